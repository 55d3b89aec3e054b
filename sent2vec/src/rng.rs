use rand::{Error, RngCore, SeedableRng};

/// The linear congruential generator word2vec uses for everything random.
///
/// It plugs into `rand` so that `gen_range` and `ndarray-rand` can draw from it.
#[derive(Debug, Clone)]
pub struct Rng(pub u64);

impl Rng {
    pub fn rand_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(25214903917).wrapping_add(11);
        self.0
    }
}

impl RngCore for Rng {
    // The low bits of an LCG have short periods; hand out the high ones.
    fn next_u32(&mut self) -> u32 {
        (self.rand_u64() >> 16) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_u32() as u64;
        let lo = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Rng {
    type Seed = [u8; 8];

    fn from_seed(seed: [u8; 8]) -> Self {
        Rng(u64::from_le_bytes(seed))
    }

    /// Use the seed as the generator state directly, like word2vec's `next_random = id`.
    fn seed_from_u64(state: u64) -> Self {
        Rng(state)
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng as _;

    use super::*;

    #[test]
    fn matches_word2vec_sequence() {
        let mut rng = Rng(1);
        assert_eq!(rng.rand_u64(), 25214903928);
        assert_eq!(rng.rand_u64(), 25214903928u64.wrapping_mul(25214903917).wrapping_add(11));
    }

    #[test]
    fn same_seed_same_draws() {
        let mut a = Rng::seed_from_u64(7);
        let mut b = Rng::seed_from_u64(7);
        let xs: Vec<usize> = (0..100).map(|_| a.gen_range(0..5)).collect();
        let ys: Vec<usize> = (0..100).map(|_| b.gen_range(0..5)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|&x| x < 5));
        // every value in range shows up eventually
        for v in 0..5 {
            assert!(xs.contains(&v), "{v} never drawn");
        }
    }

    #[test]
    fn fill_bytes_handles_ragged_tail() {
        let mut rng = Rng(5);
        let mut buf = [0u8; 7];
        rng.fill_bytes(&mut buf);
        assert!(buf.iter().any(|&b| b != 0));
    }
}
