//! Dice for combat. SplitMix64 underneath: same seed, same sequence of rolls.
//! Not cryptographically secure.

use log::warn;

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

pub const DIE_FACES: u8 = 6;

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from OS entropy, falling back to the wall clock if entropy is unavailable.
    pub fn from_entropy() -> Self {
        let mut buf = [0_u8; 8];
        match getrandom::getrandom(&mut buf) {
            Ok(()) => Self::new(u64::from_le_bytes(buf)),
            Err(err) => {
                warn!("os entropy unavailable ({err}); seeding dice from clock");
                let nanos = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0);
                Self::new(nanos)
            }
        }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }

    /// A fair-enough d6: 1..=6.
    #[inline]
    pub fn roll_die(&mut self) -> u8 {
        (self.next_u64() % u64::from(DIE_FACES)) as u8 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_rolls() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..100 {
            assert_eq!(a.roll_die(), b.roll_die());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = Rng::new(1);
        let mut b = Rng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn rolls_cover_every_face_and_nothing_else() {
        let mut rng = Rng::new(42);
        let mut seen = [0_u32; 6];
        for _ in 0..6_000 {
            let roll = rng.roll_die();
            assert!((1..=6).contains(&roll), "roll out of range: {roll}");
            seen[usize::from(roll - 1)] += 1;
        }
        assert!(seen.iter().all(|&count| count > 0));
    }
}
