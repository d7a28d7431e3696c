// src/miner/target.rs
//! Difficulty to target conversion
//!
//! A digest is accepted when it is strictly below `2^(256 - difficulty)`.

use crate::utils::error::MinerError;
use primitive_types::{U256, U512};
use std::fmt;

/// Largest difficulty that still leaves a non-zero target
pub const MAX_DIFFICULTY: u64 = 256;

/// Acceptance threshold for one round
///
/// `2^256` does not fit a `U256`, so difficulty 0 gets its own variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Target of `2^256`: every digest is accepted
    Unbounded,
    /// Digests strictly below the contained value are accepted
    Below(U256),
}

/// Computes the target for a difficulty level
///
/// # Arguments
/// * `difficulty` - Number of leading zero bits a digest needs
///
/// # Returns
/// * `Ok(Target)` - `2^(256 - difficulty)`
/// * `Err(MinerError::ConfigError)` - When `difficulty` exceeds [`MAX_DIFFICULTY`]
pub fn compute_target(difficulty: u64) -> Result<Target, MinerError> {
    if difficulty > MAX_DIFFICULTY {
        return Err(MinerError::ConfigError(format!(
            "Difficulty {} out of range (0..={})",
            difficulty, MAX_DIFFICULTY
        )));
    }

    if difficulty == 0 {
        return Ok(Target::Unbounded);
    }

    Ok(Target::Below(U256::one() << (MAX_DIFFICULTY - difficulty) as usize))
}

impl Target {
    /// Returns `true` when `digest` is strictly below the target
    #[inline]
    pub fn accepts(&self, digest: U256) -> bool {
        match self {
            Target::Unbounded => true,
            Target::Below(threshold) => digest < *threshold,
        }
    }

    /// Exact numeric value of the target
    pub fn to_u512(&self) -> U512 {
        match self {
            Target::Unbounded => U512::one() << MAX_DIFFICULTY as usize,
            Target::Below(threshold) => U512::from(*threshold),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_u512())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_power_of_two_for_every_difficulty() {
        for d in 0..=MAX_DIFFICULTY {
            let target = compute_target(d).unwrap();
            assert_eq!(target.to_u512(), U512::one() << (256 - d) as usize, "d = {}", d);
        }
    }

    #[test]
    fn target_never_grows_with_difficulty() {
        let mut previous = compute_target(0).unwrap().to_u512();
        for d in 1..=MAX_DIFFICULTY {
            let current = compute_target(d).unwrap().to_u512();
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn extremes() {
        assert_eq!(compute_target(0).unwrap(), Target::Unbounded);
        assert_eq!(compute_target(256).unwrap(), Target::Below(U256::one()));
        assert!(compute_target(0).unwrap().accepts(U256::MAX));
    }

    #[test]
    fn out_of_range_difficulty_is_a_config_error() {
        assert!(matches!(compute_target(257), Err(MinerError::ConfigError(_))));
        assert!(matches!(compute_target(u64::MAX), Err(MinerError::ConfigError(_))));
    }

    #[test]
    fn acceptance_is_strictly_below_target() {
        let target = compute_target(8).unwrap();
        let threshold = U256::one() << 248;
        assert!(target.accepts(threshold - 1));
        assert!(!target.accepts(threshold));
        assert!(!target.accepts(threshold + 1));
    }

    #[test]
    fn max_difficulty_only_accepts_zero() {
        let target = compute_target(256).unwrap();
        assert!(target.accepts(U256::zero()));
        assert!(!target.accepts(U256::one()));
        assert!(!target.accepts(U256::MAX));
    }

    #[test]
    fn display_prints_decimal_value() {
        assert_eq!(compute_target(255).unwrap().to_string(), "2");
        assert_eq!(
            compute_target(0).unwrap().to_string(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639936"
        );
    }
}
