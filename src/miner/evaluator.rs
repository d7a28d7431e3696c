// src/miner/evaluator.rs
//! Candidate evaluation
//!
//! The byte layout hashed here must match the token contract's own check:
//! `keccak256(pad32(challenge) || claimant || pad32(nonce))`.

use crate::miner::target::Target;
use crate::types::{ADDRESS_LEN, Address};
use primitive_types::U256;
use tiny_keccak::{Hasher, Keccak};

/// Length of the encoded candidate: challenge, claimant, nonce
pub const CANDIDATE_LEN: usize = 32 + ADDRESS_LEN + 32;

/// Immutable description of one search round, shared by every worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// Round challenge published by the contract
    pub challenge: U256,
    /// Account the proof is bound to
    pub claimant: Address,
    /// Acceptance threshold derived from the difficulty
    pub target: Target,
}

/// Outcome of hashing one candidate nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Digest interpreted as a big-endian unsigned integer
    pub digest: U256,
    /// Whether the digest is below the target
    pub accepted: bool,
}

/// Keccak-256 of `data`
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut out);
    out
}

/// Encodes a candidate in the exact layout the verifier hashes
pub fn encode_candidate(challenge: U256, claimant: &Address, nonce: U256) -> [u8; CANDIDATE_LEN] {
    let mut buf = [0u8; CANDIDATE_LEN];
    challenge.to_big_endian(&mut buf[..32]);
    buf[32..32 + ADDRESS_LEN].copy_from_slice(claimant.as_bytes());
    nonce.to_big_endian(&mut buf[32 + ADDRESS_LEN..]);
    buf
}

/// Hashes a candidate nonce and checks it against the problem's target
#[inline]
pub fn evaluate(problem: &Problem, nonce: U256) -> Evaluation {
    let encoded = encode_candidate(problem.challenge, &problem.claimant, nonce);
    let digest = U256::from_big_endian(&keccak256(&encoded));
    Evaluation {
        digest,
        accepted: problem.target.accepts(digest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::target::compute_target;
    use hex_literal::hex;

    fn problem(difficulty: u64) -> Problem {
        Problem {
            challenge: U256::from(0x1234_5678u64),
            claimant: Address(hex!("ca9b78435be8267922e7ac5cde70401e7502c9cc")),
            target: compute_target(difficulty).unwrap(),
        }
    }

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            keccak256(&[]),
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn candidate_layout_is_padded_big_endian() {
        let claimant = Address([0xAA; ADDRESS_LEN]);
        let encoded = encode_candidate(U256::from(0x0102u64), &claimant, U256::from(0x03u64));

        assert!(encoded[..30].iter().all(|b| *b == 0));
        assert_eq!(&encoded[30..32], &[0x01, 0x02]);
        assert_eq!(&encoded[32..52], &[0xAA; ADDRESS_LEN]);
        assert!(encoded[52..83].iter().all(|b| *b == 0));
        assert_eq!(encoded[83], 0x03);
    }

    #[test]
    fn full_width_values_fill_their_slots() {
        let encoded = encode_candidate(U256::MAX, &Address::default(), U256::MAX);
        assert_eq!(&encoded[..32], &[0xFF; 32]);
        assert_eq!(&encoded[32..52], &[0x00; ADDRESS_LEN]);
        assert_eq!(&encoded[52..], &[0xFF; 32]);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let p = problem(16);
        let nonce = U256::from(42u64);
        assert_eq!(evaluate(&p, nonce), evaluate(&p, nonce));
    }

    #[test]
    fn digest_is_keccak_of_encoding() {
        let p = problem(16);
        let nonce = U256::from(7u64);
        let expected = keccak256(&encode_candidate(p.challenge, &p.claimant, nonce));
        assert_eq!(evaluate(&p, nonce).digest, U256::from_big_endian(&expected));
    }

    #[test]
    fn decision_follows_target() {
        let nonce = U256::from(99u64);
        let digest = evaluate(&problem(0), nonce).digest;

        // A target one above the digest accepts it, a target equal to it does not
        let mut p = problem(0);
        p.target = Target::Below(digest + 1);
        assert!(evaluate(&p, nonce).accepted);
        p.target = Target::Below(digest);
        assert!(!evaluate(&p, nonce).accepted);
    }

    #[test]
    fn difficulty_zero_accepts_everything() {
        let p = problem(0);
        for n in 0..64u64 {
            assert!(evaluate(&p, U256::from(n)).accepted);
        }
    }

    #[test]
    fn digest_depends_on_claimant() {
        let mut other = problem(16);
        other.claimant = Address([0x11; ADDRESS_LEN]);
        let nonce = U256::from(5u64);
        assert_ne!(evaluate(&problem(16), nonce).digest, evaluate(&other, nonce).digest);
    }
}
