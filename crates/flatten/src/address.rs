//! Multisig account derivation.
//!
//! The derivation is treated as an external primitive with a single
//! contract: the same signatory set and threshold always yield the same
//! account. [`SubstrateMultisig`] follows `pallet-multisig`.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use unnest_core::models::AccountId;

type Blake2b256 = Blake2b<U32>;

/// Entropy prefix used by `pallet-multisig`.
const MULTISIG_PREFIX: &[u8] = b"modlpy/utilisuba";

/// Derives the account a multisig call dispatches as.
pub trait MultisigDeriver: Send + Sync {
    fn derive(&self, signatories: &[AccountId], threshold: u16) -> AccountId;
}

/// `pallet-multisig` convention:
/// `blake2_256("modlpy/utilisuba" ++ SCALE(sorted signatories) ++ threshold_le)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstrateMultisig;

impl MultisigDeriver for SubstrateMultisig {
    fn derive(&self, signatories: &[AccountId], threshold: u16) -> AccountId {
        let mut sorted = signatories.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut hasher = Blake2b256::new();
        hasher.update(MULTISIG_PREFIX);
        hasher.update(encode_compact_len(sorted.len()));
        for account in &sorted {
            hasher.update(account.as_bytes());
        }
        hasher.update(threshold.to_le_bytes());

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        AccountId(bytes)
    }
}

/// SCALE compact encoding of a length prefix.
fn encode_compact_len(len: usize) -> Vec<u8> {
    let n = len as u64;
    match n {
        0..=0x3f => vec![(n as u8) << 2],
        0x40..=0x3fff => ((n as u16) << 2 | 0b01).to_le_bytes().to_vec(),
        0x4000..=0x3fff_ffff => ((n as u32) << 2 | 0b10).to_le_bytes().to_vec(),
        _ => {
            let bytes = n.to_le_bytes();
            let used = 8 - (n.leading_zeros() / 8) as usize;
            let mut out = Vec::with_capacity(used + 1);
            out.push(((used - 4) as u8) << 2 | 0b11);
            out.extend_from_slice(&bytes[..used]);
            out
        }
    }
}
