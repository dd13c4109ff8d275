// crates/vote-ledger-core/src/core/hashing.rs
// ============================================================================
// Module: Vote Ledger Canonical Hashing
// Description: RFC 8785 JSON canonicalization and content hashing utilities.
// Purpose: Derive stable decision identifiers and integrity digests for records.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Ledger records are hashed over RFC 8785 (JCS) canonical JSON so digests
//! are stable across processes and storage backends. Decision identifiers are
//! derived from the `(proposal, voter)` pair, which makes duplicate recording
//! detectable without a separate uniqueness index.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::core::identifiers::DecisionId;
use crate::core::identifiers::ProposalId;
use crate::core::identifiers::VoterId;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for ledger records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing.
    Sha256,
}

/// Default hash algorithm for the ledger.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Deterministic content hash representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let digest = Sha256::digest(bytes);
            HashDigest {
                algorithm: HashAlgorithm::Sha256,
                value: hex_encode(&digest),
            }
        }
    }
}

/// Canonical key material for decision identifiers.
#[derive(Serialize)]
struct DecisionKey<'a> {
    /// Proposal the vote was cast on.
    proposal_id: &'a ProposalId,
    /// Voter who cast the vote.
    voter: &'a VoterId,
}

/// Derives the decision identifier for a voter's vote on a proposal.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when the key cannot be canonicalized.
pub fn derive_decision_id(
    algorithm: HashAlgorithm,
    proposal_id: &ProposalId,
    voter: &VoterId,
) -> Result<DecisionId, HashError> {
    let bytes = canonical_json_bytes(&DecisionKey {
        proposal_id,
        voter,
    })?;
    Ok(DecisionId::new(hash_bytes(algorithm, &bytes).value))
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}
