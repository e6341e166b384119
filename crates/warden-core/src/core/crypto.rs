// crates/warden-core/src/core/crypto.rs
// ============================================================================
// Module: Warden Crypto Primitives
// Description: Content hashing, HMAC signing, constant-time compare, UUIDs.
// Purpose: Provide the deterministic primitives backing every evidence record.
// Dependencies: hmac, serde, serde_jcs, sha2, subtle, uuid
// ============================================================================

//! ## Overview
//! Every hashable body in Warden is serialized as RFC 8785 canonical JSON
//! (ascending-codepoint key order, no insignificant whitespace, shortest
//! round-trippable numbers) before hashing or signing. Signatures are
//! HMAC-SHA256 over canonical bytes and are always compared in constant time.
//!
//! Security posture: a signer without key material must fail at construction;
//! verification mismatches are `false`, never panics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use hmac::Hmac;
use hmac::Mac;
use serde::Serialize;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length in characters of a lowercase hex SHA-256 digest or HMAC tag.
pub const DIGEST_HEX_LEN: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by crypto primitive construction and canonicalization.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Signing key material was empty at construction.
    #[error("signing key material must not be empty")]
    EmptyKey,
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
    /// A hashable body did not serialize to a JSON object.
    #[error("canonical body must be a json object, got {0}")]
    NonObjectBody(String),
}

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Hashes raw bytes with SHA-256 and returns lowercase hex.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`CryptoError::Canonicalization`] when serialization fails,
/// including non-finite floats which have no canonical form.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CryptoError> {
    serde_jcs::to_vec(value).map_err(|err| CryptoError::Canonicalization(err.to_string()))
}

/// Hashes the canonical JSON form of a serializable value.
///
/// # Errors
///
/// Returns [`CryptoError::Canonicalization`] when serialization fails.
pub fn sha256_canonical_hex<T: Serialize + ?Sized>(value: &T) -> Result<String, CryptoError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(sha256_hex(&bytes))
}

/// Returns canonical bytes for a record body with selected top-level fields
/// removed.
///
/// Signatures cover "every field except" a short exclusion list (the
/// signature itself, raw artifact content, proposal status). This helper
/// serializes the record, strips the excluded keys, and canonicalizes the
/// remainder.
///
/// # Errors
///
/// Returns [`CryptoError::NonObjectBody`] when the record does not serialize
/// to a JSON object, or [`CryptoError::Canonicalization`] on serializer
/// failure.
pub fn canonical_body_bytes<T: Serialize>(
    record: &T,
    excluded_fields: &[&str],
) -> Result<Vec<u8>, CryptoError> {
    let serialized = serde_json::to_value(record)
        .map_err(|err| CryptoError::Canonicalization(err.to_string()))?;
    let Value::Object(mut fields) = serialized else {
        return Err(CryptoError::NonObjectBody(value_kind(&serialized).to_string()));
    };
    for field in excluded_fields {
        fields.remove(*field);
    }
    canonical_json_bytes(&Value::Object(fields))
}

/// Returns a short label for a JSON value kind used in error messages.
const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Signing Key
// ============================================================================

/// HMAC-SHA256 mac type used for all Warden signatures.
type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signing key.
///
/// # Invariants
/// - Key material is non-empty; construction with an empty key fails.
#[derive(Clone)]
pub struct SigningKey {
    /// Initialized mac instance cloned per signing operation.
    mac: HmacSha256,
}

impl SigningKey {
    /// Creates a signing key from raw key material.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EmptyKey`] when the material is empty.
    pub fn new(material: &[u8]) -> Result<Self, CryptoError> {
        if material.is_empty() {
            return Err(CryptoError::EmptyKey);
        }
        let mac = HmacSha256::new_from_slice(material).map_err(|_| CryptoError::EmptyKey)?;
        Ok(Self {
            mac,
        })
    }

    /// Signs raw bytes and returns the lowercase hex HMAC-SHA256 tag.
    #[must_use]
    pub fn sign_hex(&self, bytes: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(bytes);
        hex_encode(&mac.finalize().into_bytes())
    }

    /// Signs the canonical body of a record with selected fields excluded.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError`] when the body cannot be canonicalized.
    pub fn sign_body<T: Serialize>(
        &self,
        record: &T,
        excluded_fields: &[&str],
    ) -> Result<String, CryptoError> {
        let bytes = canonical_body_bytes(record, excluded_fields)?;
        Ok(self.sign_hex(&bytes))
    }

    /// Verifies a stored signature against the canonical body of a record.
    ///
    /// Mismatches and canonicalization failures both report `false`; a
    /// verification path never raises.
    #[must_use]
    pub fn verify_body<T: Serialize>(
        &self,
        record: &T,
        excluded_fields: &[&str],
        signature: &str,
    ) -> bool {
        match self.sign_body(record, excluded_fields) {
            Ok(expected) => constant_time_eq(expected.as_bytes(), signature.as_bytes()),
            Err(_) => false,
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

/// Signs raw bytes with the provided key, returning lowercase hex.
#[must_use]
pub fn hmac_sha256_hex(key: &SigningKey, bytes: &[u8]) -> String {
    key.sign_hex(bytes)
}

// ============================================================================
// SECTION: Constant-Time Comparison
// ============================================================================

/// Compares two byte slices in constant time.
///
/// Length mismatch short-circuits to `false`; content comparison over equal
/// lengths is constant-time, preventing a timing oracle on signatures.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

// ============================================================================
// SECTION: Identifier Generation
// ============================================================================

/// Generates a lowercase hyphenated UUIDv4 string.
#[must_use]
pub fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
