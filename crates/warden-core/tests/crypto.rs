// crates/warden-core/tests/crypto.rs
// ============================================================================
// Module: Crypto Primitive Tests
// Description: Verifies hashing, signing, constant-time compare, and UUIDs.
// ============================================================================
//! ## Overview
//! Ensures canonical hashing is deterministic and order-independent, HMAC
//! signing round-trips and rejects empty keys, and identifiers have the
//! UUIDv4 shape.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use warden_core::CryptoError;
use warden_core::SigningKey;
use warden_core::canonical_body_bytes;
use warden_core::canonical_json_bytes;
use warden_core::constant_time_eq;
use warden_core::new_uuid;
use warden_core::sha256_canonical_hex;
use warden_core::sha256_hex;

#[test]
fn sha256_known_vector() {
    // SHA-256 of "test" = 9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
    assert_eq!(
        sha256_hex(b"test"),
        "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
    );
}

#[test]
fn sha256_empty_input() {
    // SHA-256 of empty input = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
    assert_eq!(
        sha256_hex(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn canonical_hash_is_order_independent_for_maps() {
    let mut map_a = Map::new();
    map_a.insert("b".to_string(), json!(2));
    map_a.insert("a".to_string(), json!(1));

    let mut map_b = Map::new();
    map_b.insert("a".to_string(), json!(1));
    map_b.insert("b".to_string(), json!(2));

    let hash_a = sha256_canonical_hex(&Value::Object(map_a)).expect("hash a");
    let hash_b = sha256_canonical_hex(&Value::Object(map_b)).expect("hash b");
    assert_eq!(hash_a, hash_b);
}

#[derive(Serialize)]
struct FloatWrapper {
    value: f64,
}

#[test]
fn canonical_bytes_reject_nan() {
    let value = FloatWrapper {
        value: f64::NAN,
    };
    let err = canonical_json_bytes(&value).unwrap_err();
    assert!(matches!(err, CryptoError::Canonicalization(_)));
}

#[derive(Serialize)]
struct SignedRecord {
    name: String,
    count: u32,
    signature: String,
}

#[test]
fn canonical_body_excludes_listed_fields() {
    let record = SignedRecord {
        name: "alpha".to_string(),
        count: 3,
        signature: "deadbeef".to_string(),
    };
    let body = canonical_body_bytes(&record, &["signature"]).expect("body");
    let text = String::from_utf8(body).expect("utf8");
    assert!(!text.contains("deadbeef"), "signature must be excluded from the body");
    assert!(text.contains("alpha"));
}

#[test]
fn canonical_body_rejects_non_objects() {
    let err = canonical_body_bytes(&json!([1, 2, 3]), &["signature"]).unwrap_err();
    assert!(matches!(err, CryptoError::NonObjectBody(_)));
}

#[test]
fn empty_signing_key_fails_at_construction() {
    let err = SigningKey::new(b"").unwrap_err();
    assert!(matches!(err, CryptoError::EmptyKey));
}

#[test]
fn signature_round_trip_verifies() {
    let key = SigningKey::new(b"conformance-key").expect("key");
    let record = SignedRecord {
        name: "beta".to_string(),
        count: 9,
        signature: String::new(),
    };
    let signature = key.sign_body(&record, &["signature"]).expect("sign");
    assert_eq!(signature.len(), 64);
    assert!(key.verify_body(&record, &["signature"], &signature));
}

#[test]
fn tampered_body_breaks_verification() {
    let key = SigningKey::new(b"conformance-key").expect("key");
    let record = SignedRecord {
        name: "gamma".to_string(),
        count: 1,
        signature: String::new(),
    };
    let signature = key.sign_body(&record, &["signature"]).expect("sign");

    let tampered = SignedRecord {
        name: "gamma!".to_string(),
        count: 1,
        signature: String::new(),
    };
    assert!(!key.verify_body(&tampered, &["signature"], &signature));
}

#[test]
fn different_keys_produce_different_signatures() {
    let key_a = SigningKey::new(b"key-a").expect("key a");
    let key_b = SigningKey::new(b"key-b").expect("key b");
    let bytes = b"payload";
    assert_ne!(key_a.sign_hex(bytes), key_b.sign_hex(bytes));
}

#[test]
fn constant_time_eq_matches_semantics() {
    assert!(constant_time_eq(b"same", b"same"));
    assert!(!constant_time_eq(b"same", b"sane"));
    assert!(!constant_time_eq(b"short", b"longer-value"), "length mismatch short-circuits");
    assert!(constant_time_eq(b"", b""));
}

#[test]
fn uuid_has_v4_shape() {
    let id = new_uuid();
    assert_eq!(id.len(), 36);
    let bytes: Vec<char> = id.chars().collect();
    assert_eq!(bytes[8], '-');
    assert_eq!(bytes[13], '-');
    assert_eq!(bytes[18], '-');
    assert_eq!(bytes[23], '-');
    assert_eq!(bytes[14], '4', "version nibble must be 4");
    assert!(id.chars().all(|c| c == '-' || c.is_ascii_hexdigit()));
    assert!(!id.chars().any(|c| c.is_uppercase()));
}

#[test]
fn uuids_are_unique_across_calls() {
    let first = new_uuid();
    let second = new_uuid();
    assert_ne!(first, second);
}
