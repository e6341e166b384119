// crates/warden-core/src/runtime/gates/secrets.rs
// ============================================================================
// Module: Warden Secrets Gate
// Description: Secret material detection with redaction.
// Purpose: Block content carrying credentials before it leaves the runtime.
// Dependencies: crate::core::gate, regex, serde_json
// ============================================================================

//! ## Overview
//! The secrets gate scans content with the full credential pattern set. Each
//! match is redacted to its first four and last four characters with `*`
//! padding; the raw value never appears in results, telemetry, or errors.
//! Any detection blocks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;
use serde_json::json;

use crate::core::gate::GateDecision;
use crate::core::gate::GateResult;
use crate::interfaces::WriteHook;

// ============================================================================
// SECTION: Patterns
// ============================================================================

/// One secret detection rule.
struct SecretRule {
    /// Stable rule identifier.
    rule_id: &'static str,
    /// Regex source for the credential shape.
    pattern: &'static str,
}

/// Credential pattern set.
const SECRET_RULES: &[SecretRule] = &[
    SecretRule {
        rule_id: "secrets.api-key",
        pattern: r#"(?i)api[_-]?key\s*[:=]\s*['"]?[A-Za-z0-9_\-]{8,}"#,
    },
    SecretRule {
        rule_id: "secrets.password",
        pattern: r#"(?i)password\s*[:=]\s*['"]?\S{4,}"#,
    },
    SecretRule {
        rule_id: "secrets.bearer-token",
        pattern: r"(?i)bearer\s+[A-Za-z0-9._~+/=\-]{8,}",
    },
    SecretRule {
        rule_id: "secrets.pem-header",
        pattern: r"-----BEGIN [A-Z ]*PRIVATE KEY-----",
    },
    SecretRule {
        rule_id: "secrets.sk-token",
        pattern: r"\bsk-[A-Za-z0-9]{16,}\b",
    },
    SecretRule {
        rule_id: "secrets.github-pat",
        pattern: r"\bghp_[A-Za-z0-9]{36}\b",
    },
    SecretRule {
        rule_id: "secrets.npm-token",
        pattern: r"\bnpm_[A-Za-z0-9]{36}\b",
    },
    SecretRule {
        rule_id: "secrets.aws-access-key",
        pattern: r"\bAKIA[0-9A-Z]{16}\b",
    },
];

// ============================================================================
// SECTION: Redaction
// ============================================================================

/// Redacts a matched secret to first four plus last four characters.
///
/// Matches of eight or fewer characters redact fully; the middle of longer
/// matches becomes `*` padding of the original length.
#[must_use]
pub fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[.. 4].iter().collect();
    let tail: String = chars[chars.len() - 4 ..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Gate detecting and redacting credential material in content.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretsGate;

impl SecretsGate {
    /// Scans content for credentials; `None` when nothing matched.
    ///
    /// The result carries the detection count and redacted samples only.
    #[must_use]
    pub fn evaluate_content(&self, content: &str) -> Option<GateResult> {
        let mut triggered_rules = Vec::new();
        let mut samples = Vec::new();

        for rule in SECRET_RULES {
            let Ok(pattern) = Regex::new(rule.pattern) else {
                continue;
            };
            let mut matched = false;
            for found in pattern.find_iter(content) {
                matched = true;
                samples.push(redact(found.as_str()));
            }
            if matched {
                triggered_rules.push(rule.rule_id.to_string());
            }
        }

        if samples.is_empty() {
            return None;
        }

        Some(GateResult {
            decision: GateDecision::Block,
            gate_name: "secrets".to_string(),
            reason: format!("Detected {} secret(s) in content", samples.len()),
            triggered_rules,
            remediation: Some(
                "Remove the credential from the content and rotate it if it was ever \
                 committed or transmitted"
                    .to_string(),
            ),
            metadata: json!({
                "detected": samples.len(),
                "samples": samples,
            }),
        })
    }
}

/// Returns every rule pattern source for compile validation in tests.
#[must_use]
pub fn rule_patterns() -> Vec<&'static str> {
    SECRET_RULES.iter().map(|rule| rule.pattern).collect()
}

// ============================================================================
// SECTION: Write Hook
// ============================================================================

/// Memory write hook scanning serialized values with the secrets gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretsWriteHook;

impl WriteHook for SecretsWriteHook {
    fn inspect(&self, _namespace: &str, _key: &str, serialized_value: &str) -> Option<GateResult> {
        SecretsGate.evaluate_content(serialized_value)
    }
}
