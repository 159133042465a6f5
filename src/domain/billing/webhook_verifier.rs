//! Webhook signature verification.
//!
//! Implements verification of provider webhook signatures using HMAC-SHA256
//! with constant-time comparison, plus timestamp validation to prevent
//! replay attacks.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::event::ProviderEvent;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Errors raised while verifying a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookError {
    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Webhook timestamp outside acceptable window")]
    TimestampOutOfRange,

    #[error("Webhook timestamp in the future")]
    InvalidTimestamp,

    #[error("Failed to parse webhook: {0}")]
    ParseError(String),
}

/// Parsed components of the signature header.
///
/// Header format: `t=<timestamp>,v1=<signature>[,v0=<legacy>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signature (HMAC-SHA256).
    pub v1_signature: Vec<u8>,
    /// Optional v0 legacy signature.
    pub v0_signature: Option<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a provider signature header string.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        if header.is_empty() {
            return Err(WebhookError::ParseError("empty header".to_string()));
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;
        let mut v0_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key.trim() {
                "t" => {
                    timestamp = Some(value.trim().parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex_decode(value.trim()).ok_or_else(|| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                "v0" => {
                    v0_signature = Some(hex_decode(value.trim()).ok_or_else(|| {
                        WebhookError::ParseError("invalid v0 signature hex".to_string())
                    })?);
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        Ok(SignatureHeader {
            timestamp: timestamp
                .ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?,
            v1_signature: v1_signature
                .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?,
            v0_signature,
        })
    }
}

/// Verifier for provider webhook signatures.
pub struct WebhookVerifier {
    /// Webhook signing secret (whsec_...).
    secret: String,
}

impl WebhookVerifier {
    /// Creates a new verifier with the given signing secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies the signature and parses the event envelope.
    ///
    /// # Verification Steps
    ///
    /// 1. Parse the signature header
    /// 2. Validate the timestamp window
    /// 3. Compute the expected HMAC-SHA256 signature
    /// 4. Compare signatures in constant time
    /// 5. Parse the JSON payload into a [`ProviderEvent`]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<ProviderEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected = self.compute_signature(header.timestamp, payload);
        if !constant_time_compare(&expected, &header.v1_signature) {
            return Err(WebhookError::InvalidSignature);
        }

        let event: ProviderEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        Ok(event)
    }

    /// Validates that the timestamp is within acceptable bounds.
    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }

        Ok(())
    }

    /// Computes the HMAC-SHA256 signature for the given timestamp and payload.
    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key size");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Decode a hex string to bytes.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Encode bytes to a hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Computes a signed header for test fixtures.
#[cfg(test)]
pub fn sign_test_payload(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(signed_payload.as_bytes());
    format!(
        "t={},v1={}",
        timestamp,
        hex_encode(&mac.finalize().into_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_header_with_v1_only() {
        let signature = "a".repeat(64);
        let header = SignatureHeader::parse(&format!("t=1234567890,v1={}", signature)).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signature.len(), 32);
        assert!(header.v0_signature.is_none());
    }

    #[test]
    fn parse_header_with_v0_and_v1() {
        let header_str = format!("t=1234567890,v1={},v0={}", "a".repeat(64), "b".repeat(64));
        let header = SignatureHeader::parse(&header_str).unwrap();

        assert!(header.v0_signature.is_some());
    }

    #[test]
    fn parse_header_ignores_unknown_fields() {
        let header_str = format!("t=1234567890,v1={},v2=future,scheme=hmac", "a".repeat(64));
        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
    }

    #[test]
    fn parse_header_missing_timestamp_fails() {
        let result = SignatureHeader::parse(&format!("v1={}", "a".repeat(64)));
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_missing_v1_fails() {
        let result = SignatureHeader::parse("t=1234567890");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_invalid_timestamp_fails() {
        let result = SignatureHeader::parse(&format!("t=not_a_number,v1={}", "a".repeat(64)));
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_invalid_hex_fails() {
        let result = SignatureHeader::parse("t=1234567890,v1=not_valid_hex");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_header_odd_length_hex_fails() {
        let result = SignatureHeader::parse("t=1234567890,v1=abc");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    #[test]
    fn parse_empty_header_fails() {
        let result = SignatureHeader::parse("");
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ══════════════════════════════════════════════════════════════

    fn minimal_event_payload() -> String {
        r#"{"id":"evt_test123","type":"checkout.session.completed","created":1704067200,"data":{"object":{}},"livemode":false,"api_version":"2023-10-16"}"#.to_string()
    }

    #[test]
    fn verify_valid_signature() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = minimal_event_payload();
        let timestamp = chrono::Utc::now().timestamp();
        let header = sign_test_payload(TEST_SECRET, timestamp, &payload);

        let event = verifier.verify_and_parse(payload.as_bytes(), &header).unwrap();
        assert_eq!(event.id, "evt_test123");
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let verifier = WebhookVerifier::new("wrong_secret");
        let payload = minimal_event_payload();
        let timestamp = chrono::Utc::now().timestamp();
        let header = sign_test_payload(TEST_SECRET, timestamp, &payload);

        let result = verifier.verify_and_parse(payload.as_bytes(), &header);
        assert_eq!(result.unwrap_err(), WebhookError::InvalidSignature);
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp();
        let header = sign_test_payload(TEST_SECRET, timestamp, &minimal_event_payload());

        let tampered = minimal_event_payload().replace("evt_test123", "evt_hacked");
        let result = verifier.verify_and_parse(tampered.as_bytes(), &header);
        assert_eq!(result.unwrap_err(), WebhookError::InvalidSignature);
    }

    #[test]
    fn verify_garbage_signature_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = minimal_event_payload();
        let timestamp = chrono::Utc::now().timestamp();
        let header = format!("t={},v1={}", timestamp, "a".repeat(64));

        let result = verifier.verify_and_parse(payload.as_bytes(), &header);
        assert_eq!(result.unwrap_err(), WebhookError::InvalidSignature);
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn timestamp_within_window_succeeds() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 120;
        assert!(verifier.validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn timestamp_too_old_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 600;
        assert_eq!(
            verifier.validate_timestamp(timestamp).unwrap_err(),
            WebhookError::TimestampOutOfRange
        );
    }

    #[test]
    fn timestamp_slightly_in_future_succeeds() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() + 30;
        assert!(verifier.validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn timestamp_far_in_future_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() + 120;
        assert_eq!(
            verifier.validate_timestamp(timestamp).unwrap_err(),
            WebhookError::InvalidTimestamp
        );
    }

    #[test]
    fn replayed_event_is_rejected() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = minimal_event_payload();
        let stale = chrono::Utc::now().timestamp() - 600;
        let header = sign_test_payload(TEST_SECRET, stale, &payload);

        let result = verifier.verify_and_parse(payload.as_bytes(), &header);
        assert_eq!(result.unwrap_err(), WebhookError::TimestampOutOfRange);
    }

    // ══════════════════════════════════════════════════════════════
    // JSON Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_invalid_json_fails_after_signature_check() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = "not valid json";
        let timestamp = chrono::Utc::now().timestamp();
        let header = sign_test_payload(TEST_SECRET, timestamp, payload);

        let result = verifier.verify_and_parse(payload.as_bytes(), &header);
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Hex / Constant Time Comparison Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn constant_time_compare_behaves() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2], &[1, 2, 3]));
        assert!(constant_time_compare(&[], &[]));
    }

    #[test]
    fn hex_encode_formats_bytes() {
        assert_eq!(hex_encode(&[0x00, 0xff, 0x10]), "00ff10");
        assert_eq!(hex_encode(&[]), "");
    }

    proptest! {
        #[test]
        fn hex_roundtrips(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let encoded = hex_encode(&bytes);
            let decoded = hex_decode(&encoded).unwrap();
            prop_assert_eq!(bytes, decoded);
        }

        #[test]
        fn signed_payloads_always_verify(payload in "[ -~]{0,200}") {
            let verifier = WebhookVerifier::new(TEST_SECRET);
            let timestamp = chrono::Utc::now().timestamp();
            let header = sign_test_payload(TEST_SECRET, timestamp, &payload);
            let parsed = SignatureHeader::parse(&header).unwrap();
            let expected = verifier.compute_signature(parsed.timestamp, payload.as_bytes());
            prop_assert!(constant_time_compare(&expected, &parsed.v1_signature));
        }
    }
}
