//! Best-effort JWT claim decoding (no signature verification).

use base64::Engine as _;
use chrono::{DateTime, Utc};

use crate::error::BaasError;

/// Decode the `exp` claim of an access token.
///
/// Does NOT verify the signature; the auth service remains the authority on
/// whether a token is valid. Used to populate `Session::expires_at` and to
/// decide when a refresh is due.
///
/// # Errors
///
/// Returns `BaasError::Decode` if the JWT format is invalid or the `exp`
/// claim is missing or cannot be parsed.
pub fn decode_expiry(jwt: &str) -> Result<DateTime<Utc>, BaasError> {
    let exp = decode_claims(jwt)?["exp"]
        .as_i64()
        .ok_or_else(|| BaasError::Decode("missing exp claim".into()))?;
    DateTime::from_timestamp(exp, 0).ok_or_else(|| BaasError::Decode("invalid exp timestamp".into()))
}

/// Decode the `sub` claim (the user id) of an access token.
///
/// # Errors
///
/// Returns `BaasError::Decode` if the JWT format is invalid or `sub` is missing.
pub fn decode_subject(jwt: &str) -> Result<String, BaasError> {
    decode_claims(jwt)?["sub"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| BaasError::Decode("missing sub claim".into()))
}

fn decode_claims(jwt: &str) -> Result<serde_json::Value, BaasError> {
    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 {
        return Err(BaasError::Decode("invalid JWT format".into()));
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| BaasError::Decode(format!("base64 decode failed: {e}")))?;
    serde_json::from_slice(&payload)
        .map_err(|e| BaasError::Decode(format!("JSON parse failed: {e}")))
}

/// Build an unsigned token carrying `sub` and `exp`. Used by the in-memory backend.
#[cfg(any(test, feature = "test-support"))]
pub(crate) fn encode_unsigned(subject: &str, expires_at: DateTime<Utc>) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let payload = engine.encode(
        serde_json::json!({ "sub": subject, "exp": expires_at.timestamp() }).to_string(),
    );
    let signature = engine.encode("unsigned");
    format!("{header}.{payload}.{signature}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_jwt(payload: &str) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(r#"{"alg":"HS256"}"#);
        let payload = engine.encode(payload);
        let signature = engine.encode("fake_sig");
        format!("{header}.{payload}.{signature}")
    }

    #[test]
    fn decode_expiry_valid_jwt() {
        let future_exp = Utc::now().timestamp() + 3600;
        let jwt = make_jwt(&format!(r#"{{"sub":"user_123","exp":{future_exp}}}"#));
        assert_eq!(decode_expiry(&jwt).unwrap().timestamp(), future_exp);
        assert_eq!(decode_subject(&jwt).unwrap(), "user_123");
    }

    #[test]
    fn decode_expiry_invalid_format() {
        let err = decode_expiry("not-a-jwt").unwrap_err();
        assert!(err.to_string().contains("invalid JWT format"));
    }

    #[test]
    fn decode_expiry_missing_exp_claim() {
        let jwt = make_jwt(r#"{"sub":"user_123"}"#);
        let err = decode_expiry(&jwt).unwrap_err();
        assert!(err.to_string().contains("missing exp claim"));
    }

    #[test]
    fn decode_expiry_bad_base64() {
        let err = decode_expiry("header.!!!invalid!!!.signature").unwrap_err();
        assert!(err.to_string().contains("base64 decode failed"));
    }

    #[test]
    fn unsigned_tokens_decode() {
        let exp = DateTime::from_timestamp(1_900_000_000, 0).unwrap();
        let jwt = encode_unsigned("u-7", exp);
        assert_eq!(decode_expiry(&jwt).unwrap(), exp);
        assert_eq!(decode_subject(&jwt).unwrap(), "u-7");
    }
}
