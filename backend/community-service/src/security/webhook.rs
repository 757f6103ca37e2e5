//! Payment provider webhook signatures.
//!
//! Header format: `t=<unix seconds>,v1=<hex hmac>[,v1=...]`. The MAC is
//! HMAC-SHA256 over `"{t}.{raw body}"` keyed with the endpoint secret.
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("invalid webhook secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check `header` against `payload`, rejecting timestamps outside the tolerance window.
pub fn verify_signature(secret: &str, header: &str, payload: &[u8], now: i64) -> Result<()> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::Unauthorized("webhook signature missing timestamp".into()))?;
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::Unauthorized(
            "webhook signature timestamp outside tolerance".into(),
        ));
    }

    for candidate in signatures {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::Internal(format!("invalid webhook secret: {e}")))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(AppError::Unauthorized("webhook signature mismatch".into()))
}
