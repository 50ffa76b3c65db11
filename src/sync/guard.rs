//! Sync access guard.
//!
//! When a shared secret is configured, every ingestion call must present a
//! matching secret in the `x-api-key` header or the in-body `apiKey` field;
//! the header takes precedence. When no secret is configured the guard is a
//! no-op — an intentional deployment-time trust decision, not a bug.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::error::{ApiError, unauthorized};

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Verify the shared secret for one ingestion call.
pub fn verify_shared_secret(
    configured: Option<&str>,
    headers: &HeaderMap,
    payload_key: Option<&str>,
) -> Result<(), ApiError> {
    let Some(configured) = configured else {
        return Ok(());
    };

    let header_key = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());

    let provided = header_key.or(payload_key);

    let matches = provided
        .map(|candidate| {
            ConstantTimeEq::ct_eq(candidate.as_bytes(), configured.as_bytes()).into()
        })
        .unwrap_or(false);

    if matches {
        Ok(())
    } else {
        Err(unauthorized(Some("Unauthorized")))
    }
}
