use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("JWT secret is not set")]
    MissingSecret,

    #[error("Invalid token format")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Invalid claims format")]
    BadClaims,

    #[error("Token expired")]
    Expired,
}

/// Verifies an HS256 token and turns its claims into the calling [`User`].
///
/// The application role is read from `app_metadata.role` when present (the
/// Supabase convention) and from the top-level `role` claim otherwise.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, TokenError> {
    if jwt_secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let mut parts = token.split('.');
    let (header_b64, claims_b64, signature_b64) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(claims), Some(signature), None) => (header, claims, signature),
            _ => return Err(TokenError::Malformed),
        };

    let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        TokenError::Malformed
    })?;

    let mut mac =
        HmacSha256::new_from_slice(jwt_secret.as_bytes()).map_err(|_| TokenError::MissingSecret)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err(TokenError::BadSignature);
    }

    let claims_json = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| TokenError::BadClaims)?;
    let claims: JwtClaims = serde_json::from_slice(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        TokenError::BadClaims
    })?;

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp().max(0) as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err(TokenError::Expired);
        }
    }

    let app_role = claims
        .app_metadata
        .as_ref()
        .and_then(|meta| meta.get("role"))
        .and_then(|role| role.as_str())
        .map(str::to_string);

    let created_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: app_role.or(claims.role),
        metadata: claims.user_metadata,
        created_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}
