use std::sync::Arc;

use jwt_simple::prelude::*;

use crate::error::{AppError, Result};
use crate::models::Caller;

use super::AccessClaims;

/// HMAC key used to issue and verify bearer tokens.
#[derive(Clone)]
pub struct TokenKeys {
    key: Arc<HS256Key>,
    ttl_hours: u64,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl_hours: u64) -> Self {
        Self {
            key: Arc::new(HS256Key::from_bytes(secret)),
            ttl_hours,
        }
    }

    /// Issue a token for `email` carrying `roles`.
    pub fn issue(&self, email: &str, roles: &[String]) -> Result<String> {
        let custom = AccessClaims {
            roles: roles.to_vec(),
        };
        let claims = Claims::with_custom_claims(custom, Duration::from_hours(self.ttl_hours))
            .with_subject(email);

        self.key
            .authenticate(claims)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token and resolve the caller it identifies.
    pub fn verify(&self, token: &str) -> Result<Caller> {
        let claims = self
            .key
            .verify_token::<AccessClaims>(token, None)
            .map_err(|e| {
                tracing::debug!("Token verification failed: {}", e);
                AppError::Unauthenticated
            })?;

        let identity = claims
            .subject
            .filter(|s| !s.trim().is_empty())
            .ok_or(AppError::Unauthenticated)?;

        Ok(Caller::new(identity, claims.custom.roles))
    }
}
