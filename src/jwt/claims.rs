use serde::{Deserialize, Serialize};

/// Custom claims carried by access tokens.
/// Standard claims (sub, iat, exp) are handled by jwt-simple; `sub` is the user's email.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub roles: Vec<String>,
}
