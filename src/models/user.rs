use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Role that may create licenses and manage the catalogue.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
/// Role granted to every registered user.
pub const ROLE_USER: &str = "ROLE_USER";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub created_at: i64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl CreateUser {
    pub fn validate(&self) -> Result<()> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::InvalidArgument("email must be a valid address".into()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidArgument("name cannot be empty".into()));
        }
        if let Some(role) = self
            .roles
            .iter()
            .find(|r| r.as_str() != ROLE_ADMIN && r.as_str() != ROLE_USER)
        {
            return Err(AppError::InvalidArgument(format!("unknown role '{}'", role)));
        }
        Ok(())
    }

    /// Every registered user carries `ROLE_USER`.
    pub fn with_user_role(mut self) -> Self {
        if !self.roles.iter().any(|r| r == ROLE_USER) {
            self.roles.push(ROLE_USER.to_string());
        }
        self
    }
}
