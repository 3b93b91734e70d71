use std::collections::BTreeSet;

use super::ROLE_ADMIN;

/// Identity and roles resolved from a request credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// The caller's email.
    pub identity: String,
    pub roles: BTreeSet<String>,
}

impl Caller {
    pub fn new<I, S>(identity: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identity: identity.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// A credential that carried no roles does not count as authenticated.
    pub fn is_authenticated(&self) -> bool {
        !self.roles.is_empty()
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(ROLE_ADMIN)
    }
}
