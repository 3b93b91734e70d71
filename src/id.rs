//! Prefixed ID generation for licensing entities.
//!
//! Format: `{entity}_{uuid_simple}` (32 hex chars, no hyphens), e.g.
//! `lic_9f0c3a...`. The prefix makes IDs self-describing in logs and
//! lets handlers reject garbage before touching the database.

use uuid::Uuid;

/// Entity types that carry prefixed IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    User,
    Product,
    LicenseType,
    License,
    Device,
    DeviceLicense,
    LicenseHistory,
    Ticket,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::User => "usr",
            Self::Product => "prod",
            Self::LicenseType => "ltyp",
            Self::License => "lic",
            Self::Device => "dev",
            Self::DeviceLicense => "bind",
            Self::LicenseHistory => "hist",
            Self::Ticket => "tkt",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }

    /// Checks that `s` is `{prefix}_{32 hex chars}` for this entity type.
    pub fn is_valid_id(&self, s: &str) -> bool {
        s.strip_prefix(self.prefix())
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|hex| hex.len() == 32 && hex.chars().all(|c| c.is_ascii_hexdigit()))
    }
}
