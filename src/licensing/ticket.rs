//! Tickets: transient summaries of check, activation and renewal outcomes.
//!
//! A ticket is built per call for the response and the log, then dropped.
//! Nothing here touches storage.

use chrono::Utc;
use serde::Serialize;

use crate::error::AppError;
use crate::id::EntityType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    /// Correlation id; unique per ticket, not persisted.
    pub id: String,
    pub issued_at: i64,
    /// Owner or holder the ticket was issued for.
    pub holder_id: Option<String>,
    pub blocked: bool,
    pub expiration_date: Option<i64>,
    pub device_id: Option<String>,
    pub activation_date: Option<i64>,
    /// Remaining validity in days.
    pub ticket_lifetime: Option<i64>,
}

impl Ticket {
    pub fn create(holder_id: Option<&str>, blocked: bool, expiration_date: Option<i64>) -> Self {
        Self {
            id: EntityType::Ticket.gen_id(),
            issued_at: Utc::now().timestamp(),
            holder_id: holder_id.map(String::from),
            blocked,
            expiration_date,
            device_id: None,
            activation_date: None,
            ticket_lifetime: None,
        }
    }

    pub fn with_device(mut self, device_id: &str, activation_date: i64) -> Self {
        self.device_id = Some(device_id.to_string());
        self.activation_date = Some(activation_date);
        self
    }

    pub fn with_lifetime(mut self, days: i64) -> Self {
        self.ticket_lifetime = Some(days);
        self
    }

    /// Log a ticket that confirms a completed operation.
    pub fn log_issued(&self, operation: &'static str) {
        tracing::info!(
            operation,
            ticket_id = %self.id,
            holder_id = self.holder_id.as_deref().unwrap_or("-"),
            blocked = self.blocked,
            expiration_date = ?self.expiration_date,
            device_id = self.device_id.as_deref().unwrap_or("-"),
            "ticket issued"
        );
    }

    /// Log a ticket recording a refused operation, then hand the error back.
    pub fn refuse(self, operation: &'static str, err: AppError) -> AppError {
        if err.is_rejection() {
            tracing::warn!(
                operation,
                ticket_id = %self.id,
                holder_id = self.holder_id.as_deref().unwrap_or("-"),
                blocked = self.blocked,
                reason = err.kind(),
                "refused: {}",
                err
            );
        } else {
            tracing::error!(
                operation,
                ticket_id = %self.id,
                holder_id = self.holder_id.as_deref().unwrap_or("-"),
                "failed: {}",
                err
            );
        }
        err
    }
}
