//! Licensing - device-bound software license server
//!
//! Issues licenses against a product catalogue, binds them to devices within
//! a per-license slot budget, validates and renews them, and keeps an
//! append-only history of every change.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod id;
pub mod jwt;
pub mod licensing;
pub mod middleware;
pub mod models;
