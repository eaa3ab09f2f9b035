// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Bindsync - Declarative DNS record reconciliation for BIND9 HTTP APIs
//!
//! Bindsync keeps DNS record sets in a BIND9 REST directory converged onto
//! declared desired state. Callers describe what a record set should look
//! like; the library computes the minimal sequence of append and delete
//! calls that gets there and applies it, tolerating the races inherent to a
//! delete-by-value API.
//!
//! ## Overview
//!
//! This library provides:
//!
//! - Bidirectional translation between structured record values and flat
//!   rdata presentation text, with canonical normalization
//! - Minimal-diff reconciliation of desired versus observed record sets
//! - An HTTP client for BIND9 REST directories with retry and token refresh
//! - Glue validation for in-zone nameserver declarations
//!
//! ## Modules
//!
//! - [`codec`] - rdata encoding, decoding, and normalization per record type
//! - [`recordset`] - record identities and normalized value sets
//! - [`reconcile`] - change planning and apply
//! - [`directory`] - the directory client seam and its HTTP implementation
//! - [`glue`] - nameserver glue validation
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use bindsync::{Auth, HttpDirectoryClient, RecordIdentity, Reconciler};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = HttpDirectoryClient::new(
//!     "bind9-api.example.net:8080",
//!     Auth::ApiKey("secret".to_string()),
//!     Duration::from_secs(30),
//! )?;
//! let reconciler = Reconciler::new(client);
//!
//! let identity = RecordIdentity::parse("example.com/www/A")?;
//! let desired = vec!["10.0.1.100".to_string(), "10.0.1.101".to_string()];
//! let result = reconciler.reconcile(&identity, &desired, None, None).await?;
//! assert!(result.converged());
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod constants;
pub mod directory;
pub mod dns_errors;
pub mod glue;
pub mod reconcile;
pub mod recordset;
pub mod retry;

pub use codec::{RecordType, StructuredValue};
pub use directory::{
    Auth, DirectoryClient, DirectoryRecord, HttpDirectoryClient, PasswordTokenProvider,
    TokenProvider, Zone, ZoneCreateRequest, ZoneOptions,
};
pub use dns_errors::{DirectoryError, RecordDataError, SyncError};
pub use glue::validate_glue;
pub use reconcile::{ChangeAction, ChangePlan, ChangePlanResult, Reconciler};
pub use recordset::{RecordIdentity, RecordSet};

#[cfg(test)]
mod codec_tests;
#[cfg(test)]
mod glue_tests;
