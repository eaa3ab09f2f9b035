// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for record encoding and reconciliation.
//!
//! This module provides specialized error types for:
//! - Rdata parsing and canonicalization failures
//! - Directory (BIND9 HTTP API) operation outcomes
//! - Pre-flight zone validation (glue records, identifiers)
//!
//! These errors provide structured error handling for sync operations,
//! enabling callers to distinguish transient failures (worth retrying)
//! from permanent ones.

use thiserror::Error;

use crate::codec::RecordType;

/// Errors produced by the record codec when parsing or canonicalizing rdata.
///
/// These are always fatal: malformed rdata is a configuration problem, not
/// something a retry can fix. The offending type and raw string are carried
/// so they can be surfaced verbatim to the operator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordDataError {
    /// Rdata string was empty after trimming.
    ///
    /// An empty rdata value is invalid for every record type.
    #[error("Empty rdata for {rtype} record")]
    EmptyRecordData {
        /// The record type the empty value was declared for
        rtype: RecordType,
    },

    /// Rdata string did not match the type's field grammar.
    ///
    /// Returned when the field count does not match the type's expected
    /// arity, a numeric field does not parse as an integer, a hex field
    /// contains non-hex characters, or a quoted string is unterminated.
    #[error("Malformed {rtype} rdata '{raw}': {reason}")]
    MalformedRecordData {
        /// The record type being decoded
        rtype: RecordType,
        /// The raw rdata string as supplied
        raw: String,
        /// Explanation of what is malformed
        reason: String,
    },

    /// Record type string is not one of the supported types.
    ///
    /// The set of supported types mirrors what the directory accepts;
    /// anything else is rejected up front rather than passed through.
    #[error("Unsupported record type '{value}'")]
    UnsupportedRecordType {
        /// The type string as supplied
        value: String,
    },
}

/// Outcomes of directory (BIND9 HTTP API) operations.
///
/// `NotFound` and `Conflict` are ordinary conditions during reconciliation:
/// a Remove for an already-absent value or an Add for an already-present one
/// completes as a no-op success. `Transient` failures are retryable by the
/// caller; everything else is fatal for the current pass.
#[derive(Error, Debug, Clone)]
pub enum DirectoryError {
    /// The record or zone does not exist on the directory (HTTP 404).
    #[error("Not found on endpoint {endpoint} (HTTP 404)")]
    NotFound {
        /// The directory endpoint that returned the error
        endpoint: String,
    },

    /// The record already exists on the directory (HTTP 409).
    #[error("Already exists on endpoint {endpoint}")]
    Conflict {
        /// The directory endpoint that returned the error
        endpoint: String,
    },

    /// Network failure, timeout, or 5xx-class server error.
    ///
    /// The operation may succeed if retried. The engine never retries;
    /// the HTTP adapter retries internally with backoff and reports
    /// `Transient` only once its budget is exhausted.
    #[error("Transient directory failure on endpoint {endpoint}: {reason}")]
    Transient {
        /// The directory endpoint that failed
        endpoint: String,
        /// Reason for the failure (connection error, timeout, status)
        reason: String,
    },

    /// The directory rejected the request with a non-retryable status.
    ///
    /// Covers validation failures, quota errors, and authentication
    /// failures that survived a token refresh.
    #[error("Directory request to {endpoint} rejected (HTTP {status}): {reason}")]
    Rejected {
        /// The directory endpoint that rejected the request
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body or error message
        reason: String,
    },

    /// The directory returned a success status with an unparseable body.
    #[error("Invalid response from endpoint {endpoint}: {reason}")]
    InvalidResponse {
        /// The directory endpoint that responded
        endpoint: String,
        /// Explanation of the parse failure
        reason: String,
    },
}

impl DirectoryError {
    /// Returns true if this error is transient and the operation should be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Composite error type for the reconciliation surface.
///
/// This is the primary error type returned by [`crate::reconcile::Reconciler`]
/// and the pre-flight validators. Apply-phase partial failures are *not*
/// reported through this type; they are carried in
/// [`crate::reconcile::ChangePlanResult`] alongside the completed prefix.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// Rdata parse or canonicalization failure
    #[error(transparent)]
    RecordData(#[from] RecordDataError),

    /// Directory operation failure outside the tolerated apply conditions
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A declared in-zone nameserver has no glue address supplied.
    ///
    /// Blocks reconciliation entirely for the affected zone: an in-zone
    /// nameserver without glue cannot be resolved by delegation.
    #[error("Zone '{zone}' declares in-zone nameservers without glue addresses: {nameservers:?}")]
    MissingGlueRecord {
        /// The zone being configured
        zone: String,
        /// Every declared nameserver missing a glue address
        nameservers: Vec<String>,
    },

    /// An external record identifier did not parse as `zone/owner/type`.
    #[error("Invalid record identifier '{id}': {reason}")]
    InvalidIdentifier {
        /// The identifier string as supplied
        id: String,
        /// Explanation of what is invalid
        reason: String,
    },
}

impl SyncError {
    /// Returns true if this error is transient and the operation should be retried.
    ///
    /// Only directory-side transient failures qualify. Codec, glue, and
    /// identifier errors are configuration problems and never retryable.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Directory(e) => e.is_transient(),
            Self::RecordData(_)
            | Self::MissingGlueRecord { .. }
            | Self::InvalidIdentifier { .. } => false,
        }
    }

    /// Returns a short status reason code for this error.
    ///
    /// Suitable for status conditions and structured log fields.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::RecordData(RecordDataError::EmptyRecordData { .. }) => "EmptyRecordData",
            Self::RecordData(RecordDataError::MalformedRecordData { .. }) => "MalformedRecordData",
            Self::RecordData(RecordDataError::UnsupportedRecordType { .. }) => {
                "UnsupportedRecordType"
            }
            Self::Directory(DirectoryError::NotFound { .. }) => "RecordNotFound",
            Self::Directory(DirectoryError::Conflict { .. }) => "RecordConflict",
            Self::Directory(DirectoryError::Transient { .. }) => "DirectoryUnavailable",
            Self::Directory(DirectoryError::Rejected { .. }) => "DirectoryRejected",
            Self::Directory(DirectoryError::InvalidResponse { .. }) => "InvalidDirectoryResponse",
            Self::MissingGlueRecord { .. } => "MissingGlueRecord",
            Self::InvalidIdentifier { .. } => "InvalidIdentifier",
        }
    }
}
