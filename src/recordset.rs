// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record identities and record sets.
//!
//! A record identity is the `(zone, owner, type)` tuple that keys one
//! multi-valued resource record set; a [`RecordSet`] is the duplicate-free
//! collection of canonical rdata values for one identity, with the TTL and
//! class that apply uniformly to the whole set. Desired and observed sets
//! are built fresh for every reconciliation pass and discarded afterwards;
//! nothing here is persisted.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::codec::{self, RecordType};
use crate::constants::{APEX_OWNER, WILDCARD_OWNER};
use crate::dns_errors::{RecordDataError, SyncError};

/// Normalize a DNS name for identity comparison.
///
/// Strips the trailing dot and lowercases ASCII, per DNS convention. The
/// apex (`@`) and wildcard (`*`) owner markers pass through unchanged.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed == APEX_OWNER || trimmed == WILDCARD_OWNER {
        return trimmed.to_string();
    }
    trimmed.trim_end_matches('.').to_ascii_lowercase()
}

/// The natural key of a record set: zone, owner name, and record type.
///
/// All rdata values sharing an identity are one multi-valued resource record
/// set (e.g. round-robin A records). The record type is part of the
/// identity; changing it means a different record, never an in-place
/// mutation. Zone and owner are stored normalized (no trailing dot,
/// ASCII-lowercased) so equality matches DNS behavior.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordIdentity {
    /// Zone name, normalized (e.g. `example.com`)
    pub zone: String,
    /// Owner name within the zone: a label, `@` for the apex, `*` for a wildcard
    pub owner: String,
    /// Record type
    pub rtype: RecordType,
}

impl RecordIdentity {
    /// Create an identity, normalizing the zone and owner names.
    #[must_use]
    pub fn new(zone: &str, owner: &str, rtype: RecordType) -> Self {
        Self {
            zone: normalize_name(zone),
            owner: normalize_name(owner),
            rtype,
        }
    }

    /// Parse an external identifier of the form `zone/owner/type`.
    ///
    /// Exactly three `/`-delimited segments are required, e.g.
    /// `example.com/www/A`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidIdentifier`] on a wrong segment count or
    /// an unsupported record type.
    pub fn parse(id: &str) -> Result<Self, SyncError> {
        let parts: Vec<&str> = id.split('/').collect();
        if parts.len() != 3 {
            return Err(SyncError::InvalidIdentifier {
                id: id.to_string(),
                reason: format!(
                    "expected zone/owner/type (3 segments), got {} segment(s)",
                    parts.len()
                ),
            });
        }
        if parts[0].is_empty() || parts[1].is_empty() {
            return Err(SyncError::InvalidIdentifier {
                id: id.to_string(),
                reason: "zone and owner segments must be non-empty".to_string(),
            });
        }
        let rtype = RecordType::from_str(parts[2]).map_err(|e| SyncError::InvalidIdentifier {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(parts[0], parts[1], rtype))
    }

    /// The fully qualified owner name (`owner.zone`, or the zone for `@`).
    #[must_use]
    pub fn fqdn(&self) -> String {
        if self.owner == APEX_OWNER {
            self.zone.clone()
        } else {
            format!("{}.{}", self.owner, self.zone)
        }
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zone, self.owner, self.rtype)
    }
}

/// An unordered, duplicate-free collection of canonical rdata values for one
/// identity, with the set-wide TTL and class.
///
/// Values are normalized through the codec on construction, which both
/// canonicalizes separators/quoting and rejects malformed rdata before any
/// directory call is made. The directory does not support per-value TTLs
/// within one identity, so the TTL applies to the whole set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    /// The identity all values share
    pub identity: RecordIdentity,
    /// TTL in seconds, uniform across the set
    pub ttl: u32,
    /// DNS class (IN, CH, HS), uniform across the set
    pub class: String,
    values: BTreeSet<String>,
}

impl RecordSet {
    /// Build a record set from raw rdata strings, normalizing each value.
    ///
    /// Duplicates after normalization collapse to a single value.
    ///
    /// # Errors
    ///
    /// Returns the codec error for the first value that fails to normalize.
    pub fn new<S: AsRef<str>>(
        identity: RecordIdentity,
        ttl: u32,
        class: &str,
        raw_values: &[S],
    ) -> Result<Self, RecordDataError> {
        let mut values = BTreeSet::new();
        for raw in raw_values {
            values.insert(codec::normalize(identity.rtype, raw.as_ref())?);
        }
        Ok(Self {
            identity,
            ttl,
            class: class.to_string(),
            values,
        })
    }

    /// The normalized values, in lexical order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Whether the set contains a normalized value.
    #[must_use]
    pub fn contains(&self, normalized: &str) -> bool {
        self.values.contains(normalized)
    }

    /// Values present in `self` but not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Vec<String> {
        self.values.difference(&other.values).cloned().collect()
    }

    /// Values present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Vec<String> {
        self.values.intersection(&other.values).cloned().collect()
    }

    /// Number of distinct values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
