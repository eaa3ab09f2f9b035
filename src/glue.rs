// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Glue validation for zone nameserver declarations.
//!
//! A nameserver whose hostname lives inside the zone it serves needs a glue
//! address, or resolution of the zone dead-ends on itself. This check runs
//! before a zone create or update reaches the directory, so the misconfig
//! is reported up front instead of surfacing later as a resolution failure.

use std::collections::HashMap;

use tracing::debug;

use crate::dns_errors::SyncError;
use crate::recordset::normalize_name;

/// Check that every in-zone nameserver has a glue address.
///
/// A nameserver is in-zone when its hostname equals the zone name or falls
/// under it. Out-of-zone nameservers need no glue and are skipped. Glue keys
/// match either the nameserver's full hostname or its label relative to the
/// zone (`ns1.example.com.` and `ns1` both satisfy `ns1.example.com` in zone
/// `example.com`).
///
/// All offending nameservers are collected before reporting, so one pass
/// surfaces every missing address.
///
/// # Errors
///
/// Returns [`SyncError::MissingGlueRecord`] listing each in-zone nameserver
/// without a glue address, as declared.
pub fn validate_glue(
    zone: &str,
    nameservers: &[String],
    glue: &HashMap<String, String>,
) -> Result<(), SyncError> {
    let zone_norm = normalize_name(zone);
    let suffix = format!(".{zone_norm}");

    let mut glue_keys: Vec<String> = Vec::with_capacity(glue.len());
    for key in glue.keys() {
        glue_keys.push(normalize_name(key));
    }

    let mut missing = Vec::new();
    for ns in nameservers {
        let ns_norm = normalize_name(ns);

        let in_zone = ns_norm == zone_norm || ns_norm.ends_with(&suffix);
        if !in_zone {
            debug!(zone = %zone_norm, nameserver = %ns_norm, "Out-of-zone nameserver, no glue needed");
            continue;
        }

        // Accept the glue keyed by full hostname or by label relative to
        // the zone.
        let relative = ns_norm
            .strip_suffix(&suffix)
            .unwrap_or(ns_norm.as_str())
            .to_string();
        let covered = glue_keys
            .iter()
            .any(|key| *key == ns_norm || *key == relative);

        if !covered {
            missing.push(ns.clone());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SyncError::MissingGlueRecord {
            zone: zone_norm,
            nameservers: missing,
        })
    }
}
