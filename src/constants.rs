// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for bindsync.

// ============================================================================
// Record Defaults
// ============================================================================

/// Default TTL for DNS records when none is supplied (seconds).
///
/// Matches the directory's own schema default.
pub const DEFAULT_RECORD_TTL_SECS: u32 = 3600;

/// Default DNS class for records when none is supplied.
pub const DEFAULT_RECORD_CLASS: &str = "IN";

/// Owner name denoting the zone apex.
pub const APEX_OWNER: &str = "@";

/// Owner name denoting a wildcard.
pub const WILDCARD_OWNER: &str = "*";
