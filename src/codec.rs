// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record codec: canonical rdata text and its type-specific decomposition.
//!
//! DNS rdata is stored and compared by this crate as flat presentation text
//! (e.g. `"10 mail.example.com."`). Each record type has its own positional
//! field grammar, with quoted-string fields for types that may contain
//! embedded spaces (TXT, CAA, NAPTR). This module provides:
//!
//! - [`decode`]: split a raw rdata string into a [`StructuredValue`] per the
//!   type's grammar
//! - [`StructuredValue::to_rdata`]: the inverse, producing canonical text
//! - [`normalize`]: idempotent canonicalization (consistent separators and
//!   quoting), the basis for set equality during reconciliation
//!
//! The codec validates syntax only: arity, integer fields, hex fields, and
//! quote balance. Names are preserved byte-for-byte; in particular a missing
//! trailing dot on an FQDN field is *not* auto-qualified here.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::dns_errors::RecordDataError;

/// Supported DNS record types.
///
/// The set mirrors what the directory accepts. Parsing is case-insensitive;
/// unknown strings are rejected with
/// [`RecordDataError::UnsupportedRecordType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Dname,
    Ns,
    Ptr,
    Mx,
    Txt,
    Srv,
    Caa,
    Naptr,
    Sshfp,
    Tlsa,
    Loc,
    Hinfo,
    Rp,
    Uri,
    Https,
    Svcb,
}

impl RecordType {
    /// All supported record types, in no particular order.
    pub const ALL: [Self; 19] = [
        Self::A,
        Self::Aaaa,
        Self::Cname,
        Self::Dname,
        Self::Ns,
        Self::Ptr,
        Self::Mx,
        Self::Txt,
        Self::Srv,
        Self::Caa,
        Self::Naptr,
        Self::Sshfp,
        Self::Tlsa,
        Self::Loc,
        Self::Hinfo,
        Self::Rp,
        Self::Uri,
        Self::Https,
        Self::Svcb,
    ];

    /// The type's presentation name (e.g. `"AAAA"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Dname => "DNAME",
            Self::Ns => "NS",
            Self::Ptr => "PTR",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Srv => "SRV",
            Self::Caa => "CAA",
            Self::Naptr => "NAPTR",
            Self::Sshfp => "SSHFP",
            Self::Tlsa => "TLSA",
            Self::Loc => "LOC",
            Self::Hinfo => "HINFO",
            Self::Rp => "RP",
            Self::Uri => "URI",
            Self::Https => "HTTPS",
            Self::Svcb => "SVCB",
        }
    }

    /// Whether this type excludes all other data at the same owner name.
    ///
    /// For exclusive types the reconciliation engine emits removals before
    /// additions, avoiding a transient state where the owner carries both
    /// the old and the new data.
    #[must_use]
    pub fn is_exclusive_at_owner(self) -> bool {
        matches!(self, Self::Cname)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = RecordDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "AAAA" => Ok(Self::Aaaa),
            "CNAME" => Ok(Self::Cname),
            "DNAME" => Ok(Self::Dname),
            "NS" => Ok(Self::Ns),
            "PTR" => Ok(Self::Ptr),
            "MX" => Ok(Self::Mx),
            "TXT" => Ok(Self::Txt),
            "SRV" => Ok(Self::Srv),
            "CAA" => Ok(Self::Caa),
            "NAPTR" => Ok(Self::Naptr),
            "SSHFP" => Ok(Self::Sshfp),
            "TLSA" => Ok(Self::Tlsa),
            "LOC" => Ok(Self::Loc),
            "HINFO" => Ok(Self::Hinfo),
            "RP" => Ok(Self::Rp),
            "URI" => Ok(Self::Uri),
            "HTTPS" => Ok(Self::Https),
            "SVCB" => Ok(Self::Svcb),
            _ => Err(RecordDataError::UnsupportedRecordType {
                value: s.to_string(),
            }),
        }
    }
}

/// Type-specific decomposition of an rdata string.
///
/// A derived, read-only view: the raw rdata text is the source of truth, and
/// a `StructuredValue` is never mutated in place. Types without a useful
/// decomposition (LOC, HINFO, RP, URI, HTTPS, SVCB) carry their fields as an
/// opaque token list validated only for quote balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredValue {
    /// A or AAAA address
    Address { address: String },
    /// CNAME, DNAME, NS, or PTR target
    Target { target: String },
    /// MX preference and exchange
    Mx { preference: u16, exchange: String },
    /// TXT text, quotes stripped
    Txt { text: String },
    /// SRV priority, weight, port, and target
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    /// CAA flags, tag, and value (value quotes stripped)
    Caa { flags: u8, tag: String, value: String },
    /// SSHFP algorithm, fingerprint type, and hex fingerprint
    Sshfp {
        algorithm: u8,
        fingerprint_type: u8,
        fingerprint: String,
    },
    /// TLSA usage, selector, matching type, and hex certificate data
    Tlsa {
        usage: u8,
        selector: u8,
        matching_type: u8,
        certificate_data: String,
    },
    /// NAPTR order, preference, quoted flags/services/regexp, replacement
    Naptr {
        order: u16,
        preference: u16,
        flags: String,
        services: String,
        regexp: String,
        replacement: String,
    },
    /// Opaque positional fields for types decoded only to token level
    Opaque { fields: Vec<String> },
}

impl StructuredValue {
    /// Encode back to canonical rdata text.
    ///
    /// Single-space separators; always-quoted fields (TXT text, CAA value,
    /// NAPTR flags/services/regexp) are re-quoted, opaque fields only when
    /// their content requires it. `decode(t, f.to_rdata()) == f` holds for
    /// any value legally constructed for type `t`.
    #[must_use]
    pub fn to_rdata(&self) -> String {
        match self {
            Self::Address { address } => address.clone(),
            Self::Target { target } => target.clone(),
            Self::Mx {
                preference,
                exchange,
            } => format!("{preference} {exchange}"),
            Self::Txt { text } => quote(text),
            Self::Srv {
                priority,
                weight,
                port,
                target,
            } => format!("{priority} {weight} {port} {target}"),
            Self::Caa { flags, tag, value } => format!("{flags} {tag} {}", quote(value)),
            Self::Sshfp {
                algorithm,
                fingerprint_type,
                fingerprint,
            } => format!("{algorithm} {fingerprint_type} {fingerprint}"),
            Self::Tlsa {
                usage,
                selector,
                matching_type,
                certificate_data,
            } => format!("{usage} {selector} {matching_type} {certificate_data}"),
            Self::Naptr {
                order,
                preference,
                flags,
                services,
                regexp,
                replacement,
            } => format!(
                "{order} {preference} {} {} {} {replacement}",
                quote(flags),
                quote(services),
                quote(regexp)
            ),
            Self::Opaque { fields } => fields
                .iter()
                .map(|f| quote_if_needed(f))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// A single rdata token produced by the quote-aware tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    quoted: bool,
}

/// Split an rdata string into whitespace-separated tokens, honoring quotes.
///
/// Inside a quoted token, `\"` and `\\` are unescaped; any other character
/// is taken verbatim. An unterminated quote is malformed.
fn tokenize(rtype: RecordType, raw: &str) -> Result<Vec<Token>, RecordDataError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut started = false;
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '\\' => match chars.next() {
                    Some(e @ ('"' | '\\')) => current.push(e),
                    Some(e) => {
                        current.push('\\');
                        current.push(e);
                    }
                    None => {
                        return Err(RecordDataError::MalformedRecordData {
                            rtype,
                            raw: raw.to_string(),
                            reason: "trailing backslash in quoted string".to_string(),
                        })
                    }
                },
                '"' => in_quotes = false,
                _ => current.push(c),
            }
        } else {
            match c {
                '"' => {
                    in_quotes = true;
                    started = true;
                    quoted = true;
                }
                c if c.is_whitespace() => {
                    if started {
                        tokens.push(Token {
                            text: std::mem::take(&mut current),
                            quoted,
                        });
                        started = false;
                        quoted = false;
                    }
                }
                _ => {
                    started = true;
                    current.push(c);
                }
            }
        }
    }

    if in_quotes {
        return Err(RecordDataError::MalformedRecordData {
            rtype,
            raw: raw.to_string(),
            reason: "unterminated quoted string".to_string(),
        });
    }
    if started {
        tokens.push(Token {
            text: current,
            quoted,
        });
    }

    Ok(tokens)
}

/// Wrap a field in quotes, escaping embedded quotes and backslashes.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Quote a field only if its content requires it.
fn quote_if_needed(s: &str) -> String {
    if s.is_empty() || s.contains(char::is_whitespace) || s.contains('"') || s.contains('\\') {
        quote(s)
    } else {
        s.to_string()
    }
}

/// Strip one pair of surrounding quotes and unescape, if present.
fn unquote(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1]
            .replace("\\\"", "\"")
            .replace("\\\\", "\\")
    } else {
        s.to_string()
    }
}

/// Decode a raw rdata string into its type-specific structured form.
///
/// # Errors
///
/// Returns [`RecordDataError::EmptyRecordData`] for an empty string and
/// [`RecordDataError::MalformedRecordData`] when the field count does not
/// match the type's arity, a numeric field does not parse, a hex field is
/// not hex, or quoting is unbalanced.
pub fn decode(rtype: RecordType, raw: &str) -> Result<StructuredValue, RecordDataError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RecordDataError::EmptyRecordData { rtype });
    }

    // TXT passes through as a single opaque string; segment splitting for
    // >255-byte strings is the directory's concern.
    if rtype == RecordType::Txt {
        return Ok(StructuredValue::Txt {
            text: unquote(trimmed),
        });
    }

    let tokens = tokenize(rtype, trimmed)?;

    let malformed = |reason: String| RecordDataError::MalformedRecordData {
        rtype,
        raw: raw.to_string(),
        reason,
    };
    let arity = |expected: usize| -> Result<(), RecordDataError> {
        if tokens.len() == expected {
            Ok(())
        } else {
            Err(malformed(format!(
                "expected {expected} field(s), got {}",
                tokens.len()
            )))
        }
    };
    let int_u16 = |tok: &Token, field: &str| -> Result<u16, RecordDataError> {
        tok.text
            .parse::<u16>()
            .map_err(|_| malformed(format!("{field} '{}' is not an integer in 0..=65535", tok.text)))
    };
    let int_u8 = |tok: &Token, field: &str| -> Result<u8, RecordDataError> {
        tok.text
            .parse::<u8>()
            .map_err(|_| malformed(format!("{field} '{}' is not an integer in 0..=255", tok.text)))
    };
    let hex = |tok: &Token, field: &str| -> Result<String, RecordDataError> {
        if !tok.text.is_empty() && tok.text.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(tok.text.clone())
        } else {
            Err(malformed(format!("{field} '{}' is not hexadecimal", tok.text)))
        }
    };

    match rtype {
        RecordType::A | RecordType::Aaaa => {
            arity(1)?;
            Ok(StructuredValue::Address {
                address: tokens[0].text.clone(),
            })
        }
        RecordType::Cname | RecordType::Dname | RecordType::Ns | RecordType::Ptr => {
            arity(1)?;
            Ok(StructuredValue::Target {
                target: tokens[0].text.clone(),
            })
        }
        RecordType::Mx => {
            arity(2)?;
            Ok(StructuredValue::Mx {
                preference: int_u16(&tokens[0], "preference")?,
                exchange: tokens[1].text.clone(),
            })
        }
        RecordType::Srv => {
            arity(4)?;
            Ok(StructuredValue::Srv {
                priority: int_u16(&tokens[0], "priority")?,
                weight: int_u16(&tokens[1], "weight")?,
                port: int_u16(&tokens[2], "port")?,
                target: tokens[3].text.clone(),
            })
        }
        RecordType::Caa => {
            arity(3)?;
            Ok(StructuredValue::Caa {
                flags: int_u8(&tokens[0], "flags")?,
                tag: tokens[1].text.clone(),
                value: tokens[2].text.clone(),
            })
        }
        RecordType::Sshfp => {
            arity(3)?;
            Ok(StructuredValue::Sshfp {
                algorithm: int_u8(&tokens[0], "algorithm")?,
                fingerprint_type: int_u8(&tokens[1], "fingerprint type")?,
                fingerprint: hex(&tokens[2], "fingerprint")?,
            })
        }
        RecordType::Tlsa => {
            arity(4)?;
            Ok(StructuredValue::Tlsa {
                usage: int_u8(&tokens[0], "usage")?,
                selector: int_u8(&tokens[1], "selector")?,
                matching_type: int_u8(&tokens[2], "matching type")?,
                certificate_data: hex(&tokens[3], "certificate data")?,
            })
        }
        RecordType::Naptr => {
            arity(6)?;
            Ok(StructuredValue::Naptr {
                order: int_u16(&tokens[0], "order")?,
                preference: int_u16(&tokens[1], "preference")?,
                flags: tokens[2].text.clone(),
                services: tokens[3].text.clone(),
                regexp: tokens[4].text.clone(),
                replacement: tokens[5].text.clone(),
            })
        }
        RecordType::Loc
        | RecordType::Hinfo
        | RecordType::Rp
        | RecordType::Uri
        | RecordType::Https
        | RecordType::Svcb => Ok(StructuredValue::Opaque {
            fields: tokens.into_iter().map(|t| t.text).collect(),
        }),
        // TXT handled above
        RecordType::Txt => unreachable!("TXT decoded before tokenizing"),
    }
}

/// Canonicalize a raw rdata string: decode then re-encode.
///
/// Idempotent; two semantically-equal inputs (modulo separators and quoting)
/// produce byte-identical output, which is what makes reconciliation's set
/// equality correct. Name case and trailing dots are preserved.
///
/// # Errors
///
/// Same conditions as [`decode`].
pub fn normalize(rtype: RecordType, raw: &str) -> Result<String, RecordDataError> {
    Ok(decode(rtype, raw)?.to_rdata())
}

/// Build the per-type `data` field map for a directory create request.
///
/// The directory's create call takes decomposed fields keyed by name
/// (`address`, `target`, `nameserver`, `preference`/`exchange`, ...), with
/// numeric fields sent as strings. Types without a decomposition, and rdata
/// that fails to decode, fall back to a single `rdata` key and let the
/// directory do its own validation.
#[must_use]
pub fn record_data_map(rtype: RecordType, rdata: &str) -> Map<String, Value> {
    let mut data = Map::new();
    let fallback = |mut data: Map<String, Value>| {
        data.insert("rdata".to_string(), Value::String(rdata.to_string()));
        data
    };

    let Ok(value) = decode(rtype, rdata) else {
        return fallback(data);
    };

    match (rtype, value) {
        (RecordType::A | RecordType::Aaaa, StructuredValue::Address { address }) => {
            data.insert("address".to_string(), Value::String(address));
        }
        (RecordType::Cname | RecordType::Dname, StructuredValue::Target { target }) => {
            data.insert("target".to_string(), Value::String(target));
        }
        (RecordType::Ns, StructuredValue::Target { target }) => {
            data.insert("nameserver".to_string(), Value::String(target));
        }
        (RecordType::Ptr, StructuredValue::Target { target }) => {
            data.insert("ptrdname".to_string(), Value::String(target));
        }
        (
            RecordType::Mx,
            StructuredValue::Mx {
                preference,
                exchange,
            },
        ) => {
            data.insert(
                "preference".to_string(),
                Value::String(preference.to_string()),
            );
            data.insert("exchange".to_string(), Value::String(exchange));
        }
        (RecordType::Txt, StructuredValue::Txt { text }) => {
            data.insert("text".to_string(), Value::String(text));
        }
        (
            RecordType::Srv,
            StructuredValue::Srv {
                priority,
                weight,
                port,
                target,
            },
        ) => {
            data.insert("priority".to_string(), Value::String(priority.to_string()));
            data.insert("weight".to_string(), Value::String(weight.to_string()));
            data.insert("port".to_string(), Value::String(port.to_string()));
            data.insert("target".to_string(), Value::String(target));
        }
        (RecordType::Caa, StructuredValue::Caa { flags, tag, value }) => {
            data.insert("flags".to_string(), Value::String(flags.to_string()));
            data.insert("tag".to_string(), Value::String(tag));
            data.insert("value".to_string(), Value::String(value));
        }
        _ => return fallback(data),
    }

    data
}
