// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Directory client adapter for the BIND9 HTTP API.
//!
//! The reconciliation engine talks to the record store through the
//! [`DirectoryClient`] trait: one change action becomes exactly one remote
//! call, and outcomes are reported through the
//! [`DirectoryError`] taxonomy so the engine can
//! distinguish tolerated conditions (not found, conflict) from failures.
//!
//! [`HttpDirectoryClient`] is the production implementation. Transport
//! concerns live entirely here: request timeouts, transient-error retry with
//! exponential backoff, and credential refresh on 401. The engine itself
//! never retries.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::codec::record_data_map;
use crate::dns_errors::DirectoryError;
use crate::recordset::RecordIdentity;
use crate::retry::{http_backoff, is_retryable_http_status};

// ============================================================================
// Wire types
// ============================================================================

/// A DNS record as the directory reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Owner name (e.g. `www`, `@`)
    pub name: String,
    /// Record type (e.g. `A`, `MX`)
    #[serde(rename = "type")]
    pub rtype: String,
    /// TTL in seconds
    pub ttl: u32,
    /// DNS class, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Rdata presentation text
    pub rdata: String,
    /// Zone the record belongs to, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

/// Request body for creating a record.
#[derive(Debug, Clone, Serialize)]
pub struct RecordCreateRequest {
    /// Record type (e.g. `A`, `MX`)
    pub record_type: String,
    /// Owner name
    pub name: String,
    /// TTL in seconds
    pub ttl: u32,
    /// DNS class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_class: Option<String>,
    /// Decomposed rdata fields, keyed per type
    pub data: Map<String, Value>,
}

/// Zone configuration options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneOptions {
    /// Hosts allowed to transfer the zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_transfer: Option<Vec<String>>,
    /// Hosts allowed to send dynamic updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_update: Option<Vec<String>>,
    /// Hosts allowed to query the zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_query: Option<Vec<String>>,
    /// Whether to notify secondaries on change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<bool>,
}

/// A DNS zone as the directory reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    /// Zone name
    pub name: String,
    /// Zone type (primary, secondary)
    pub zone_type: String,
    /// Zone file path on the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// SOA serial
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<i64>,
    /// Whether the zone is loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded: Option<bool>,
    /// Whether DNSSEC is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnssec_enabled: Option<bool>,
    /// Number of records in the zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<i64>,
    /// Zone options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ZoneOptions>,
}

/// Request body for creating a zone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ZoneCreateRequest {
    /// Zone name
    pub name: String,
    /// Zone type (primary, secondary)
    pub zone_type: String,
    /// Zone file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// SOA primary nameserver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa_mname: Option<String>,
    /// SOA responsible mailbox
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa_rname: Option<String>,
    /// SOA refresh interval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa_refresh: Option<u32>,
    /// SOA retry interval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa_retry: Option<u32>,
    /// SOA expire interval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa_expire: Option<u32>,
    /// SOA minimum / negative TTL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa_minimum: Option<u32>,
    /// Default TTL for the zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ttl: Option<u32>,
    /// Authoritative nameservers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameservers: Option<Vec<String>>,
    /// Glue map: nameserver hostname to IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns_addresses: Option<HashMap<String, String>>,
    /// Zone options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ZoneOptions>,
}

// ============================================================================
// Credentials
// ============================================================================

/// A refreshable bearer-token source.
///
/// Abstracts the directory's token exchange so the client can refresh and
/// replay a request when the directory answers 401.
#[async_trait]
pub trait TokenProvider: Send + Sync + fmt::Debug {
    /// The current token, fetching one if none is cached.
    async fn current(&self) -> Result<String, DirectoryError>;

    /// Force a fresh token, replacing any cached one.
    async fn refresh(&self) -> Result<String, DirectoryError>;
}

/// How the client authenticates to the directory.
#[derive(Debug, Clone)]
pub enum Auth {
    /// No authentication
    None,
    /// Static API key sent as `X-API-Key`
    ApiKey(String),
    /// Bearer token from a refreshable provider
    Token(Arc<dyn TokenProvider>),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Token provider that exchanges a username and password for a JWT via the
/// directory's `/api/v1/auth/token` endpoint, caching the result until a
/// refresh is forced.
pub struct PasswordTokenProvider {
    token_url: String,
    username: String,
    password: String,
    http: HttpClient,
    cached: RwLock<Option<String>>,
}

// Manual impl so the password never reaches a log line.
impl fmt::Debug for PasswordTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordTokenProvider")
            .field("token_url", &self.token_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl PasswordTokenProvider {
    /// Create a provider for the given directory endpoint.
    #[must_use]
    pub fn new(endpoint: &str, username: &str, password: &str) -> Self {
        let base = build_api_url(endpoint);
        Self {
            token_url: format!("{base}/api/v1/auth/token"),
            username: username.to_string(),
            password: password.to_string(),
            http: HttpClient::new(),
            cached: RwLock::new(None),
        }
    }
}

#[async_trait]
impl TokenProvider for PasswordTokenProvider {
    async fn current(&self) -> Result<String, DirectoryError> {
        if let Some(token) = self.cached.read().await.clone() {
            return Ok(token);
        }
        self.refresh().await
    }

    async fn refresh(&self) -> Result<String, DirectoryError> {
        let params = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| transport_error(&self.token_url, &e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(DirectoryError::Rejected {
                endpoint: self.token_url.clone(),
                status: status.as_u16(),
                reason: format!("authentication failed: {body}"),
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| DirectoryError::InvalidResponse {
                endpoint: self.token_url.clone(),
                reason: format!("token response: {e}"),
            })?;

        let mut cached = self.cached.write().await;
        *cached = Some(parsed.access_token.clone());
        debug!(endpoint = %self.token_url, "Obtained directory access token");

        Ok(parsed.access_token)
    }
}

// ============================================================================
// Client trait
// ============================================================================

/// The record-store seam the reconciliation engine depends on.
///
/// One change action maps to exactly one call here. Implementations report
/// outcomes through [`DirectoryError`] so the engine can apply its
/// idempotence rules (`NotFound` on remove and `Conflict` on add are no-op
/// successes).
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// List the observed rdata values for one record identity.
    ///
    /// An empty list means the directory reports no matching records; the
    /// policy for trusting that (versus a journal the read path cannot see)
    /// belongs to the caller.
    async fn list_records(
        &self,
        identity: &RecordIdentity,
    ) -> Result<Vec<DirectoryRecord>, DirectoryError>;

    /// Create one rdata value for the identity.
    async fn create_record(
        &self,
        identity: &RecordIdentity,
        rdata: &str,
        ttl: u32,
        class: &str,
    ) -> Result<(), DirectoryError>;

    /// Delete one rdata value for the identity.
    async fn delete_record(
        &self,
        identity: &RecordIdentity,
        rdata: &str,
    ) -> Result<(), DirectoryError>;

    /// Refresh set-wide metadata (TTL/class) for surviving values.
    ///
    /// The default implementation falls back to delete-then-create per
    /// value, tolerating `NotFound`/`Conflict` along the way; directories
    /// with a cheaper metadata call can override it.
    async fn refresh_metadata(
        &self,
        identity: &RecordIdentity,
        rdatas: &[String],
        ttl: u32,
        class: &str,
    ) -> Result<(), DirectoryError> {
        for rdata in rdatas {
            match self.delete_record(identity, rdata).await {
                Ok(()) | Err(DirectoryError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
            match self.create_record(identity, rdata, ttl, class).await {
                Ok(()) | Err(DirectoryError::Conflict { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

// ============================================================================
// HTTP implementation
// ============================================================================

/// Build the API base URL from a server address.
///
/// Converts `"bind9-api.example.net:8080"` to
/// `http://bind9-api.example.net:8080`, leaving explicit `http`/`https`
/// prefixes intact and trimming any trailing slash.
#[must_use]
pub fn build_api_url(server: &str) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        server.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", server.trim_end_matches('/'))
    }
}

fn transport_error(endpoint: &str, err: &reqwest::Error) -> DirectoryError {
    let reason = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        format!("request failed: {err}")
    };
    DirectoryError::Transient {
        endpoint: endpoint.to_string(),
        reason,
    }
}

/// HTTP client for a BIND9 REST directory.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpDirectoryClient {
    base: Url,
    http: HttpClient,
    auth: Auth,
}

impl HttpDirectoryClient {
    /// Create a client for the given endpoint.
    ///
    /// Every request is bounded by `timeout`; a timeout is reported as a
    /// transient (retryable) failure, never dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint does not parse as an HTTP URL or
    /// the underlying HTTP client cannot be constructed.
    pub fn new(endpoint: &str, auth: Auth, timeout: Duration) -> Result<Self> {
        let base = Url::parse(&build_api_url(endpoint))
            .with_context(|| format!("Invalid directory endpoint '{endpoint}'"))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("Invalid directory endpoint '{endpoint}': expected http or https");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { base, http, auth })
    }

    /// Build a URL under `/api/v1` with escaped path segments.
    fn api_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        {
            // An http(s) URL is always a valid base.
            let mut path = url.path_segments_mut().expect("http URL is a base");
            path.pop_if_empty();
            path.extend(["api", "v1"]);
            path.extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// Execute a request with automatic retry on transient failures.
    ///
    /// Retries on 429/5xx and connection-level errors with exponential
    /// backoff (2 minute budget); fails immediately on other errors.
    async fn request<T: Serialize + fmt::Debug>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&T>,
    ) -> Result<String, DirectoryError> {
        let mut backoff = http_backoff();
        let start_time = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.request_once(method.clone(), url, body).await {
                Ok(response) => {
                    if attempt > 1 {
                        debug!(
                            method = %method,
                            url = %url,
                            attempt = attempt,
                            elapsed = ?start_time.elapsed(),
                            "Directory call succeeded after retries"
                        );
                    }
                    return Ok(response);
                }
                Err(e) if e.is_transient() => {
                    if let Some(duration) = backoff.next_backoff() {
                        warn!(
                            method = %method,
                            url = %url,
                            attempt = attempt,
                            retry_after = ?duration,
                            error = %e,
                            "Transient directory error, will retry"
                        );
                        tokio::time::sleep(duration).await;
                    } else {
                        error!(
                            method = %method,
                            url = %url,
                            attempt = attempt,
                            elapsed = ?start_time.elapsed(),
                            error = %e,
                            "Retry budget exhausted, giving up"
                        );
                        return Err(e);
                    }
                }
                Err(e) => {
                    error!(
                        method = %method,
                        url = %url,
                        error = %e,
                        "Non-retryable directory error"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Perform one request attempt, refreshing the token once on 401.
    async fn request_once<T: Serialize + fmt::Debug>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&T>,
    ) -> Result<String, DirectoryError> {
        debug!(
            method = %method,
            url = %url,
            body = ?body,
            "Directory request"
        );

        let response = self.execute(method.clone(), url, body).await?;

        // Expired token: refresh once and replay the request.
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            if let Auth::Token(provider) = &self.auth {
                info!(url = %url, "Directory returned 401, refreshing token");
                provider.refresh().await?;
                self.execute(method, url, body).await?
            } else {
                response
            }
        } else {
            response
        };

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(url.as_str(), &e))?;

        if !status.is_success() {
            return Err(self.classify_status(url, status, &text));
        }

        Ok(text)
    }

    /// Send one HTTP request with the configured credentials attached.
    async fn execute<T: Serialize + fmt::Debug>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&T>,
    ) -> Result<reqwest::Response, DirectoryError> {
        let mut request = self.http.request(method, url.clone());

        if let Some(body_data) = body {
            request = request.json(body_data);
        }

        request = match &self.auth {
            Auth::None => request,
            Auth::ApiKey(key) => request.header("X-API-Key", key),
            Auth::Token(provider) => request.bearer_auth(provider.current().await?),
        };

        request
            .send()
            .await
            .map_err(|e| transport_error(url.as_str(), &e))
    }

    /// Map an error status to the directory taxonomy.
    fn classify_status(&self, url: &Url, status: StatusCode, body: &str) -> DirectoryError {
        let endpoint = url.to_string();
        match status {
            StatusCode::NOT_FOUND => DirectoryError::NotFound { endpoint },
            StatusCode::CONFLICT => DirectoryError::Conflict { endpoint },
            s if is_retryable_http_status(s) => DirectoryError::Transient {
                endpoint,
                reason: format!("HTTP {s}: {body}"),
            },
            s => {
                // Some directory versions report these conditions with a
                // generic status and a descriptive body.
                let lower = body.to_ascii_lowercase();
                if lower.contains("already exists") {
                    DirectoryError::Conflict { endpoint }
                } else if lower.contains("not found") {
                    DirectoryError::NotFound { endpoint }
                } else {
                    DirectoryError::Rejected {
                        endpoint,
                        status: s.as_u16(),
                        reason: body.to_string(),
                    }
                }
            }
        }
    }

    // ===== Zone boundary calls =====

    /// Retrieve a zone by name.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] if the zone does not exist, or
    /// the usual transport/rejection errors.
    pub async fn get_zone(&self, name: &str) -> Result<Zone, DirectoryError> {
        let url = self.api_url(&["zones", name], &[]);
        let text = self.request(Method::GET, &url, None::<&()>).await?;
        serde_json::from_str(&text).map_err(|e| DirectoryError::InvalidResponse {
            endpoint: url.to_string(),
            reason: format!("zone response: {e}"),
        })
    }

    /// Create a zone.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Conflict`] if the zone already exists.
    pub async fn create_zone(&self, request: &ZoneCreateRequest) -> Result<Zone, DirectoryError> {
        let url = self.api_url(&["zones"], &[]);
        info!(zone = %request.name, zone_type = %request.zone_type, "Creating zone");
        let text = self.request(Method::POST, &url, Some(request)).await?;
        serde_json::from_str(&text).map_err(|e| DirectoryError::InvalidResponse {
            endpoint: url.to_string(),
            reason: format!("zone response: {e}"),
        })
    }

    /// Delete a zone, optionally removing its zone file.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] if the zone does not exist.
    pub async fn delete_zone(&self, name: &str, delete_file: bool) -> Result<(), DirectoryError> {
        let query: &[(&str, &str)] = if delete_file {
            &[("delete_file", "true")]
        } else {
            &[]
        };
        let url = self.api_url(&["zones", name], query);
        info!(zone = %name, delete_file = delete_file, "Deleting zone");
        self.request(Method::DELETE, &url, None::<&()>).await?;
        Ok(())
    }

    /// Reload a zone after external changes.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] if the zone does not exist.
    pub async fn reload_zone(&self, name: &str) -> Result<(), DirectoryError> {
        let url = self.api_url(&["zones", name, "reload"], &[]);
        info!(zone = %name, "Reloading zone");
        self.request(Method::POST, &url, None::<&()>).await?;
        Ok(())
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn list_records(
        &self,
        identity: &RecordIdentity,
    ) -> Result<Vec<DirectoryRecord>, DirectoryError> {
        let url = self.api_url(
            &["zones", &identity.zone, "records"],
            &[
                ("record_type", identity.rtype.as_str()),
                ("name", &identity.owner),
            ],
        );
        let text = self.request(Method::GET, &url, None::<&()>).await?;
        serde_json::from_str(&text).map_err(|e| DirectoryError::InvalidResponse {
            endpoint: url.to_string(),
            reason: format!("record list: {e}"),
        })
    }

    async fn create_record(
        &self,
        identity: &RecordIdentity,
        rdata: &str,
        ttl: u32,
        class: &str,
    ) -> Result<(), DirectoryError> {
        let url = self.api_url(&["zones", &identity.zone, "records"], &[]);
        let request = RecordCreateRequest {
            record_type: identity.rtype.as_str().to_string(),
            name: identity.owner.clone(),
            ttl,
            record_class: Some(class.to_string()),
            data: record_data_map(identity.rtype, rdata),
        };

        info!(
            identity = %identity,
            rdata = %rdata,
            ttl = ttl,
            "Creating record"
        );
        self.request(Method::POST, &url, Some(&request)).await?;
        Ok(())
    }

    async fn delete_record(
        &self,
        identity: &RecordIdentity,
        rdata: &str,
    ) -> Result<(), DirectoryError> {
        let url = self.api_url(
            &[
                "zones",
                &identity.zone,
                "records",
                &identity.owner,
                identity.rtype.as_str(),
            ],
            &[("rdata", rdata)],
        );

        info!(identity = %identity, rdata = %rdata, "Deleting record");
        self.request(Method::DELETE, &url, None::<&()>).await?;
        Ok(())
    }
}
