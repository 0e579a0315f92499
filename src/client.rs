//! XCP client: signing, transport and the registrar operations.

use crate::codec::{self, DecodeError, ResponseOutcome};
use crate::config::{ClientConfig, ConfigError};
use crate::signature::sign;
use crate::value::{AttributeValue, Attributes};
use crate::zone;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// A request ready to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Encoded envelope
    pub body: String,
    /// Value for `X-Username`
    pub username: String,
    /// Value for `X-Signature`
    pub signature: String,
}

/// Delivers a signed request and returns the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round trip. Implementations must not retry.
    async fn post(&self, request: &SignedRequest) -> Result<String, TransportError>;

    /// Get the transport name for debugging.
    fn name(&self) -> &'static str;
}

/// HTTPS transport backed by reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport posting to `endpoint` with a bounded timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &SignedRequest) -> Result<String, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .header("X-Username", &request.username)
            .header("X-Signature", &request.signature)
            .body(request.body.clone())
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response.text().await.map_err(TransportError::from_reqwest)
    }

    fn name(&self) -> &'static str {
        "http_transport"
    }
}

/// Transport-level failure. Opaque to the codec.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Http(err)
        }
    }
}

/// Errors surfaced by client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The response was not a usable envelope.
    #[error(transparent)]
    Malformed(#[from] DecodeError),

    /// Well-formed envelope reporting failure.
    #[error("OpenSRS {response_code}: {}", or_unknown(.response_text))]
    ProtocolFailure {
        response_code: i64,
        response_text: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn or_unknown(text: &str) -> &str {
    if text.is_empty() {
        "Unknown error"
    } else {
        text
    }
}

impl ClientError {
    /// Remote response code, when the server produced one.
    pub fn response_code(&self) -> Option<i64> {
        match self {
            ClientError::ProtocolFailure { response_code, .. } => Some(*response_code),
            _ => None,
        }
    }
}

/// Turn a decoded outcome into success or [`ClientError::ProtocolFailure`].
pub fn classify(outcome: ResponseOutcome) -> Result<ResponseOutcome, ClientError> {
    if outcome.is_success {
        Ok(outcome)
    } else {
        Err(ClientError::ProtocolFailure {
            response_code: outcome.response_code,
            response_text: outcome.response_text,
        })
    }
}

/// Per-domain locks serializing zone read-modify-write cycles.
///
/// `set_dns_zone` replaces the whole zone, so two overlapping upserts on one
/// domain lose the first write. Clients sharing a `DomainLocks` never overlap
/// on the same domain. Other processes are not covered.
///
/// Entries for domains nobody holds or waits on are dropped on the next
/// [`lock`](Self::lock) call.
#[derive(Debug, Default)]
pub struct DomainLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DomainLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a domain's zone.
    pub async fn lock(&self, domain: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Only the map holds an idle lock; new holders need the map mutex
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(domain.to_ascii_lowercase())
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

/// Client for the XCP envelope protocol.
pub struct XcpClient {
    username: String,
    api_key: String,
    transport: Arc<dyn Transport>,
    zone_locks: Arc<DomainLocks>,
}

impl XcpClient {
    /// Create a client over HTTPS from validated configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = HttpTransport::new(
            config.endpoint(),
            Duration::from_millis(config.timeout_ms),
        )?;

        info!(
            username = %config.username,
            endpoint = %transport.endpoint(),
            timeout_ms = config.timeout_ms,
            "OpenSRS client initialized"
        );

        Ok(Self::with_transport(
            config.username.clone(),
            config.api_key.clone(),
            Arc::new(transport),
        ))
    }

    /// Create a client over any transport.
    pub fn with_transport(
        username: impl Into<String>,
        api_key: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
            transport,
            zone_locks: Arc::new(DomainLocks::new()),
        }
    }

    /// Share zone locks with other clients.
    pub fn with_domain_locks(mut self, locks: Arc<DomainLocks>) -> Self {
        self.zone_locks = locks;
        self
    }

    /// Encode and sign a request without sending it.
    pub fn build_request(
        &self,
        object: &str,
        action: &str,
        attributes: &Attributes,
    ) -> SignedRequest {
        let body = codec::encode(object, action, attributes);
        let signature = sign(&body, &self.api_key);
        SignedRequest {
            body,
            username: self.username.clone(),
            signature,
        }
    }

    /// Send one request and classify the response.
    pub async fn call(
        &self,
        object: &str,
        action: &str,
        attributes: &Attributes,
    ) -> Result<ResponseOutcome, ClientError> {
        let request = self.build_request(object, action, attributes);

        debug!(
            object,
            action,
            transport = self.transport.name(),
            bytes = request.body.len(),
            "Sending XCP request"
        );

        let raw = match self.transport.post(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(object, action, error = %e, "XCP transport failed");
                return Err(e.into());
            }
        };

        let outcome = match codec::decode(&raw) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(object, action, error = %e, "Malformed XCP response");
                return Err(e.into());
            }
        };

        if !outcome.is_success {
            warn!(
                object,
                action,
                response_code = outcome.response_code,
                response_text = %outcome.response_text,
                "XCP request rejected"
            );
        } else {
            debug!(
                object,
                action,
                response_code = outcome.response_code,
                "XCP request succeeded"
            );
        }

        classify(outcome)
    }

    /// `reseller/get_balance`.
    pub async fn get_balance(&self) -> Result<Attributes, ClientError> {
        let outcome = self.call("reseller", "get_balance", &Attributes::new()).await?;
        Ok(outcome.attributes)
    }

    /// `domain/get_domains_by_expiredate`.
    pub async fn get_domains_by_expiredate(
        &self,
        exp_from: &str,
        exp_to: &str,
        limit: u32,
    ) -> Result<Attributes, ClientError> {
        let attributes = Attributes::new()
            .with("exp_from", exp_from)
            .with("exp_to", exp_to)
            .with("limit", limit);
        let outcome = self
            .call("domain", "get_domains_by_expiredate", &attributes)
            .await?;
        Ok(outcome.attributes)
    }

    /// `domain/get_dns_zone`.
    pub async fn get_dns_zone(&self, domain: &str) -> Result<Attributes, ClientError> {
        let attributes = Attributes::new().with("domain", domain);
        let outcome = self.call("domain", "get_dns_zone", &attributes).await?;
        Ok(outcome.attributes)
    }

    /// `domain/set_dns_zone`. Replaces the entire zone.
    pub async fn set_dns_zone(
        &self,
        domain: &str,
        records: Attributes,
    ) -> Result<ResponseOutcome, ClientError> {
        let attributes = Attributes::new()
            .with("domain", domain)
            .with("records", records);
        self.call("domain", "set_dns_zone", &attributes).await
    }

    /// Insert or update one `A` record, preserving every other record.
    ///
    /// Fetches the zone, merges with [`zone::upsert_a`] and submits the full
    /// record set while holding this domain's [`DomainLocks`] entry. Returns the
    /// submitted records.
    pub async fn upsert_a_record(
        &self,
        domain: &str,
        subdomain: &str,
        ip_address: &str,
    ) -> Result<Attributes, ClientError> {
        let _guard = self.zone_locks.lock(domain).await;

        let current = self.get_dns_zone(domain).await?;
        let records = match current.get("records") {
            Some(AttributeValue::Mapping(records)) => records.clone(),
            _ => Attributes::new(),
        };

        let next = zone::upsert_a(&records, subdomain, ip_address);
        self.set_dns_zone(domain, next.clone()).await?;

        info!(
            domain,
            subdomain = zone::display_subdomain(subdomain),
            ip_address,
            "Upserted A record"
        );

        Ok(next)
    }
}
