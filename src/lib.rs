//! Client for the OpenSRS XCP envelope protocol.
//!
//! This crate provides:
//!
//! - A recursive attribute model with order-preserving mappings
//! - Envelope encoding and decoding (`dt_assoc` / `dt_array`)
//! - Two-pass MD5 request signing
//! - Safe `A` record upserts against full-replace DNS zones
//! - An HTTPS transport and a tool catalog for tool-calling hosts
//!
//! ## Example
//!
//! ```no_run
//! use opensrs_client::{ClientConfig, XcpClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default().apply_env();
//! let client = XcpClient::from_config(&config)?;
//! client.upsert_a_record("example.com", "www", "203.0.113.7").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Zone updates replace the whole record set on the server. Concurrent
//! updates of one domain race; share a [`DomainLocks`] between clients to
//! serialize them.

pub mod client;
pub mod codec;
pub mod config;
pub mod signature;
pub mod tools;
pub mod value;
pub mod zone;

pub use client::{ClientError, DomainLocks, HttpTransport, Transport, TransportError, XcpClient};
pub use codec::{decode, encode, DecodeError, ResponseOutcome};
pub use config::{ClientConfig, ConfigError, Environment};
pub use signature::sign;
pub use tools::{ToolCall, ToolError};
pub use value::{AttributeValue, Attributes};
pub use zone::{a_records, upsert_a, ARecord};
