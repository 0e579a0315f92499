//! XCP envelope codec.
//!
//! Requests and responses share one envelope shape:
//!
//! ```text
//! <OPS_envelope>
//!   <header><version>0.9</version></header>
//!   <body><data_block><dt_assoc>
//!     <item key="protocol">XCP</item>
//!     <item key="object">domain</item>
//!     <item key="action">get_dns_zone</item>
//!     <item key="attributes"><dt_assoc>...</dt_assoc></item>
//!   </dt_assoc></data_block></body>
//! </OPS_envelope>
//! ```

mod decode;
mod encode;

pub use decode::decode;
pub use encode::encode;

use crate::value::Attributes;
use thiserror::Error;

/// Envelope protocol version sent in the header.
pub const ENVELOPE_VERSION: &str = "0.9";

/// Value of the `protocol` item.
pub const PROTOCOL: &str = "XCP";

/// Root element name.
pub(crate) const ROOT: &str = "OPS_envelope";
pub(crate) const ITEM: &str = "item";
pub(crate) const ASSOC: &str = "dt_assoc";
pub(crate) const ARRAY: &str = "dt_array";

/// Decoded response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOutcome {
    /// Numeric response code (0 when absent or not numeric)
    pub response_code: i64,
    /// True only when the wire `is_success` item is exactly "1"
    pub is_success: bool,
    /// Human readable response text
    pub response_text: String,
    /// Decoded `attributes` mapping
    pub attributes: Attributes,
}

/// Structural failure while decoding an envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed envelope: invalid XML: {0}")]
    Xml(String),

    #[error("malformed envelope: missing {0}")]
    Missing(&'static str),

    #[error("malformed envelope: {0}")]
    Shape(String),
}
