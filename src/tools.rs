//! Tool catalog and dispatch.
//!
//! Exposes the registrar operations as named tools taking JSON arguments,
//! the shape expected by tool-calling hosts.

use crate::client::{ClientError, XcpClient};
use crate::zone;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use thiserror::Error;

/// Default page size for domain listings.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Description of a callable tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

/// All tools, in listing order.
pub fn catalog() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "opensrs_get_balance",
            description: "Get OpenSRS reseller balance",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
        ToolDescriptor {
            name: "opensrs_list_domains",
            description: "List reseller domains by expiration date window",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "exp_from": { "type": "string", "description": "YYYY-MM-DD" },
                    "exp_to": { "type": "string", "description": "YYYY-MM-DD" },
                    "limit": { "type": "integer", "default": DEFAULT_LIST_LIMIT }
                },
                "required": ["exp_from", "exp_to"],
                "additionalProperties": false
            }),
        },
        ToolDescriptor {
            name: "opensrs_get_dns_zone",
            description: "Get DNS zone records for a domain",
            input_schema: json!({
                "type": "object",
                "properties": { "domain": { "type": "string" } },
                "required": ["domain"],
                "additionalProperties": false
            }),
        },
        ToolDescriptor {
            name: "opensrs_upsert_a_record",
            description: "Upsert an A record in OpenSRS DNS zone (preserves all existing records)",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": { "type": "string" },
                    "subdomain": { "type": "string", "description": "Use empty string for root (@)" },
                    "ip_address": { "type": "string" }
                },
                "required": ["domain", "subdomain", "ip_address"],
                "additionalProperties": false
            }),
        },
    ]
}

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    GetBalance,
    ListDomains {
        exp_from: String,
        exp_to: String,
        limit: u32,
    },
    GetDnsZone {
        domain: String,
    },
    UpsertARecord {
        domain: String,
        subdomain: String,
        ip_address: String,
    },
}

impl ToolCall {
    /// Parse a tool name and its JSON arguments.
    pub fn parse(name: &str, args: &JsonValue) -> Result<Self, ToolError> {
        match name {
            "opensrs_get_balance" => Ok(ToolCall::GetBalance),
            "opensrs_list_domains" => Ok(ToolCall::ListDomains {
                exp_from: required_str(args, "exp_from")?,
                exp_to: required_str(args, "exp_to")?,
                limit: optional_u32(args, "limit")?.unwrap_or(DEFAULT_LIST_LIMIT),
            }),
            "opensrs_get_dns_zone" => Ok(ToolCall::GetDnsZone {
                domain: required_str(args, "domain")?,
            }),
            "opensrs_upsert_a_record" => Ok(ToolCall::UpsertARecord {
                domain: required_str(args, "domain")?,
                subdomain: optional_str(args, "subdomain")?.unwrap_or_default(),
                ip_address: required_str(args, "ip_address")?,
            }),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    /// Tool name of this call.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetBalance => "opensrs_get_balance",
            ToolCall::ListDomains { .. } => "opensrs_list_domains",
            ToolCall::GetDnsZone { .. } => "opensrs_get_dns_zone",
            ToolCall::UpsertARecord { .. } => "opensrs_upsert_a_record",
        }
    }

    /// Run the call and render its result as JSON.
    pub async fn execute(&self, client: &XcpClient) -> Result<JsonValue, ToolError> {
        let result = match self {
            ToolCall::GetBalance => client.get_balance().await?.to_json(),
            ToolCall::ListDomains {
                exp_from,
                exp_to,
                limit,
            } => client
                .get_domains_by_expiredate(exp_from, exp_to, *limit)
                .await?
                .to_json(),
            ToolCall::GetDnsZone { domain } => client.get_dns_zone(domain).await?.to_json(),
            ToolCall::UpsertARecord {
                domain,
                subdomain,
                ip_address,
            } => {
                client
                    .upsert_a_record(domain, subdomain, ip_address)
                    .await?;
                json!({
                    "ok": true,
                    "domain": domain,
                    "subdomain": zone::display_subdomain(subdomain),
                    "ip_address": ip_address,
                })
            }
        };
        Ok(result)
    }
}

fn optional_str(args: &JsonValue, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ToolError::InvalidArguments(format!("'{}' must be a string", key))),
    }
}

fn required_str(args: &JsonValue, key: &str) -> Result<String, ToolError> {
    optional_str(args, key)?
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required '{}'", key)))
}

fn optional_u32(args: &JsonValue, key: &str) -> Result<Option<u32>, ToolError> {
    match args.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ToolError::InvalidArguments(format!("'{}' must be a non-negative integer", key))
            }),
    }
}

/// Errors from tool parsing or execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}
