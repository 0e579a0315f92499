//! Request signing.
//!
//! The registrar authenticates requests with a two-pass MD5 over the exact
//! request body and the account's API key:
//!
//! ```text
//! signature = md5_hex(md5_hex(body ++ key) ++ key)
//! ```
//!
//! The digest is fixed by the remote server; any other algorithm is rejected.

/// Compute the `X-Signature` header value for a request body.
pub fn sign(body: &str, secret: &str) -> String {
    let first = md5_hex(&[body.as_bytes(), secret.as_bytes()]);
    md5_hex(&[first.as_bytes(), secret.as_bytes()])
}

fn md5_hex(parts: &[&[u8]]) -> String {
    let mut ctx = md5::Context::new();
    for part in parts {
        ctx.consume(part);
    }
    format!("{:x}", ctx.compute())
}
