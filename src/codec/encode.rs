//! Request envelope encoder.

use super::{ARRAY, ASSOC, ENVELOPE_VERSION, ITEM, PROTOCOL, ROOT};
use crate::value::{AttributeValue, Attributes};
use quick_xml::escape::escape;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no" ?>"#;
const DOCTYPE: &str = r#"<!DOCTYPE OPS_envelope SYSTEM "ops.dtd">"#;

/// Encode a request envelope.
///
/// Output is compact and byte-for-byte deterministic for equal inputs, which
/// the signature depends on.
pub fn encode(object: &str, action: &str, attributes: &Attributes) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(DECLARATION);
    out.push_str(DOCTYPE);
    out.push('<');
    out.push_str(ROOT);
    out.push_str("><header><version>");
    out.push_str(ENVELOPE_VERSION);
    out.push_str("</version></header><body><data_block><");
    out.push_str(ASSOC);
    out.push('>');

    // Fixed order: protocol, object, action, attributes
    write_scalar_item(&mut out, "protocol", PROTOCOL);
    write_scalar_item(&mut out, "object", object);
    write_scalar_item(&mut out, "action", action);
    open_item(&mut out, Some("attributes"));
    write_assoc(&mut out, attributes);
    close_item(&mut out);

    out.push_str("</");
    out.push_str(ASSOC);
    out.push_str("></data_block></body></");
    out.push_str(ROOT);
    out.push('>');
    out
}

fn write_scalar_item(out: &mut String, key: &str, text: &str) {
    open_item(out, Some(key));
    out.push_str(&escape(text));
    close_item(out);
}

fn open_item(out: &mut String, key: Option<&str>) {
    out.push('<');
    out.push_str(ITEM);
    if let Some(key) = key {
        out.push_str(" key=\"");
        out.push_str(&escape(key));
        out.push('"');
    }
    out.push('>');
}

fn close_item(out: &mut String) {
    out.push_str("</");
    out.push_str(ITEM);
    out.push('>');
}

/// Render one item. List children pass `None` and stay unkeyed.
fn write_item(out: &mut String, key: Option<&str>, value: &AttributeValue) {
    open_item(out, key);
    match value {
        AttributeValue::Scalar(text) => out.push_str(&escape(text.as_str())),
        AttributeValue::List(items) => write_array(out, items),
        AttributeValue::Mapping(map) => write_assoc(out, map),
    }
    close_item(out);
}

fn write_assoc(out: &mut String, map: &Attributes) {
    out.push('<');
    out.push_str(ASSOC);
    out.push('>');
    for (key, value) in map.iter() {
        write_item(out, Some(key), value);
    }
    out.push_str("</");
    out.push_str(ASSOC);
    out.push('>');
}

fn write_array(out: &mut String, items: &[AttributeValue]) {
    out.push('<');
    out.push_str(ARRAY);
    out.push('>');
    for item in items {
        write_item(out, None, item);
    }
    out.push_str("</");
    out.push_str(ARRAY);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no" ?>"#,
        r#"<!DOCTYPE OPS_envelope SYSTEM "ops.dtd">"#,
        "<OPS_envelope><header><version>0.9</version></header>",
        "<body><data_block><dt_assoc>",
    );
    const SUFFIX: &str = "</dt_assoc></data_block></body></OPS_envelope>";

    #[test]
    fn test_encode_empty_attributes() {
        let xml = encode("reseller", "get_balance", &Attributes::new());
        let expected = format!(
            "{PREFIX}<item key=\"protocol\">XCP</item>\
             <item key=\"object\">reseller</item>\
             <item key=\"action\">get_balance</item>\
             <item key=\"attributes\"><dt_assoc></dt_assoc></item>{SUFFIX}"
        );
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_encode_scalars_in_insertion_order() {
        let attrs = Attributes::new()
            .with("exp_from", "2026-01-01")
            .with("exp_to", "2030-12-31")
            .with("limit", 100u32);
        let xml = encode("domain", "get_domains_by_expiredate", &attrs);
        assert!(xml.contains(
            "<item key=\"attributes\"><dt_assoc>\
             <item key=\"exp_from\">2026-01-01</item>\
             <item key=\"exp_to\">2030-12-31</item>\
             <item key=\"limit\">100</item>\
             </dt_assoc></item>"
        ));
    }

    #[test]
    fn test_encode_empty_scalar_is_not_omitted() {
        let attrs = Attributes::new().with("subdomain", AttributeValue::empty());
        let xml = encode("domain", "set_dns_zone", &attrs);
        assert!(xml.contains("<item key=\"subdomain\"></item>"));
    }

    #[test]
    fn test_encode_list_of_mappings() {
        let records = Attributes::new().with(
            "A",
            AttributeValue::List(vec![AttributeValue::Mapping(
                Attributes::new()
                    .with("subdomain", "www")
                    .with("ip_address", "2.2.2.2"),
            )]),
        );
        let attrs = Attributes::new()
            .with("domain", "example.com")
            .with("records", records);
        let xml = encode("domain", "set_dns_zone", &attrs);
        assert!(xml.contains(
            "<item key=\"records\"><dt_assoc><item key=\"A\"><dt_array>\
             <item><dt_assoc>\
             <item key=\"subdomain\">www</item>\
             <item key=\"ip_address\">2.2.2.2</item>\
             </dt_assoc></item>\
             </dt_array></item></dt_assoc></item>"
        ));
    }

    #[test]
    fn test_encode_escapes_text_and_keys() {
        let attrs = Attributes::new().with("a<b", "x & \"y\"");
        let xml = encode("domain", "test", &attrs);
        assert!(xml.contains("<item key=\"a&lt;b\">x &amp; &quot;y&quot;</item>"));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let attrs = Attributes::new()
            .with("domain", "example.com")
            .with("nested", Attributes::new().with("list", vec!["1", "2"]));
        let first = encode("domain", "get_dns_zone", &attrs);
        let second = encode("domain", "get_dns_zone", &attrs.clone());
        assert_eq!(first, second);
    }
}
