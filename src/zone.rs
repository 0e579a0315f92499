//! DNS zone record merging.
//!
//! `set_dns_zone` replaces the entire record set of a domain, so changing one
//! address record means fetching the zone, merging locally and submitting the
//! whole set back. [`upsert_a`] is the merge step. Everything except the
//! targeted `A` entry passes through untouched.
//!
//! The fetch/merge/submit cycle is not atomic on the server. Two concurrent
//! updates of the same zone race and the later submit wins; see
//! [`DomainLocks`](crate::client::DomainLocks).

use crate::value::{AttributeValue, Attributes};
use serde::Serialize;

/// Record type key for address records.
pub const A_RECORD: &str = "A";

/// Typed view of an `A` record entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ARecord {
    /// Empty for the zone apex
    pub subdomain: String,
    pub ip_address: String,
}

impl ARecord {
    fn from_entry(entry: &AttributeValue) -> Option<Self> {
        let map = entry.as_mapping()?;
        Some(Self {
            subdomain: map.get_str("subdomain").unwrap_or_default().to_string(),
            ip_address: map.get_str("ip_address").unwrap_or_default().to_string(),
        })
    }
}

/// Subdomain as shown to people, `@` for the apex.
pub fn display_subdomain(subdomain: &str) -> &str {
    if subdomain.is_empty() {
        "@"
    } else {
        subdomain
    }
}

/// Project the `A` list of a zone into typed records.
///
/// Entries that are not mappings are skipped; missing fields read as empty.
pub fn a_records(zone: &Attributes) -> Vec<ARecord> {
    zone.get(A_RECORD)
        .and_then(AttributeValue::as_list)
        .map(|entries| entries.iter().filter_map(ARecord::from_entry).collect())
        .unwrap_or_default()
}

/// Insert or update the `A` record for `subdomain`.
///
/// The first entry whose `subdomain` equals the target exactly (a missing
/// field counts as the apex) gets its `ip_address` replaced in place. With no
/// match a new `{subdomain, ip_address}` entry is appended. All other record
/// types and `A` entries are carried over in order. An `A` value that is not a
/// list is treated as empty.
pub fn upsert_a(zone: &Attributes, subdomain: &str, ip_address: &str) -> Attributes {
    let mut entries: Vec<AttributeValue> = zone
        .get(A_RECORD)
        .and_then(AttributeValue::as_list)
        .map(<[AttributeValue]>::to_vec)
        .unwrap_or_default();

    let existing = entries.iter_mut().find_map(|entry| match entry {
        AttributeValue::Mapping(map)
            if map.get_str("subdomain").unwrap_or_default() == subdomain =>
        {
            Some(map)
        }
        _ => None,
    });

    match existing {
        Some(map) => {
            map.insert("ip_address", ip_address);
        }
        None => entries.push(AttributeValue::Mapping(
            Attributes::new()
                .with("subdomain", subdomain)
                .with("ip_address", ip_address),
        )),
    }

    let mut next = zone.clone();
    next.insert(A_RECORD, AttributeValue::List(entries));
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(subdomain: &str, ip: &str) -> AttributeValue {
        AttributeValue::Mapping(
            Attributes::new()
                .with("subdomain", subdomain)
                .with("ip_address", ip),
        )
    }

    fn mx() -> AttributeValue {
        AttributeValue::List(vec![AttributeValue::Mapping(
            Attributes::new()
                .with("priority", "10")
                .with("hostname", "mail.example.com"),
        )])
    }

    #[test]
    fn test_upsert_appends_new_subdomain() {
        let zone = Attributes::new()
            .with("A", vec![entry("", "1.1.1.1")])
            .with("MX", mx());

        let next = upsert_a(&zone, "www", "2.2.2.2");

        assert_eq!(
            next.get("A"),
            Some(&AttributeValue::List(vec![
                entry("", "1.1.1.1"),
                entry("www", "2.2.2.2"),
            ]))
        );
        assert_eq!(next.get("MX"), Some(&mx()));
        let keys: Vec<_> = next.keys().collect();
        assert_eq!(keys, vec!["A", "MX"]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let zone = Attributes::new().with(
            "A",
            vec![entry("mail", "3.3.3.3"), entry("www", "1.1.1.1"), entry("api", "4.4.4.4")],
        );

        let next = upsert_a(&zone, "www", "9.9.9.9");

        assert_eq!(
            next.get("A"),
            Some(&AttributeValue::List(vec![
                entry("mail", "3.3.3.3"),
                entry("www", "9.9.9.9"),
                entry("api", "4.4.4.4"),
            ]))
        );
    }

    #[test]
    fn test_upsert_keeps_extra_fields_of_matched_entry() {
        let zone = Attributes::new().with(
            "A",
            vec![AttributeValue::Mapping(
                Attributes::new()
                    .with("subdomain", "www")
                    .with("ip_address", "1.1.1.1")
                    .with("ttl", "3600"),
            )],
        );

        let next = upsert_a(&zone, "www", "5.5.5.5");
        let records = a_records(&next);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ip_address, "5.5.5.5");
        let list = next.get("A").unwrap().as_list().unwrap();
        assert_eq!(list[0].get("ttl"), Some(&AttributeValue::from("3600")));
    }

    #[test]
    fn test_upsert_apex_matches_only_apex() {
        let zone = Attributes::new().with("A", vec![entry("www", "1.1.1.1")]);

        let next = upsert_a(&zone, "", "8.8.8.8");

        assert_eq!(
            next.get("A"),
            Some(&AttributeValue::List(vec![
                entry("www", "1.1.1.1"),
                entry("", "8.8.8.8"),
            ]))
        );
    }

    #[test]
    fn test_upsert_missing_subdomain_field_is_apex() {
        let zone = Attributes::new().with(
            "A",
            vec![AttributeValue::Mapping(
                Attributes::new().with("ip_address", "1.1.1.1"),
            )],
        );

        let next = upsert_a(&zone, "", "7.7.7.7");
        let list = next.get("A").unwrap().as_list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].get("ip_address"), Some(&AttributeValue::from("7.7.7.7")));
    }

    #[test]
    fn test_upsert_without_a_records() {
        let zone = Attributes::new().with("CNAME", vec![entry("blog", "x")]);

        let next = upsert_a(&zone, "www", "2.2.2.2");

        let keys: Vec<_> = next.keys().collect();
        assert_eq!(keys, vec!["CNAME", "A"]);
        assert_eq!(next.get("A"), Some(&AttributeValue::List(vec![entry("www", "2.2.2.2")])));
        assert_eq!(next.get("CNAME"), zone.get("CNAME"));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let zone = Attributes::new()
            .with("A", vec![entry("", "1.1.1.1"), entry("www", "1.1.1.2")])
            .with("MX", mx());

        for (sub, ip) in [("www", "2.2.2.2"), ("new", "3.3.3.3"), ("", "1.1.1.1")] {
            let once = upsert_a(&zone, sub, ip);
            let twice = upsert_a(&once, sub, ip);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_upsert_leaves_input_untouched() {
        let zone = Attributes::new().with("A", vec![entry("www", "1.1.1.1")]);
        let before = zone.clone();
        let _ = upsert_a(&zone, "www", "9.9.9.9");
        assert_eq!(zone, before);
    }

    #[test]
    fn test_a_records_projection() {
        let zone = Attributes::new().with(
            "A",
            AttributeValue::List(vec![
                entry("", "1.1.1.1"),
                AttributeValue::from("junk"),
                AttributeValue::Mapping(Attributes::new().with("subdomain", "www")),
            ]),
        );

        let records = a_records(&zone);
        assert_eq!(records.len(), 2);
        assert_eq!(display_subdomain(&records[0].subdomain), "@");
        assert_eq!(display_subdomain(&records[1].subdomain), "www");
        assert_eq!(records[1].subdomain, "www");
        assert_eq!(records[1].ip_address, "");
        assert!(a_records(&Attributes::new()).is_empty());
    }

    fn arb_subdomain() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("www".to_string()),
            Just("mail".to_string()),
            any::<String>(),
        ]
    }

    fn arb_a_entry() -> impl Strategy<Value = AttributeValue> {
        prop_oneof![
            (arb_subdomain(), any::<String>()).prop_map(|(sub, ip)| entry(&sub, &ip)),
            any::<String>().prop_map(|ip| AttributeValue::Mapping(
                Attributes::new().with("ip_address", ip)
            )),
            any::<String>().prop_map(AttributeValue::Scalar),
        ]
    }

    prop_compose! {
        fn arb_zone()(
            a in prop::option::of(prop::collection::vec(arb_a_entry(), 0..6)),
            others in prop::collection::vec(("[B-Z][A-Z]{0,4}", any::<String>()), 0..4),
        ) -> Attributes {
            let mut zone: Attributes = others.into_iter().collect();
            if let Some(a) = a {
                zone.insert(A_RECORD, a);
            }
            zone
        }
    }

    proptest! {
        #[test]
        fn test_upsert_properties(
            zone in arb_zone(),
            subdomain in arb_subdomain(),
            ip in any::<String>(),
        ) {
            let once = upsert_a(&zone, &subdomain, &ip);
            prop_assert_eq!(&upsert_a(&once, &subdomain, &ip), &once);

            for (key, value) in zone.iter().filter(|(key, _)| *key != A_RECORD) {
                prop_assert_eq!(once.get(key), Some(value));
            }

            let matching = a_records(&once)
                .into_iter()
                .filter(|record| record.subdomain == subdomain)
                .collect::<Vec<_>>();
            prop_assert!(!matching.is_empty());
            prop_assert_eq!(&matching[0].ip_address, &ip);
        }
    }
}
