use std::collections::BTreeMap;

use baseutils::version::Operator;
use baseutils::{Constraints, Version, contains, dedup, string_hash, to_json, version_compare};
use pretty_assertions::assert_eq;

#[test]
fn test_string_hash_matches_reference_values() {
    assert_eq!(string_hash("abc"), 96354);
    assert_eq!(string_hash("hello"), 99162322);
}

#[test]
fn test_dedup_keeps_first_occurrence() {
    let tags = vec!["news".to_owned(), "sport".to_owned(), "news".to_owned()];
    let unique = dedup(&tags);
    assert_eq!(unique, ["news", "sport"]);
    assert!(contains(&unique, &"sport".to_owned()));
}

#[test]
fn test_to_json_encodes_maps_and_strings() {
    let value = BTreeMap::from([("b", 2), ("a", 1)]);
    assert_eq!(to_json(&value), r#"{"a":1,"b":2}"#);
    assert_eq!(to_json("quote\""), r#""quote\"""#);
}

#[test]
fn test_constraints_expose_parts() {
    let constraints: Constraints = "~> 2.1, != 2.1.4".parse().unwrap();
    let operators: Vec<Operator> = constraints.iter().map(|c| c.operator()).collect();
    assert_eq!(operators, [Operator::Pessimistic, Operator::NotEqual]);

    let version: Version = "2.3.0".parse().unwrap();
    assert!(constraints.check(&version));
    assert!(!constraints.check(&"2.1.4".parse().unwrap()));
}

#[test]
fn test_client_version_gate() {
    assert!(version_compare("6.1.9", ">=6.1.8"));
    assert!(!version_compare("6.1.7", ">=6.1.8"));
    assert!(version_compare("6_2_0", ">=6.1.8, <7"));
}

#[cfg(feature = "redis")]
#[test]
fn test_redis_reexport() {
    let endpoints = baseutils::redis::select_topology("a:1,b:2").unwrap();
    assert_eq!(endpoints.topology(), baseutils::redis::Topology::Cluster);
}
