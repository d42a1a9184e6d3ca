//! Fieldset expansion and product field lists.

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use prism_model::{FieldsetDef, ProductDef};
use prism_registry::{ConfigError, dedup_fields, product_fields, resolve_fieldsets};
use proptest::prelude::*;

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn fieldset(fields: &[&str], fieldsets: &[&str]) -> FieldsetDef {
    FieldsetDef {
        fields: strings(fields),
        fieldsets: strings(fieldsets),
    }
}

fn defs(entries: Vec<(&str, FieldsetDef)>) -> IndexMap<String, FieldsetDef> {
    entries
        .into_iter()
        .map(|(name, def)| (name.to_string(), def))
        .collect()
}

fn product(fieldsets: &[&str], fields: &[&str]) -> ProductDef {
    ProductDef {
        fieldsets: strings(fieldsets),
        fields: strings(fields),
        pivots: vec![],
    }
}

// ── Expansion ────────────────────────────────────────────────────

#[test]
fn direct_fields_come_before_referenced_fields() {
    let resolved = resolve_fieldsets(&defs(vec![
        ("ids", fieldset(&["prism_id", "mlbam_id"], &[])),
        ("bio", fieldset(&["name.first", "name.last"], &["ids"])),
    ]))
    .unwrap();
    assert_eq!(
        resolved["bio"],
        strings(&["name.first", "name.last", "prism_id", "mlbam_id"])
    );
}

#[test]
fn references_resolve_regardless_of_declaration_order() {
    let resolved = resolve_fieldsets(&defs(vec![
        ("full", fieldset(&["bats"], &["bio"])),
        ("bio", fieldset(&["name"], &["ids"])),
        ("ids", fieldset(&["prism_id"], &[])),
    ]))
    .unwrap();
    assert_eq!(resolved["full"], strings(&["bats", "name", "prism_id"]));
    let order: Vec<&str> = resolved.keys().map(String::as_str).collect();
    assert_eq!(order, vec!["full", "bio", "ids"]);
}

#[test]
fn duplicates_keep_first_occurrence() {
    let resolved = resolve_fieldsets(&defs(vec![
        ("a", fieldset(&["x", "y"], &[])),
        ("b", fieldset(&["y", "z"], &[])),
        ("ab", fieldset(&["y"], &["a", "b"])),
    ]))
    .unwrap();
    assert_eq!(resolved["ab"], strings(&["y", "x", "z"]));
}

#[test]
fn diamond_references_are_not_cycles() {
    let resolved = resolve_fieldsets(&defs(vec![
        ("base", fieldset(&["prism_id"], &[])),
        ("left", fieldset(&["l"], &["base"])),
        ("right", fieldset(&["r"], &["base"])),
        ("top", fieldset(&[], &["left", "right"])),
    ]))
    .unwrap();
    assert_eq!(resolved["top"], strings(&["l", "prism_id", "r"]));
}

#[test]
fn self_reference_is_rejected() {
    let err = resolve_fieldsets(&defs(vec![("loop", fieldset(&["x"], &["loop"]))])).unwrap_err();
    match err {
        ConfigError::CyclicFieldset(path) => assert_eq!(path, strings(&["loop", "loop"])),
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn transitive_cycle_is_rejected_with_path() {
    let err = resolve_fieldsets(&defs(vec![
        ("a", fieldset(&["x"], &["b"])),
        ("b", fieldset(&["y"], &["c"])),
        ("c", fieldset(&["z"], &["a"])),
    ]))
    .unwrap_err();
    match &err {
        ConfigError::CyclicFieldset(path) => assert_eq!(path, &strings(&["a", "b", "c", "a"])),
        other => panic!("expected cycle, got {other:?}"),
    }
    assert!(err.to_string().contains("a -> b -> c -> a"));
}

#[test]
fn unknown_reference_is_rejected() {
    let err =
        resolve_fieldsets(&defs(vec![("bio", fieldset(&["name"], &["missing"]))])).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::UnknownFieldset { ref name, .. } if name == "missing"
    ));
}

// ── Product fields ───────────────────────────────────────────────

#[test]
fn product_concatenates_fieldsets_then_fields() {
    let fieldsets = resolve_fieldsets(&defs(vec![
        ("a", fieldset(&["x", "y"], &[])),
        ("b", fieldset(&["y", "z"], &[])),
    ]))
    .unwrap();
    let fields = product_fields("p", &product(&["a", "b"], &["w", "x"]), &fieldsets).unwrap();
    assert_eq!(fields, strings(&["x", "y", "z", "w"]));
}

#[test]
fn product_with_nothing_has_no_fields() {
    let fields = product_fields("empty", &ProductDef::default(), &IndexMap::new()).unwrap();
    assert!(fields.is_empty());
}

#[test]
fn product_unknown_fieldset_is_rejected() {
    let err = product_fields("p", &product(&["nope"], &[]), &IndexMap::new()).unwrap_err();
    assert!(err.to_string().contains("product 'p'"));
}

// ── Properties ───────────────────────────────────────────────────

fn field_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e](\\.[a-c])?", 0..12)
}

proptest! {
    /// Expanding an already-expanded list yields the same list.
    #[test]
    fn expansion_is_idempotent(direct in field_list(), referenced in field_list()) {
        let first = resolve_fieldsets(&defs(vec![
            ("inner", FieldsetDef { fields: referenced, fieldsets: vec![] }),
            ("outer", FieldsetDef { fields: direct, fieldsets: vec!["inner".into()] }),
        ])).unwrap();

        let again = resolve_fieldsets(&defs(vec![
            ("outer", FieldsetDef { fields: first["outer"].clone(), fieldsets: vec![] }),
        ])).unwrap();

        prop_assert_eq!(&again["outer"], &first["outer"]);
    }

    /// Output has no duplicates and keeps every input field at its first position.
    #[test]
    fn dedup_keeps_first_occurrence(fields in field_list()) {
        let deduped = dedup_fields(fields.clone());
        let mut expected: Vec<String> = Vec::new();
        for field in fields {
            if !expected.contains(&field) {
                expected.push(field);
            }
        }
        prop_assert_eq!(deduped, expected);
    }
}
