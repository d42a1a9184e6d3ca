//! Seeding, joining and preprocessing of intermediates.

mod common;

use std::sync::atomic::Ordering;

use common::{
    CountingSource, chadwick_data, crosswalk, failing_source, keyed, records, registry, sfbb_data,
    source_table, static_source,
};
use pretty_assertions::assert_eq;
use prism_model::Record;
use prism_registry::{
    BuildPlan, Intermediates, RegistryError, SourceTable, build_intermediates, seed_intermediates,
};
use serde_json::json;

fn build(table: &SourceTable) -> Result<Intermediates, RegistryError> {
    let plan = BuildPlan::compile(&registry()).unwrap();
    build_intermediates(&crosswalk(), &plan.sources, table, false)
}

// ── Seeding ──────────────────────────────────────────────────────

#[test]
fn seeds_keep_crosswalk_order() {
    let seeded = seed_intermediates(&crosswalk()).unwrap();
    let ids: Vec<&str> = seeded.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);
    assert_eq!(seeded["p2"].crosswalk()["mlbam_id"], json!("605141"));
}

#[test]
fn missing_prism_id_is_rejected() {
    let rows = records(json!([{"prism_id": "p1"}, {"mlbam_id": "1"}]));
    let err = seed_intermediates(&rows).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidIdentity { index: 1, .. }));
}

#[test]
fn empty_prism_id_is_rejected() {
    let rows = records(json!([{"prism_id": ""}]));
    assert!(seed_intermediates(&rows).is_err());
}

#[test]
fn duplicate_prism_id_keeps_first_position_and_later_row() {
    let rows = records(json!([
        {"prism_id": "p1", "v": 1},
        {"prism_id": "p2", "v": 2},
        {"prism_id": "p1", "v": 3}
    ]));
    let seeded = seed_intermediates(&rows).unwrap();
    let ids: Vec<&str> = seeded.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
    assert_eq!(seeded["p1"].crosswalk()["v"], json!(3));
}

// ── Joining ──────────────────────────────────────────────────────

#[test]
fn every_identity_gets_every_source_slot() {
    let built = build(&source_table()).unwrap();
    for intermediate in built.values() {
        assert!(intermediate.source("chadwick").is_some());
        assert!(intermediate.source("sfbb").is_some());
    }
}

#[test]
fn joined_record_matches_lookup_or_is_empty() {
    let built = build(&source_table()).unwrap();
    let chadwick = chadwick_data();
    let sfbb = sfbb_data();
    for intermediate in built.values() {
        let key = intermediate.crosswalk()["mlbam_id"].as_str().unwrap();
        assert_eq!(intermediate.source("chadwick"), chadwick.get(key));

        let joined = intermediate.source("sfbb").unwrap();
        match sfbb.get(key) {
            Some(raw) => {
                for (field, value) in raw {
                    assert_eq!(&joined[field], value);
                }
            }
            None => assert!(joined.is_empty()),
        }
    }
}

#[test]
fn preprocessing_runs_on_matched_records() {
    let built = build(&source_table()).unwrap();
    assert_eq!(
        built["p1"].source("sfbb").unwrap()["display"],
        json!("Aaron Judge (NYY)")
    );
    assert_eq!(built["p2"].source("sfbb"), Some(&Record::new()));
}

#[test]
fn numeric_crosswalk_key_matches_string_source_key() {
    let rows = records(json!([{"prism_id": "p1", "mlbam_id": 592450}]));
    let plan = BuildPlan::compile(&registry()).unwrap();
    let built = build_intermediates(&rows, &plan.sources, &source_table(), false).unwrap();
    assert_eq!(
        built["p1"].source("chadwick").unwrap()["name_last"],
        json!("Judge")
    );
}

#[test]
fn missing_or_null_crosswalk_key_yields_empty_record() {
    let rows = records(json!([
        {"prism_id": "p1"},
        {"prism_id": "p2", "mlbam_id": null},
        {"prism_id": "p3", "mlbam_id": ""}
    ]));
    let plan = BuildPlan::compile(&registry()).unwrap();
    let built = build_intermediates(&rows, &plan.sources, &source_table(), false).unwrap();
    for intermediate in built.values() {
        assert_eq!(intermediate.source("chadwick"), Some(&Record::new()));
    }
}

#[test]
fn each_source_loads_once_per_build() {
    let (chadwick, calls, refreshes) = CountingSource::new(chadwick_data());
    let table = SourceTable::new()
        .with("chadwick", chadwick)
        .with("sfbb", static_source(sfbb_data()));
    let plan = BuildPlan::compile(&registry()).unwrap();

    build_intermediates(&crosswalk(), &plan.sources, &table, true).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

#[test]
fn failing_source_aborts_build() {
    let table = SourceTable::new()
        .with("chadwick", static_source(chadwick_data()))
        .with("sfbb", failing_source());
    let err = build(&table).unwrap_err();
    match err {
        RegistryError::SourceLoad { name, .. } => assert_eq!(name, "sfbb"),
        other => panic!("expected source error, got {other:?}"),
    }
}

#[test]
fn shared_source_records_are_not_mutated() {
    let data = keyed(json!({"1": {"first": "A", "last": "B"}}));
    let table = SourceTable::new()
        .with("chadwick", static_source(data.clone()))
        .with("sfbb", static_source(data.clone()));
    let rows = records(json!([
        {"prism_id": "p1", "mlbam_id": "1"},
        {"prism_id": "p2", "mlbam_id": "1"}
    ]));
    let plan = BuildPlan::compile(&registry()).unwrap();
    let built = build_intermediates(&rows, &plan.sources, &table, false).unwrap();

    assert_eq!(built["p1"].source("chadwick"), data.get("1"));
    assert_eq!(built["p1"].source("sfbb"), built["p2"].source("sfbb"));
}

#[test]
fn intermediate_serializes_as_plain_object() {
    let built = build(&source_table()).unwrap();
    let value = serde_json::to_value(&built["p2"]).unwrap();
    assert_eq!(
        value,
        json!({
            "crosswalk": {"prism_id": "p2", "mlbam_id": "605141"},
            "chadwick": {"key_mlbam": "605141", "name_first": "Mookie", "name_last": "Betts"},
            "sfbb": {}
        })
    );
}
