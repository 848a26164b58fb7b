//! Property-based tests for ledgers, the baseline, and the updater.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::{BTreeSet, HashSet};
use std::fs;

use proptest::prelude::*;
use tempfile::TempDir;

use portledger::core::baseline::{parse_baseline, serialize_baseline, Baseline, BaselineStore};
use portledger::core::ledger::{parse_entries, serialize_ledger, Ledger, LedgerStore};
use portledger::core::paths::RegistryPaths;
use portledger::core::types::{Oid, PackageName};
use portledger::core::version::{LedgerEntry, SchemedVersion, Version, VersionScheme};
use portledger::engine::{update_package, ConsistencyError, LedgerChange, UpdateOptions};

/// Strategy for generating valid hex OIDs.
fn valid_oid_string() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
        ]),
        40,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for generating valid package names.
fn valid_package_name() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}(-[a-z0-9]{1,8}){0,2}"
}

/// Strategy for a version valid under some scheme.
fn schemed_version() -> impl Strategy<Value = SchemedVersion> {
    let text = prop_oneof![
        "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}".prop_map(|t| (VersionScheme::Relaxed, t)),
        (0u32..20, 0u32..20, 0u32..50)
            .prop_map(|(a, b, c)| (VersionScheme::Semver, format!("{a}.{b}.{c}"))),
        (2000u32..2030, 1u32..13, 1u32..29)
            .prop_map(|(y, m, d)| (VersionScheme::Date, format!("{y:04}-{m:02}-{d:02}"))),
        "[a-z][a-z0-9._-]{0,12}".prop_map(|t| (VersionScheme::String, t)),
    ];
    (text, 0u32..5).prop_map(|((scheme, text), rev)| {
        SchemedVersion::parse(scheme, text, rev).expect("strategy yields valid versions")
    })
}

/// Ledger entries with distinct versions and distinct content ids.
fn ledger_entries() -> impl Strategy<Value = Vec<LedgerEntry>> {
    prop::collection::vec((schemed_version(), valid_oid_string()), 1..12).prop_map(|raw| {
        let mut versions = BTreeSet::new();
        let mut trees = BTreeSet::new();
        raw.into_iter()
            .filter(|(v, oid)| {
                versions.insert(v.version.text().to_string()) && trees.insert(oid.clone())
            })
            .map(|(v, oid)| LedgerEntry::new(v, Oid::new(oid).unwrap()))
            .collect()
    })
}

proptest! {
    /// Any ledger survives serialization unchanged.
    #[test]
    fn ledger_serde_roundtrip(entries in ledger_entries()) {
        let ledger = Ledger::from_entries(entries).unwrap();
        let json = serialize_ledger(&ledger).unwrap();
        let parsed = parse_entries(&json).unwrap();
        prop_assert_eq!(parsed.as_slice(), ledger.entries());
    }

    /// Serialized ledgers always carry an explicit port-version.
    #[test]
    fn ledger_always_writes_port_version(entries in ledger_entries()) {
        let count = entries.len();
        let ledger = Ledger::from_entries(entries).unwrap();
        let json = serialize_ledger(&ledger).unwrap();
        prop_assert_eq!(json.matches("\"port-version\"").count(), count);
    }

    /// Any baseline survives serialization unchanged.
    #[test]
    fn baseline_serde_roundtrip(
        packages in prop::collection::btree_map(
            valid_package_name(),
            ("[a-z0-9][a-z0-9.-]{0,10}", 0u32..10),
            0..20,
        )
    ) {
        let mut baseline = Baseline::new();
        for (name, (text, rev)) in &packages {
            baseline.set(name.clone(), Version::new(text.clone(), *rev));
        }
        let json = serialize_baseline(&baseline).unwrap();
        let parsed = parse_baseline(&json).unwrap();
        prop_assert_eq!(parsed, baseline);
    }

    /// The baseline keeps other snapshots it does not own.
    #[test]
    fn baseline_preserves_foreign_snapshots(
        snapshot in "[a-z]{1,10}",
        name in valid_package_name(),
    ) {
        prop_assume!(snapshot != "default");
        let json = format!(
            r#"{{"default": {{}}, "{snapshot}": {{"{name}": {{"baseline": "1", "port-version": 0}}}}}}"#
        );
        let mut baseline = parse_baseline(&json).unwrap();
        baseline.set(name.clone(), Version::new("2", 0));

        let written: serde_json::Value =
            serde_json::from_str(&serialize_baseline(&baseline).unwrap()).unwrap();
        prop_assert_eq!(&written[&snapshot][&name]["baseline"], "1");
        prop_assert_eq!(&written["default"][&name]["baseline"], "2");
    }

    /// Port revision zero is never displayed.
    #[test]
    fn version_display(text in "[a-z0-9.]{1,12}", rev in 0u32..100) {
        let shown = Version::new(text.clone(), rev).to_string();
        if rev == 0 {
            prop_assert_eq!(shown, text);
        } else {
            prop_assert_eq!(shown, format!("{text}#{rev}"));
        }
    }

    /// Valid package names shard by their first character.
    #[test]
    fn package_name_shard(name in valid_package_name()) {
        let package = PackageName::new(name.clone()).unwrap();
        prop_assert_eq!(package.shard(), name.chars().next().unwrap());
        prop_assert_eq!(package.to_string(), name);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever sequence of updates a contributor runs, history stays
    /// well-formed and repeating the last successful update writes nothing.
    #[test]
    fn updater_keeps_history_well_formed(
        steps in prop::collection::vec((0usize..4, 0usize..4, any::<bool>()), 1..16)
    ) {
        let dir = TempDir::new().unwrap();
        let paths = RegistryPaths::new(dir.path().to_path_buf());
        let name = PackageName::new("foo").unwrap();
        let ledgers = LedgerStore::new(&paths);
        let baseline = BaselineStore::new(&paths);

        for (version, tree, overwrite) in steps {
            let desired =
                SchemedVersion::parse(VersionScheme::Relaxed, format!("1.{version}"), 0).unwrap();
            let content_id = Oid::new(format!("{tree}").repeat(40)).unwrap();
            let options = UpdateOptions { overwrite };

            match update_package(&name, &desired, &content_id, &ledgers, &baseline, options) {
                Ok(_) => {
                    let ledger_bytes = fs::read(paths.ledger_path(&name)).unwrap();
                    let baseline_bytes = fs::read(paths.baseline_path()).unwrap();

                    let again =
                        update_package(&name, &desired, &content_id, &ledgers, &baseline, options)
                            .unwrap();
                    prop_assert_eq!(again.ledger, LedgerChange::Unchanged);
                    prop_assert_eq!(fs::read(paths.ledger_path(&name)).unwrap(), ledger_bytes);
                    prop_assert_eq!(fs::read(paths.baseline_path()).unwrap(), baseline_bytes);

                    let recorded = baseline.load().unwrap();
                    prop_assert_eq!(recorded.get("foo"), Some(&desired.version));
                }
                Err(ConsistencyError::UncommittedChange { .. })
                | Err(ConsistencyError::MissingVersionBump { .. }) => {}
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }

            let ledger = ledgers.load(&name).unwrap();
            let mut texts = BTreeSet::new();
            let mut trees = HashSet::new();
            for entry in ledger.entries() {
                prop_assert!(texts.insert(entry.version().text().to_string()));
                prop_assert!(trees.insert(entry.content_id.clone()));
            }
        }
    }
}
