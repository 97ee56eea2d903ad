//! Whole cycles over the file-backed source into the SQLite store.

use invsweep::engine::db_ops::active_references;
use invsweep::engine::{EntityHandler, Registry, SqliteStore};
use invsweep::source::{FileSource, RuleParser};
use invsweep::{EntityType, Opts, run_single_cycle};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::rc::Rc;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn fixture(root: &Path) {
    write(
        root,
        "accounts.json",
        r#"[{"id": "111", "master": true}, {"id": "222"}, {"id": "333"}]"#,
    );
    write(root, "regions.json", r#"["r1", "r2"]"#);
    write(root, "333/.denied", "");
    write(
        root,
        "111/r1/instances.jsonl",
        "{\"id\": \"i-1\", \"nics\": [{\"id\": \"eni-1\"}]}\n{\"id\": \"i-2\"}\n",
    );
    write(root, "222/r2/instances.json", r#"[{"id": "i-3"}]"#);
    write(root, "222/r2/floating_ips.json", r#"[{"id": "ip-1"}]"#);
}

fn opts(root: &Path) -> Opts {
    let mut instances = EntityType::new("instances")
        .with_limit(2)
        .with_related(&["floating_ips"]);
    instances
        .rules
        .nested
        .insert("nics".into(), "network_adapters".into());
    Opts {
        inventory_name: "cloud".into(),
        source_dir: Some(root.to_path_buf()),
        entity_types: vec![instances, EntityType::new("floating_ips").related_only()],
        ..Opts::default()
    }
}

fn cycle(root: &Path, db: &Path) {
    let source = Rc::new(FileSource::new(root));
    let registry =
        Registry::new().with_fallback(EntityHandler::new(source.clone(), Rc::new(RuleParser)));
    let store = SqliteStore::open(db, 1000).unwrap();
    let outcome = run_single_cycle(&opts(root), &registry, source, Box::new(store)).unwrap();
    assert!(outcome.error().is_none(), "{:?}", outcome.error());
}

fn active(db: &Path, collection: &str) -> Vec<String> {
    let store = SqliteStore::from_connection(Connection::open(db).unwrap(), 1);
    active_references(store.conn(), "cloud", "default", collection).unwrap()
}

#[test]
fn test_cycle_populates_every_collection() {
    let src = tempfile::tempdir().unwrap();
    let db = tempfile::tempdir().unwrap();
    let db = db.path().join("inv.db");
    fixture(src.path());

    cycle(src.path(), &db);

    assert_eq!(active(&db, "instances"), vec!["i-1", "i-2", "i-3"]);
    assert_eq!(active(&db, "network_adapters"), vec!["eni-1"]);
    assert_eq!(active(&db, "floating_ips"), vec!["ip-1"]);
}

#[test]
fn test_second_cycle_sweeps_vanished_resources() {
    let src = tempfile::tempdir().unwrap();
    let db = tempfile::tempdir().unwrap();
    let db = db.path().join("inv.db");
    fixture(src.path());
    cycle(src.path(), &db);

    write(src.path(), "111/r1/instances.jsonl", "{\"id\": \"i-2\"}\n");
    fs::remove_file(src.path().join("222/r2/floating_ips.json")).unwrap();
    cycle(src.path(), &db);

    assert_eq!(active(&db, "instances"), vec!["i-2", "i-3"]);
    // No part touched these collections this time, so they were not swept.
    assert_eq!(active(&db, "network_adapters"), vec!["eni-1"]);
    assert_eq!(active(&db, "floating_ips"), vec!["ip-1"]);
}

#[test]
fn test_cycle_with_no_records_sweeps_nothing() {
    let src = tempfile::tempdir().unwrap();
    let db = tempfile::tempdir().unwrap();
    let db = db.path().join("inv.db");
    fixture(src.path());
    cycle(src.path(), &db);

    for rel in [
        "111/r1/instances.jsonl",
        "222/r2/instances.json",
        "222/r2/floating_ips.json",
    ] {
        fs::remove_file(src.path().join(rel)).unwrap();
    }
    cycle(src.path(), &db);

    assert_eq!(active(&db, "instances"), vec!["i-1", "i-2", "i-3"]);
}
