//! 未アップロード分エクスポートの統合テスト

use frame_tagger::ledger::{Ledger, NewAnnotation};
use frame_tagger::workspace::Workspace;
use frame_tagger_common::{CategoryTable, Timestamp};
use serde_json::Value;
use std::path::Path;
use tempfile::tempdir;

fn open(dir: &Path) -> Ledger {
    let ws = Workspace::new(dir, "/data/local-files/?d=");
    ws.ensure_directories(&CategoryTable::default()).unwrap();
    Ledger::load(ws, CategoryTable::default())
}

fn add(ledger: &mut Ledger, ts: &str, note: &str) {
    let staged = ledger.workspace().preview_path();
    std::fs::write(&staged, b"jpeg").unwrap();
    let draft = NewAnnotation {
        staged_image: staged,
        source_url: "https://www.youtube.com/watch?v=xyz".to_string(),
        timestamp: Timestamp::parse(ts).unwrap(),
        category_code: "PF".to_string(),
        note: note.to_string(),
    };
    ledger.finalize(draft, false).unwrap();
}

fn read_snapshot(path: &Path) -> Vec<Value> {
    let raw = std::fs::read_to_string(path).expect("スナップショットが読めない");
    serde_json::from_str(&raw).expect("スナップショットがJSONではない")
}

#[test]
fn test_export_marks_pending_and_writes_snapshot() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut ledger = open(dir.path());
    add(&mut ledger, "00:00:01", "one");
    add(&mut ledger, "00:00:02", "two");
    add(&mut ledger, "00:00:03", "three");

    let outcome = ledger.export_unuploaded_as(true, "20260301_120000").unwrap();
    assert_eq!(outcome.count, 3);

    let path = outcome.path.expect("スナップショットのパスが無い");
    assert_eq!(path, dir.path().join("meta/upload/export_20260301_120000.json"));

    let entries = read_snapshot(&path);
    let notes: Vec<&str> = entries.iter().map(|e| e["explanation"].as_str().unwrap()).collect();
    assert_eq!(notes, vec!["one", "two", "three"]);
    assert!(entries.iter().all(|e| e["Uploaded"] == Value::Bool(true)));
    assert_eq!(entries[0]["category"], "PF");
    assert_eq!(entries[0]["category_full"], "Personal Foul");
    assert_eq!(entries[0]["image"], "/data/local-files/?d=frames/PF/PF-1.jpg");

    assert_eq!(ledger.pending_count(), 0);
    let reloaded = open(dir.path());
    assert!(reloaded.records().iter().all(|r| r.uploaded));
}

/// 2回目は新しいレコードだけ
#[test]
fn test_second_export_only_new_records() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut ledger = open(dir.path());
    add(&mut ledger, "00:00:01", "");
    ledger.export_unuploaded_as(true, "20260301_120000").unwrap();

    let empty = ledger.export_unuploaded_as(true, "20260301_120001").unwrap();
    assert_eq!(empty.count, 0);
    assert!(empty.path.is_none());
    assert!(!dir.path().join("meta/upload/export_20260301_120001.json").exists());

    add(&mut ledger, "00:00:05", "late");
    let outcome = ledger.export_unuploaded_as(true, "20260301_120002").unwrap();
    assert_eq!(outcome.count, 1);
    let entries = read_snapshot(&outcome.path.unwrap());
    assert_eq!(entries[0]["timestamp"], "00:00:05");
}

/// 説明なしのエクスポートは explanation キーを含まない
#[test]
fn test_export_without_note() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut ledger = open(dir.path());
    add(&mut ledger, "00:00:01", "secret");

    let outcome = ledger.export_unuploaded_as(false, "20260301_120000").unwrap();
    let entries = read_snapshot(&outcome.path.unwrap());

    assert!(entries[0].get("explanation").is_none());
    assert_eq!(entries[0]["filename"], "PF-1.jpg");
    // 台帳側の説明は残る
    assert_eq!(ledger.get(0).unwrap().note, "secret");
}

/// 同名のスナップショットは上書きしない
#[test]
fn test_export_name_collision_gets_suffix() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut ledger = open(dir.path());
    let upload = dir.path().join("meta/upload");
    std::fs::create_dir_all(&upload).unwrap();
    std::fs::write(upload.join("export_20260301_120000.json"), "[]").unwrap();

    add(&mut ledger, "00:00:01", "");
    let outcome = ledger.export_unuploaded_as(true, "20260301_120000").unwrap();

    assert_eq!(outcome.path.unwrap(), upload.join("export_20260301_120000_1.json"));
    let original = std::fs::read_to_string(upload.join("export_20260301_120000.json")).unwrap();
    assert_eq!(original, "[]");
}
