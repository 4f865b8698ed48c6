//! 未アップロード分のエクスポート
//!
//! 台帳の `Uploaded=false` のレコードを選び、台帳側をアップロード済みにしてから
//! `meta/upload/export_<日時>.json` に書き出す。
//!
//! 台帳の更新がスナップショット書き込みより先なので、その間で落ちると
//! アップロード済みなのにどのスナップショットにも含まれないレコードが残る。

use super::Ledger;
use crate::error::Result;
use frame_tagger_common::AnnotationRecord;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct ExportOutcome {
    /// 書き出した件数
    pub count: usize,
    /// 0件のときは None
    pub path: Option<PathBuf>,
}

/// スナップショット1件（説明を省けること以外は台帳と同じ形）
#[derive(Serialize)]
struct SnapshotEntry<'a> {
    image: &'a str,
    filename: &'a str,
    video_url: &'a str,
    timestamp: &'a str,
    category: &'a str,
    category_full: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<&'a str>,
    #[serde(rename = "Uploaded")]
    uploaded: bool,
}

impl<'a> SnapshotEntry<'a> {
    fn new(record: &'a AnnotationRecord, include_note: bool) -> Self {
        Self {
            image: &record.image_ref,
            filename: &record.filename,
            video_url: &record.source_url,
            timestamp: &record.timestamp,
            category: &record.category_code,
            category_full: &record.category_label,
            explanation: include_note.then_some(record.note.as_str()),
            uploaded: record.uploaded,
        }
    }
}

impl Ledger {
    pub fn pending_count(&self) -> usize {
        self.records.iter().filter(|r| !r.uploaded).count()
    }

    /// 現在時刻のファイル名でエクスポート
    pub fn export_unuploaded(&mut self, include_note: bool) -> Result<ExportOutcome> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        self.export_unuploaded_as(include_note, &stamp)
    }

    /// `export_<stamp>.json` としてエクスポート
    pub fn export_unuploaded_as(&mut self, include_note: bool, stamp: &str) -> Result<ExportOutcome> {
        let selected: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.uploaded)
            .map(|(i, _)| i)
            .collect();

        if selected.is_empty() {
            return Ok(ExportOutcome { count: 0, path: None });
        }

        for &i in &selected {
            self.records[i].uploaded = true;
        }
        self.save()?;

        let export_dir = self.workspace.upload_dir();
        let entries: Vec<SnapshotEntry> = selected
            .iter()
            .map(|&i| SnapshotEntry::new(&self.records[i], include_note))
            .collect();

        let path = write_snapshot(&export_dir, stamp, &entries).map_err(|e| {
            tracing::error!(
                count = entries.len(),
                error = %e,
                "台帳はアップロード済みに更新済みですが、スナップショットの書き込みに失敗しました"
            );
            e
        })?;

        tracing::info!(path = %path.display(), count = entries.len(), "エクスポート完了");
        Ok(ExportOutcome { count: entries.len(), path: Some(path) })
    }
}

/// 既存ファイルは上書きしない（衝突時は `_1`, `_2`, ... を付ける）
fn write_snapshot(dir: &Path, stamp: &str, entries: &[SnapshotEntry]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let mut suffix = 0u32;
    loop {
        let name = if suffix == 0 {
            format!("export_{}.json", stamp)
        } else {
            format!("export_{}_{}.json", stamp, suffix)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => {
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, entries)?;
                writer.flush()?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
