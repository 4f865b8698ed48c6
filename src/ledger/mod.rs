//! アノテーション台帳
//!
//! レコードを挿入順に保持し、カテゴリ別のファイル番号採番・重複検出・
//! 編集時の画像移動を行う。変更のたびに台帳ファイル全体を書き直す。

pub mod index;
pub mod snapshot;

pub use snapshot::ExportOutcome;

use crate::error::{FrameTagError, Result};
use crate::workspace::Workspace;
use frame_tagger_common::{AnnotationRecord, CategoryTable, Timestamp};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// 確定前のアノテーション
#[derive(Debug, Clone)]
pub struct NewAnnotation {
    /// プレビューとして切り出した画像
    pub staged_image: PathBuf,
    pub source_url: String,
    pub timestamp: Timestamp,
    pub category_code: String,
    pub note: String,
}

/// 編集内容（None の項目は変更しない）
#[derive(Debug, Clone, Default)]
pub struct RecordEdit {
    pub category_code: Option<String>,
    pub note: Option<String>,
    pub timestamp: Option<Timestamp>,
    /// 他のレコードと同じ動画・同じタイムスタンプになっても保存
    pub force: bool,
}

/// 削除時の画像ファイルの扱い
#[derive(Debug)]
pub enum ImageRemoval {
    Removed(PathBuf),
    Missing(PathBuf),
    Failed { path: PathBuf, error: String },
}

#[derive(Debug)]
pub struct DeleteOutcome {
    pub record: AnnotationRecord,
    pub image: ImageRemoval,
}

pub struct Ledger {
    workspace: Workspace,
    categories: CategoryTable,
    records: Vec<AnnotationRecord>,
}

impl Ledger {
    /// 台帳ファイルを読み込む（無い・壊れている場合は空）
    pub fn load(workspace: Workspace, categories: CategoryTable) -> Self {
        let records = load_records(&workspace.ledger_path());
        Self { workspace, categories, records }
    }

    /// 台帳ファイルから読み直す
    pub fn reload(&mut self) {
        self.records = load_records(&self.workspace.ledger_path());
    }

    /// 台帳全体を書き出す
    pub fn save(&self) -> Result<()> {
        save_records(&self.workspace.ledger_path(), &self.records)
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: usize) -> Result<&AnnotationRecord> {
        self.records.get(id).ok_or(FrameTagError::RecordNotFound(id + 1))
    }

    /// 表示用の一覧（新しい順）。id は挿入順の位置
    pub fn listing(&self, pending_only: bool) -> Vec<(usize, &AnnotationRecord)> {
        self.records
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, r)| !pending_only || !r.uploaded)
            .collect()
    }

    /// カテゴリの次の番号
    ///
    /// フレームディレクトリに加え、台帳上の同カテゴリのファイル名も見る
    /// （画像が外部で消されていても番号を再利用しない）。
    pub fn next_index(&self, category_code: &str) -> u32 {
        let on_disk = index::max_index_in_dir(&self.workspace.frame_dir(category_code), category_code);
        let in_ledger = self
            .records
            .iter()
            .filter(|r| r.category_code == category_code)
            .filter_map(|r| index::parse_index(&r.filename, category_code))
            .max()
            .unwrap_or(0);
        on_disk.max(in_ledger) + 1
    }

    /// 同じ動画・同じタイムスタンプのレコードがあるか
    pub fn is_duplicate(&self, source_url: &str, timestamp: &str) -> bool {
        self.records.iter().any(|r| r.same_moment(source_url, timestamp))
    }

    /// プレビュー画像を確定してレコードを追加
    ///
    /// 重複があり `force` でなければ何も変更せず `DuplicateAnnotation` を返す。
    /// 画像を移動できなければレコードは作らない。
    pub fn finalize(&mut self, draft: NewAnnotation, force: bool) -> Result<&AnnotationRecord> {
        let label = self.categories.label(&draft.category_code)?.to_string();

        if !draft.staged_image.is_file() {
            return Err(FrameTagError::StagedImageMissing(
                draft.staged_image.display().to_string(),
            ));
        }

        let timestamp = draft.timestamp.to_string();
        if self.is_duplicate(&draft.source_url, &timestamp) {
            if !force {
                return Err(FrameTagError::DuplicateAnnotation {
                    source_url: draft.source_url,
                    timestamp,
                });
            }
            tracing::info!(url = %draft.source_url, %timestamp, "重複を承知で保存します");
        }

        let filename = index::frame_filename(&draft.category_code, self.next_index(&draft.category_code));
        let final_path = self.workspace.frame_path(&draft.category_code, &filename);
        std::fs::create_dir_all(self.workspace.frame_dir(&draft.category_code))?;
        move_file(&draft.staged_image, &final_path).map_err(|e| {
            FrameTagError::ImageRelocation(format!(
                "{} → {}: {}",
                draft.staged_image.display(),
                final_path.display(),
                e
            ))
        })?;

        let record = AnnotationRecord {
            image_ref: self.workspace.image_ref(&draft.category_code, &filename),
            filename,
            source_url: draft.source_url,
            timestamp,
            category_code: draft.category_code,
            category_label: label,
            note: draft.note,
            uploaded: false,
        };
        tracing::debug!(filename = %record.filename, "レコードを追加");

        self.records.push(record);
        self.save()?;
        Ok(&self.records[self.records.len() - 1])
    }

    /// レコードを編集（成功すれば必ず未アップロードに戻る）
    ///
    /// タイムスタンプの変更で他のレコードと重複する場合は、`force` でなければ
    /// 何も変更せず `DuplicateAnnotation` を返す。
    /// カテゴリが変わる場合は新カテゴリで採番し直して画像を移動する。
    /// 移動に失敗したら台帳は変更しない。
    pub fn edit(&mut self, id: usize, changes: RecordEdit) -> Result<&AnnotationRecord> {
        let current = self.get(id)?.clone();
        let mut updated = current.clone();

        let new_timestamp = changes.timestamp.map(|t| t.to_string());
        if let Some(timestamp) = new_timestamp.as_ref().filter(|t| **t != current.timestamp) {
            let clash = self
                .records
                .iter()
                .enumerate()
                .any(|(i, r)| i != id && r.same_moment(&current.source_url, timestamp));
            if clash {
                if !changes.force {
                    return Err(FrameTagError::DuplicateAnnotation {
                        source_url: current.source_url,
                        timestamp: timestamp.clone(),
                    });
                }
                tracing::info!(url = %current.source_url, %timestamp, "重複を承知で修正します");
            }
        }

        if let Some(code) = changes.category_code.filter(|c| *c != current.category_code) {
            let label = self.categories.label(&code)?.to_string();
            let filename = index::frame_filename(&code, self.next_index(&code));
            let from = self.image_path(&current);
            let to = self.workspace.frame_path(&code, &filename);

            std::fs::create_dir_all(self.workspace.frame_dir(&code))?;
            move_file(&from, &to).map_err(|e| {
                FrameTagError::ImageRelocation(format!("{} → {}: {}", from.display(), to.display(), e))
            })?;
            tracing::debug!(from = %current.filename, to = %filename, "カテゴリ変更で画像を移動");

            updated.image_ref = self.workspace.image_ref(&code, &filename);
            updated.filename = filename;
            updated.category_code = code;
            updated.category_label = label;
        }

        if let Some(note) = changes.note {
            updated.note = note;
        }
        if let Some(timestamp) = new_timestamp {
            updated.timestamp = timestamp;
        }
        updated.uploaded = false;

        self.records[id] = updated;
        self.save()?;
        Ok(&self.records[id])
    }

    /// レコードを削除し、画像ファイルも消す
    ///
    /// 画像の削除に失敗しても台帳からは取り除く。
    pub fn delete(&mut self, id: usize) -> Result<DeleteOutcome> {
        self.get(id)?;
        let record = self.records.remove(id);
        let path = self.image_path(&record);

        let image = if !path.exists() {
            ImageRemoval::Missing(path)
        } else {
            match std::fs::remove_file(&path) {
                Ok(()) => ImageRemoval::Removed(path),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "画像の削除に失敗");
                    ImageRemoval::Failed { path, error: e.to_string() }
                }
            }
        };

        self.save()?;
        Ok(DeleteOutcome { record, image })
    }

    /// レコードの画像のローカルパス
    pub fn image_path(&self, record: &AnnotationRecord) -> PathBuf {
        if record.image_ref.is_empty() {
            self.workspace.frame_path(&record.category_code, &record.filename)
        } else {
            self.workspace.resolve_image_ref(&record.image_ref)
        }
    }
}

fn load_records(path: &Path) -> Vec<AnnotationRecord> {
    if !path.exists() {
        return Vec::new();
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "台帳を開けません、空として扱います");
            return Vec::new();
        }
    };

    match serde_json::from_reader(BufReader::new(file)) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "台帳が不正です、空として扱います");
            Vec::new()
        }
    }
}

fn save_records(path: &Path, records: &[AnnotationRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// rename できなければコピー+削除
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !from.is_file() {
                return Err(rename_err);
            }
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)?;
            Ok(())
        }
    }
}
