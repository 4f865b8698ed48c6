//! ダウンロード済み動画のカタログ（videos/video_meta.json）
//!
//! 動画ID → {タイトル, URL, ファイル名}。読み込み時に実ファイルが無い
//! エントリを取り除き、変化があれば書き戻す。

use crate::error::Result;
use frame_tagger_common::VideoEntry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct VideoCatalog {
    path: PathBuf,
    video_dir: PathBuf,
    entries: BTreeMap<String, VideoEntry>,
}

impl VideoCatalog {
    /// カタログを読み込み、存在しない動画のエントリを削除
    pub fn load(path: &Path, video_dir: &Path) -> Result<Self> {
        let loaded = read_entries(path);
        let before = loaded.len();

        let entries: BTreeMap<String, VideoEntry> = loaded
            .into_iter()
            .filter(|(id, entry)| {
                let exists = !entry.filename.is_empty() && video_dir.join(&entry.filename).is_file();
                if !exists {
                    tracing::info!(video_id = %id, filename = %entry.filename, "動画ファイルが無いためカタログから削除");
                }
                exists
            })
            .collect();

        let catalog = Self {
            path: path.to_path_buf(),
            video_dir: video_dir.to_path_buf(),
            entries,
        };
        if catalog.entries.len() != before {
            catalog.save()?;
        }
        Ok(catalog)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &self.entries)?;
        writer.flush()?;
        Ok(())
    }

    pub fn upsert(&mut self, video_id: impl Into<String>, entry: VideoEntry) {
        self.entries.insert(video_id.into(), entry);
    }

    pub fn get(&self, video_id: &str) -> Option<&VideoEntry> {
        self.entries.get(video_id)
    }

    /// タイトルで検索（選択肢から選ばれたとき用）
    pub fn find_by_title(&self, title: &str) -> Option<(&str, &VideoEntry)> {
        self.entries
            .iter()
            .find(|(_, e)| e.title == title)
            .map(|(id, e)| (id.as_str(), e))
    }

    /// ID またはタイトルで検索
    pub fn lookup(&self, key: &str) -> Option<(&str, &VideoEntry)> {
        self.entries
            .get_key_value(key)
            .map(|(id, e)| (id.as_str(), e))
            .or_else(|| self.find_by_title(key))
    }

    pub fn video_dir(&self) -> &Path {
        &self.video_dir
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.entries.contains_key(video_id)
    }

    pub fn video_path(&self, entry: &VideoEntry) -> PathBuf {
        self.video_dir.join(&entry.filename)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VideoEntry)> {
        self.entries.iter().map(|(id, e)| (id.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, VideoEntry> {
    if !path.exists() {
        return BTreeMap::new();
    }
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return BTreeMap::new(),
    };
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "動画カタログが不正です、空として扱います");
            BTreeMap::new()
        }
    }
}
