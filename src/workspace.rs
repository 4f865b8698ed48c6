//! 作業ディレクトリのレイアウト
//!
//! ```text
//! <base>/
//!   videos/               ダウンロード済み動画
//!   videos/video_meta.json
//!   frames/<コード>/      確定したフレーム画像
//!   meta/data.json        台帳
//!   meta/annotation_guide.md
//!   meta/upload/          エクスポートのスナップショット
//!   preview.jpg           確定前のプレビュー
//! ```

use crate::error::Result;
use frame_tagger_common::CategoryTable;
use std::path::{Path, PathBuf};

const LOCAL_FILE_MARKER: &str = "?d=";

#[derive(Debug, Clone)]
pub struct Workspace {
    base_dir: PathBuf,
    image_ref_prefix: String,
}

impl Workspace {
    pub fn new(base_dir: impl Into<PathBuf>, image_ref_prefix: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            image_ref_prefix: image_ref_prefix.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn video_dir(&self) -> PathBuf {
        self.base_dir.join("videos")
    }

    pub fn video_meta_path(&self) -> PathBuf {
        self.video_dir().join("video_meta.json")
    }

    pub fn frame_root(&self) -> PathBuf {
        self.base_dir.join("frames")
    }

    pub fn frame_dir(&self, category_code: &str) -> PathBuf {
        self.frame_root().join(category_code)
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.base_dir.join("meta")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.meta_dir().join("data.json")
    }

    pub fn guide_path(&self) -> PathBuf {
        self.meta_dir().join("annotation_guide.md")
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.meta_dir().join("upload")
    }

    pub fn preview_path(&self) -> PathBuf {
        self.base_dir.join("preview.jpg")
    }

    /// 必要なディレクトリをすべて作成
    pub fn ensure_directories(&self, categories: &CategoryTable) -> Result<()> {
        std::fs::create_dir_all(self.video_dir())?;
        std::fs::create_dir_all(self.frame_root())?;
        std::fs::create_dir_all(self.meta_dir())?;
        for code in categories.codes() {
            std::fs::create_dir_all(self.frame_dir(code))?;
        }
        Ok(())
    }

    /// 台帳に書く画像ロケータ
    pub fn image_ref(&self, category_code: &str, filename: &str) -> String {
        format!("{}frames/{}/{}", self.image_ref_prefix, category_code, filename)
    }

    /// 画像ロケータからローカルパスを復元（`?d=` 以降を作業ディレクトリ相対で解釈）
    pub fn resolve_image_ref(&self, image_ref: &str) -> PathBuf {
        let relative = image_ref
            .rsplit(LOCAL_FILE_MARKER)
            .next()
            .unwrap_or(image_ref)
            .trim_start_matches('/');
        self.base_dir.join(relative)
    }

    pub fn frame_path(&self, category_code: &str, filename: &str) -> PathBuf {
        self.frame_dir(category_code).join(filename)
    }
}
