use crate::error::{FrameTagError, Result};
use frame_tagger_common::CategoryTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const BASE_DIR_ENV: &str = "FRAME_TAG_BASE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 作業ディレクトリ（未設定ならカレント）
    pub base_dir: Option<PathBuf>,
    pub categories: CategoryTable,
    /// 台帳の image フィールドに付ける接頭辞
    pub image_ref_prefix: String,
    pub downloader: String,
    /// yt-dlp の --cookies-from-browser に渡すブラウザ名
    pub cookies_from_browser: Option<String>,
    pub ffmpeg: String,
    pub ffprobe: String,
    /// ffmpeg -q:v（小さいほど高画質）
    pub frame_quality: u8,
    pub include_note_in_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: None,
            categories: CategoryTable::default(),
            image_ref_prefix: "/data/local-files/?d=".into(),
            downloader: "yt-dlp".into(),
            cookies_from_browser: Some("chrome".into()),
            ffmpeg: "ffmpeg".into(),
            ffprobe: "ffprobe".into(),
            frame_quality: 2,
            include_note_in_export: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "設定を読み込みました");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| FrameTagError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("frame-tagger").join("config.json"))
    }

    /// 作業ディレクトリを解決（引数 > 環境変数 > 設定 > カレント）
    pub fn resolve_base_dir(&self, override_dir: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = override_dir {
            return Ok(dir);
        }
        if let Ok(dir) = std::env::var(BASE_DIR_ENV) {
            if !dir.trim().is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }
        match &self.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    pub fn set_base_dir(&mut self, dir: PathBuf) -> Result<()> {
        self.base_dir = Some(dir);
        self.save()
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(FrameTagError::Config("カテゴリが1つも定義されていません".into()));
        }
        for code in self.categories.codes() {
            if code.is_empty() || code.contains(['-', '/', '\\', '.']) {
                return Err(FrameTagError::Config(format!(
                    "カテゴリコードに使えない文字が含まれています: {:?}",
                    code
                )));
            }
        }
        Ok(())
    }
}
