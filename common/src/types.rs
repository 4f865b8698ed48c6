//! 台帳・動画カタログの型定義
//!
//! - AnnotationRecord: タグ付けされた1フレーム
//! - VideoEntry: ダウンロード済み動画のメタデータ
//!
//! JSONのキー名は既存の台帳ファイルと互換。

use serde::{Deserialize, Serialize};

/// アノテーションレコード
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// 画像ロケータ（`/data/local-files/?d=frames/PF/PF-1.jpg` など）
    #[serde(rename = "image")]
    pub image_ref: String,

    /// `<コード>-<N>.jpg`
    pub filename: String,

    #[serde(rename = "video_url")]
    pub source_url: String,

    /// `HH:MM:SS`
    pub timestamp: String,

    #[serde(rename = "category")]
    pub category_code: String,

    /// 作成時に解決したラベル（以後は再解決しない）
    #[serde(rename = "category_full", default)]
    pub category_label: String,

    #[serde(rename = "explanation", default)]
    pub note: String,

    #[serde(rename = "Uploaded", default)]
    pub uploaded: bool,
}

impl AnnotationRecord {
    /// 同じ動画・同じ位置か
    pub fn same_moment(&self, source_url: &str, timestamp: &str) -> bool {
        self.source_url == source_url && self.timestamp == timestamp
    }
}

/// 動画カタログのエントリ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub title: String,
    pub video_url: String,
    /// videos/ 配下のファイル名
    pub filename: String,
}
