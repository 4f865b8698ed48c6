use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameTagError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("未知のカテゴリ: {0}")]
    UnknownCategory(String),

    #[error("タイムスタンプが不正です（HH:MM:SS かつ動画の長さ以内）: {0}")]
    InvalidTimestamp(String),

    #[error("同じ動画・同じタイムスタンプのアノテーションが既にあります: {source_url} @ {timestamp}")]
    DuplicateAnnotation { source_url: String, timestamp: String },

    #[error("プレビュー画像が見つかりません: {0}")]
    StagedImageMissing(String),

    #[error("画像の移動に失敗: {0}")]
    ImageRelocation(String),

    /// 表示番号（1始まり）
    #[error("レコードが見つかりません: #{0}")]
    RecordNotFound(usize),

    #[error("動画が見つかりません: {0}")]
    VideoNotFound(String),

    #[error("ダウンロード失敗: {0}")]
    DownloadFailed(String),

    #[error("フレーム切り出し失敗: {0}")]
    FrameExtraction(String),

    #[error("動画の長さを取得できません: {0}")]
    DurationProbe(String),

    #[error("この操作は現在の状態では実行できません: {0}")]
    InvalidState(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),
}

impl From<frame_tagger_common::Error> for FrameTagError {
    fn from(e: frame_tagger_common::Error) -> Self {
        use frame_tagger_common::Error as Common;
        match e {
            Common::Io(e) => FrameTagError::Io(e),
            Common::Json(e) => FrameTagError::JsonParse(e),
            Common::InvalidTimestamp(s) => FrameTagError::InvalidTimestamp(s),
            Common::UnknownCategory(s) => FrameTagError::UnknownCategory(s),
        }
    }
}

impl FrameTagError {
    /// 操作者の確認で続行できるエラーか
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, FrameTagError::DuplicateAnnotation { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameTagError>;
