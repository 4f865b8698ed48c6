//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use frame_tagger::app::record_id_from_display;
use frame_tagger::config::Config;
use frame_tagger::error::FrameTagError;
use frame_tagger::video::VideoCatalog;
use frame_tagger_common::Timestamp;
use tempfile::tempdir;

/// 0番は存在しない
#[test]
fn test_record_number_zero() {
    assert!(matches!(record_id_from_display(0), Err(FrameTagError::RecordNotFound(0))));
    assert_eq!(record_id_from_display(1).unwrap(), 0);
}

/// 不正なタイムスタンプは共通エラーから変換される
#[test]
fn test_invalid_timestamp_conversion() {
    for input in ["", "12:34", "00:60:00", "aa:bb:cc", "-1:00:00"] {
        let err: FrameTagError = Timestamp::parse(input).unwrap_err().into();
        assert!(matches!(err, FrameTagError::InvalidTimestamp(_)), "{} が受理された", input);
    }

    let err: FrameTagError = Timestamp::parse_within("00:02:00", 90.0).unwrap_err().into();
    assert!(err.to_string().contains("00:02:00"));
}

/// 壊れたカタログは空として扱う
#[test]
fn test_malformed_catalog() {
    let dir = tempdir().expect("Failed to create temp dir");
    let meta = dir.path().join("video_meta.json");
    std::fs::write(&meta, "not json").unwrap();

    let catalog = VideoCatalog::load(&meta, dir.path()).unwrap();
    assert!(catalog.is_empty());
}

/// カテゴリの無い設定は開けない
#[test]
fn test_config_without_categories() {
    let config: Config = serde_json::from_str(r#"{"categories": []}"#).unwrap();
    assert!(matches!(config.validate(), Err(FrameTagError::Config(_))));
}

/// FrameTagErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        FrameTagError::Config("テスト設定エラー".to_string()),
        FrameTagError::FileNotFound("test.jpg".to_string()),
        FrameTagError::UnknownCategory("XX".to_string()),
        FrameTagError::InvalidTimestamp("99:99".to_string()),
        FrameTagError::DuplicateAnnotation {
            source_url: "https://example.com/v".to_string(),
            timestamp: "00:00:01".to_string(),
        },
        FrameTagError::StagedImageMissing("preview.jpg".to_string()),
        FrameTagError::ImageRelocation("a → b".to_string()),
        FrameTagError::RecordNotFound(3),
        FrameTagError::VideoNotFound("abc".to_string()),
        FrameTagError::DownloadFailed("exit 1".to_string()),
        FrameTagError::FrameExtraction("ffmpeg".to_string()),
        FrameTagError::DurationProbe("ffprobe".to_string()),
        FrameTagError::InvalidState("Empty".to_string()),
        FrameTagError::CliExecution("中断".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// 確認で続行できるのは重複だけ
#[test]
fn test_needs_confirmation() {
    let dup = FrameTagError::DuplicateAnnotation {
        source_url: "u".to_string(),
        timestamp: "00:00:01".to_string(),
    };
    assert!(dup.needs_confirmation());
    assert!(!FrameTagError::RecordNotFound(1).needs_confirmation());
    assert!(!FrameTagError::UnknownCategory("XX".to_string()).needs_confirmation());
}
