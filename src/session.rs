//! 1回の対話セッションの状態
//!
//! 現在の動画とプレビューの状態を保持し、各ハンドラに明示的に渡す。
//! プレビューは次の3状態を取る:
//!
//! ```text
//! Empty ──stage──▶ Staged ──confirm──▶ Confirmed
//!   ▲               │  ▲                  │
//!   └───discard─────┘  └──stage───────────┤
//!   └──────────────reset──────────────────┘
//! ```

use crate::error::{FrameTagError, Result};
use crate::ledger::{Ledger, NewAnnotation};
use crate::video::{FrameExtractor, FrameInfo};
use frame_tagger_common::{AnnotationRecord, CategoryTable, Timestamp};
use std::path::{Path, PathBuf};

/// 読み込み中の動画
#[derive(Debug, Clone)]
pub struct CurrentVideo {
    pub video_id: String,
    pub title: String,
    pub path: PathBuf,
    pub source_url: String,
    pub duration_secs: f64,
}

/// 確定待ちのフレーム
#[derive(Debug, Clone)]
pub struct StagedFrame {
    pub path: PathBuf,
    pub timestamp: Timestamp,
    pub category_code: String,
    pub note: String,
    pub frame: FrameInfo,
}

#[derive(Debug, Clone, Default)]
pub enum PreviewState {
    #[default]
    Empty,
    Staged(StagedFrame),
    Confirmed(AnnotationRecord),
}

impl PreviewState {
    pub fn name(&self) -> &'static str {
        match self {
            PreviewState::Empty => "empty",
            PreviewState::Staged(_) => "staged",
            PreviewState::Confirmed(_) => "confirmed",
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionContext {
    video: Option<CurrentVideo>,
    preview: PreviewState,
    /// 重複を承知で保存する（次の confirm の1回だけ有効）
    force_save: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn video(&self) -> Option<&CurrentVideo> {
        self.video.as_ref()
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    pub fn staged(&self) -> Option<&StagedFrame> {
        match &self.preview {
            PreviewState::Staged(staged) => Some(staged),
            _ => None,
        }
    }

    pub fn force_save(&self) -> bool {
        self.force_save
    }

    /// 動画を切り替える（プレビューは破棄）
    pub fn load_video(&mut self, video: CurrentVideo) {
        if let PreviewState::Staged(staged) = &self.preview {
            remove_preview_file(&staged.path);
        }
        tracing::debug!(video_id = %video.video_id, "動画を読み込み");
        self.video = Some(video);
        self.preview = PreviewState::Empty;
        self.force_save = false;
    }

    /// タイムスタンプを検証してからフレームを切り出し、Staged にする
    pub fn stage<E: FrameExtractor>(
        &mut self,
        extractor: &E,
        categories: &CategoryTable,
        preview_path: PathBuf,
        timestamp_input: &str,
        category_code: &str,
        note: &str,
    ) -> Result<&StagedFrame> {
        let video = self
            .video
            .as_ref()
            .ok_or_else(|| FrameTagError::InvalidState("動画が読み込まれていません".into()))?;

        if !categories.contains(category_code) {
            return Err(FrameTagError::UnknownCategory(category_code.to_string()));
        }

        let timestamp = Timestamp::parse_within(timestamp_input, video.duration_secs)?;

        let frame = extractor.extract_frame(&video.path, timestamp, &preview_path)?;

        self.preview = PreviewState::Staged(StagedFrame {
            path: preview_path,
            timestamp,
            category_code: category_code.to_string(),
            note: note.to_string(),
            frame,
        });
        self.force_save = false;

        match &self.preview {
            PreviewState::Staged(staged) => Ok(staged),
            _ => unreachable!(),
        }
    }

    /// 次の confirm で重複チェックを無視する
    pub fn allow_duplicate(&mut self) {
        self.force_save = true;
    }

    /// Staged を台帳に確定して Confirmed にする
    ///
    /// 重複で止まった場合は Staged のまま。
    pub fn confirm(&mut self, ledger: &mut Ledger) -> Result<&AnnotationRecord> {
        let staged = self.staged().cloned().ok_or_else(|| {
            FrameTagError::InvalidState(format!("プレビューがありません（{}）", self.preview.name()))
        })?;
        let video = self
            .video
            .as_ref()
            .ok_or_else(|| FrameTagError::InvalidState("動画が読み込まれていません".into()))?;

        let draft = NewAnnotation {
            staged_image: staged.path,
            source_url: video.source_url.clone(),
            timestamp: staged.timestamp,
            category_code: staged.category_code,
            note: staged.note,
        };

        let record = ledger.finalize(draft, self.force_save)?.clone();
        self.force_save = false;
        self.preview = PreviewState::Confirmed(record);

        match &self.preview {
            PreviewState::Confirmed(record) => Ok(record),
            _ => unreachable!(),
        }
    }

    /// Staged を破棄してプレビュー画像を消す
    pub fn discard(&mut self) -> Result<()> {
        let staged = self
            .staged()
            .cloned()
            .ok_or_else(|| FrameTagError::InvalidState(format!("破棄するプレビューがありません（{}）", self.preview.name())))?;

        remove_preview_file(&staged.path);
        self.preview = PreviewState::Empty;
        self.force_save = false;
        Ok(())
    }

    /// Confirmed から次の入力待ちに戻す
    pub fn reset(&mut self) -> Result<()> {
        match self.preview {
            PreviewState::Confirmed(_) => {
                self.preview = PreviewState::Empty;
                Ok(())
            }
            _ => Err(FrameTagError::InvalidState(format!(
                "確定済みのプレビューがありません（{}）",
                self.preview.name()
            ))),
        }
    }
}

fn remove_preview_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "プレビュー画像を削除できません");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Workspace;
    use tempfile::tempdir;

    /// ffmpeg の代わりにダミーのJPEGバイト列を書く
    struct FakeExtractor;

    impl FrameExtractor for FakeExtractor {
        fn extract_frame(&self, _video: &Path, _at: Timestamp, output: &Path) -> Result<FrameInfo> {
            std::fs::write(output, b"fake jpeg")?;
            Ok(FrameInfo { width: 1280, height: 720 })
        }
    }

    fn setup() -> (tempfile::TempDir, Ledger, SessionContext) {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path(), "/data/local-files/?d=");
        ws.ensure_directories(&CategoryTable::default()).unwrap();
        let ledger = Ledger::load(ws, CategoryTable::default());

        let mut session = SessionContext::new();
        session.load_video(CurrentVideo {
            video_id: "abc".into(),
            title: "Week 1".into(),
            path: dir.path().join("videos/abc.mp4"),
            source_url: "https://www.youtube.com/watch?v=abc".into(),
            duration_secs: 600.0,
        });
        (dir, ledger, session)
    }

    #[test]
    fn test_stage_requires_video() {
        let dir = tempdir().unwrap();
        let mut session = SessionContext::new();
        let result = session.stage(
            &FakeExtractor,
            &CategoryTable::default(),
            dir.path().join("preview.jpg"),
            "00:00:01",
            "PF",
            "",
        );
        assert!(matches!(result, Err(FrameTagError::InvalidState(_))));
    }

    #[test]
    fn test_invalid_timestamp_creates_nothing() {
        let (dir, _ledger, mut session) = setup();
        let preview = dir.path().join("preview.jpg");

        for input in ["abc", "00:10:01", "25:00:00"] {
            let result = session.stage(&FakeExtractor, &CategoryTable::default(), preview.clone(), input, "PF", "");
            assert!(matches!(result, Err(FrameTagError::InvalidTimestamp(_))), "{}", input);
        }
        assert!(!preview.exists());
        assert!(matches!(session.preview(), PreviewState::Empty));
    }

    #[test]
    fn test_stage_confirm_reset() {
        let (dir, mut ledger, mut session) = setup();
        let categories = CategoryTable::default();

        session
            .stage(&FakeExtractor, &categories, dir.path().join("preview.jpg"), "00:01:00", "PF", "ホールディング")
            .unwrap();
        assert_eq!(session.preview().name(), "staged");

        let record = session.confirm(&mut ledger).unwrap();
        assert_eq!(record.filename, "PF-1.jpg");
        assert_eq!(record.note, "ホールディング");
        assert_eq!(session.preview().name(), "confirmed");
        assert_eq!(ledger.len(), 1);

        // Confirmed からもう一度 confirm はできない
        assert!(matches!(session.confirm(&mut ledger), Err(FrameTagError::InvalidState(_))));

        session.reset().unwrap();
        assert_eq!(session.preview().name(), "empty");
        assert!(matches!(session.reset(), Err(FrameTagError::InvalidState(_))));
    }

    #[test]
    fn test_duplicate_stays_staged_until_allowed() {
        let (dir, mut ledger, mut session) = setup();
        let categories = CategoryTable::default();
        let preview = dir.path().join("preview.jpg");

        session.stage(&FakeExtractor, &categories, preview.clone(), "00:00:05", "FS", "").unwrap();
        session.confirm(&mut ledger).unwrap();

        session.stage(&FakeExtractor, &categories, preview.clone(), "00:00:05", "FS", "").unwrap();
        let err = session.confirm(&mut ledger).unwrap_err();
        assert!(err.needs_confirmation());
        assert_eq!(session.preview().name(), "staged");
        assert_eq!(ledger.len(), 1);

        session.allow_duplicate();
        session.confirm(&mut ledger).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(!session.force_save());
    }

    #[test]
    fn test_discard_removes_preview() {
        let (dir, _ledger, mut session) = setup();
        let preview = dir.path().join("preview.jpg");

        session
            .stage(&FakeExtractor, &CategoryTable::default(), preview.clone(), "00:00:00", "PF", "")
            .unwrap();
        assert!(preview.exists());

        session.discard().unwrap();
        assert!(!preview.exists());
        assert!(matches!(session.discard(), Err(FrameTagError::InvalidState(_))));
    }

    #[test]
    fn test_load_video_drops_staged_preview() {
        let (dir, _ledger, mut session) = setup();
        let preview = dir.path().join("preview.jpg");

        session
            .stage(&FakeExtractor, &CategoryTable::default(), preview.clone(), "00:00:03", "PF", "")
            .unwrap();
        session.load_video(CurrentVideo {
            video_id: "def".into(),
            title: "Week 2".into(),
            path: dir.path().join("videos/def.mp4"),
            source_url: "https://www.youtube.com/watch?v=def".into(),
            duration_secs: 300.0,
        });

        assert!(!preview.exists());
        assert_eq!(session.preview().name(), "empty");
        assert_eq!(session.video().unwrap().video_id, "def");
    }
}
