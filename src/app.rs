//! 作業ディレクトリ・台帳・カタログ・外部ツールをまとめたハンドル

use crate::config::Config;
use crate::error::{FrameTagError, Result};
use crate::guide;
use crate::ledger::{DeleteOutcome, ImageRemoval, Ledger};
use crate::session::CurrentVideo;
use crate::video::{DownloadedVideo, Downloader, FrameTool, VideoCatalog};
use crate::workspace::Workspace;
use frame_tagger_common::AnnotationRecord;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

pub struct App {
    pub config: Config,
    pub workspace: Workspace,
    pub ledger: Ledger,
    pub catalog: VideoCatalog,
    pub downloader: Downloader,
    pub frames: FrameTool,
}

impl App {
    /// ディレクトリを用意し、台帳とカタログを読み込む
    pub fn open(config: Config, base_dir: PathBuf) -> Result<Self> {
        config.validate()?;

        let workspace = Workspace::new(base_dir, config.image_ref_prefix.clone());
        workspace.ensure_directories(&config.categories)?;

        let ledger = Ledger::load(workspace.clone(), config.categories.clone());
        let catalog = VideoCatalog::load(&workspace.video_meta_path(), &workspace.video_dir())?;
        let downloader = Downloader::new(config.downloader.clone(), config.cookies_from_browser.clone());
        let frames = FrameTool::new(config.ffmpeg.clone(), config.ffprobe.clone(), config.frame_quality);

        tracing::debug!(
            base_dir = %workspace.base_dir().display(),
            records = ledger.len(),
            videos = catalog.len(),
            "作業ディレクトリを開きました"
        );

        Ok(Self { config, workspace, ledger, catalog, downloader, frames })
    }

    /// 進捗バー付きでダウンロード
    pub async fn download(&mut self, url: &str) -> Result<DownloadedVideo> {
        let bar = ProgressBar::new(1000);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {percent:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        let result = self
            .downloader
            .download(url, &mut self.catalog, |p| {
                bar.set_position((p.fraction * 1000.0).round() as u64);
                if !p.total_size.is_empty() {
                    bar.set_message(format!("of {}", p.total_size));
                }
            })
            .await;

        match &result {
            Ok(video) if video.skipped => bar.finish_with_message("既に存在するためスキップ"),
            Ok(_) => bar.finish_with_message("完了"),
            Err(_) => bar.abandon_with_message("失敗"),
        }
        result
    }

    /// カタログの動画（ID またはタイトル）を読み込み、長さを調べる
    pub fn open_video(&self, key: &str) -> Result<CurrentVideo> {
        let (video_id, entry) = self
            .catalog
            .lookup(key)
            .ok_or_else(|| FrameTagError::VideoNotFound(key.to_string()))?;
        let path = self.catalog.video_path(entry);
        let duration_secs = self.frames.probe_duration(&path)?;

        Ok(CurrentVideo {
            video_id: video_id.to_string(),
            title: entry.title.clone(),
            path,
            source_url: entry.video_url.clone(),
            duration_secs,
        })
    }

    pub fn guide(&self) -> Result<String> {
        guide::load_guide(&self.workspace.guide_path())
    }
}

/// 一覧の1行
pub fn record_line(id: usize, record: &AnnotationRecord) -> String {
    format!(
        "#{:<3} {} - {} [{}] {}",
        id + 1,
        record.timestamp,
        record.filename,
        record.category_code,
        if record.uploaded { "✅ アップロード済み" } else { "❌ 未アップロード" }
    )
}

pub fn print_record_detail(id: usize, record: &AnnotationRecord, image: &std::path::Path) {
    println!("#{} {}", id + 1, record.filename);
    println!("  カテゴリ: {} ({})", record.category_code, record.category_label);
    println!("  タイムスタンプ: {}", record.timestamp);
    println!("  説明: {}", record.note);
    println!("  動画: {}", record.source_url);
    println!(
        "  画像: {}{}",
        image.display(),
        if image.exists() { "" } else { " ⚠ 見つかりません" }
    );
    println!(
        "  アップロード: {}",
        if record.uploaded { "✅ 済み" } else { "❌ 未" }
    );
}

pub fn report_delete(outcome: &DeleteOutcome) {
    println!("✔ 削除しました: {}", outcome.record.filename);
    match &outcome.image {
        ImageRemoval::Removed(path) => println!("  画像を削除: {}", path.display()),
        ImageRemoval::Missing(path) => println!("  画像は既にありません: {}", path.display()),
        ImageRemoval::Failed { path, error } => {
            println!("⚠ 画像の削除に失敗: {} ({})", path.display(), error)
        }
    }
}

/// 表示用の番号（1始まり）を台帳の位置に変換
pub fn record_id_from_display(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .ok_or(FrameTagError::RecordNotFound(number))
}
