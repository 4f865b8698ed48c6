//! yt-dlp 連携モジュール
//!
//! 動画をダウンロードし、標準出力の進捗行を逐次パースして呼び出し元に通知する。
//! 成功したときだけカタログに登録する。

use super::catalog::VideoCatalog;
use crate::error::{FrameTagError, Result};
use frame_tagger_common::VideoEntry;
use regex::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

const UNKNOWN_TITLE: &str = "unknown_title";
/// これ未満の進捗変化は通知しない
const PROGRESS_STEP: f64 = 0.005;

/// 進捗イベント
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// 0.0〜1.0
    pub fraction: f64,
    /// `12.3MiB` など
    pub total_size: String,
}

#[derive(Debug, Clone)]
pub struct DownloadedVideo {
    pub video_id: String,
    pub path: PathBuf,
    pub title: String,
    pub total_size: Option<String>,
    /// 既にファイルがあったのでダウンロードしなかった
    pub skipped: bool,
}

/// URL から動画IDを取り出す（`v=` の値、無ければ最後のパス要素）
pub fn video_id_from_url(url: &str) -> String {
    let raw = match url.rsplit_once("v=") {
        Some((_, rest)) => rest.split('&').next().unwrap_or(rest),
        None => url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(url),
    };

    let id: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if id.is_empty() {
        "video".to_string()
    } else {
        id
    }
}

/// `[download]  42.0% of ~12.34MiB ...` 形式の行を解析
pub fn parse_progress_line(line: &str) -> Option<DownloadProgress> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex =
            Regex::new(r"\[download\]\s+(\d{1,3}(?:\.\d+)?)%\s+of\s+~?\s*([\d.]+)([KMG]iB)").unwrap();
    }

    let caps = PROGRESS_RE.captures(line)?;
    let percent: f64 = caps[1].parse().ok()?;
    Some(DownloadProgress {
        fraction: (percent / 100.0).clamp(0.0, 1.0),
        total_size: format!("{}{}", &caps[2], &caps[3]),
    })
}

pub struct Downloader {
    program: String,
    cookies_from_browser: Option<String>,
}

impl Downloader {
    pub fn new(program: impl Into<String>, cookies_from_browser: Option<String>) -> Self {
        Self {
            program: program.into(),
            cookies_from_browser,
        }
    }

    fn cookie_args(&self) -> Vec<String> {
        match &self.cookies_from_browser {
            Some(browser) => vec!["--cookies-from-browser".into(), browser.clone()],
            None => Vec::new(),
        }
    }

    /// タイトル取得（失敗時は `unknown_title`）
    pub async fn fetch_title(&self, url: &str) -> String {
        let output = Command::new(&self.program)
            .args(self.cookie_args())
            .args(["--skip-download", "--print", "title", url])
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            Ok(out) => {
                tracing::warn!(code = ?out.status.code(), "タイトル取得に失敗");
                UNKNOWN_TITLE.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "タイトル取得コマンドを起動できません");
                UNKNOWN_TITLE.to_string()
            }
        }
    }

    /// 動画をダウンロードしてカタログに登録
    ///
    /// 既に `videos/<id>.mp4` があればダウンロードしない。
    /// 終了コードが0以外なら `DownloadFailed` を返し、カタログは変更しない。
    pub async fn download<F>(
        &self,
        url: &str,
        catalog: &mut VideoCatalog,
        mut on_progress: F,
    ) -> Result<DownloadedVideo>
    where
        F: FnMut(&DownloadProgress),
    {
        let video_id = video_id_from_url(url);
        let filename = format!("{}.mp4", video_id);
        let path = catalog.video_dir().join(&filename);

        if path.is_file() {
            tracing::info!(path = %path.display(), "動画は既に存在するためダウンロードをスキップ");
            let title = match catalog.get(&video_id) {
                Some(entry) => entry.title.clone(),
                None => {
                    catalog.upsert(
                        video_id.clone(),
                        VideoEntry {
                            title: video_id.clone(),
                            video_url: url.to_string(),
                            filename: filename.clone(),
                        },
                    );
                    catalog.save()?;
                    video_id.clone()
                }
            };
            on_progress(&DownloadProgress { fraction: 1.0, total_size: String::new() });
            return Ok(DownloadedVideo { video_id, path, title, total_size: None, skipped: true });
        }

        std::fs::create_dir_all(catalog.video_dir())?;
        let title = self.fetch_title(url).await;
        tracing::debug!(%title, %video_id, "ダウンロード開始");

        let mut child = Command::new(&self.program)
            .args(self.cookie_args())
            .args(["-f", "best", "--newline", "-o"])
            .arg(&path)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FrameTagError::DownloadFailed(format!("{} を起動できません: {}", self.program, e)))?;

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        let mut last_fraction = 0.0;
        let mut total_size = None;
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                if let Some(progress) = parse_progress_line(&line) {
                    total_size = Some(progress.total_size.clone());
                    if progress.fraction - last_fraction >= PROGRESS_STEP {
                        on_progress(&progress);
                        last_fraction = progress.fraction;
                    }
                } else {
                    tracing::trace!(line = %line, "yt-dlp");
                }
            }
        }

        let status = child.wait().await?;
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(FrameTagError::DownloadFailed(format!(
                "{} failed (code {:?}): {}",
                self.program,
                status.code(),
                stderr.trim()
            )));
        }

        catalog.upsert(
            video_id.clone(),
            VideoEntry {
                title: title.clone(),
                video_url: url.to_string(),
                filename,
            },
        );
        catalog.save()?;

        on_progress(&DownloadProgress {
            fraction: 1.0,
            total_size: total_size.clone().unwrap_or_default(),
        });

        Ok(DownloadedVideo { video_id, path, title, total_size, skipped: false })
    }
}
