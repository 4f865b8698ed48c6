//! ffmpeg / ffprobe 連携
//!
//! - 指定タイムスタンプの1フレームをJPEGで切り出す
//! - 動画の長さ（秒）を取得する

use crate::error::{FrameTagError, Result};
use frame_tagger_common::Timestamp;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

/// 切り出したフレーム
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
}

/// 動画から1フレームを切り出す
pub trait FrameExtractor {
    fn extract_frame(&self, video: &Path, at: Timestamp, output: &Path) -> Result<FrameInfo>;
}

pub struct FrameTool {
    ffmpeg: String,
    ffprobe: String,
    quality: u8,
}

#[derive(Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<serde_json::Value>,
}

impl FrameTool {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>, quality: u8) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            quality,
        }
    }

    /// 1フレームを切り出して画像として読めるか確認
    pub fn extract_frame(&self, video: &Path, at: Timestamp, output: &Path) -> Result<FrameInfo> {
        if !video.is_file() {
            return Err(FrameTagError::FileNotFound(video.display().to_string()));
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let status_output = Command::new(&self.ffmpeg)
            .args(["-loglevel", "error", "-ss"])
            .arg(at.to_string())
            .arg("-i")
            .arg(video)
            .args(["-frames:v", "1", "-q:v"])
            .arg(self.quality.to_string())
            .arg("-y")
            .arg(output)
            .output()
            .map_err(|e| FrameTagError::FrameExtraction(format!("{} を起動できません: {}", self.ffmpeg, e)))?;

        if !status_output.status.success() {
            let stderr = String::from_utf8_lossy(&status_output.stderr);
            return Err(FrameTagError::FrameExtraction(format!(
                "{} failed (code {:?}): {}",
                self.ffmpeg,
                status_output.status.code(),
                stderr.trim()
            )));
        }

        if !output.is_file() {
            return Err(FrameTagError::FrameExtraction(format!(
                "{} @ {} のフレームが出力されませんでした",
                video.display(),
                at
            )));
        }

        let (width, height) = image::image_dimensions(output)
            .map_err(|e| FrameTagError::FrameExtraction(format!("出力画像が読めません: {}", e)))?;
        tracing::debug!(%at, width, height, "フレームを切り出しました");

        Ok(FrameInfo { width, height })
    }

    /// 動画の長さ（秒）
    pub fn probe_duration(&self, video: &Path) -> Result<f64> {
        if !video.is_file() {
            return Err(FrameTagError::FileNotFound(video.display().to_string()));
        }

        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
            .arg(video)
            .output()
            .map_err(|e| FrameTagError::DurationProbe(format!("{} を起動できません: {}", self.ffprobe, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FrameTagError::DurationProbe(format!(
                "{} failed (code {:?}): {}",
                self.ffprobe,
                output.status.code(),
                stderr.trim()
            )));
        }

        parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

impl FrameExtractor for FrameTool {
    fn extract_frame(&self, video: &Path, at: Timestamp, output: &Path) -> Result<FrameInfo> {
        FrameTool::extract_frame(self, video, at, output)
    }
}

/// ffprobe の JSON から format.duration を取り出す（文字列・数値どちらも可）
pub fn parse_probe_duration(json: &str) -> Result<f64> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| FrameTagError::DurationProbe(format!("ffprobe出力のパースに失敗: {}", e)))?;

    let duration = match probe.format.duration {
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        _ => None,
    };

    match duration {
        Some(d) if d.is_finite() && d >= 0.0 => Ok(d),
        _ => Err(FrameTagError::DurationProbe("duration がありません".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_duration_string() {
        let json = r#"{"format": {"duration": "125.480000"}}"#;
        assert!((parse_probe_duration(json).unwrap() - 125.48).abs() < 1e-9);
    }

    #[test]
    fn test_parse_probe_duration_number() {
        let json = r#"{"format": {"duration": 61}}"#;
        assert_eq!(parse_probe_duration(json).unwrap(), 61.0);
    }

    #[test]
    fn test_parse_probe_duration_missing() {
        assert!(parse_probe_duration(r#"{"format": {}}"#).is_err());
        assert!(parse_probe_duration(r#"{"format": {"duration": "N/A"}}"#).is_err());
        assert!(parse_probe_duration("not json").is_err());
    }

    #[test]
    fn test_missing_video_is_reported() {
        let tool = FrameTool::new("ffmpeg", "ffprobe", 2);
        let missing = Path::new("/nonexistent/video.mp4");
        assert!(matches!(tool.probe_duration(missing), Err(FrameTagError::FileNotFound(_))));
        assert!(matches!(
            tool.extract_frame(missing, Timestamp::ZERO, Path::new("/tmp/out.jpg")),
            Err(FrameTagError::FileNotFound(_))
        ));
    }
}
