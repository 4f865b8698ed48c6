//! アノテーションガイド（meta/annotation_guide.md）

use crate::error::Result;
use std::path::Path;

pub const DEFAULT_GUIDE: &str = "\
カテゴリは設定ファイル（~/.config/frame-tagger/config.json）の categories で変更できます。

**Pre-Snap**
FS: False Start
IS: Illegal Shift
IM: Illegal Motion
IF: Illegal Formation
OF: Offside/Encroachment
NI: Neutral Zone Infraction
EF: Encroachment
DG: Delay of Game

**Post-Snap**
PI: Pass Interference
HF: Holding (Foul)
IC: Illegal Contact
";

/// ガイドを読み込む。ファイルが無いか空なら既定の内容を書き込んで返す
pub fn load_guide(path: &Path) -> Result<String> {
    let is_empty = match std::fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };

    if is_empty {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, DEFAULT_GUIDE)?;
        tracing::info!(path = %path.display(), "既定のアノテーションガイドを作成しました");
        return Ok(DEFAULT_GUIDE.to_string());
    }

    let content = std::fs::read_to_string(path)?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        Ok(DEFAULT_GUIDE.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}
