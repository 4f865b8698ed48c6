//! カテゴリ別ファイル番号の採番
//!
//! `frames/<コード>/` 内の `<コード>-<整数>.jpg` を走査し、最大値+1 を返す。
//! 形式に合わないファイルは無視する。

use std::path::Path;
use walkdir::WalkDir;

const FRAME_EXTENSION: &str = ".jpg";

/// `<コード>-<N>.jpg` なら N を返す
pub fn parse_index(filename: &str, category_code: &str) -> Option<u32> {
    let digits = filename
        .strip_prefix(category_code)?
        .strip_prefix('-')?
        .strip_suffix(FRAME_EXTENSION)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// ディレクトリ内の最大番号（なければ0）
pub fn max_index_in_dir(dir: &Path, category_code: &str) -> u32 {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            parse_index(&name, category_code)
        })
        .max()
        .unwrap_or(0)
}

/// 次に使う番号（1始まり）
pub fn next_index(dir: &Path, category_code: &str) -> u32 {
    max_index_in_dir(dir, category_code) + 1
}

pub fn frame_filename(category_code: &str, index: u32) -> String {
    format!("{}-{}{}", category_code, index, FRAME_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("PF-1.jpg", "PF"), Some(1));
        assert_eq!(parse_index("PF-42.jpg", "PF"), Some(42));
        assert_eq!(parse_index("PF-.jpg", "PF"), None);
        assert_eq!(parse_index("PF-1a.jpg", "PF"), None);
        assert_eq!(parse_index("PF-1.png", "PF"), None);
        assert_eq!(parse_index("FS-1.jpg", "PF"), None);
        assert_eq!(parse_index("PFX-1.jpg", "PF"), None);
        assert_eq!(parse_index("PF-1-2.jpg", "PF"), None);
    }

    #[test]
    fn test_next_index_with_gaps() {
        let dir = tempdir().unwrap();
        for name in ["PF-1.jpg", "PF-2.jpg", "PF-5.jpg"] {
            File::create(dir.path().join(name)).unwrap();
        }
        assert_eq!(next_index(dir.path(), "PF"), 6);
    }

    #[test]
    fn test_next_index_ignores_non_conforming() {
        let dir = tempdir().unwrap();
        for name in ["PF-3.jpg", "PF-99.png", "notes.txt", "PF-final.jpg", "FS-10.jpg"] {
            File::create(dir.path().join(name)).unwrap();
        }
        std::fs::create_dir(dir.path().join("PF-50.jpg.d")).unwrap();
        assert_eq!(next_index(dir.path(), "PF"), 4);
    }

    #[test]
    fn test_next_index_empty_or_missing_dir() {
        let dir = tempdir().unwrap();
        assert_eq!(next_index(dir.path(), "PF"), 1);
        assert_eq!(next_index(&dir.path().join("missing"), "PF"), 1);
    }

    #[test]
    fn test_frame_filename() {
        assert_eq!(frame_filename("FS", 7), "FS-7.jpg");
        assert_eq!(parse_index(&frame_filename("FS", 7), "FS"), Some(7));
    }
}
