//! カテゴリ表
//!
//! 短いコード（ファイル名に使う）と表示ラベルの対応。並び順は定義順。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// カテゴリ定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub code: String,
    pub label: String,
}

impl Category {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self { code: code.into(), label: label.into() }
    }

    /// 選択肢用の表示（`PF：Personal Foul`）
    pub fn display_name(&self) -> String {
        format!("{}：{}", self.code, self.label)
    }
}

/// コード → ラベルの固定表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTable {
    entries: Vec<Category>,
}

impl CategoryTable {
    /// 重複コードは後勝ち
    pub fn new(entries: Vec<Category>) -> Self {
        let mut table = Self { entries: Vec::new() };
        for entry in entries {
            table.insert(entry);
        }
        table
    }

    fn insert(&mut self, entry: Category) {
        if let Some(existing) = self.entries.iter_mut().find(|c| c.code == entry.code) {
            existing.label = entry.label;
        } else {
            self.entries.push(entry);
        }
    }

    pub fn get(&self, code: &str) -> Option<&Category> {
        self.entries.iter().find(|c| c.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// ラベルを解決（未知のコードはエラー）
    pub fn label(&self, code: &str) -> Result<&str> {
        self.get(code)
            .map(|c| c.label.as_str())
            .ok_or_else(|| Error::UnknownCategory(code.to_string()))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|c| c.code.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `PF：Personal Foul` 形式の表示からコードを取り出す
    pub fn code_from_display<'a>(&self, display: &'a str) -> Option<&'a str> {
        let code = display.split('：').next()?.trim();
        if self.contains(code) {
            Some(code)
        } else {
            None
        }
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(vec![
            Category::new("PF", "Personal Foul"),
            Category::new("FS", "False Start"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = CategoryTable::default();
        assert_eq!(table.len(), 2);
        assert_eq!(table.label("PF").unwrap(), "Personal Foul");
        assert_eq!(table.label("FS").unwrap(), "False Start");
        assert!(matches!(table.label("XX"), Err(Error::UnknownCategory(_))));
    }

    #[test]
    fn test_duplicate_code_last_wins() {
        let table = CategoryTable::new(vec![
            Category::new("PF", "Old"),
            Category::new("PI", "Pass Interference"),
            Category::new("PF", "Personal Foul"),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.label("PF").unwrap(), "Personal Foul");
        assert_eq!(table.codes().collect::<Vec<_>>(), vec!["PF", "PI"]);
    }

    #[test]
    fn test_display_round_trip() {
        let table = CategoryTable::default();
        let display = table.get("FS").unwrap().display_name();
        assert_eq!(display, "FS：False Start");
        assert_eq!(table.code_from_display(&display), Some("FS"));
        assert_eq!(table.code_from_display("ZZ：Nope"), None);
    }

    #[test]
    fn test_serde_as_array() {
        let table = CategoryTable::default();
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.starts_with('['));
        let back: CategoryTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
