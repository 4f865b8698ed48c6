//! タイムスタンプ（HH:MM:SS）の解析と範囲チェック
//!
//! 動画内の位置を表す。時は24を超えてもよいが、分・秒は0〜59に限る。

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 動画内の位置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    hours: u32,
    minutes: u32,
    seconds: u32,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { hours: 0, minutes: 0, seconds: 0 };

    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Result<Self> {
        if minutes > 59 || seconds > 59 {
            return Err(Error::InvalidTimestamp(format!(
                "{}:{}:{}",
                hours, minutes, seconds
            )));
        }
        Ok(Self { hours, minutes, seconds })
    }

    /// `HH:MM:SS` 文字列を解析
    ///
    /// 前後の空白は無視する。各フィールドは符号なしの10進整数。
    ///
    /// # Examples
    /// ```
    /// use frame_tagger_common::Timestamp;
    ///
    /// let ts = Timestamp::parse(" 1:02:03 ").unwrap();
    /// assert_eq!(ts.total_seconds(), 3723);
    /// assert_eq!(ts.to_string(), "01:02:03");
    /// assert!(Timestamp::parse("abc").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidTimestamp(input.trim().to_string());

        let parts: Vec<&str> = input.trim().split(':').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut fields = [0u32; 3];
        for (slot, part) in fields.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
        }

        Self::new(fields[0], fields[1], fields[2]).map_err(|_| invalid())
    }

    /// 解析した上で動画の長さ（秒）に収まるか確認
    pub fn parse_within(input: &str, duration_secs: f64) -> Result<Self> {
        let ts = Self::parse(input)?;
        if !ts.is_within(duration_secs) {
            return Err(Error::InvalidTimestamp(format!(
                "{} は動画の長さ {:.1}秒 を超えています",
                ts, duration_secs
            )));
        }
        Ok(ts)
    }

    pub fn from_seconds(total: u64) -> Self {
        let hours = (total / 3600) as u32;
        let minutes = ((total % 3600) / 60) as u32;
        let seconds = (total % 60) as u32;
        Self { hours, minutes, seconds }
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64
    }

    /// 0 ≤ 総秒数 ≤ duration
    pub fn is_within(&self, duration_secs: f64) -> bool {
        self.total_seconds() as f64 <= duration_secs
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
