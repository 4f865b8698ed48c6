//! Frame Tagger Common Library
//!
//! 台帳・CLI・対話モードで共有される型とユーティリティ

pub mod types;
pub mod category;
pub mod error;
pub mod timestamp;

pub use types::{AnnotationRecord, VideoEntry};
pub use category::{Category, CategoryTable};
pub use error::{Error, Result};
pub use timestamp::Timestamp;
