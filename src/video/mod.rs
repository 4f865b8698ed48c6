//! 動画まわりの外部ツール連携とカタログ

pub mod catalog;
pub mod downloader;
pub mod frame;

pub use catalog::VideoCatalog;
pub use downloader::{DownloadProgress, DownloadedVideo, Downloader};
pub use frame::{FrameExtractor, FrameInfo, FrameTool};
