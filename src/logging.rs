//! ログ初期化
//!
//! `tracing` のログは stderr に出す（stdout は操作者向けの表示に使う）。
//! レベルは環境変数 `FRAME_TAG_LOG` で指定できる:
//! - `FRAME_TAG_LOG=debug` 詳細
//! - `FRAME_TAG_LOG=info` 通常
//! - 未指定時は `warn`（`--verbose` なら `debug`）

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "FRAME_TAG_LOG";

pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;

    tracing::debug!("ログを初期化しました");
    Ok(())
}
