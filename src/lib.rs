pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod guide;
pub mod interactive;
pub mod ledger;
pub mod logging;
pub mod session;
pub mod video;
pub mod workspace;
