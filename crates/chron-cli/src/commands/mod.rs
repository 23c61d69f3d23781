pub mod audit;
pub mod config;
pub mod dispatch;
pub mod history;
pub mod log;
pub mod parse;
pub mod purge;
pub mod show;
pub mod templates;
