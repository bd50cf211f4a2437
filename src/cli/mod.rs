pub mod actions;
pub mod commands;
pub mod config;
pub mod dispatch;

mod start;
pub use start::start;
