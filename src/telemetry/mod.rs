pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

pub fn window() -> LogCtx<ops::window::Window> { LogCtx::new(config::logs_are_json()) }
pub fn merge() -> LogCtx<ops::merge::Merge> { LogCtx::new(config::logs_are_json()) }
