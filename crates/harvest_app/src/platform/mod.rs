mod app;
mod commands;
mod config;
mod console;
mod effects;
mod logging;

pub use app::run_app;
