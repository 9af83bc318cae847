pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod recorder;
