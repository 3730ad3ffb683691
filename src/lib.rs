// Library half of watchl - exposes the core modules for integration tests

pub mod app;
pub mod command;
pub mod config;
pub mod guarded;
pub mod output;
pub mod refresher;
pub mod services;
pub mod throttle;
pub mod viewer;
