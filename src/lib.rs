// Library surface for the binary and the headless/integration tests.
pub mod app_dirs;
pub mod cheat;
pub mod config;
pub mod error;
pub mod metrics;
pub mod record;
pub mod runtime;
pub mod sentences;
pub mod session;
pub mod signing;
pub mod store;
pub mod summary;
pub mod ui;
