pub mod app;
pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod store;

pub use app::AppState;
