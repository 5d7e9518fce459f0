pub mod aggregate;
pub mod app;
pub mod charts;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod source;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use source::ActivitySource;
pub use state::AppState;
