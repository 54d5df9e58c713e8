pub mod api;
pub mod app;
pub mod calendar;
pub mod config;
pub mod duration;
pub mod errors;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod session;
pub mod state;
pub mod ui;

pub use api::ApiClient;
pub use app::router;
pub use config::Config;
pub use duration::{display_to_interop, parse_duration, Duration, DurationError};
pub use state::AppState;
