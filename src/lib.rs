pub mod api;
pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod host;
pub mod models;
pub mod session;
pub mod state;
pub mod stats;
pub mod timer;
pub mod ui;
pub mod view;

pub use app::router;
pub use config::Config;
pub use host::load_identity;
pub use session::{Session, SessionOptions};
pub use state::AppState;
