use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/view", get(handlers::get_view))
        .route("/api/timer", get(handlers::get_timer))
        .route("/activity/start", post(handlers::start_activity))
        .route("/activity/finish", post(handlers::finish_activity))
        .route("/stats/refresh", post(handlers::refresh_stats))
        .route("/settings/:field", post(handlers::update_setting))
        .route("/screen/:name", post(handlers::switch_screen))
        .with_state(state)
}
