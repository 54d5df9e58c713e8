use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::today).post(handlers::create_today))
        .route("/healthz", get(handlers::health))
        .route("/auth/login", get(handlers::login_page).post(handlers::login))
        .route("/auth/register", get(handlers::register_page).post(handlers::register))
        .route("/auth/logout", get(handlers::logout))
        .route("/calendar", get(handlers::calendar))
        .route("/calendar/:date", get(handlers::day))
        .route("/calendar/:date/create", post(handlers::create_entry))
        .route("/calendar/:date/update", post(handlers::update_entry))
        .route("/calendar/:date/delete", post(handlers::delete_entry))
        .route("/me", get(handlers::profile))
        .route("/admin", get(handlers::admin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
