use axum::Router;

pub mod calendar;
pub mod system;

pub fn router() -> Router {
    Router::new().nest("/api/calendar", calendar::router())
}
