use super::{files::serve_file, health::health, models::AppState};
use axum::{routing::get, Router};

/// Builds the API routes. The file route is only mounted for the local
/// backend; remote objects are reached through signed URLs instead.
pub fn routes(state: AppState, url_prefix: &str) -> Router {
    let mut router = Router::new().route("/health", get(health));

    if state.serves_files() {
        let route = format!("{}/*path", url_prefix.trim_end_matches('/'));
        router = router.route(&route, get(serve_file));
    }

    router.with_state(state)
}
