use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full application router with state attached
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if state.config.security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use axum::routing::post;

    Router::new()
        .route("/signup", post(public::signup))
        .route("/signin", post(public::signin))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{movies, reviews};

    Router::new()
        .route(
            "/movies",
            get(movies::list)
                .post(movies::create)
                .put(movies::update)
                .delete(movies::delete),
        )
        .route("/movies/:movie_id", get(movies::get))
        .route(
            "/review",
            get(reviews::list)
                .post(reviews::create)
                .put(reviews::update)
                .delete(reviews::delete),
        )
        // route_layer so unknown paths still 404 instead of 401
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}
