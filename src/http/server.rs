//! Main router configuration assembling the tenant OAuth endpoints.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::{
    context::AppState,
    handler_oauth_clients::{
        delete_client_handler, get_client_handler, register_client_handler,
        update_client_handler,
    },
};

/// Build the application router
pub fn build_router(ctx: AppState) -> Router {
    let mut router = Router::new();

    // Conditionally add client registration endpoints
    if *ctx.config.enable_client_registration.as_ref() {
        let auth_routes = Router::new()
            .route("/register", post(register_client_handler))
            .route(
                "/register/{client_id}",
                get(get_client_handler)
                    .put(update_client_handler)
                    .delete(delete_client_handler),
            );
        router = router.nest("/auth", auth_routes);
    }

    router.layer(TraceLayer::new_for_http()).with_state(ctx)
}
