use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_url_handler, delete_owner_urls_handler, delete_url_handler, edit_note_handler,
    get_url_handler, health_handler, list_owner_urls_handler, redirect_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        // Only `/{code}` lives at the top level, so every issued code is
        // reachable there.
        Router::new()
            .route("/{code}", get(redirect_handler))
            .nest(
                "/v1",
                Router::new()
                    .route("/health", get(health_handler))
                    .route("/urls", post(create_url_handler))
                    .route(
                        "/urls/{id}",
                        get(get_url_handler)
                            .patch(edit_note_handler)
                            .delete(delete_url_handler),
                    )
                    .route(
                        "/owners/{owner_id}/urls",
                        get(list_owner_urls_handler).delete(delete_owner_urls_handler),
                    ),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
