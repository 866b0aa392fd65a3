pub mod middleware;
pub mod places;
pub mod users;

use crate::state::AppState;
use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

pub fn build_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Place routes; create/update/delete require a Bearer token
        .route("/places/user/{uid}", get(places::get_places_by_user))
        .route(
            "/places/{pid}",
            get(places::get_place)
                .patch(places::update_place)
                .delete(places::delete_place),
        )
        .route("/places", post(places::create_place))
        // User routes
        .route("/users", get(users::list_users))
        .route("/users/signup", post(users::signup))
        .route("/users/login", post(users::login))
        .with_state(state)
}
