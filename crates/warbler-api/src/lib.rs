pub mod auth;
pub mod home;
pub mod messages;
pub mod middleware;
pub mod render;
pub mod session;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::auth::AppState;
use crate::middleware::load_user;

/// Every route sees the current user resolved by [`load_user`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::homepage))
        .route("/signup", get(auth::signup_form).post(auth::signup))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/users", get(users::list_users))
        .route("/users/profile", get(users::edit_profile_form).post(users::edit_profile))
        .route("/users/delete", post(users::delete_user))
        .route("/users/{user_id}", get(users::show_user))
        .route("/users/{user_id}/following", get(users::show_following))
        .route("/users/{user_id}/followers", get(users::show_followers))
        .route("/users/{user_id}/likes", get(users::show_likes))
        .route("/users/follow/{user_id}", post(users::add_follow))
        .route("/users/stop-following/{user_id}", post(users::stop_following))
        .route("/users/add_like/{message_id}", post(users::add_like))
        .route("/messages/new", get(messages::new_message_form).post(messages::create_message))
        .route("/messages/{message_id}", get(messages::show_message))
        .route("/messages/{message_id}/delete", post(messages::delete_message))
        .fallback(home::not_found)
        .layer(axum_middleware::from_fn_with_state(state.clone(), load_user))
        .with_state(state)
}
