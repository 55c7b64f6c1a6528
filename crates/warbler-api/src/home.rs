use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use warbler_db::models::UserRow;

use crate::auth::{AppState, db_call};
use crate::middleware::CurrentUser;
use crate::render;

/// Messages shown on the logged-in home page.
pub const TIMELINE_LIMIT: u32 = 100;

/// Anonymous visitors get the sign-up prompt; logged-in users get the
/// timeline of their own and followed users' warbles.
pub async fn homepage(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    let Some(user) = current.user() else {
        return Ok(render::home_anon(jar));
    };

    let user_id = user.id;
    let (stats, messages, liked) = db_call(&state, move |db| {
        Ok((
            db.user_stats(user_id)?,
            db.timeline(user_id, TIMELINE_LIMIT)?,
            db.liked_message_ids(user_id)?,
        ))
    })
    .await?;

    Ok(render::home_page(jar, user, &stats, &messages, &liked))
}

pub async fn not_found(current: CurrentUser, jar: CookieJar) -> Response {
    not_found_page(jar, current.user())
}

pub fn not_found_page(jar: CookieJar, current: Option<&UserRow>) -> Response {
    (StatusCode::NOT_FOUND, render::not_found(jar, current)).into_response()
}
