use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::{StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use warbler_db::models::UserRow;

use crate::auth::{AppState, db_call};
use crate::{home, session};

/// The logged-in user for this request, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<UserRow>);

impl CurrentUser {
    pub fn user(&self) -> Option<&UserRow> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default())
    }
}

/// A numeric id taken from the path. Anything that does not parse gets the
/// 404 page, the same as an unknown route.
#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for RecordId {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(RecordId(id)),
            Err(rejection) => {
                debug!("Rejected path id: {}", rejection);
                let current = parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default();
                let jar = CookieJar::from_headers(&parts.headers);
                Err(home::not_found_page(jar, current.user()))
            }
        }
    }
}

/// Resolve the session cookie to a user before any handler runs. A forged
/// token or one naming a deleted user leaves the request anonymous.
pub async fn load_user(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = match session::session_user_id(&jar, &state.secret_key) {
        Some(id) => db_call(&state, move |db| db.get_user(id)).await?,
        None => None,
    };

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// A plain 302, the status browsers and form posts expect.
pub fn redirect(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}

/// Bounce to the home page with the unauthorized notice.
pub fn unauthorized(jar: CookieJar) -> Response {
    let jar = session::flash(jar, "danger", "Access unauthorized.");
    (jar, redirect("/")).into_response()
}
