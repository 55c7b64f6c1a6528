use std::sync::Arc;

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use warbler_db::{Database, DbError};
use warbler_types::api::{LoginForm, SignupForm};

use crate::middleware::{CurrentUser, redirect};
use crate::{render, session};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub secret_key: String,
}

/// Runs blocking DB work off the async runtime, handing back the raw
/// database result so callers can react to specific errors.
pub async fn db_try<F, T>(state: &AppState, f: F) -> Result<warbler_db::Result<T>, StatusCode>
where
    F: FnOnce(&Database) -> warbler_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Like [`db_try`], with every database error mapped to a 500.
pub async fn db_call<F, T>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    F: FnOnce(&Database) -> warbler_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    db_try(state, f).await?.map_err(|e| {
        error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub async fn signup_form(current: CurrentUser, jar: CookieJar) -> Response {
    render::signup_page(jar, current.user(), &SignupForm::default(), &[])
}

pub async fn signup(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, StatusCode> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(render::signup_page(jar, current.user(), &form, &errors));
    }

    let username = form.username.clone();
    let email = form.email.clone();
    let password = form.password.clone();
    let image_url = form.image_url().map(str::to_string);

    let result = db_try(&state, move |db| {
        db.signup(&username, &email, &password, image_url.as_deref())
    })
    .await?;

    match result {
        Ok(user) => {
            let jar = session::login(jar, &state.secret_key, user.id).map_err(|e| {
                error!("Failed to issue session token: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            Ok((jar, redirect("/")).into_response())
        }
        Err(DbError::Integrity(reason)) => {
            info!("Signup rejected for {}: {}", form.username, reason);
            let jar = session::flash(jar, "danger", "Username already taken");
            Ok(render::signup_page(jar, current.user(), &form, &[]))
        }
        Err(DbError::InvalidPassword) => Ok(render::signup_page(
            jar,
            current.user(),
            &form,
            &["Password is required.".to_string()],
        )),
        Err(e) => {
            error!("Signup failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn login_form(current: CurrentUser, jar: CookieJar) -> Response {
    render::login_page(jar, current.user(), &LoginForm::default(), &[])
}

pub async fn login(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, StatusCode> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(render::login_page(jar, current.user(), &form, &errors));
    }

    let username = form.username.clone();
    let password = form.password.clone();
    let user = db_call(&state, move |db| db.authenticate(&username, &password)).await?;

    let Some(user) = user else {
        let jar = session::flash(jar, "danger", "Invalid credentials.");
        return Ok(render::login_page(jar, current.user(), &form, &[]));
    };

    let jar = session::login(jar, &state.secret_key, user.id).map_err(|e| {
        error!("Failed to issue session token: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let jar = session::flash(jar, "success", format!("Hello, {}!", user.username));
    info!(user_id = user.id, "User logged in");
    Ok((jar, redirect("/")).into_response())
}

pub async fn logout(jar: CookieJar) -> Response {
    let jar = session::logout(jar);
    let jar = session::flash(jar, "success", "You have successfully logged out.");
    (jar, redirect("/login")).into_response()
}
