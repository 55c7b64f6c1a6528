use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use warbler_types::api::MessageForm;

use crate::auth::{AppState, db_call};
use crate::middleware::{CurrentUser, RecordId, redirect, unauthorized};
use crate::{home, render};

pub async fn new_message_form(current: CurrentUser, jar: CookieJar) -> Response {
    let Some(user) = current.user() else {
        return unauthorized(jar);
    };
    render::new_message_page(jar, user, &MessageForm::default(), &[])
}

pub async fn create_message(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<MessageForm>,
) -> Result<Response, StatusCode> {
    let Some(user) = current.user() else {
        return Ok(unauthorized(jar));
    };

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(render::new_message_page(jar, user, &form, &errors));
    }

    let user_id = user.id;
    let message = db_call(&state, move |db| db.create_message(user_id, &form.text)).await?;
    info!(user_id, message_id = message.id, "Message created");

    Ok((jar, redirect(&format!("/users/{}", user_id))).into_response())
}

pub async fn show_message(
    State(state): State<AppState>,
    RecordId(message_id): RecordId,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    let viewer_id = current.user().map(|u| u.id);
    let found = db_call(&state, move |db| {
        let Some(message) = db.get_message(message_id)? else {
            return Ok(None);
        };
        let liked = match viewer_id {
            Some(id) => db.liked_message_ids(id)?.contains(&message_id),
            None => false,
        };
        Ok(Some((message, liked)))
    })
    .await?;

    let Some((message, liked)) = found else {
        return Ok(home::not_found_page(jar, current.user()));
    };
    Ok(render::message_page(jar, current.user(), &message, liked))
}

/// Only the author may delete a message.
pub async fn delete_message(
    State(state): State<AppState>,
    RecordId(message_id): RecordId,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    let Some(user) = current.user() else {
        return Ok(unauthorized(jar));
    };

    let Some(message) = db_call(&state, move |db| db.get_message(message_id)).await? else {
        return Ok(home::not_found_page(jar, Some(user)));
    };

    if message.user_id != user.id {
        warn!(user_id = user.id, message_id, "Refused to delete another user's message");
        return Ok(unauthorized(jar));
    }

    db_call(&state, move |db| db.delete_message(message_id)).await?;
    info!(user_id = user.id, message_id, "Message deleted");

    Ok((jar, redirect(&format!("/users/{}", user.id))).into_response())
}
