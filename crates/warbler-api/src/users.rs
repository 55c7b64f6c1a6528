use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use warbler_db::accounts::verify_password;
use warbler_db::models::{UserRow, UserStats, UserUpdate};
use warbler_db::{Database, DbError};
use warbler_types::api::{SearchQuery, UserEditForm, non_empty};

use crate::auth::{AppState, db_call, db_try};
use crate::home::{TIMELINE_LIMIT, not_found_page};
use crate::middleware::{CurrentUser, RecordId, redirect, unauthorized};
use crate::{render, session};

/// A user with their counters, as seen by the viewer.
struct Profile {
    user: UserRow,
    stats: UserStats,
    viewer_follows: bool,
}

fn load_profile(
    db: &Database,
    user_id: i64,
    viewer_id: Option<i64>,
) -> warbler_db::Result<Option<Profile>> {
    let Some(user) = db.get_user(user_id)? else {
        return Ok(None);
    };
    let viewer_follows = match viewer_id {
        Some(viewer) if viewer != user_id => db.is_following(viewer, user_id)?,
        _ => false,
    };
    Ok(Some(Profile {
        stats: db.user_stats(user_id)?,
        user,
        viewer_follows,
    }))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    let term = query.term().map(str::to_string);
    let search = term.clone();
    let users = db_call(&state, move |db| db.list_users(search.as_deref())).await?;

    Ok(render::users_index(jar, current.user(), &users, term.as_deref()))
}

pub async fn show_user(
    State(state): State<AppState>,
    RecordId(user_id): RecordId,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    let viewer_id = current.user().map(|u| u.id);
    let found = db_call(&state, move |db| {
        let Some(profile) = load_profile(db, user_id, viewer_id)? else {
            return Ok(None);
        };
        let messages = db.user_messages(user_id, TIMELINE_LIMIT)?;
        let liked = match viewer_id {
            Some(id) => db.liked_message_ids(id)?,
            None => Default::default(),
        };
        Ok(Some((profile, messages, liked)))
    })
    .await?;

    let Some((profile, messages, liked)) = found else {
        return Ok(not_found_page(jar, current.user()));
    };

    Ok(render::user_profile(
        jar,
        current.user(),
        &profile.user,
        &profile.stats,
        profile.viewer_follows,
        &messages,
        &liked,
    ))
}

pub async fn show_following(
    State(state): State<AppState>,
    RecordId(user_id): RecordId,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    follow_list(state, user_id, current, jar, FollowList::Following).await
}

pub async fn show_followers(
    State(state): State<AppState>,
    RecordId(user_id): RecordId,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    follow_list(state, user_id, current, jar, FollowList::Followers).await
}

#[derive(Clone, Copy)]
enum FollowList {
    Following,
    Followers,
}

async fn follow_list(
    state: AppState,
    user_id: i64,
    current: CurrentUser,
    jar: CookieJar,
    which: FollowList,
) -> Result<Response, StatusCode> {
    let Some(viewer) = current.user() else {
        return Ok(unauthorized(jar));
    };

    let viewer_id = viewer.id;
    let found = db_call(&state, move |db| {
        let Some(profile) = load_profile(db, user_id, Some(viewer_id))? else {
            return Ok(None);
        };
        let users = match which {
            FollowList::Following => db.following(user_id)?,
            FollowList::Followers => db.followers(user_id)?,
        };
        Ok(Some((profile, users)))
    })
    .await?;

    let Some((profile, users)) = found else {
        return Ok(not_found_page(jar, Some(viewer)));
    };

    let title = match which {
        FollowList::Following => "Following",
        FollowList::Followers => "Followers",
    };
    Ok(render::user_list(
        jar,
        viewer,
        &profile.user,
        &profile.stats,
        profile.viewer_follows,
        title,
        &users,
    ))
}

pub async fn show_likes(
    State(state): State<AppState>,
    RecordId(user_id): RecordId,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    let Some(viewer) = current.user() else {
        return Ok(unauthorized(jar));
    };

    let viewer_id = viewer.id;
    let found = db_call(&state, move |db| {
        let Some(profile) = load_profile(db, user_id, Some(viewer_id))? else {
            return Ok(None);
        };
        let messages = db.liked_messages(user_id)?;
        let liked = db.liked_message_ids(viewer_id)?;
        Ok(Some((profile, messages, liked)))
    })
    .await?;

    let Some((profile, messages, liked)) = found else {
        return Ok(not_found_page(jar, Some(viewer)));
    };

    Ok(render::likes_page(
        jar,
        viewer,
        &profile.user,
        &profile.stats,
        profile.viewer_follows,
        &messages,
        &liked,
    ))
}

pub async fn add_follow(
    State(state): State<AppState>,
    RecordId(followed_id): RecordId,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    let Some(user) = current.user() else {
        return Ok(unauthorized(jar));
    };

    let follower_id = user.id;
    let followed = db_call(&state, move |db| {
        if db.get_user(followed_id)?.is_none() {
            return Ok(false);
        }
        db.follow(follower_id, followed_id)?;
        Ok(true)
    })
    .await?;

    if !followed {
        return Ok(not_found_page(jar, Some(user)));
    }
    Ok((jar, redirect(&format!("/users/{}/following", follower_id))).into_response())
}

pub async fn stop_following(
    State(state): State<AppState>,
    RecordId(followed_id): RecordId,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    let Some(user) = current.user() else {
        return Ok(unauthorized(jar));
    };

    let follower_id = user.id;
    db_call(&state, move |db| db.unfollow(follower_id, followed_id)).await?;

    Ok((jar, redirect(&format!("/users/{}/following", follower_id))).into_response())
}

pub async fn edit_profile_form(current: CurrentUser, jar: CookieJar) -> Response {
    let Some(user) = current.user() else {
        return unauthorized(jar);
    };

    let form = UserEditForm {
        username: user.username.clone(),
        email: user.email.clone(),
        image_url: Some(user.image_url.clone()),
        header_image_url: Some(user.header_image_url.clone()),
        bio: user.bio.clone(),
        location: user.location.clone(),
        password: String::new(),
    };
    render::edit_profile_page(jar, user, &form, &[])
}

/// Changes require the current password.
pub async fn edit_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<UserEditForm>,
) -> Result<Response, StatusCode> {
    let Some(user) = current.user() else {
        return Ok(unauthorized(jar));
    };

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(render::edit_profile_page(jar, user, &form, &errors));
    }

    if !verify_password(&user.password, &form.password) {
        let jar = session::flash(jar, "danger", "Wrong password, please try again.");
        return Ok((jar, redirect("/")).into_response());
    }

    let user_id = user.id;
    let username = form.username.clone();
    let email = form.email.clone();
    let image_url = non_empty(form.image_url.as_deref()).map(str::to_string);
    let header_image_url = non_empty(form.header_image_url.as_deref()).map(str::to_string);
    let bio = form.bio.clone();
    let location = form.location.clone();

    let result = db_try(&state, move |db| {
        db.update_user(
            user_id,
            &UserUpdate {
                username: &username,
                email: &email,
                image_url: image_url.as_deref(),
                header_image_url: header_image_url.as_deref(),
                bio: bio.as_deref(),
                location: location.as_deref(),
            },
        )
    })
    .await?;

    match result {
        Ok(_) => {
            info!(user_id, "Profile updated");
            Ok((jar, redirect(&format!("/users/{}", user_id))).into_response())
        }
        Err(DbError::Integrity(_)) => {
            let jar = session::flash(jar, "danger", "Username or email already taken");
            Ok(render::edit_profile_page(jar, user, &form, &[]))
        }
        Err(e) => {
            error!("Profile update failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    let Some(user) = current.user() else {
        return Ok(unauthorized(jar));
    };

    let user_id = user.id;
    db_call(&state, move |db| db.delete_user(user_id)).await?;
    info!(user_id, "User deleted");

    let jar = session::logout(jar);
    Ok((jar, redirect("/signup")).into_response())
}

/// Toggles the current user's like on a message. Users cannot like their own.
pub async fn add_like(
    State(state): State<AppState>,
    RecordId(message_id): RecordId,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, StatusCode> {
    let Some(user) = current.user() else {
        return Ok(unauthorized(jar));
    };

    let Some(message) = db_call(&state, move |db| db.get_message(message_id)).await? else {
        return Ok(not_found_page(jar, Some(user)));
    };

    if message.user_id == user.id {
        return Ok(unauthorized(jar));
    }

    let user_id = user.id;
    let liked = db_call(&state, move |db| db.toggle_like(user_id, message_id)).await?;
    info!(user_id, message_id, liked, "Like toggled");

    Ok((jar, redirect("/")).into_response())
}
