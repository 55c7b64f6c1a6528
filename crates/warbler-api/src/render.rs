//! HTML pages, rendered with plain string formatting.

use std::collections::HashSet;
use std::fmt::Write;

use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use warbler_db::models::{MessageRow, UserRow, UserStats};
use warbler_types::api::{LoginForm, MessageForm, SignupForm, UserEditForm};

use crate::session::{self, Flash};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encodes the characters that could end a CSS `url('...')` early.
pub fn css_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '\'' | '"' | '(' | ')' | '\\' | '<' | '>' => {
                let _ = write!(out, "%{:02X}", c as u32);
            }
            c if c.is_whitespace() || c.is_control() => {
                let mut buf = [0u8; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    let _ = write!(out, "%{:02X}", b);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Wraps `body` in the site layout and consumes pending flash messages.
pub fn page(jar: CookieJar, current: Option<&UserRow>, title: &str, body: &str) -> Response {
    let (jar, flashes) = session::take_flashes(jar);
    (jar, Html(layout(current, &flashes, title, body))).into_response()
}

fn layout(current: Option<&UserRow>, flashes: &[Flash], title: &str, body: &str) -> String {
    let nav = match current {
        Some(user) => format!(
            r#"<li><a href="/users/{id}"><img src="{img}" alt="{name}"></a></li>
        <li><a href="/messages/new">New Message</a></li>
        <li><a href="/logout">Log out</a></li>"#,
            id = user.id,
            img = escape(&user.image_url),
            name = escape(&user.username),
        ),
        None => r#"<li><a href="/signup">Sign up</a></li>
        <li><a href="/login">Log in</a></li>"#
            .to_string(),
    };

    let mut alerts = String::new();
    for f in flashes {
        let _ = write!(
            alerts,
            r#"<div class="alert alert-{}">{}</div>"#,
            escape(&f.category),
            escape(&f.message)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
</head>
<body>
  <nav class="navbar">
    <a href="/" class="navbar-brand">Warbler</a>
    <form action="/users" class="navbar-form">
      <input name="q" placeholder="Search Warbler">
    </form>
    <ul class="nav">
        {nav}
    </ul>
  </nav>
  <div class="container">
    {alerts}
    {body}
  </div>
</body>
</html>"#,
        title = escape(title),
    )
}

// -- Fragments --

fn errors_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape(e)))
        .collect();
    format!(r#"<ul class="form-errors">{items}</ul>"#)
}

fn input(name: &str, kind: &str, placeholder: &str, value: &str) -> String {
    format!(
        r#"<input type="{kind}" name="{name}" placeholder="{placeholder}" value="{value}">"#,
        value = escape(value),
    )
}

fn user_card(user: &UserRow) -> String {
    let bio = user.bio.as_deref().map(escape).unwrap_or_default();
    format!(
        r#"<div class="card user-card">
      <a href="/users/{id}"><img src="{img}" alt="Image for {name}"></a>
      <a href="/users/{id}"><p>@{name}</p></a>
      <p class="card-bio">{bio}</p>
    </div>"#,
        id = user.id,
        img = escape(&user.image_url),
        name = escape(&user.username),
    )
}

fn users_grid(users: &[UserRow], empty: &str) -> String {
    if users.is_empty() {
        return format!(r#"<h3 class="text-center">{}</h3>"#, escape(empty));
    }
    let cards: String = users.iter().map(user_card).collect();
    format!(r#"<div class="user-grid">{cards}</div>"#)
}

/// `liked` is `None` for anonymous viewers and for the viewer's own messages,
/// which get no like button.
fn message_item(message: &MessageRow, liked: Option<bool>) -> String {
    let when = message
        .created_at()
        .map(|ts| ts.format("%d %B %Y").to_string())
        .unwrap_or_default();

    let like_button = match liked {
        Some(liked) => format!(
            r#"<form method="POST" action="/users/add_like/{id}" class="messages-like">
          <button class="{class}">&#9733;</button>
        </form>"#,
            id = message.id,
            class = if liked { "liked" } else { "not-liked" },
        ),
        None => String::new(),
    };

    format!(
        r#"<li class="message">
      <a href="/messages/{id}" class="message-link"></a>
      <a href="/users/{uid}"><img src="{img}" alt="" class="timeline-image"></a>
      <div class="message-area">
        <a href="/users/{uid}">@{name}</a>
        <span class="text-muted">{when}</span>
        <p>{text}</p>
      </div>
      {like_button}
    </li>"#,
        id = message.id,
        uid = message.user_id,
        img = escape(&message.author_image_url),
        name = escape(&message.author_username),
        text = escape(&message.text),
    )
}

fn messages_list(
    messages: &[MessageRow],
    viewer: Option<&UserRow>,
    liked: &HashSet<i64>,
) -> String {
    let items: String = messages
        .iter()
        .map(|m| {
            let like_state = viewer
                .filter(|v| v.id != m.user_id)
                .map(|_| liked.contains(&m.id));
            message_item(m, like_state)
        })
        .collect();
    format!(r#"<ul class="list-group messages">{items}</ul>"#)
}

/// Profile header with the follow/unfollow or edit control.
fn profile_header(
    user: &UserRow,
    stats: &UserStats,
    viewer: Option<&UserRow>,
    following: bool,
) -> String {
    let action = match viewer {
        Some(v) if v.id == user.id => r#"<a href="/users/profile" class="btn">Edit Profile</a>
      <form method="POST" action="/users/delete"><button class="btn btn-danger">Delete Profile</button></form>"#
            .to_string(),
        Some(_) if following => format!(
            r#"<form method="POST" action="/users/stop-following/{}"><button class="btn btn-primary">Unfollow</button></form>"#,
            user.id
        ),
        Some(_) => format!(
            r#"<form method="POST" action="/users/follow/{}"><button class="btn btn-outline-primary">Follow</button></form>"#,
            user.id
        ),
        None => String::new(),
    };

    format!(
        r#"<div class="profile">
    <div class="header-image" style="background-image: url('{header}')"></div>
    <img src="{img}" alt="Image for {name}" class="profile-avatar">
    <h4>@{name}</h4>
    <p>{bio}</p>
    <p class="user-location">{location}</p>
    <ul class="user-stats">
      <li><a href="/users/{id}">Messages <span>{messages}</span></a></li>
      <li><a href="/users/{id}/following">Following <span>{following_count}</span></a></li>
      <li><a href="/users/{id}/followers">Followers <span>{followers}</span></a></li>
      <li><a href="/users/{id}/likes">Likes <span>{likes}</span></a></li>
    </ul>
    {action}
  </div>"#,
        id = user.id,
        header = escape(&css_url(&user.header_image_url)),
        img = escape(&user.image_url),
        name = escape(&user.username),
        bio = user.bio.as_deref().map(escape).unwrap_or_default(),
        location = user.location.as_deref().map(escape).unwrap_or_default(),
        messages = stats.messages,
        following_count = stats.following,
        followers = stats.followers,
        likes = stats.likes,
    )
}

// -- Pages --

pub fn home_anon(jar: CookieJar) -> Response {
    page(
        jar,
        None,
        "Warbler",
        r#"<div class="home-hero">
    <h1>What's Happening?</h1>
    <h4>New to Warbler?</h4>
    <a href="/signup" class="btn btn-primary">Sign up now</a>
  </div>"#,
    )
}

pub fn home_page(
    jar: CookieJar,
    user: &UserRow,
    stats: &UserStats,
    messages: &[MessageRow],
    liked: &HashSet<i64>,
) -> Response {
    let body = format!(
        r#"<aside class="user-aside">
    <a href="/users/{id}"><img src="{img}" alt="Image for {name}"></a>
    <a href="/users/{id}"><p>@{name}</p></a>
    <ul class="user-stats">
      <li><a href="/users/{id}">Messages <span>{messages}</span></a></li>
      <li><a href="/users/{id}/following">Following <span>{following}</span></a></li>
      <li><a href="/users/{id}/followers">Followers <span>{followers}</span></a></li>
    </ul>
  </aside>
  <div class="timeline">{timeline}</div>"#,
        id = user.id,
        img = escape(&user.image_url),
        name = escape(&user.username),
        messages = stats.messages,
        following = stats.following,
        followers = stats.followers,
        timeline = messages_list(messages, Some(user), liked),
    );
    page(jar, Some(user), "Warbler", &body)
}

pub fn signup_page(
    jar: CookieJar,
    current: Option<&UserRow>,
    form: &SignupForm,
    errors: &[String],
) -> Response {
    let body = format!(
        r#"<h2 class="join-message">Join Warbler today.</h2>
  {errors}
  <form method="POST" action="/signup" id="user_form">
    {username}
    {email}
    {password}
    {image_url}
    <button class="btn btn-primary">Sign me up!</button>
  </form>"#,
        errors = errors_list(errors),
        username = input("username", "text", "Username", &form.username),
        email = input("email", "text", "E-mail", &form.email),
        password = input("password", "password", "Password", ""),
        image_url = input(
            "image_url",
            "text",
            "(Optional) Image URL",
            form.image_url.as_deref().unwrap_or_default()
        ),
    );
    page(jar, current, "Sign up", &body)
}

pub fn login_page(
    jar: CookieJar,
    current: Option<&UserRow>,
    form: &LoginForm,
    errors: &[String],
) -> Response {
    let body = format!(
        r#"<h2 class="join-message">Welcome back.</h2>
  {errors}
  <form method="POST" action="/login" id="user_form">
    {username}
    {password}
    <button class="btn btn-primary">Log in</button>
  </form>"#,
        errors = errors_list(errors),
        username = input("username", "text", "Username", &form.username),
        password = input("password", "password", "Password", ""),
    );
    page(jar, current, "Log in", &body)
}

pub fn edit_profile_page(
    jar: CookieJar,
    current: &UserRow,
    form: &UserEditForm,
    errors: &[String],
) -> Response {
    let body = format!(
        r#"<h2 class="join-message">Edit Your Profile.</h2>
  {errors}
  <form method="POST" action="/users/profile" id="user_form">
    {username}
    {email}
    {image_url}
    {header_image_url}
    {bio}
    {location}
    <p>To confirm changes, enter your password:</p>
    {password}
    <button class="btn btn-success">Edit this user!</button>
    <a href="/users/{id}" class="btn btn-outline-secondary">Cancel</a>
  </form>"#,
        id = current.id,
        errors = errors_list(errors),
        username = input("username", "text", "Username", &form.username),
        email = input("email", "text", "E-mail", &form.email),
        image_url = input(
            "image_url",
            "text",
            "(Optional) Image URL",
            form.image_url.as_deref().unwrap_or_default()
        ),
        header_image_url = input(
            "header_image_url",
            "text",
            "(Optional) Header Image URL",
            form.header_image_url.as_deref().unwrap_or_default()
        ),
        bio = input(
            "bio",
            "text",
            "(Optional) Tell us about yourself",
            form.bio.as_deref().unwrap_or_default()
        ),
        location = input(
            "location",
            "text",
            "(Optional) Location",
            form.location.as_deref().unwrap_or_default()
        ),
        password = input("password", "password", "Password", ""),
    );
    page(jar, Some(current), "Edit Profile", &body)
}

pub fn users_index(
    jar: CookieJar,
    current: Option<&UserRow>,
    users: &[UserRow],
    search: Option<&str>,
) -> Response {
    let empty = match search {
        Some(term) => format!("Sorry, no users found for \"{}\"", term),
        None => "Sorry, no users found".to_string(),
    };
    page(jar, current, "Users", &users_grid(users, &empty))
}

pub fn user_profile(
    jar: CookieJar,
    current: Option<&UserRow>,
    user: &UserRow,
    stats: &UserStats,
    following: bool,
    messages: &[MessageRow],
    liked: &HashSet<i64>,
) -> Response {
    let body = format!(
        "{}\n  {}",
        profile_header(user, stats, current, following),
        messages_list(messages, current, liked)
    );
    page(jar, current, &format!("@{}", user.username), &body)
}

/// The following / followers pages.
pub fn user_list(
    jar: CookieJar,
    current: &UserRow,
    user: &UserRow,
    stats: &UserStats,
    following: bool,
    title: &str,
    users: &[UserRow],
) -> Response {
    let body = format!(
        "{}\n  <h3>{}</h3>\n  {}",
        profile_header(user, stats, Some(current), following),
        escape(title),
        users_grid(users, "Nobody here yet.")
    );
    page(jar, Some(current), title, &body)
}

pub fn likes_page(
    jar: CookieJar,
    current: &UserRow,
    user: &UserRow,
    stats: &UserStats,
    following: bool,
    messages: &[MessageRow],
    liked: &HashSet<i64>,
) -> Response {
    let body = format!(
        "{}\n  <h3>Likes</h3>\n  {}",
        profile_header(user, stats, Some(current), following),
        messages_list(messages, Some(current), liked)
    );
    page(jar, Some(current), "Likes", &body)
}

pub fn new_message_page(
    jar: CookieJar,
    current: &UserRow,
    form: &MessageForm,
    errors: &[String],
) -> Response {
    let body = format!(
        r#"{errors}
  <form method="POST" action="/messages/new">
    <textarea name="text" placeholder="What's happening?" maxlength="140">{text}</textarea>
    <button class="btn btn-outline-success">Add my message!</button>
  </form>"#,
        errors = errors_list(errors),
        text = escape(&form.text),
    );
    page(jar, Some(current), "New Message", &body)
}

pub fn message_page(
    jar: CookieJar,
    current: Option<&UserRow>,
    message: &MessageRow,
    liked: bool,
) -> Response {
    let is_owner = current.is_some_and(|u| u.id == message.user_id);
    let control = if is_owner {
        format!(
            r#"<form method="POST" action="/messages/{}/delete"><button class="btn btn-outline-danger">Delete</button></form>"#,
            message.id
        )
    } else {
        String::new()
    };
    let like_state = current.filter(|_| !is_owner).map(|_| liked);

    let body = format!(
        r#"<div class="message-detail">
    <ul class="list-group">{item}</ul>
    {control}
  </div>"#,
        item = message_item(message, like_state),
    );
    page(jar, current, "Message", &body)
}

pub fn not_found(jar: CookieJar, current: Option<&UserRow>) -> Response {
    page(
        jar,
        current,
        "Not Found",
        r#"<h1>404</h1>
  <p>Sorry, we couldn't find that page.</p>
  <a href="/">Go home</a>"#,
    )
}
