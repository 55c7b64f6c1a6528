#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use axum_extra::extract::cookie::Cookie;
use http_body_util::BodyExt;
use tower::ServiceExt;

use warbler_api::auth::{AppState, AppStateInner};
use warbler_api::session::{CURR_USER_KEY, encode_session};
use warbler_db::Database;
use warbler_db::accounts::hash_password;
use warbler_db::models::{NewUser, UserRow};

const SECRET: &str = "test-secret";

pub const PASSWORD: &str = "password";

/// One Argon2 hash of [`PASSWORD`] shared by every seeded user.
fn password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap())
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            secret_key: SECRET.to_string(),
        });
        let router = warbler_api::router(state.clone());
        Self { state, router }
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Inserts a user whose password is [`PASSWORD`].
    pub fn seed_user(&self, username: &str, email: &str) -> UserRow {
        self.db()
            .insert_user(&NewUser {
                username,
                email,
                password_hash: password_hash(),
                image_url: None,
            })
            .unwrap()
    }

    /// A `Cookie` header value that logs in as `user_id`, whether or not it exists.
    pub fn session_for(&self, user_id: i64) -> String {
        format!("{}={}", CURR_USER_KEY, encode_session(SECRET, user_id).unwrap())
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::from(form.to_string())).unwrap()).await
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// GETs the redirect target, carrying `cookie` plus whatever the response set.
    pub async fn follow_redirect(
        &self,
        resp: Response<Body>,
        cookie: Option<&str>,
    ) -> Response<Body> {
        assert_eq!(resp.status(), StatusCode::FOUND);
        let location = location(&resp);
        let cookie = merge_cookies(cookie, &resp);
        self.get(&location, Some(&cookie)).await
    }
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// The cookies a response sets, parsed with their attributes.
pub fn set_cookies(resp: &Response<Body>) -> Vec<Cookie<'static>> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v.to_string()).ok())
        .collect()
}

/// A `Set-Cookie` that clears the cookie rather than storing a value.
fn is_removal(cookie: &Cookie<'_>) -> bool {
    cookie.value().is_empty() || cookie.max_age().is_some_and(|age| age.is_zero())
}

/// Applies the response's `Set-Cookie` headers to a request `Cookie` value.
pub fn merge_cookies(cookie: Option<&str>, resp: &Response<Body>) -> String {
    let mut jar: BTreeMap<String, String> = Cookie::split_parse(cookie.unwrap_or_default())
        .filter_map(Result::ok)
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect();

    for set in set_cookies(resp) {
        if is_removal(&set) {
            jar.remove(set.name());
        } else {
            jar.insert(set.name().to_string(), set.value().to_string());
        }
    }

    jar.iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn sets_cookie(resp: &Response<Body>, name: &str) -> bool {
    set_cookies(resp)
        .iter()
        .any(|c| c.name() == name && !is_removal(c))
}

pub async fn body_text(resp: Response<Body>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
