mod common;

use axum::http::StatusCode;

use common::{PASSWORD, TestApp, body_text, location, merge_cookies, set_cookies, sets_cookie};

#[tokio::test]
async fn signup_logs_in() {
    let app = TestApp::new();

    let resp = app
        .post_form(
            "/signup",
            "username=newbie&email=newbie%40test.com&password=secret123&image_url=",
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    assert!(sets_cookie(&resp, "curr_user"));

    let user = app.db().get_user_by_username("newbie").unwrap().unwrap();
    assert_ne!(user.password, "secret123");
    assert_eq!(user.image_url, warbler_db::models::DEFAULT_IMAGE_URL);

    let resp = app.follow_redirect(resp, None).await;
    let body = body_text(resp).await;
    assert!(body.contains("@newbie"));
    assert!(body.contains("timeline"));
}

#[tokio::test]
async fn signup_duplicate_username() {
    let app = TestApp::new();
    app.seed_user("taken", "taken@test.com");

    let resp = app
        .post_form(
            "/signup",
            "username=taken&email=other%40test.com&password=secret123",
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Username already taken"));
    assert_eq!(app.db().list_users(None).unwrap().len(), 1);
}

#[tokio::test]
async fn signup_invalid_form() {
    let app = TestApp::new();

    let resp = app
        .post_form("/signup", "username=&email=bad&password=123", None)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("Username is required."));
    assert!(body.contains("Invalid email address."));
    assert!(body.contains("Password must be at least 6 characters."));
    assert!(app.db().list_users(None).unwrap().is_empty());
}

#[tokio::test]
async fn login_valid() {
    let app = TestApp::new();
    let user = app.seed_user("testuser", "test@test.com");

    let resp = app
        .post_form("/login", &format!("username=testuser&password={PASSWORD}"), None)
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(sets_cookie(&resp, "curr_user"));

    let cookie = merge_cookies(None, &resp);
    let home = app.get("/", Some(&cookie)).await;
    let cookie = merge_cookies(Some(&cookie), &home);
    let body = body_text(home).await;
    assert!(body.contains("Hello, testuser!"));
    assert!(body.contains(&format!("/users/{}", user.id)));

    // flash is shown once
    let body = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(!body.contains("Hello, testuser!"));
    assert!(body.contains(&format!("/users/{}", user.id)));
}

#[tokio::test]
async fn login_invalid() {
    let app = TestApp::new();
    app.seed_user("testuser", "test@test.com");

    let resp = app
        .post_form("/login", "username=testuser&password=notmypassword", None)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!sets_cookie(&resp, "curr_user"));
    assert!(body_text(resp).await.contains("Invalid credentials."));

    let resp = app
        .post_form("/login", "username=notmebruv&password=password", None)
        .await;
    assert!(body_text(resp).await.contains("Invalid credentials."));
}

#[tokio::test]
async fn logout_clears_session() {
    let app = TestApp::new();
    let user = app.seed_user("testuser", "test@test.com");
    let cookie = app.session_for(user.id);

    let resp = app.get("/logout", Some(&cookie)).await;
    assert_eq!(location(&resp), "/login");

    let removed = set_cookies(&resp)
        .into_iter()
        .find(|c| c.name() == "curr_user")
        .unwrap();
    assert_eq!(removed.value(), "");
    assert_eq!(removed.path(), Some("/"));
    assert!(!sets_cookie(&resp, "curr_user"));
    assert!(!merge_cookies(Some(&cookie), &resp).contains("curr_user="));

    let resp = app.follow_redirect(resp, Some(&cookie)).await;
    let body = body_text(resp).await;
    assert!(body.contains("You have successfully logged out."));
    assert!(body.contains(r#"href="/signup""#));
}

#[tokio::test]
async fn homepage_anonymous() {
    let app = TestApp::new();
    let body = body_text(app.get("/", None).await).await;
    assert!(body.contains("Sign up now"));
}

#[tokio::test]
async fn homepage_timeline() {
    let app = TestApp::new();
    let me = app.seed_user("me", "me@test.com");
    let friend = app.seed_user("friend", "friend@test.com");
    let stranger = app.seed_user("stranger", "stranger@test.com");
    app.db().create_message(friend.id, "from a friend").unwrap();
    app.db().create_message(stranger.id, "from a stranger").unwrap();
    app.db().create_message(me.id, "from me").unwrap();
    app.db().follow(me.id, friend.id).unwrap();

    let body = body_text(app.get("/", Some(&app.session_for(me.id))).await).await;
    assert!(body.contains("from a friend"));
    assert!(body.contains("from me"));
    assert!(!body.contains("from a stranger"));
}

#[tokio::test]
async fn edit_profile() {
    let app = TestApp::new();
    let user = app.seed_user("testuser", "test@test.com");
    let cookie = app.session_for(user.id);

    let resp = app.get("/users/profile", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains(r#"value="testuser""#));

    let resp = app
        .post_form(
            "/users/profile",
            &format!("username=renamed&email=test%40test.com&bio=Hi+there&password={PASSWORD}"),
            Some(&cookie),
        )
        .await;
    assert_eq!(location(&resp), format!("/users/{}", user.id));

    let updated = app.db().get_user(user.id).unwrap().unwrap();
    assert_eq!(updated.username, "renamed");
    assert_eq!(updated.bio.as_deref(), Some("Hi there"));
}

#[tokio::test]
async fn edit_profile_wrong_password() {
    let app = TestApp::new();
    let user = app.seed_user("testuser", "test@test.com");
    let cookie = app.session_for(user.id);

    let resp = app
        .post_form(
            "/users/profile",
            "username=renamed&email=test%40test.com&password=wrongpass",
            Some(&cookie),
        )
        .await;
    let resp = app.follow_redirect(resp, Some(&cookie)).await;

    assert!(body_text(resp).await.contains("Wrong password, please try again."));
    assert_eq!(app.db().get_user(user.id).unwrap().unwrap().username, "testuser");
}

#[tokio::test]
async fn edit_profile_requires_login() {
    let app = TestApp::new();
    let resp = app.get("/users/profile", None).await;
    let resp = app.follow_redirect(resp, None).await;
    assert!(body_text(resp).await.contains("Access unauthorized"));
}

#[tokio::test]
async fn delete_account() {
    let app = TestApp::new();
    let user = app.seed_user("testuser", "test@test.com");
    let m = app.db().create_message(user.id, "soon gone").unwrap();
    let cookie = app.session_for(user.id);

    let resp = app.post_form("/users/delete", "", Some(&cookie)).await;
    assert_eq!(location(&resp), "/signup");

    assert!(app.db().get_user(user.id).unwrap().is_none());
    assert!(app.db().get_message(m.id).unwrap().is_none());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::new();
    let resp = app.get("/no/such/page", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_text(resp).await.contains("404"));
}
