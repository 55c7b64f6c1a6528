use serde::{Deserialize, Serialize};

/// Longest warble the message form accepts.
pub const MAX_MESSAGE_LEN: usize = 140;

/// Shortest password the signup and login forms accept.
pub const MIN_PASSWORD_LEN: usize = 6;

// -- Session --

/// Claims carried by the signed `curr_user` session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl SignupForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        require(&mut errors, "Username", &self.username);
        require(&mut errors, "E-mail", &self.email);
        if !self.email.trim().is_empty() && !self.email.contains('@') {
            errors.push("Invalid email address.".to_string());
        }
        min_length(&mut errors, "Password", &self.password, MIN_PASSWORD_LEN);
        errors
    }

    pub fn image_url(&self) -> Option<&str> {
        non_empty(self.image_url.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        require(&mut errors, "Username", &self.username);
        min_length(&mut errors, "Password", &self.password, MIN_PASSWORD_LEN);
        errors
    }
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
pub struct UserEditForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub header_image_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl UserEditForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        require(&mut errors, "Username", &self.username);
        require(&mut errors, "E-mail", &self.email);
        require(&mut errors, "Password", &self.password);
        errors
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

impl SearchQuery {
    /// The search term, if one was given and is not blank.
    pub fn term(&self) -> Option<&str> {
        non_empty(self.q.as_deref().map(str::trim))
    }
}

// -- Messages --

#[derive(Debug, Default, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub text: String,
}

impl MessageForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        require(&mut errors, "Text", &self.text);
        if self.text.chars().count() > MAX_MESSAGE_LEN {
            errors.push(format!("Text must be at most {} characters.", MAX_MESSAGE_LEN));
        }
        errors
    }
}

/// Treats blank form fields as absent.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn require(errors: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{} is required.", field));
    }
}

fn min_length(errors: &mut Vec<String>, field: &str, value: &str, min: usize) {
    if value.chars().count() < min {
        errors.push(format!("{} must be at least {} characters.", field, min));
    }
}
