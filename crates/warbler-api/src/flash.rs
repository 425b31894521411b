//! One-shot notices carried across a redirect in a cookie and shown by the
//! next rendered page.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FLASH_COOKIE: &str = "warbler_flash";

pub const ACCESS_UNAUTHORIZED: &str = "Access unauthorized.";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Warning,
    Danger,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: Category,
    pub message: String,
}

impl Flash {
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Category::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Category::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(Category::Danger, message)
    }
}

/// Queues `flash` for the next page, after any already pending.
pub fn push(jar: CookieJar, flash: Flash) -> CookieJar {
    let mut pending = read(&jar);
    pending.push(flash);

    let Ok(json) = serde_json::to_vec(&pending) else {
        return jar;
    };
    let cookie = Cookie::build((FLASH_COOKIE, B64.encode(json)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Drains pending flashes, clearing the cookie if there were any.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Flash>) {
    let pending = read(&jar);
    if pending.is_empty() {
        return (jar, pending);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), pending)
}

fn read(jar: &CookieJar) -> Vec<Flash> {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return Vec::new();
    };
    let decoded = B64
        .decode(cookie.value())
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok());
    decoded.unwrap_or_else(|| {
        debug!("Discarding unreadable flash cookie");
        Vec::new()
    })
}
