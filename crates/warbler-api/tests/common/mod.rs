//! In-process HTTP harness: one app over an in-memory database, and browser
//! stand-ins that keep their own cookies.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use argon2::Params;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use axum_extra::extract::cookie::Cookie;
use http_body_util::BodyExt;
use tower::ServiceExt;
use warbler_api::password::Passwords;
use warbler_api::session::SessionKeys;
use warbler_api::{AppState, AppStateInner};
use warbler_db::Database;
use warbler_types::models::{MessageId, UserId};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            sessions: SessionKeys::new("test-secret", 1, false),
            passwords: Passwords::with_params(Params::new(8, 1, 1, None).unwrap()),
        });
        let static_dir = std::env::temp_dir().join("warbler-test-static");
        let router = warbler_api::router(state.clone(), &static_dir);
        Self { router, state }
    }

    pub fn client(&self) -> Client {
        Client {
            router: self.router.clone(),
            cookies: BTreeMap::new(),
        }
    }

    pub fn user_id(&self, username: &str) -> UserId {
        self.state
            .db
            .get_user_by_username(username)
            .unwrap()
            .unwrap_or_else(|| panic!("no user {username}"))
            .id
    }

    pub fn latest_message_of(&self, username: &str) -> MessageId {
        let id = self.user_id(username);
        self.state.db.messages_by_user(id, 1).unwrap()[0].id
    }

    /// A fresh client already signed up (and so logged in) as `username`.
    pub async fn signed_up(&self, username: &str) -> Client {
        let mut client = self.client();
        let res = client.signup(username, "password1").await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        client
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub cache_control: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn page(&self) -> Option<&str> {
        let start = self.body.find("data-page=\"")? + "data-page=\"".len();
        let end = self.body[start..].find('"')? + start;
        Some(&self.body[start..end])
    }

    pub fn assert_redirect(&self, to: &str) {
        assert_eq!(self.status, StatusCode::SEE_OTHER, "body: {}", self.body);
        assert_eq!(self.location.as_deref(), Some(to));
    }
}

pub struct Client {
    router: Router,
    cookies: BTreeMap<String, String>,
}

impl Client {
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let req = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        self.post_with(uri, form, None).await
    }

    pub async fn post_with(
        &mut self,
        uri: &str,
        form: &[(&str, &str)],
        referer: Option<&str>,
    ) -> TestResponse {
        let mut builder = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(referer) = referer {
            builder = builder.header(header::REFERER, referer);
        }
        let req = builder.body(Body::from(serde_urlencoded::to_string(form).unwrap())).unwrap();
        self.send(req).await
    }

    pub async fn signup(&mut self, username: &str, password: &str) -> TestResponse {
        let email = format!("{username}@example.com");
        self.post(
            "/signup",
            &[
                ("username", username),
                ("email", &email),
                ("password", password),
                ("image_url", ""),
            ],
        )
        .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.post("/login", &[("username", username), ("password", password)])
            .await
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn send(&mut self, req: Request<Body>) -> TestResponse {
        let res = self.router.clone().oneshot(req).await.unwrap();
        self.store_cookies(&res);

        let status = res.status();
        let header_value = |name: header::HeaderName| {
            res.headers()
                .get(name)
                .map(|v| v.to_str().unwrap().to_string())
        };
        let location = header_value(header::LOCATION);
        let cache_control = header_value(header::CACHE_CONTROL);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            location,
            cache_control,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn store_cookies(&mut self, res: &Response<Body>) {
        for value in res.headers().get_all(header::SET_COOKIE) {
            let cookie = Cookie::parse(value.to_str().unwrap().to_string()).unwrap();
            let expired = cookie.max_age().is_some_and(|age| age.is_zero());
            if expired || cookie.value().is_empty() {
                self.cookies.remove(cookie.name());
            } else {
                self.cookies
                    .insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
    }
}
