use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;
use tracing::{debug, error, warn};
use warbler_db::DbError;

use crate::flash::{self, ACCESS_UNAUTHORIZED, Flash};
use crate::views;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,

    /// No current actor, or the actor may not touch this resource.
    #[error("Access unauthorized")]
    Unauthorized,

    /// Re-authentication with the current password failed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Ids in the path that do not parse as ids name nothing, so they get the
/// 404 page rather than axum's plain-text 400.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!("Unmatched path parameter: {}", rejection.body_text());
        ApiError::NotFound
    }
}

/// Redirects home with "Access unauthorized.", queued after any flashes
/// `jar` already carries.
pub fn unauthorized_redirect(jar: CookieJar) -> Response {
    let jar = flash::push(jar, Flash::danger(ACCESS_UNAUTHORIZED));
    (jar, Redirect::to("/")).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound | ApiError::Db(DbError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, views::not_found()).into_response()
            }
            ApiError::Unauthorized
            | ApiError::InvalidCredentials
            | ApiError::Db(DbError::Forbidden) => {
                // No request jar here, so pending flashes are replaced. Paths
                // that can reach this with flashes queued call
                // `unauthorized_redirect` with their own jar.
                unauthorized_redirect(CookieJar::new())
            }
            ApiError::Db(DbError::Duplicate(field)) => {
                warn!("Unhandled uniqueness conflict on {}", field);
                (StatusCode::CONFLICT, views::server_error()).into_response()
            }
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, views::server_error()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header;

    use super::*;

    fn flash_cookie(res: &Response) -> String {
        res.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(flash::FLASH_COOKIE))
            .expect("flash cookie set")
            .to_string()
    }

    #[test]
    fn unauthorized_redirect_keeps_pending_flashes() {
        let jar = flash::push(CookieJar::new(), Flash::warning("earlier"));
        let res = unauthorized_redirect(jar.clone());
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let cookie = axum_extra::extract::cookie::Cookie::parse(flash_cookie(&res)).unwrap();
        let (_, flashes) = flash::take(CookieJar::new().add(cookie.into_owned()));
        assert_eq!(
            flashes,
            vec![Flash::warning("earlier"), Flash::danger(ACCESS_UNAUTHORIZED)]
        );
    }
}
