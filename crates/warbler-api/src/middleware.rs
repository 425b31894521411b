use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use warbler_types::models::User;

use crate::error::{ApiError, unauthorized_redirect};
use crate::state::{AppState, run_blocking};

/// The user bound to this request's session, if any. Inserted into request
/// extensions for every route by [`load_current_user`].
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

/// Resolves the session cookie to a user once per request. A session that
/// points at a deleted user resolves to nobody.
pub async fn load_current_user(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match state.sessions.user_id(&jar) {
        Some(id) => run_blocking(&state, move |s| Ok(s.db.get_user_by_id(id)?))
            .await?
            .map(User::from),
        None => None,
    };

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Gate for every route that needs a logged-in user. Passes the user on as a
/// plain `User` extension.
pub async fn require_user(mut req: Request, next: Next) -> Response {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .and_then(|current| current.0.clone());

    let Some(user) = user else {
        warn!("Unauthorized request to {} {}", req.method(), req.uri().path());
        return unauthorized_redirect(CookieJar::from_headers(req.headers()));
    };

    req.extensions_mut().insert(user);
    next.run(req).await
}
