use axum::{
    Extension,
    extract::{Path, State},
    http::{HeaderMap, Uri, header},
    response::Redirect,
};
use axum_extra::extract::WithRejection;
use warbler_types::models::{MessageId, User};

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

/// POST /messages/{id}/likedtoggle. Flips the actor's like and sends them
/// back where they came from.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    WithRejection(Path(message_id), _): WithRejection<Path<MessageId>, ApiError>,
    headers: HeaderMap,
) -> Result<Redirect, ApiError> {
    run_blocking(&state, move |s| Ok(s.db.toggle_like(actor.id, message_id)?)).await?;
    Ok(Redirect::to(&back_to(&headers)))
}

/// The local path of the `Referer`, or `/`. Only the path and query are
/// kept, so the redirect never leaves this site.
fn back_to(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Uri>().ok())
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_string()))
        .filter(|path| is_local_path(path))
        .unwrap_or_else(|| "/".to_string())
}

/// A path that stays on this host. Browsers read both `//` and `/\` as the
/// start of a new authority.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !matches!(path.as_bytes().get(1), Some(b'/' | b'\\'))
}
