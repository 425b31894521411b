use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::WithRejection;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::{info, warn};
use warbler_db::DbError;
use warbler_types::forms::{FieldErrors, MessageForm, Validate};
use warbler_types::models::{Message, MessageId, User};

use crate::error::{ApiError, unauthorized_redirect};
use crate::flash;
use crate::state::{AppState, run_blocking};
use crate::views::{self, Layout};

/// GET /messages/new
pub async fn new_message_form(Extension(actor): Extension<User>, jar: CookieJar) -> impl IntoResponse {
    let (jar, flashes) = flash::take(jar);
    let page = views::new_message(
        &Layout::new(Some(&actor), &flashes),
        &MessageForm::default(),
        &FieldErrors::default(),
    );
    (jar, page)
}

/// POST /messages/new
pub async fn create_message(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    jar: CookieJar,
    Form(form): Form<MessageForm>,
) -> Result<Response, ApiError> {
    if let Err(errors) = form.validate() {
        let (jar, flashes) = flash::take(jar);
        let page = views::new_message(&Layout::new(Some(&actor), &flashes), &form, &errors);
        return Ok((jar, page).into_response());
    }

    let author = actor.id;
    let text = form.text;
    let message = run_blocking(&state, move |s| {
        Ok(s.db.create_message(author, &text, Utc::now())?)
    })
    .await?;

    info!(message_id = message.id, user_id = author, "Message posted");
    Ok(Redirect::to(&format!("/users/{author}")).into_response())
}

/// GET /messages/{id}
pub async fn show_message(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    WithRejection(Path(id), _): WithRejection<Path<MessageId>, ApiError>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = actor.id;
    let (message, liked) = run_blocking(&state, move |s| {
        let message: Message = s.db.get_message(id)?.ok_or(ApiError::NotFound)?.into();
        let liked = s.db.is_liked_by(id, viewer)?;
        Ok((message, liked))
    })
    .await?;

    let (jar, flashes) = flash::take(jar);
    let page = views::message_show(&Layout::new(Some(&actor), &flashes), &message, liked);
    Ok((jar, page))
}

/// POST /messages/{id}/delete. Only the author may delete; anyone else gets
/// the unauthorized redirect.
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    WithRejection(Path(id), _): WithRejection<Path<MessageId>, ApiError>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let owner = actor.id;
    match run_blocking(&state, move |s| Ok(s.db.delete_message(id, owner)?)).await {
        Ok(()) => Ok(Redirect::to(&format!("/users/{owner}")).into_response()),
        Err(ApiError::Db(DbError::Forbidden)) => {
            warn!(message_id = id, user_id = owner, "Refused to delete another user's message");
            Ok(unauthorized_redirect(jar))
        }
        Err(e) => Err(e),
    }
}
