use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};
use warbler_db::DbError;
use warbler_db::models::NewUser;
use warbler_types::forms::{FieldErrors, LoginForm, SignupForm, Validate};
use warbler_types::models::User;

use crate::error::ApiError;
use crate::flash::{self, Flash, INVALID_CREDENTIALS};
use crate::middleware::CurrentUser;
use crate::state::{AppState, AppStateInner, run_blocking};
use crate::views::{self, Layout};

pub const USERNAME_TAKEN: &str = "Username already taken";

/// Creates a user with a freshly hashed password. A taken username or email
/// comes back as `ApiError::Db(DbError::Duplicate(_))` with nothing written.
pub fn signup_user(state: &AppStateInner, form: &SignupForm) -> Result<User, ApiError> {
    let password_hash = state.passwords.hash(&form.password)?;
    let image_url = form.image_url_or_default();

    let row = state.db.create_user(&NewUser {
        username: form.username.trim(),
        email: form.email.trim(),
        password_hash: &password_hash,
        image_url: &image_url,
    })?;
    Ok(row.into())
}

/// Returns the user only when `password` matches their stored hash. Unknown
/// usernames and wrong passwords both yield `Ok(None)`.
pub fn authenticate(
    state: &AppStateInner,
    username: &str,
    password: &str,
) -> Result<Option<User>, ApiError> {
    let Some(row) = state.db.get_user_by_username(username)? else {
        return Ok(None);
    };

    if state.passwords.verify(password, &row.password) {
        Ok(Some(row.into()))
    } else {
        Ok(None)
    }
}

/// GET /signup. Visiting the form ends any current session.
pub async fn signup_form(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = state.sessions.logout(jar);
    let (jar, flashes) = flash::take(jar);
    let page = views::signup(
        &Layout::new(None, &flashes),
        &SignupForm::default(),
        &FieldErrors::default(),
    );
    (jar, page)
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, ApiError> {
    let jar = state.sessions.logout(jar);
    let (jar, mut flashes) = flash::take(jar);

    if let Err(errors) = form.validate() {
        let page = views::signup(&Layout::new(None, &flashes), &form, &errors);
        return Ok((jar, page).into_response());
    }

    let submitted = form.clone();
    match run_blocking(&state, move |s| signup_user(s, &submitted)).await {
        Ok(user) => {
            info!(user_id = user.id, "Signed up {}", user.username);
            let jar = state.sessions.login(jar, user.id)?;
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(ApiError::Db(DbError::Duplicate(field))) => {
            warn!("Signup rejected: {} already taken", field);
            flashes.push(Flash::danger(USERNAME_TAKEN));
            let page = views::signup(&Layout::new(None, &flashes), &form, &FieldErrors::default());
            Ok((jar, page).into_response())
        }
        Err(e) => Err(e),
    }
}

/// GET /login
pub async fn login_form(
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> impl IntoResponse {
    let (jar, flashes) = flash::take(jar);
    let page = views::login(
        &Layout::new(current.0.as_ref(), &flashes),
        &LoginForm::default(),
        &FieldErrors::default(),
    );
    (jar, page)
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let (jar, mut flashes) = flash::take(jar);

    if let Err(errors) = form.validate() {
        let page = views::login(&Layout::new(current.0.as_ref(), &flashes), &form, &errors);
        return Ok((jar, page).into_response());
    }

    let (username, password) = (form.username.trim().to_string(), form.password.clone());
    let user = run_blocking(&state, move |s| authenticate(s, &username, &password)).await?;

    match user {
        Some(user) => {
            info!(user_id = user.id, "Logged in {}", user.username);
            let jar = state.sessions.login(jar, user.id)?;
            let jar = flash::push(jar, Flash::success(format!("Hello, {}!", user.username)));
            Ok((jar, Redirect::to("/")).into_response())
        }
        None => {
            warn!("Failed login for {}", form.username);
            flashes.push(Flash::danger(INVALID_CREDENTIALS));
            let page = views::login(&Layout::new(current.0.as_ref(), &flashes), &form, &FieldErrors::default());
            Ok((jar, page).into_response())
        }
    }
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    jar: CookieJar,
) -> impl IntoResponse {
    info!(user_id = actor.id, "Logged out {}", actor.username);
    (state.sessions.logout(jar), Redirect::to("/"))
}
