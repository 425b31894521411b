use std::collections::HashSet;

use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::WithRejection;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, warn};
use warbler_db::models::MessageRow;
use warbler_db::{Database, DbError};
use warbler_types::forms::{EditProfileForm, FieldErrors, Validate};
use warbler_types::models::{FEED_LIMIT, Message, MessageId, ProfileUpdate, User, UserId, UserStats};

use crate::error::ApiError;
use crate::flash::{self, Flash, INVALID_CREDENTIALS};
use crate::state::{AppState, AppStateInner, run_blocking};
use crate::views::{self, Layout, Profile};

pub const CANNOT_FOLLOW_SELF: &str = "You cannot follow yourself.";
pub const PROFILE_TAKEN: &str = "Username or email already taken.";

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Owned form of [`Profile`], loaded off the runtime.
struct LoadedProfile {
    user: User,
    stats: UserStats,
    is_following: Option<bool>,
}

impl LoadedProfile {
    fn load(db: &Database, id: UserId, viewer: Option<UserId>) -> Result<Self, ApiError> {
        let user: User = db.find_user(id)?.into();
        let stats = db.user_stats(id)?;
        let is_following = match viewer {
            Some(viewer) if viewer != id => Some(db.is_following(viewer, id)?),
            _ => None,
        };
        Ok(Self { user, stats, is_following })
    }

    fn view(&self) -> Profile<'_> {
        Profile {
            user: &self.user,
            stats: self.stats,
            is_following: self.is_following,
        }
    }
}

fn messages_with_likes(
    db: &Database,
    rows: Vec<MessageRow>,
    viewer: UserId,
) -> Result<(Vec<Message>, HashSet<MessageId>), ApiError> {
    let liked = db.liked_message_ids(viewer)?;
    Ok((rows.into_iter().map(Message::from).collect(), liked))
}

/// Checks `password` against the actor's stored hash, then applies `update`.
pub fn edit_profile(
    state: &AppStateInner,
    actor: UserId,
    password: &str,
    update: &ProfileUpdate,
) -> Result<User, ApiError> {
    let row = state.db.find_user(actor)?;
    if !state.passwords.verify(password, &row.password) {
        return Err(ApiError::InvalidCredentials);
    }
    Ok(state.db.update_profile(actor, update)?.into())
}

/// GET /users?q=
pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    Query(search): Query<SearchQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let q = search.q;
    let needle = q.clone();
    let users: Vec<User> = run_blocking(&state, move |s| {
        Ok(s.db
            .search_users(needle.as_deref())?
            .into_iter()
            .map(User::from)
            .collect())
    })
    .await?;

    let (jar, flashes) = flash::take(jar);
    let page = views::users_index(&Layout::new(Some(&actor), &flashes), &users, q.as_deref());
    Ok((jar, page))
}

/// GET /users/{id}
pub async fn show_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    WithRejection(Path(id), _): WithRejection<Path<UserId>, ApiError>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = actor.id;
    let (profile, messages, liked) = run_blocking(&state, move |s| {
        let profile = LoadedProfile::load(&s.db, id, Some(viewer))?;
        let rows = s.db.messages_by_user(id, FEED_LIMIT)?;
        let (messages, liked) = messages_with_likes(&s.db, rows, viewer)?;
        Ok((profile, messages, liked))
    })
    .await?;

    let (jar, flashes) = flash::take(jar);
    let layout = Layout::new(Some(&actor), &flashes);
    let page = views::user_show(&layout, &profile.view(), &messages, &liked);
    Ok((jar, page))
}

/// GET /users/{id}/following
pub async fn show_following(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    WithRejection(Path(id), _): WithRejection<Path<UserId>, ApiError>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = actor.id;
    let (profile, users) = run_blocking(&state, move |s| {
        let profile = LoadedProfile::load(&s.db, id, Some(viewer))?;
        let users: Vec<User> = s.db.following_of(id)?.into_iter().map(User::from).collect();
        Ok((profile, users))
    })
    .await?;

    let (jar, flashes) = flash::take(jar);
    let page = views::following(&Layout::new(Some(&actor), &flashes), &profile.view(), &users);
    Ok((jar, page))
}

/// GET /users/{id}/followers
pub async fn show_followers(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    WithRejection(Path(id), _): WithRejection<Path<UserId>, ApiError>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = actor.id;
    let (profile, users) = run_blocking(&state, move |s| {
        let profile = LoadedProfile::load(&s.db, id, Some(viewer))?;
        let users: Vec<User> = s.db.followers_of(id)?.into_iter().map(User::from).collect();
        Ok((profile, users))
    })
    .await?;

    let (jar, flashes) = flash::take(jar);
    let page = views::followers(&Layout::new(Some(&actor), &flashes), &profile.view(), &users);
    Ok((jar, page))
}

/// GET /users/{id}/likedmessages
pub async fn show_liked_messages(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    WithRejection(Path(id), _): WithRejection<Path<UserId>, ApiError>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = actor.id;
    let (profile, messages, liked) = run_blocking(&state, move |s| {
        let profile = LoadedProfile::load(&s.db, id, Some(viewer))?;
        let rows = s.db.liked_messages(id)?;
        let (messages, liked) = messages_with_likes(&s.db, rows, viewer)?;
        Ok((profile, messages, liked))
    })
    .await?;

    let (jar, flashes) = flash::take(jar);
    let layout = Layout::new(Some(&actor), &flashes);
    let page = views::liked_messages(&layout, &profile.view(), &messages, &liked);
    Ok((jar, page))
}

/// POST /users/follow/{id}
pub async fn start_following(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    WithRejection(Path(id), _): WithRejection<Path<UserId>, ApiError>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let follower = actor.id;
    let back = Redirect::to(&format!("/users/{}/following", actor.id));

    match run_blocking(&state, move |s| Ok(s.db.follow(follower, id)?)).await {
        Ok(_) => Ok(back.into_response()),
        Err(ApiError::Db(DbError::SelfFollow)) => {
            let jar = flash::push(jar, Flash::warning(CANNOT_FOLLOW_SELF));
            Ok((jar, back).into_response())
        }
        Err(e) => Err(e),
    }
}

/// POST /users/stop-following/{id}
pub async fn stop_following(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    WithRejection(Path(id), _): WithRejection<Path<UserId>, ApiError>,
) -> Result<Redirect, ApiError> {
    let follower = actor.id;
    run_blocking(&state, move |s| Ok(s.db.unfollow(follower, id)?)).await?;
    Ok(Redirect::to(&format!("/users/{}/following", actor.id)))
}

fn prefilled(user: &User) -> EditProfileForm {
    EditProfileForm {
        username: user.username.clone(),
        email: user.email.clone(),
        image_url: user.image_url.clone(),
        header_image_url: user.header_image_url.clone(),
        bio: user.bio.clone().unwrap_or_default(),
        password: String::new(),
    }
}

/// GET /users/profile
pub async fn profile_form(Extension(actor): Extension<User>, jar: CookieJar) -> impl IntoResponse {
    let (jar, flashes) = flash::take(jar);
    let page = views::edit_profile(
        &Layout::new(Some(&actor), &flashes),
        &prefilled(&actor),
        &FieldErrors::default(),
    );
    (jar, page)
}

/// POST /users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    jar: CookieJar,
    Form(form): Form<EditProfileForm>,
) -> Result<Response, ApiError> {
    let (jar, mut flashes) = flash::take(jar);

    if let Err(errors) = form.validate() {
        let page = views::edit_profile(&Layout::new(Some(&actor), &flashes), &form, &errors);
        return Ok((jar, page).into_response());
    }

    let actor_id = actor.id;
    let password = form.password.clone();
    let update = form.to_update();
    match run_blocking(&state, move |s| edit_profile(s, actor_id, &password, &update)).await {
        Ok(user) => {
            info!(user_id = user.id, "Updated profile of {}", user.username);
            Ok(Redirect::to(&format!("/users/{}", user.id)).into_response())
        }
        Err(ApiError::InvalidCredentials) => {
            warn!(user_id = actor_id, "Profile edit with wrong password");
            flashes.push(Flash::danger(INVALID_CREDENTIALS));
            let page = views::edit_profile(&Layout::new(Some(&actor), &flashes), &form, &FieldErrors::default());
            Ok((jar, page).into_response())
        }
        Err(ApiError::Db(DbError::Duplicate(field))) => {
            warn!(user_id = actor_id, "Profile edit rejected: {} already taken", field);
            flashes.push(Flash::danger(PROFILE_TAKEN));
            let page = views::edit_profile(&Layout::new(Some(&actor), &flashes), &form, &FieldErrors::default());
            Ok((jar, page).into_response())
        }
        Err(e) => Err(e),
    }
}

/// POST /users/delete
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<User>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let id = actor.id;
    run_blocking(&state, move |s| Ok(s.db.delete_user(id)?)).await?;
    info!(user_id = id, "Deleted account {}", actor.username);
    Ok((state.sessions.logout(jar), Redirect::to("/signup")))
}
