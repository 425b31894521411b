use std::collections::HashSet;

use axum::{
    Extension,
    extract::State,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use warbler_db::Database;
use warbler_types::models::{FEED_LIMIT, Message, MessageId, User};

use crate::error::ApiError;
use crate::flash;
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_blocking};
use crate::views::{self, Layout};

/// What `/` shows: nothing personal for visitors, otherwise the actor's own
/// messages plus those of everyone they follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeFeed {
    Anonymous,
    Personal {
        messages: Vec<Message>,
        liked: HashSet<MessageId>,
    },
}

pub fn home_feed(db: &Database, actor: Option<&User>) -> Result<HomeFeed, ApiError> {
    let Some(actor) = actor else {
        return Ok(HomeFeed::Anonymous);
    };

    let messages = db
        .home_feed(actor.id, FEED_LIMIT)?
        .into_iter()
        .map(Message::from)
        .collect();
    let liked = db.liked_message_ids(actor.id)?;
    Ok(HomeFeed::Personal { messages, liked })
}

/// GET /
pub async fn homepage(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let actor = current.0;
    let viewer = actor.clone();
    let feed = run_blocking(&state, move |s| home_feed(&s.db, viewer.as_ref())).await?;

    let (jar, flashes) = flash::take(jar);
    let layout = Layout::new(actor.as_ref(), &flashes);
    let page = match feed {
        HomeFeed::Anonymous => views::home_anon(&layout),
        HomeFeed::Personal { messages, liked } => views::home(&layout, &messages, &liked),
    };
    Ok((jar, page))
}

#[cfg(test)]
mod tests {
    use warbler_db::models::NewUser;
    use warbler_types::models::DEFAULT_IMAGE_URL;

    use super::*;

    fn user(db: &Database, name: &str) -> User {
        db.create_user(&NewUser {
            username: name,
            email: &format!("{name}@example.com"),
            password_hash: "h",
            image_url: DEFAULT_IMAGE_URL,
        })
        .unwrap()
        .into()
    }

    #[test]
    fn anonymous_gets_distinct_view() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(home_feed(&db, None).unwrap(), HomeFeed::Anonymous);
    }

    #[test]
    fn following_scenario() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let carol = user(&db, "carol");

        db.create_message(alice.id, "hello world", chrono::Utc::now()).unwrap();
        db.follow(bob.id, alice.id).unwrap();

        let HomeFeed::Personal { messages, liked } = home_feed(&db, Some(&bob)).unwrap() else {
            panic!("expected a personal feed");
        };
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "hello world");
        assert!(liked.is_empty());

        let HomeFeed::Personal { messages, .. } = home_feed(&db, Some(&carol)).unwrap() else {
            panic!("expected a personal feed");
        };
        assert!(messages.is_empty());
    }
}
