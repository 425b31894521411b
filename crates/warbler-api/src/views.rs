//! Server-rendered pages, built with `maud`. Interpolated values are escaped
//! by the `html!` macro.
//!
//! Each page tags its `<body>` with a `data-page` attribute naming the view,
//! which is what the HTTP tests look for.

use std::collections::HashSet;

use maud::{DOCTYPE, Markup, html};
use warbler_types::forms::{EditProfileForm, FieldErrors, LoginForm, MessageForm, SignupForm};
use warbler_types::models::{MAX_MESSAGE_LEN, Message, MessageId, User, UserStats};

use crate::flash::Flash;

/// Per-request chrome: who is looking, and what notices to show them.
pub struct Layout<'a> {
    pub actor: Option<&'a User>,
    pub flashes: &'a [Flash],
}

impl<'a> Layout<'a> {
    pub fn new(actor: Option<&'a User>, flashes: &'a [Flash]) -> Self {
        Self { actor, flashes }
    }

    fn is_actor(&self, user: &User) -> bool {
        self.actor.is_some_and(|a| a.id == user.id)
    }
}

/// Everything the profile header needs, shared by the profile page and its
/// following/followers/likes tabs.
pub struct Profile<'a> {
    pub user: &'a User,
    pub stats: UserStats,
    /// `None` when the viewer is looking at their own profile.
    pub is_following: Option<bool>,
}

fn page(layout: &Layout<'_>, page_id: &str, title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · Warbler" }
                link rel="stylesheet" href="/static/stylesheets/style.css";
            }
            body data-page=(page_id) {
                nav.navbar {
                    a.navbar-brand href="/" { "Warbler" }
                    (nav_links(layout))
                }
                main.container {
                    @for flash in layout.flashes {
                        div class={ "alert alert-" (flash.category.as_str()) } { (flash.message) }
                    }
                    (body)
                }
            }
        }
    }
}

fn nav_links(layout: &Layout<'_>) -> Markup {
    html! {
        @if let Some(actor) = layout.actor {
            form.navbar-search action="/users" method="GET" {
                input name="q" placeholder="Search Warbler" aria-label="Search users";
            }
            ul.navbar-links {
                li {
                    a href={ "/users/" (actor.id) } {
                        img.avatar-sm src=(actor.image_url) alt=(actor.username);
                        " @" (actor.username)
                    }
                }
                li { a href="/messages/new" { "New Message" } }
                li {
                    form method="POST" action="/logout" {
                        button.btn-link { "Log out" }
                    }
                }
            }
        } @else {
            ul.navbar-links {
                li { a href="/signup" { "Sign up" } }
                li { a href="/login" { "Log in" } }
            }
        }
    }
}

fn field_errors(errors: &FieldErrors, name: &str) -> Markup {
    html! {
        @for e in errors.get(name) {
            span.form-error { (e) }
        }
    }
}

fn input(kind: &str, name: &str, label: &str, value: &str, errors: &FieldErrors) -> Markup {
    html! {
        label for=(name) { (label) }
        input type=(kind) id=(name) name=(name) value=(value);
        (field_errors(errors, name))
    }
}

fn textarea(name: &str, label: &str, value: &str, errors: &FieldErrors) -> Markup {
    html! {
        label for=(name) { (label) }
        textarea id=(name) name=(name) { (value) }
        (field_errors(errors, name))
    }
}

fn message_list(layout: &Layout<'_>, messages: &[Message], liked: &HashSet<MessageId>) -> Markup {
    html! {
        @if messages.is_empty() {
            p.empty { "No messages yet." }
        } @else {
            ul.messages {
                @for m in messages {
                    li.message id={ "message-" (m.id) } {
                        a href={ "/users/" (m.user_id) } {
                            img.avatar src=(m.author_image_url) alt="";
                        }
                        div.message-body {
                            a href={ "/users/" (m.user_id) } { "@" (m.author_username) }
                            a.timestamp href={ "/messages/" (m.id) } {
                                (m.created_at.format("%d %B %Y").to_string())
                            }
                            p { (m.text) }
                        }
                        @if layout.actor.is_some() {
                            (like_button(m.id, liked.contains(&m.id)))
                        }
                    }
                }
            }
        }
    }
}

fn like_button(id: MessageId, liked: bool) -> Markup {
    let (class, label) = if liked {
        ("btn-like liked", "Unlike")
    } else {
        ("btn-like not-liked", "Like")
    };
    html! {
        form.like-form method="POST" action={ "/messages/" (id) "/likedtoggle" } {
            button class=(class) aria-label=(label) { "★" }
        }
    }
}

fn user_cards(users: &[User]) -> Markup {
    html! {
        div.user-cards {
            @for u in users {
                div.card.user-card {
                    a href={ "/users/" (u.id) } { img.avatar src=(u.image_url) alt=""; }
                    a href={ "/users/" (u.id) } class="card-username" { "@" (u.username) }
                    p.card-bio { (u.bio.as_deref().unwrap_or_default()) }
                }
            }
        }
    }
}

fn profile_header(layout: &Layout<'_>, profile: &Profile<'_>) -> Markup {
    let user = profile.user;
    html! {
        header.profile {
            img.profile-header-img src=(user.header_image_url) alt="";
            img.avatar-lg src=(user.image_url) alt="";
            h2 { "@" (user.username) }
            p.bio { (user.bio.as_deref().unwrap_or_default()) }
            p.location { (user.location.as_deref().unwrap_or_default()) }
            ul.stats {
                li { a href={ "/users/" (user.id) } { "Messages " strong { (profile.stats.messages) } } }
                li { a href={ "/users/" (user.id) "/following" } { "Following " strong { (profile.stats.following) } } }
                li { a href={ "/users/" (user.id) "/followers" } { "Followers " strong { (profile.stats.followers) } } }
                li { a href={ "/users/" (user.id) "/likedmessages" } { "Likes " strong { (profile.stats.likes) } } }
            }
            @if layout.is_actor(user) {
                a.btn href="/users/profile" { "Edit Profile" }
                form.inline method="POST" action="/users/delete" {
                    button.btn.btn-danger { "Delete Profile" }
                }
            } @else if profile.is_following == Some(true) {
                form method="POST" action={ "/users/stop-following/" (user.id) } {
                    button.btn { "Unfollow" }
                }
            } @else {
                form method="POST" action={ "/users/follow/" (user.id) } {
                    button.btn.btn-primary { "Follow" }
                }
            }
        }
    }
}

pub fn home_anon(layout: &Layout<'_>) -> Markup {
    let body = html! {
        section.home-hero {
            h1 { "What's Happening?" }
            h4 { "New to Warbler?" }
            a.btn.btn-primary href="/signup" { "Sign up now" }
        }
    };
    page(layout, "home-anon", "Welcome", body)
}

pub fn home(layout: &Layout<'_>, messages: &[Message], liked: &HashSet<MessageId>) -> Markup {
    let body = html! {
        @if let Some(actor) = layout.actor {
            aside.card.home-card {
                img.avatar src=(actor.image_url) alt="";
                a href={ "/users/" (actor.id) } { "@" (actor.username) }
            }
        }
        (message_list(layout, messages, liked))
    };
    page(layout, "home", "Home", body)
}

pub fn signup(layout: &Layout<'_>, form: &SignupForm, errors: &FieldErrors) -> Markup {
    let body = html! {
        h2 { "Join Warbler today." }
        form.form method="POST" action="/signup" {
            (input("text", "username", "Username", &form.username, errors))
            (input("email", "email", "E-mail", &form.email, errors))
            (input("password", "password", "Password", "", errors))
            (input("text", "image_url", "(Optional) Image URL", &form.image_url, errors))
            button.btn.btn-primary { "Sign me up!" }
        }
    };
    page(layout, "signup", "Sign up", body)
}

pub fn login(layout: &Layout<'_>, form: &LoginForm, errors: &FieldErrors) -> Markup {
    let body = html! {
        h2 { "Welcome back." }
        form.form method="POST" action="/login" {
            (input("text", "username", "Username", &form.username, errors))
            (input("password", "password", "Password", "", errors))
            button.btn.btn-primary { "Log in" }
        }
    };
    page(layout, "login", "Log in", body)
}

pub fn users_index(layout: &Layout<'_>, users: &[User], query: Option<&str>) -> Markup {
    let body = html! {
        @if users.is_empty() {
            h3 { "Sorry, no users found" }
        } @else {
            (user_cards(users))
        }
    };
    let title = match query {
        Some(q) if !q.is_empty() => format!("Users matching \"{q}\""),
        _ => "Users".to_string(),
    };
    page(layout, "users-index", &title, body)
}

pub fn user_show(
    layout: &Layout<'_>,
    profile: &Profile<'_>,
    messages: &[Message],
    liked: &HashSet<MessageId>,
) -> Markup {
    let body = html! {
        (profile_header(layout, profile))
        (message_list(layout, messages, liked))
    };
    page(layout, "user-show", &profile.user.username, body)
}

pub fn following(layout: &Layout<'_>, profile: &Profile<'_>, users: &[User]) -> Markup {
    let body = html! {
        (profile_header(layout, profile))
        h3 { "Following" }
        (user_cards(users))
    };
    page(layout, "following", "Following", body)
}

pub fn followers(layout: &Layout<'_>, profile: &Profile<'_>, users: &[User]) -> Markup {
    let body = html! {
        (profile_header(layout, profile))
        h3 { "Followers" }
        (user_cards(users))
    };
    page(layout, "followers", "Followers", body)
}

pub fn liked_messages(
    layout: &Layout<'_>,
    profile: &Profile<'_>,
    messages: &[Message],
    liked: &HashSet<MessageId>,
) -> Markup {
    let body = html! {
        (profile_header(layout, profile))
        h3 { "Liked Messages" }
        (message_list(layout, messages, liked))
    };
    page(layout, "liked-messages", "Liked Messages", body)
}

pub fn edit_profile(layout: &Layout<'_>, form: &EditProfileForm, errors: &FieldErrors) -> Markup {
    let actor_id = layout.actor.map(|a| a.id).unwrap_or_default();
    let body = html! {
        h2 { "Edit Your Profile." }
        form.form method="POST" action="/users/profile" {
            (input("text", "username", "Username", &form.username, errors))
            (input("email", "email", "E-mail", &form.email, errors))
            (input("text", "image_url", "Image URL", &form.image_url, errors))
            (input("text", "header_image_url", "Header Image URL", &form.header_image_url, errors))
            (textarea("bio", "Bio", &form.bio, errors))
            p { "To confirm changes, enter your password:" }
            (input("password", "password", "Password", "", errors))
            button.btn.btn-success { "Edit this user!" }
            a.btn href={ "/users/" (actor_id) } { "Cancel" }
        }
    };
    page(layout, "edit-profile", "Edit Profile", body)
}

pub fn new_message(layout: &Layout<'_>, form: &MessageForm, errors: &FieldErrors) -> Markup {
    let body = html! {
        h2 { "New Message" }
        form.form method="POST" action="/messages/new" {
            (textarea("text", "What's happening?", &form.text, errors))
            small { "At most " (MAX_MESSAGE_LEN) " characters." }
            button.btn.btn-success { "Add my message!" }
        }
    };
    page(layout, "new-message", "New Message", body)
}

pub fn message_show(layout: &Layout<'_>, message: &Message, liked: bool) -> Markup {
    let liked_ids: HashSet<MessageId> = if liked { HashSet::from([message.id]) } else { HashSet::new() };
    let body = html! {
        (message_list(layout, std::slice::from_ref(message), &liked_ids))
        @if layout.actor.is_some_and(|a| a.id == message.user_id) {
            form method="POST" action={ "/messages/" (message.id) "/delete" } {
                button.btn.btn-danger { "Delete" }
            }
        }
    };
    page(layout, "message-show", "Message", body)
}

pub fn not_found() -> Markup {
    let body = html! {
        h1 { "404" }
        p { "Sorry, we couldn't find that page." }
        a href="/" { "Go home" }
    };
    page(&Layout::new(None, &[]), "not-found", "Not Found", body)
}

pub fn server_error() -> Markup {
    let body = html! {
        h1 { "Something went wrong" }
        p { "Please try again." }
    };
    page(&Layout::new(None, &[]), "server-error", "Error", body)
}
