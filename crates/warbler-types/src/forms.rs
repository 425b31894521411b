//! Submitted form input and validation.
//!
//! Every form deserializes from `application/x-www-form-urlencoded` with
//! missing fields defaulting to empty strings, so a half-filled form reaches
//! `validate` instead of failing extraction.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::models::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, MAX_MESSAGE_LEN, ProfileUpdate};

pub const MIN_PASSWORD_LEN: usize = 6;

const REQUIRED: &str = "This field is required.";
const INVALID_EMAIL: &str = "Invalid email address.";
const INVALID_IMAGE: &str = "Enter Valid Image URL";

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: String,
}

impl SignupForm {
    pub fn image_url_or_default(&self) -> String {
        or_default(&self.image_url, DEFAULT_IMAGE_URL)
    }
}

impl Validate for SignupForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        required(&mut errors, "username", &self.username);
        if required(&mut errors, "email", &self.email) && !is_email(&self.email) {
            errors.add("email", INVALID_EMAIL);
        }
        min_length(&mut errors, "password", &self.password, MIN_PASSWORD_LEN);
        errors.into_result()
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        required(&mut errors, "username", &self.username);
        min_length(&mut errors, "password", &self.password, MIN_PASSWORD_LEN);
        errors.into_result()
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct MessageForm {
    pub text: String,
}

impl Validate for MessageForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if required(&mut errors, "text", &self.text)
            && self.text.chars().count() > MAX_MESSAGE_LEN
        {
            errors.add(
                "text",
                format!("Field cannot be longer than {MAX_MESSAGE_LEN} characters."),
            );
        }
        errors.into_result()
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct EditProfileForm {
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: String,
    pub password: String,
}

impl EditProfileForm {
    /// The column values this form would write, with blank image URLs
    /// replaced by the defaults and a blank bio cleared.
    pub fn to_update(&self) -> ProfileUpdate {
        let bio = self.bio.trim();
        ProfileUpdate {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            image_url: or_default(&self.image_url, DEFAULT_IMAGE_URL),
            header_image_url: or_default(&self.header_image_url, DEFAULT_HEADER_IMAGE_URL),
            bio: (!bio.is_empty()).then(|| bio.to_string()),
        }
    }
}

impl Validate for EditProfileForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        required(&mut errors, "username", &self.username);
        if required(&mut errors, "email", &self.email) && !is_email(&self.email) {
            errors.add("email", INVALID_EMAIL);
        }
        optional_image(&mut errors, "image_url", &self.image_url);
        optional_image(&mut errors, "header_image_url", &self.header_image_url);
        // Only presence is checked here; the password is verified against the
        // stored hash before anything is written.
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result()
    }
}

/// Records a "required" error for blank input. Returns whether the value was
/// present, so callers can chain further checks.
fn required(errors: &mut FieldErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
        false
    } else {
        true
    }
}

fn min_length(errors: &mut FieldErrors, field: &'static str, value: &str, min: usize) {
    if value.chars().count() < min {
        errors.add(field, format!("Field must be at least {min} characters long."));
    }
}

fn optional_image(errors: &mut FieldErrors, field: &'static str, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !is_image_url(value) {
        errors.add(field, INVALID_IMAGE);
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() { default.to_string() } else { value.to_string() }
}

pub fn is_image_url(value: &str) -> bool {
    value.ends_with(".jpg") || value.ends_with(".png")
}

/// A deliberately loose shape check: one `@`, a non-empty local part and a
/// dotted domain, no whitespace.
pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_requires_fields() {
        let errors = SignupForm::default().validate().unwrap_err();
        assert_eq!(errors.get("username"), [REQUIRED]);
        assert_eq!(errors.get("email"), [REQUIRED]);
        assert_eq!(errors.get("password").len(), 1);
        assert!(errors.get("image_url").is_empty());
    }

    #[test]
    fn signup_rejects_bad_email_and_short_password() {
        let form = SignupForm {
            username: "alice".into(),
            email: "not-an-email".into(),
            password: "12345".into(),
            image_url: String::new(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("email"), [INVALID_EMAIL]);
        assert_eq!(errors.get("password"), ["Field must be at least 6 characters long."]);
    }

    #[test]
    fn signup_blank_image_uses_default() {
        let form = SignupForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "password".into(),
            image_url: "  ".into(),
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.image_url_or_default(), DEFAULT_IMAGE_URL);
    }

    #[test]
    fn message_length_is_bounded() {
        let ok = MessageForm { text: "é".repeat(MAX_MESSAGE_LEN) };
        assert!(ok.validate().is_ok());

        let long = MessageForm { text: "x".repeat(MAX_MESSAGE_LEN + 1) };
        assert_eq!(long.validate().unwrap_err().get("text").len(), 1);

        let blank = MessageForm { text: " \n".into() };
        assert_eq!(blank.validate().unwrap_err().get("text"), [REQUIRED]);
    }

    #[test]
    fn edit_profile_checks_image_suffix() {
        let form = EditProfileForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            image_url: "https://img.example.com/me.gif".into(),
            header_image_url: "https://img.example.com/header.png".into(),
            bio: String::new(),
            password: "password".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("image_url"), [INVALID_IMAGE]);
        assert!(errors.get("header_image_url").is_empty());
    }

    #[test]
    fn edit_profile_update_resolves_defaults() {
        let form = EditProfileForm {
            username: " alice ".into(),
            email: "alice@example.com".into(),
            image_url: String::new(),
            header_image_url: String::new(),
            bio: "   ".into(),
            password: "password".into(),
        };
        let update = form.to_update();
        assert_eq!(update.username, "alice");
        assert_eq!(update.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(update.header_image_url, DEFAULT_HEADER_IMAGE_URL);
        assert_eq!(update.bio, None);
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("u1@email.com"));
        assert!(!is_email("u1@email"));
        assert!(!is_email("@email.com"));
        assert!(!is_email("u1 @email.com"));
        assert!(!is_email("u1@@email.com"));
    }
}
