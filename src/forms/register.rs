//! Registration form validation.
//!
//! Given a proposed account payload, produces either a normalized
//! [`NewAuthor`] or a field-keyed error set. Fields are validated
//! independently, in declaration order; the password/confirmation
//! comparison runs after every per-field check and attaches its error to
//! `password`. Nothing is persisted here — the caller only creates the
//! account when validation fully succeeds.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use super::FieldErrors;

pub const USERNAME_MIN_LEN: usize = 4;
pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Substring rejected from passwords, case-sensitive.
const FORBIDDEN_PASSWORD_TERM: &str = "atencao";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterPayload {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,

    /// Confirmation field. Compared against `password` and then discarded,
    /// never persisted.
    #[serde(default)]
    pub password2: String,
}

/// Normalized output of a fully valid registration form. The password is
/// still raw here; hashing happens in the persistence layer.
#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn username_charset() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[A-Za-z0-9@.+\-_]+$")
}

fn email_syntax() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email_syntax().is_match(email)
}

/// A password is strong when it has at least one uppercase letter, one
/// lowercase letter and one digit, and is at least 8 characters long.
#[must_use]
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_LEN
        && password.chars().any(char::is_uppercase)
        && password.chars().any(char::is_lowercase)
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Validates the registration payload.
///
/// `email_in_use` is the result of the storage uniqueness read for the
/// submitted email; the caller performs that read whenever the email is
/// syntactically valid, regardless of any other field's outcome.
pub fn validate(payload: &RegisterPayload, email_in_use: bool) -> Result<NewAuthor, FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = payload.username.trim();
    if username.is_empty() {
        errors.add("username", "This field must not be empty");
    } else if username.chars().count() < USERNAME_MIN_LEN {
        errors.add("username", "Username minimum length is 4 characters");
    } else if username.chars().count() > USERNAME_MAX_LEN {
        errors.add("username", "Username maximum length is 150 characters");
    } else if !username_charset().is_match(username) {
        errors.add(
            "username",
            "Username must have letters, numbers or one of those @.+-_",
        );
    }

    if payload.first_name.trim().is_empty() {
        errors.add("first_name", "Write your first name");
    }

    if payload.last_name.trim().is_empty() {
        errors.add("last_name", "Write your last name");
    }

    let email = payload.email.trim();
    if email.is_empty() {
        errors.add("email", "Write your email");
    } else if !is_valid_email(email) {
        errors.add("email", "The email must be valid");
    } else if email_in_use {
        errors.add("email", "User email is already in use");
    }

    if payload.password.is_empty() {
        errors.add("password", "Password must not be empty");
    } else if !is_strong_password(&payload.password) {
        errors.add(
            "password",
            "Password must have at least one uppercase letter, one lowercase letter and one \
             number. The length should be at least 8 characters",
        );
    } else if payload.password.contains(FORBIDDEN_PASSWORD_TERM) {
        errors.add("password", "Do not type 'atencao' in the password field");
    }

    if payload.password2.is_empty() {
        errors.add("password2", "Password confirmation must not be empty");
    }

    // Cross-field rule: always attached to `password`, never `password2`.
    if payload.password != payload.password2 {
        errors.add(
            "password",
            "Password and password confirmation must be equal",
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewAuthor {
        username: username.to_string(),
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        email: email.to_string(),
        password: payload.password.clone(),
    })
}
