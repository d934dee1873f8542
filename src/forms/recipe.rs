//! Dashboard recipe form validation.
//!
//! Client-submitted values never reach the publication or HTML flags: the
//! gateway forces both to false on every save, so this form only covers the
//! editable fields.

use rand::Rng;
use serde::Deserialize;

use super::FieldErrors;

pub const TITLE_MIN_LEN: usize = 5;
const SLUG_SUFFIX_LEN: usize = 6;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePayload {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub preparation_time: Option<i32>,

    #[serde(default)]
    pub preparation_time_unit: String,

    pub servings: Option<i32>,

    #[serde(default)]
    pub servings_unit: String,

    #[serde(default)]
    pub preparation_steps: String,

    pub cover_path: Option<String>,
}

/// A fully validated recipe form, ready to insert or apply over an existing
/// draft. Ownership and the draft/HTML flags are the gateway's concern.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub preparation_time: i32,
    pub preparation_time_unit: String,
    pub servings: i32,
    pub servings_unit: String,
    pub preparation_steps: String,
    pub cover_path: Option<String>,
}

pub fn validate(payload: &RecipePayload) -> Result<RecipeDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = payload.title.trim();
    if title.is_empty() {
        errors.add("title", "This field must not be empty");
    } else if title.chars().count() < TITLE_MIN_LEN {
        errors.add("title", "Title must have at least 5 characters");
    }

    let description = payload.description.trim();
    if description.is_empty() {
        errors.add("description", "This field must not be empty");
    } else if !title.is_empty() && description == title {
        errors.add("description", "Description cannot be equal to title");
    }

    match payload.preparation_time {
        None => errors.add("preparation_time", "This field must not be empty"),
        Some(n) if n <= 0 => errors.add("preparation_time", "Must be a positive number"),
        Some(_) => {}
    }

    if payload.preparation_time_unit.trim().is_empty() {
        errors.add("preparation_time_unit", "This field must not be empty");
    }

    match payload.servings {
        None => errors.add("servings", "This field must not be empty"),
        Some(n) if n <= 0 => errors.add("servings", "Must be a positive number"),
        Some(_) => {}
    }

    if payload.servings_unit.trim().is_empty() {
        errors.add("servings_unit", "This field must not be empty");
    }

    if payload.preparation_steps.trim().is_empty() {
        errors.add("preparation_steps", "This field must not be empty");
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(RecipeDraft {
        title: title.to_string(),
        description: description.to_string(),
        preparation_time: payload.preparation_time.unwrap_or_default(),
        preparation_time_unit: payload.preparation_time_unit.trim().to_string(),
        servings: payload.servings.unwrap_or_default(),
        servings_unit: payload.servings_unit.trim().to_string(),
        preparation_steps: payload.preparation_steps.trim().to_string(),
        cover_path: payload.cover_path.clone(),
    })
}

/// Lowercases the title and collapses every non-alphanumeric run into a
/// single hyphen.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Slug with a short random suffix so two recipes may share a title.
/// Generated once at creation; edits keep the original slug.
#[must_use]
pub fn unique_slug(title: &str) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::rng();
    let suffix: String = (0..SLUG_SUFFIX_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();

    let base = slugify(title);
    if base.is_empty() {
        suffix
    } else {
        format!("{base}-{suffix}")
    }
}
