//! Form validation for the author-facing surfaces.
//!
//! Each form exposes a pure `validate` function that returns either the
//! normalized record or a [`FieldErrors`] set. Validation never partially
//! applies: callers persist nothing unless the whole form passed.

use serde::Serialize;

pub mod recipe;
pub mod register;

/// One validated field's accumulated messages.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub messages: Vec<String>,
}

/// Field-keyed validation errors, in field evaluation order.
///
/// Backed by a Vec rather than a map so the order fields were validated in
/// is the order they serialize in.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        let message = message.into();
        if let Some(entry) = self.errors.iter_mut().find(|e| e.field == field) {
            entry.messages.push(message);
        } else {
            self.errors.push(FieldError {
                field,
                messages: vec![message],
            });
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Messages recorded for a field, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.messages.as_slice())
    }

    #[must_use]
    pub fn contains(&self, field: &str, message: &str) -> bool {
        self.get(field)
            .is_some_and(|msgs| msgs.iter().any(|m| m == message))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}
