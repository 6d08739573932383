//! Request body checks shared by handlers.

use std::sync::LazyLock;

use regex::Regex;

use crate::web::error::FieldError;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

// Bangladeshi mobile numbers, with or without the country code.
static PHONE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:\+8801|01)[3-9]\d{8}$").ok());

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 255;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.as_ref().is_some_and(|re| re.is_match(phone))
}

/// Accumulates field errors so a response can report all of them at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(is_valid_email(value.trim()), field, "Please provide a valid email")
    }

    pub fn password(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(
            value.chars().count() >= MIN_PASSWORD_LEN,
            field,
            "Password must be at least 6 characters long",
        )
    }

    pub fn full_name(&mut self, field: &str, value: &str) -> &mut Self {
        let len = value.trim().chars().count();
        self.check(
            (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len),
            field,
            "Full name must be between 2 and 255 characters",
        )
    }

    pub fn phone(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(phone) if !phone.is_empty() => self.check(
                is_valid_phone(phone),
                field,
                "Please provide a valid Bangladeshi phone number",
            ),
            _ => self,
        }
    }

    pub fn not_blank(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "Field must not be empty")
    }

    pub fn finish(&mut self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}
