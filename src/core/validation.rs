//! Typed forms and the rule pipeline that checks them.
//!
//! A [`Validator`] is an ordered list of rules. Each rule looks at the whole
//! form and may report one [`FieldError`]. Running the validator collects
//! every failure instead of stopping at the first one.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::*;
use crate::core::errors::{FieldError, ValidationErrors};

type Rule<'a, T> = Box<dyn Fn(&T) -> Option<FieldError> + 'a>;

pub struct Validator<'a, T: ?Sized> {
    rules: Vec<Rule<'a, T>>,
}

impl<'a, T: ?Sized> Default for Validator<'a, T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<'a, T: ?Sized> Validator<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: impl Fn(&T) -> Option<FieldError> + 'a) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn validate(&self, input: &T) -> ValidationErrors {
        ValidationErrors(self.rules.iter().filter_map(|rule| rule(input)).collect())
    }
}

pub fn required(field: &'static str, value: &str) -> Option<FieldError> {
    value
        .trim()
        .is_empty()
        .then(|| FieldError::new(field, "This field is required."))
}

/// Length in characters, not bytes. Empty values pass so `required` owns that case.
pub fn length(field: &'static str, value: &str, min: usize, max: usize) -> Option<FieldError> {
    let len = value.chars().count();
    if value.is_empty() || (min..=max).contains(&len) {
        return None;
    }
    Some(FieldError::new(
        field,
        format!("Field must be between {min} and {max} characters long."),
    ))
}

pub fn equal_to(field: &'static str, value: &str, other_field: &str, other: &str) -> Option<FieldError> {
    (value != other).then(|| FieldError::new(field, format!("Field must be equal to {other_field}.")))
}

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Regex should compile"))
}

fn username_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Regex should compile"))
}

pub fn email(field: &'static str, value: &str) -> Option<FieldError> {
    (!value.is_empty() && !email_regex().is_match(value))
        .then(|| FieldError::new(field, "Invalid email address."))
}

pub fn handle(field: &'static str, value: &str) -> Option<FieldError> {
    (!value.is_empty() && !username_regex().is_match(value)).then(|| {
        FieldError::new(
            field,
            "Usernames may only contain letters, digits, '.', '_' and '-'.",
        )
    })
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validator<'a>() -> Validator<'a, Self> {
        Validator::new()
            .rule(|f: &Self| required("username", &f.username))
            .rule(|f: &Self| required("password", &f.password))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

impl RegistrationForm {
    pub fn validator<'a>() -> Validator<'a, Self> {
        Validator::new()
            .rule(|f: &Self| required("username", &f.username))
            .rule(|f: &Self| length("username", &f.username, MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH))
            .rule(|f: &Self| handle("username", &f.username))
            .rule(|f: &Self| required("email", &f.email))
            .rule(|f: &Self| length("email", &f.email, 1, MAX_EMAIL_LENGTH))
            .rule(|f: &Self| email("email", &f.email))
            .rule(|f: &Self| required("password", &f.password))
            .rule(|f: &Self| required("password2", &f.password2))
            .rule(|f: &Self| equal_to("password2", &f.password2, "password", &f.password))
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditProfileForm {
    pub username: String,
    pub about_me: String,
}

impl EditProfileForm {
    pub fn validator<'a>() -> Validator<'a, Self> {
        Validator::new()
            .rule(|f: &Self| required("username", &f.username))
            .rule(|f: &Self| length("username", &f.username, MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH))
            .rule(|f: &Self| handle("username", &f.username))
            .rule(|f: &Self| length("about_me", &f.about_me, 0, MAX_ABOUT_ME_LENGTH))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResetPasswordForm {
    pub password: String,
    pub password2: String,
}

impl ResetPasswordForm {
    pub fn validator<'a>() -> Validator<'a, Self> {
        Validator::new()
            .rule(|f: &Self| required("password", &f.password))
            .rule(|f: &Self| required("password2", &f.password2))
            .rule(|f: &Self| equal_to("password2", &f.password2, "password", &f.password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegistrationForm {
        RegistrationForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "secret".into(),
            password2: "secret".into(),
        }
    }

    #[test]
    fn valid_registration_has_no_errors() {
        assert!(RegistrationForm::validator().validate(&registration()).is_empty());
    }

    #[test]
    fn collects_every_failure() {
        let form = RegistrationForm {
            username: String::new(),
            email: "not-an-email".into(),
            password: "a".into(),
            password2: "b".into(),
        };
        let errors = RegistrationForm::validator().validate(&form);
        assert!(errors.has("username"));
        assert!(errors.has("email"));
        assert!(errors.has("password2"));
        assert!(!errors.has("password"));
    }

    #[test]
    fn username_length_counts_chars() {
        let mut form = registration();
        form.username = "ab".into();
        let errors = RegistrationForm::validator().validate(&form);
        assert_eq!(errors.messages_for("username").count(), 1);

        form.username = "a".repeat(MAX_USERNAME_LENGTH + 1);
        assert!(RegistrationForm::validator().validate(&form).has("username"));
    }

    #[test]
    fn username_rejects_spaces() {
        let mut form = registration();
        form.username = "bad name".into();
        assert!(RegistrationForm::validator().validate(&form).has("username"));
    }

    #[test]
    fn about_me_may_be_empty_but_bounded() {
        let mut form = EditProfileForm {
            username: "alice".into(),
            about_me: String::new(),
        };
        assert!(EditProfileForm::validator().validate(&form).is_empty());

        form.about_me = "x".repeat(MAX_ABOUT_ME_LENGTH + 1);
        assert!(EditProfileForm::validator().validate(&form).has("about_me"));
    }

    #[test]
    fn reset_form_requires_matching_passwords() {
        let form = ResetPasswordForm {
            password: "one".into(),
            password2: "two".into(),
        };
        let errors = ResetPasswordForm::validator().validate(&form);
        assert_eq!(
            errors.messages_for("password2").collect::<Vec<_>>(),
            vec!["Field must be equal to password."]
        );
    }
}
