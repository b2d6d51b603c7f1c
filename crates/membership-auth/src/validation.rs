//! Signup and login form validation
//!
//! Each form is checked in two passes. First every field is checked for
//! emptiness in form order, then the schema rules run field by field. Only
//! the first violation is reported.
//!
//! Forms are built from the decoded `(name, value)` pairs of the request
//! body. A field sent more than once fails the schema as a non-string,
//! the way a repeated key decodes to a list.

use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Maximum length of a display name, in characters
pub const NAME_MAX_LEN: u64 = 30;

/// Maximum length of a plaintext password, in characters
pub const PASSWORD_MAX_LEN: u64 = 30;

/// First problem found with a submitted form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A required field was missing or blank
    #[error("{0} can not be empty")]
    Empty(&'static str),

    /// A field broke a schema rule
    #[error("{0}")]
    Invalid(String),
}

/// Fields posted by the signup form
#[derive(Debug, Clone, Default, Validate)]
pub struct SignupForm {
    #[validate(
        custom(function = "validate_alphanumeric"),
        length(
            max = 30,
            message = "\"name\" length must be less than or equal to 30 characters long"
        )
    )]
    pub name: String,

    #[validate(
        email(message = "\"email\" must be a valid email"),
        custom(function = "validate_domain_segments")
    )]
    pub email: String,

    #[validate(length(
        max = 30,
        message = "\"password\" length must be less than or equal to 30 characters long"
    ))]
    pub password: String,

    /// Fields submitted more than once
    repeated: Vec<&'static str>,
}

/// Fields posted by the login form
#[derive(Debug, Clone, Default, Validate)]
pub struct LoginForm {
    #[validate(
        email(message = "\"email\" must be a valid email"),
        custom(function = "validate_domain_segments")
    )]
    pub email: String,

    #[validate(length(
        max = 30,
        message = "\"password\" length must be less than or equal to 30 characters long"
    ))]
    pub password: String,

    /// Fields submitted more than once
    repeated: Vec<&'static str>,
}

/// A signup form that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A login form that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Rule order per field; codes not listed here are reported last
const SIGNUP_RULES: &[(&str, &[&str])] = &[
    ("name", &["alphanumeric", "length"]),
    ("email", &["email"]),
    ("password", &["length"]),
];

const LOGIN_RULES: &[(&str, &[&str])] = &[("email", &["email"]), ("password", &["length"])];

impl SignupForm {
    /// Collect the signup fields from decoded form pairs; missing ones are empty
    pub fn from_fields(fields: &[(String, String)]) -> Self {
        let mut repeated = Vec::new();

        Self {
            name: field_value(fields, "name", &mut repeated),
            email: field_value(fields, "email", &mut repeated),
            password: field_value(fields, "password", &mut repeated),
            repeated,
        }
    }

    /// Validate the form, returning the normalized account on success
    pub fn into_account(self) -> Result<NewAccount, FormError> {
        if self.is_blank("name", &self.name) {
            return Err(FormError::Empty("Name"));
        }
        if self.is_blank("email", &self.email) {
            return Err(FormError::Empty("Email"));
        }
        if self.is_blank("password", &self.password) {
            return Err(FormError::Empty("Password"));
        }

        let errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        if let Some(violation) = first_violation(&errors, &self.repeated, SIGNUP_RULES) {
            return Err(violation);
        }

        Ok(NewAccount {
            name: self.name,
            email: self.email,
            password: self.password,
        })
    }

    fn is_blank(&self, field: &str, value: &str) -> bool {
        value.is_empty() && !self.repeated.iter().any(|name| *name == field)
    }
}

impl LoginForm {
    /// Collect the login fields from decoded form pairs; missing ones are empty
    pub fn from_fields(fields: &[(String, String)]) -> Self {
        let mut repeated = Vec::new();

        Self {
            email: field_value(fields, "email", &mut repeated),
            password: field_value(fields, "password", &mut repeated),
            repeated,
        }
    }

    /// Validate the form, returning the credentials on success
    pub fn into_credentials(self) -> Result<Credentials, FormError> {
        if self.is_blank("email", &self.email) {
            return Err(FormError::Empty("Email"));
        }
        if self.is_blank("password", &self.password) {
            return Err(FormError::Empty("Password"));
        }

        let errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        if let Some(violation) = first_violation(&errors, &self.repeated, LOGIN_RULES) {
            return Err(violation);
        }

        Ok(Credentials {
            email: self.email,
            password: self.password,
        })
    }

    fn is_blank(&self, field: &str, value: &str) -> bool {
        value.is_empty() && !self.repeated.iter().any(|name| *name == field)
    }
}

/// First value posted for `key`, noting the key in `repeated` when it appears again
fn field_value(
    fields: &[(String, String)],
    key: &'static str,
    repeated: &mut Vec<&'static str>,
) -> String {
    let mut values = fields
        .iter()
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value);

    let first = values.next().cloned().unwrap_or_default();
    if values.next().is_some() {
        repeated.push(key);
    }

    first
}

fn first_violation(
    errors: &ValidationErrors,
    repeated: &[&str],
    rules: &[(&str, &[&str])],
) -> Option<FormError> {
    let field_errors = errors.field_errors();

    for (field, codes) in rules {
        // Type comes before every other rule of a field
        if repeated.iter().any(|name| name == field) {
            return Some(FormError::Invalid(format!("\"{}\" must be a string", field)));
        }

        let Some(found) = field_errors.get(*field) else {
            continue;
        };

        let first = codes
            .iter()
            .find_map(|code| found.iter().find(|e| e.code == *code))
            .or_else(|| found.first());

        if let Some(error) = first {
            return Some(FormError::Invalid(describe(field, error)));
        }
    }

    if field_errors.is_empty() {
        None
    } else {
        Some(FormError::Invalid("Invalid form submission".to_string()))
    }
}

fn describe(field: &str, error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("\"{}\" is invalid", field),
    }
}

fn validate_alphanumeric(value: &str) -> Result<(), ValidationError> {
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new("alphanumeric")
            .with_message("\"name\" must only contain alpha-numeric characters".into()));
    }
    Ok(())
}

/// Require a dotted domain part, so `ann@localhost` is rejected
fn validate_domain_segments(value: &str) -> Result<(), ValidationError> {
    let has_segments = value
        .rsplit_once('@')
        .map(|(_, domain)| {
            let mut labels = domain.split('.');
            domain.contains('.') && labels.all(|label| !label.is_empty())
        })
        .unwrap_or(false);

    if !has_segments {
        return Err(ValidationError::new("email")
            .with_message("\"email\" must be a valid email".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> SignupForm {
        SignupForm {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    fn login(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_signup() {
        let account = signup("Ann", "ann@x.com", "pw1").into_account().unwrap();

        assert_eq!(
            account,
            NewAccount {
                name: "Ann".to_string(),
                email: "ann@x.com".to_string(),
                password: "pw1".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_fields_reported_in_form_order() {
        assert_eq!(
            signup("", "", "").into_account(),
            Err(FormError::Empty("Name"))
        );
        assert_eq!(
            signup("Ann", "", "").into_account(),
            Err(FormError::Empty("Email"))
        );
        assert_eq!(
            signup("Ann", "ann@x.com", "").into_account(),
            Err(FormError::Empty("Password"))
        );
    }

    #[test]
    fn test_empty_check_runs_before_schema() {
        // The bad name would fail the schema, but the missing password wins
        let result = signup("not valid!", "ann@x.com", "").into_account();
        assert_eq!(result, Err(FormError::Empty("Password")));
    }

    #[test]
    fn test_empty_message_text() {
        assert_eq!(FormError::Empty("Name").to_string(), "Name can not be empty");
        assert_eq!(
            FormError::Empty("Password").to_string(),
            "Password can not be empty"
        );
    }

    #[test]
    fn test_name_must_be_alphanumeric() {
        let err = signup("Ann Lee", "ann@x.com", "pw1").into_account().unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"name\" must only contain alpha-numeric characters"
        );
    }

    #[test]
    fn test_name_alphanumeric_reported_before_length() {
        let name = format!("{}!", "a".repeat(40));
        let err = signup(&name, "ann@x.com", "pw1").into_account().unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"name\" must only contain alpha-numeric characters"
        );
    }

    #[test]
    fn test_name_length_limit() {
        assert!(signup(&"a".repeat(30), "ann@x.com", "pw1")
            .into_account()
            .is_ok());

        let err = signup(&"a".repeat(31), "ann@x.com", "pw1")
            .into_account()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"name\" length must be less than or equal to 30 characters long"
        );
    }

    #[test]
    fn test_name_reported_before_email() {
        let err = signup("Ann Lee", "nope", "pw1").into_account().unwrap_err();
        assert!(err.to_string().starts_with("\"name\""));
    }

    #[test]
    fn test_email_syntax() {
        for bad in ["nope", "ann@", "@x.com", "ann@localhost", "ann@x..com"] {
            let err = signup("Ann", bad, "pw1").into_account().unwrap_err();
            assert_eq!(
                err.to_string(),
                "\"email\" must be a valid email",
                "{} should be rejected",
                bad
            );
        }

        assert!(signup("Ann", "ann.lee+tag@mail.x.com", "pw1")
            .into_account()
            .is_ok());
    }

    #[test]
    fn test_password_length_limit_without_minimum() {
        assert!(signup("Ann", "ann@x.com", "p").into_account().is_ok());
        assert!(signup("Ann", "ann@x.com", &"p".repeat(30))
            .into_account()
            .is_ok());

        let err = signup("Ann", "ann@x.com", &"p".repeat(31))
            .into_account()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"password\" length must be less than or equal to 30 characters long"
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let password = "é".repeat(30);
        assert!(signup("Ann", "ann@x.com", &password).into_account().is_ok());
    }

    #[test]
    fn test_login_checks() {
        assert_eq!(login("", "pw1").into_credentials(), Err(FormError::Empty("Email")));
        assert_eq!(
            login("ann@x.com", "").into_credentials(),
            Err(FormError::Empty("Password"))
        );
        assert_eq!(
            login("nope", "pw1").into_credentials().unwrap_err().to_string(),
            "\"email\" must be a valid email"
        );

        let credentials = login("ann@x.com", "pw1").into_credentials().unwrap();
        assert_eq!(credentials.email, "ann@x.com");
        assert_eq!(credentials.password, "pw1");
    }

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_form_fields_are_empty() {
        let form = SignupForm::from_fields(&fields(&[("name", "Ann")]));
        assert_eq!(form.into_account(), Err(FormError::Empty("Email")));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let form = SignupForm::from_fields(&fields(&[
            ("name", "Ann"),
            ("email", "ann@x.com"),
            ("password", "pw1"),
            ("role", "admin"),
        ]));
        assert!(form.into_account().is_ok());
    }

    #[test]
    fn test_repeated_field_is_not_a_string() {
        let form = SignupForm::from_fields(&fields(&[
            ("name", "Ann"),
            ("name", "Bob"),
            ("email", "ann@x.com"),
            ("password", "pw1"),
        ]));
        assert_eq!(
            form.into_account().unwrap_err().to_string(),
            "\"name\" must be a string"
        );
    }

    #[test]
    fn test_repeated_blank_field_passes_empty_check() {
        let form = SignupForm::from_fields(&fields(&[
            ("name", ""),
            ("name", ""),
            ("email", "ann@x.com"),
            ("password", "pw1"),
        ]));
        assert_eq!(
            form.into_account().unwrap_err().to_string(),
            "\"name\" must be a string"
        );
    }

    #[test]
    fn test_empty_check_runs_before_repeated_field() {
        let form = SignupForm::from_fields(&fields(&[
            ("name", "Ann"),
            ("name", "Bob"),
            ("password", "pw1"),
        ]));
        assert_eq!(form.into_account(), Err(FormError::Empty("Email")));
    }

    #[test]
    fn test_earlier_field_rule_wins_over_repeated_field() {
        let form = SignupForm::from_fields(&fields(&[
            ("name", "Ann Lee"),
            ("email", "ann@x.com"),
            ("email", "bob@x.com"),
            ("password", "pw1"),
        ]));
        assert_eq!(
            form.into_account().unwrap_err().to_string(),
            "\"name\" must only contain alpha-numeric characters"
        );
    }

    #[test]
    fn test_login_repeated_password() {
        let form = LoginForm::from_fields(&fields(&[
            ("email", "ann@x.com"),
            ("password", "pw1"),
            ("password", "pw2"),
        ]));
        assert_eq!(
            form.into_credentials().unwrap_err().to_string(),
            "\"password\" must be a string"
        );
    }

    #[test]
    fn test_top_level_domain_not_checked_against_registry() {
        // Only the shape of the domain is checked
        assert!(signup("Ann", "ann@x.notatld", "pw1").into_account().is_ok());
    }
}
