//! Local form validation for auth endpoints; nothing here touches the network.

use regex::Regex;
use std::collections::BTreeMap;

use super::types::SignupRequest;

/// Per-field messages, surfaced inline by the client.
pub(crate) type FieldErrors = BTreeMap<String, String>;

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Password strength score, 0-5: one point each for length >= 8, length >= 12,
/// mixed case, a digit, and a symbol.
pub(crate) fn password_strength(password: &str) -> u8 {
    let mut strength = 0;
    let length = password.chars().count();
    if length >= 8 {
        strength += 1;
    }
    if length >= 12 {
        strength += 1;
    }
    if password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
    {
        strength += 1;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        strength += 1;
    }
    if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        strength += 1;
    }
    strength
}

fn require(errors: &mut FieldErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), message.to_string());
    }
}

pub(crate) fn validate_login(email: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    require(&mut errors, "email", email, "Email is required");
    require(&mut errors, "password", password, "Password is required");
    errors
}

pub(crate) fn validate_signup(request: &SignupRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();

    require(&mut errors, "email", &request.email, "Email is required");
    if !errors.contains_key("email") && !valid_email(&normalize_email(&request.email)) {
        errors.insert(
            "email".to_string(),
            "Please enter a valid email address".to_string(),
        );
    }

    require(
        &mut errors,
        "first_name",
        &request.first_name,
        "First name is required",
    );
    require(
        &mut errors,
        "last_name",
        &request.last_name,
        "Last name is required",
    );
    require(
        &mut errors,
        "phone",
        &request.phone,
        "Phone number is required",
    );

    validate_new_password(
        &mut errors,
        &request.password,
        Some(request.confirm_password.as_str()),
    );

    errors
}

/// Password + confirmation rules shared by signup and reset.
pub(crate) fn validate_new_password(
    errors: &mut FieldErrors,
    password: &str,
    confirm_password: Option<&str>,
) {
    if password.is_empty() {
        errors.insert("password".to_string(), "Password is required".to_string());
    } else if password.chars().count() < 8 {
        errors.insert(
            "password".to_string(),
            "Password must be at least 8 characters".to_string(),
        );
    }

    match confirm_password {
        None => {}
        Some(confirm) if confirm.is_empty() => {
            errors.insert(
                "confirm_password".to_string(),
                "Please confirm your password".to_string(),
            );
        }
        Some(confirm) if confirm != password => {
            errors.insert(
                "confirm_password".to_string(),
                "Passwords do not match".to_string(),
            );
        }
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_request() -> SignupRequest {
        SignupRequest {
            email: "alice@example.com".to_string(),
            password: "correct-horse".to_string(),
            confirm_password: "correct-horse".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Doe".to_string(),
            phone: "+15550100".to_string(),
        }
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn strength_is_monotone_in_satisfied_criteria() {
        let ladder = [
            ("abc", 0),              // nothing
            ("abcdefgh", 1),         // length >= 8
            ("abcdefghijkl", 2),     // + length >= 12
            ("Abcdefghijkl", 3),     // + mixed case
            ("Abcdefghijk1", 4),     // + digit
            ("Abcdefghijk1!", 5),    // + symbol
        ];
        let mut previous = 0;
        for (password, expected) in ladder {
            let score = password_strength(password);
            assert_eq!(score, expected, "password: {password}");
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn strength_counts_symbol_and_digit_without_length() {
        assert_eq!(password_strength("a1!"), 2);
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = validate_login("", "secret");
        assert_eq!(errors.get("email").map(String::as_str), Some("Email is required"));
        assert!(!errors.contains_key("password"));

        let errors = validate_login("a@example.com", "");
        assert_eq!(
            errors.get("password").map(String::as_str),
            Some("Password is required")
        );
    }

    #[test]
    fn signup_accepts_a_complete_request() {
        assert!(validate_signup(&signup_request()).is_empty());
    }

    #[test]
    fn signup_flags_bad_email_and_missing_names() {
        let mut request = signup_request();
        request.email = "nope".to_string();
        request.first_name = String::new();
        let errors = validate_signup(&request);
        assert_eq!(
            errors.get("email").map(String::as_str),
            Some("Please enter a valid email address")
        );
        assert_eq!(
            errors.get("first_name").map(String::as_str),
            Some("First name is required")
        );
    }

    #[test]
    fn new_password_rules() {
        let mut errors = FieldErrors::new();
        validate_new_password(&mut errors, "short", Some("short"));
        assert_eq!(
            errors.get("password").map(String::as_str),
            Some("Password must be at least 8 characters")
        );

        let mut errors = FieldErrors::new();
        validate_new_password(&mut errors, "long-enough", Some(""));
        assert_eq!(
            errors.get("confirm_password").map(String::as_str),
            Some("Please confirm your password")
        );

        let mut errors = FieldErrors::new();
        validate_new_password(&mut errors, "long-enough", Some("different"));
        assert_eq!(
            errors.get("confirm_password").map(String::as_str),
            Some("Passwords do not match")
        );

        let mut errors = FieldErrors::new();
        validate_new_password(&mut errors, "long-enough", Some("long-enough"));
        assert!(errors.is_empty());
    }
}
