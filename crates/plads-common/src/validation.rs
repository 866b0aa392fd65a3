//! Per-operation request validation rules, evaluated before any handler
//! side effect. A non-empty error list maps to a 422 at the boundary.

/// Minimum description length for places
pub const MIN_DESCRIPTION_LEN: usize = 5;
/// Minimum password length for signup
pub const MIN_PASSWORD_LEN: usize = 6;

/// Lowercase-normalize an email address before validation or lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Syntactic email check on an already-normalized address: exactly one
/// `@`, a non-empty local part, and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let Some(domain) = parts.next() else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain.split('.').count() >= 2 && domain.split('.').all(|label| !label.is_empty())
}

/// Rules for POST /api/places
pub fn validate_place_create(
    title: &str,
    description: &str,
    address: &str,
) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    check_place_fields(title, description, &mut errors);
    if address.trim().is_empty() {
        errors.push("address must not be empty".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Rules for PATCH /api/places/{pid}
pub fn validate_place_update(title: &str, description: &str) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    check_place_fields(title, description, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_place_fields(title: &str, description: &str, errors: &mut Vec<String>) {
    if title.trim().is_empty() {
        errors.push("title must not be empty".to_string());
    }
    if description.chars().count() < MIN_DESCRIPTION_LEN {
        errors.push(format!(
            "description must be at least {} characters",
            MIN_DESCRIPTION_LEN
        ));
    }
}

/// Rules for POST /api/users/signup. Expects the email to be normalized
/// with [`normalize_email`] first.
pub fn validate_signup(name: &str, email: &str, password: &str) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push("name must not be empty".to_string());
    }
    if !is_valid_email(email) {
        errors.push("email is not a valid address".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
