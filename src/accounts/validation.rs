//! Form checks run before any backend call

use super::{LoginForm, RegisterForm};
use crate::error::AccountError;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_registration(form: &RegisterForm) -> Result<(), AccountError> {
    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty()
        || email.is_empty()
        || form.password.is_empty()
        || form.confirm_password.is_empty()
    {
        return Err(AccountError::validation("Please fill in all fields"));
    }

    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AccountError::validation(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }

    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if form.password != form.confirm_password {
        return Err(AccountError::validation("Passwords do not match"));
    }

    if !is_valid_username(username) {
        return Err(AccountError::validation(
            "Username may only contain letters, digits and underscores",
        ));
    }

    if !is_valid_email(email) {
        return Err(AccountError::validation("Please enter a valid email address"));
    }

    Ok(())
}

pub fn validate_login(form: &LoginForm) -> Result<(), AccountError> {
    let identifier = form.identifier.trim();

    if identifier.is_empty() || form.password.is_empty() {
        return Err(AccountError::validation(
            "Please enter your username or email and password",
        ));
    }

    if identifier.chars().count() < MIN_USERNAME_LEN {
        return Err(AccountError::validation(format!(
            "Username or email must be at least {MIN_USERNAME_LEN} characters"
        )));
    }

    Ok(())
}

/// ASCII letters, digits and underscore only
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `local@domain.tld`: no whitespace, one `@`, a dot inside the domain
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
