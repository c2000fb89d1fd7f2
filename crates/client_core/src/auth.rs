use shared::protocol::PasswordCredentials;

use crate::error::BackendError;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    Register,
}

/// Local checks before any credentials leave the machine.
pub fn validate_credentials(
    email: &str,
    password: &str,
    mode: AuthMode,
) -> Result<PasswordCredentials, BackendError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(BackendError::Validation(
            "email and password are required".into(),
        ));
    }
    if !email.contains('@') {
        return Err(BackendError::Validation(format!(
            "'{email}' is not an email address"
        )));
    }
    if mode == AuthMode::Register && password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BackendError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(PasswordCredentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}
