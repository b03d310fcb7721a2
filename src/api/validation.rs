use validator::Validate;

use crate::api::errors::ApiError;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn validate_payload(payload: &impl Validate) -> Result<(), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))
}

pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ))
    }
}

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_reject_whitespace_and_symbols() {
        assert!(validate_username("jane.doe-2").is_ok());
        assert!(validate_username("jane doe").is_err());
        assert!(validate_username("jane@doe").is_err());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password_len("1234567").is_err());
        assert!(validate_password_len("12345678").is_ok());
    }
}
