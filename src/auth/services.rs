use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::error;

use crate::{auth::dto::RegisterRequest, error::AppError};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^\S+@\S+\.\S+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims and lowercases the email, trims the username, then checks field rules.
pub fn normalize_registration(payload: &mut RegisterRequest) -> Result<(), AppError> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.is_empty() {
        return Err(AppError::validation("Username is required"));
    }
    if payload.username.chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::validation(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if payload.email.is_empty() {
        return Err(AppError::validation("Email is required"));
    }
    if !is_valid_email(&payload.email) {
        return Err(AppError::validation("Invalid email format"));
    }
    if payload.password.is_empty() {
        return Err(AppError::validation("Password is required"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
