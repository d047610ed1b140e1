//! Credential resolution for the broker management API.
//!
//! The environment takes precedence: when `EMQ_USERNAME` is set, the
//! credentials must come fully from the environment. Only when the
//! environment lookup fails does the JSON credentials file get read.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const USERNAME_ENV: &str = "EMQ_USERNAME";
pub const PASSWORD_ENV: &str = "EMQ_PASSWORD";

#[derive(Debug, Error)]
pub enum CredsError {
    #[error("Can't find {0}")]
    MissingEnv(&'static str),
    #[error("missing username in {0}")]
    MissingUsername(String),
    #[error("missing password in {0}")]
    MissingPassword(String),
    #[error("failed to read credentials file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode credentials file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct FileCreds {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Resolves the API credentials, environment first, file second.
pub fn find_creds(path: &Path) -> Result<(String, String), CredsError> {
    match load_from_env() {
        Ok(creds) => Ok(creds),
        Err(_) => load_from_file(path),
    }
}

fn load_from_env() -> Result<(String, String), CredsError> {
    let username =
        std::env::var(USERNAME_ENV).map_err(|_| CredsError::MissingEnv(USERNAME_ENV))?;
    let password =
        std::env::var(PASSWORD_ENV).map_err(|_| CredsError::MissingEnv(PASSWORD_ENV))?;
    Ok((username, password))
}

fn load_from_file(path: &Path) -> Result<(String, String), CredsError> {
    let abs = std::path::absolute(path).map_err(|source| CredsError::Io {
        path: path.to_owned(),
        source,
    })?;

    let raw = std::fs::read_to_string(&abs).map_err(|source| CredsError::Io {
        path: abs.clone(),
        source,
    })?;

    let creds: FileCreds = serde_json::from_str(&raw).map_err(|source| CredsError::Decode {
        path: abs.clone(),
        source,
    })?;

    // Checks run in order, so with both fields empty the password error is
    // the one reported.
    let mut err = None;
    if creds.username.is_empty() {
        err = Some(CredsError::MissingUsername(abs.display().to_string()));
    }
    if creds.password.is_empty() {
        err = Some(CredsError::MissingPassword(abs.display().to_string()));
    }
    match err {
        Some(err) => Err(err),
        None => Ok((creds.username, creds.password)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Environment variables are process-wide; serialize the tests touching
    // them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        std::env::remove_var(USERNAME_ENV);
        std::env::remove_var(PASSWORD_ENV);
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn env_takes_precedence_over_the_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(USERNAME_ENV, "env-user");
        std::env::set_var(PASSWORD_ENV, "env-pass");

        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "auth.json",
            r#"{"username": "file-user", "password": "file-pass"}"#,
        );

        let (username, password) = find_creds(&path).unwrap();
        assert_eq!(username, "env-user");
        assert_eq!(password, "env-pass");

        clear_env();
    }

    #[test]
    fn partial_env_falls_back_to_the_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(USERNAME_ENV, "env-user");

        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "auth.json",
            r#"{"username": "file-user", "password": "file-pass"}"#,
        );

        let (username, password) = find_creds(&path).unwrap();
        assert_eq!(username, "file-user");
        assert_eq!(password, "file-pass");

        clear_env();
    }

    #[test]
    fn env_username_missing_fails_env_lookup() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(PASSWORD_ENV, "env-pass");

        let err = load_from_env().unwrap_err();
        assert_eq!(err.to_string(), "Can't find EMQ_USERNAME");

        clear_env();
    }

    #[test]
    fn env_password_missing_fails_env_lookup() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(USERNAME_ENV, "env-user");

        let err = load_from_env().unwrap_err();
        assert_eq!(err.to_string(), "Can't find EMQ_PASSWORD");

        clear_env();
    }

    #[test]
    fn file_provides_credentials_without_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "auth.json",
            r#"{"username": "admin", "password": "public"}"#,
        );

        let (username, password) = find_creds(&path).unwrap();
        assert_eq!(username, "admin");
        assert_eq!(password, "public");
    }

    #[test]
    fn missing_file_surfaces_the_io_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let dir = TempDir::new().unwrap();
        let err = find_creds(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CredsError::Io { .. }));
    }

    #[test]
    fn malformed_json_surfaces_the_decode_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "auth.json", "{not json");

        let err = find_creds(&path).unwrap_err();
        assert!(matches!(err, CredsError::Decode { .. }));
    }

    #[test]
    fn missing_username_field_is_reported_with_the_path() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "auth.json", r#"{"password": "public"}"#);

        let err = find_creds(&path).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("missing username in "), "got: {msg}");
        assert!(msg.contains("auth.json"));
    }

    #[test]
    fn missing_password_field_is_reported_with_the_path() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "auth.json", r#"{"username": "admin"}"#);

        let err = find_creds(&path).unwrap_err();
        assert!(matches!(err, CredsError::MissingPassword(_)));
    }

    #[test]
    fn both_fields_missing_reports_the_password() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "auth.json", "{}");

        let err = find_creds(&path).unwrap_err();
        assert!(matches!(err, CredsError::MissingPassword(_)));
    }

    #[test]
    fn empty_fields_count_as_missing() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "auth.json",
            r#"{"username": "", "password": "public"}"#,
        );

        let err = find_creds(&path).unwrap_err();
        assert!(matches!(err, CredsError::MissingUsername(_)));
    }
}
