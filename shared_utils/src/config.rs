use thiserror::Error;

/// Errors related to application configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable is set but holds only whitespace.
    #[error("Environment variable {0} is empty")]
    EmptyEnvVar(String),
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// Values are trimmed; a variable holding only whitespace is reported as
/// [`ConfigError::EmptyEnvVar`] instead of being passed along.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, ConfigError> {
    let raw = std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
    let value = raw.trim();
    if value.is_empty() {
        return Err(ConfigError::EmptyEnvVar(name.to_string()));
    }
    Ok(value.to_string())
}

/// Reads an optional environment variable.
///
/// Returns `None` when the variable is unset or blank, so callers can
/// fall through to their next configuration layer.
pub fn get_env_var_or(name: &str) -> Option<String> {
    get_env_var(name).ok()
}
