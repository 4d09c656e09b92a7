use crate::data_store::DEFAULT_STORE_TIMEOUT;
use std::env;
use std::env::VarError;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Default directory for storing uploaded venue images
pub const DEFAULT_IMAGE_STORAGE_PATH: &str = "wwwroot/images/venues";

/// Get the database URL from the environment variable.
pub fn get_database_url_from_env() -> Result<String, SetupError> {
    env::var("DATABASE_URL").map_err(|e| SetupError::from_env_error(e, "DATABASE_URL"))
}

/// Get the timeout for database operations from the environment variable "STORE_TIMEOUT_SECONDS"
/// or fall back to [DEFAULT_STORE_TIMEOUT].
pub fn get_store_timeout_from_env() -> Result<Duration, SetupError> {
    match optional_env_var("STORE_TIMEOUT_SECONDS")? {
        None => Ok(DEFAULT_STORE_TIMEOUT),
        Some(value) => parse_timeout_seconds(&value).ok_or(SetupError::EnvVariableInvalid {
            variable_name: "STORE_TIMEOUT_SECONDS",
            problem: "Not a number of seconds between 0.001 and 2147483",
        }),
    }
}

/// Get the directory for storing uploaded venue images from the environment variable
/// "IMAGE_STORAGE_PATH" or fall back to [DEFAULT_IMAGE_STORAGE_PATH].
pub fn get_image_storage_path_from_env() -> Result<PathBuf, SetupError> {
    Ok(PathBuf::from(
        optional_env_var("IMAGE_STORAGE_PATH")?
            .unwrap_or_else(|| DEFAULT_IMAGE_STORAGE_PATH.to_owned()),
    ))
}

fn optional_env_var(variable_name: &'static str) -> Result<Option<String>, SetupError> {
    match env::var(variable_name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(SetupError::from_env_error(e, variable_name)),
    }
}

fn parse_timeout_seconds(value: &str) -> Option<Duration> {
    let seconds: f64 = value.trim().parse().ok()?;
    let timeout = Duration::try_from_secs_f64(seconds).ok()?;
    // statement_timeout has millisecond resolution and treats 0 as "no timeout"
    if timeout.as_millis() == 0 || timeout.as_millis() > i32::MAX as u128 {
        return None;
    }
    Some(timeout)
}

#[derive(Debug)]
pub enum SetupError {
    EnvVariableMissing {
        variable_name: &'static str,
    },
    EnvVariableInvalid {
        variable_name: &'static str,
        problem: &'static str,
    },
}

impl SetupError {
    fn from_env_error(error: VarError, variable_name: &'static str) -> Self {
        match error {
            VarError::NotPresent => Self::EnvVariableMissing { variable_name },
            VarError::NotUnicode(_) => Self::EnvVariableInvalid {
                variable_name,
                problem: "no valid unicode",
            },
        }
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::EnvVariableMissing { variable_name } => {
                write!(f, "Environment variable {} must be defined", variable_name)
            }
            SetupError::EnvVariableInvalid {
                variable_name,
                problem,
            } => write!(
                f,
                "Value of environment variable {} is invalid: {}",
                variable_name, problem
            ),
        }
    }
}

impl std::error::Error for SetupError {}
