use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    terminal,
};
use tracing::{debug, warn};

use crate::clients::flexible::ClientType;
use crate::error::ConfigError;
use crate::generator::{McqValidation, RetryConfig};

pub const ENV_MAX_RETRIES: &str = "STUDY_BUDDY_MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "STUDY_BUDDY_RETRY_DELAY_MS";
pub const ENV_RESULTS_DIR: &str = "STUDY_BUDDY_RESULTS_DIR";
pub const ENV_MCQ_VALIDATION: &str = "STUDY_BUDDY_MCQ_VALIDATION";
pub const ENV_MODEL: &str = "STUDY_BUDDY_MODEL";
pub const ENV_CLIENT: &str = "STUDY_BUDDY_CLIENT";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "STUDY_BUDDY_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RESULTS_DIR: &str = "results";

const KEY_PROMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for types that can retrieve their API key from environment variables
pub trait KeyFromEnv {
    /// The environment variable name for this client's API key
    const KEY_NAME: &'static str;

    /// Find the API key by checking the .env file and the environment
    fn find_key() -> Option<String> {
        let _ = dotenvy::dotenv();
        env::var(Self::KEY_NAME).ok().filter(|k| !k.trim().is_empty())
    }

    /// Find the API key, asking on the terminal if it is not configured.
    ///
    /// Gives up after a timeout or an empty line.
    fn find_key_with_user() -> Result<String, ConfigError> {
        if let Some(key) = Self::find_key() {
            return Ok(key);
        }

        print!(
            "Environment variable {} not found. Please enter the API key ({}s timeout): ",
            Self::KEY_NAME,
            KEY_PROMPT_TIMEOUT.as_secs()
        );
        let _ = io::stdout().flush();

        let (sender, receiver) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_ok() {
                let _ = sender.send(input.trim().to_string());
            }
        });

        let api_key = match receiver.recv_timeout(KEY_PROMPT_TIMEOUT) {
            Ok(input) if !input.is_empty() => input,
            _ => return Err(ConfigError::MissingKey(Self::KEY_NAME)),
        };

        if Self::prompt_save_to_env() {
            match Self::save_to_env_file(&api_key) {
                Ok(()) => println!("API key saved to .env file"),
                Err(e) => warn!(error = %e, "Failed to save API key to .env file"),
            }
        }

        Ok(api_key)
    }

    /// Ask whether the key should be appended to `.env`.
    /// Single keystroke when the terminal allows it, otherwise a line.
    fn prompt_save_to_env() -> bool {
        print!("Add {} to .env file? (y/N): ", Self::KEY_NAME);
        let _ = io::stdout().flush();

        if let Ok(answer) = read_single_key() {
            println!("{}", if answer { "y" } else { "n" });
            return answer;
        }

        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map(|_| input.trim().eq_ignore_ascii_case("y"))
            .unwrap_or(false)
    }

    /// Append the key to `.env` unless it is already there
    fn save_to_env_file(api_key: &str) -> io::Result<()> {
        if let Ok(content) = std::fs::read_to_string(".env") {
            if content.contains(&format!("{}=", Self::KEY_NAME)) {
                return Ok(());
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(".env")?;
        writeln!(file, "{}={}", Self::KEY_NAME, api_key)
    }
}

/// Read one y/n keystroke in raw mode. Anything but `y` means no.
fn read_single_key() -> io::Result<bool> {
    terminal::enable_raw_mode()?;

    let result = (|| -> io::Result<bool> {
        if !event::poll(KEY_PROMPT_TIMEOUT)? {
            return Ok(false);
        }
        Ok(matches!(
            event::read()?,
            Event::Key(KeyEvent { code: KeyCode::Char('y' | 'Y'), .. })
        ))
    })();

    terminal::disable_raw_mode()?;
    result
}

/// Runtime settings, resolved from the environment (and `.env`).
///
/// Command line flags are applied on top of these by the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub retry: RetryConfig,
    pub mcq_validation: McqValidation,
    pub results_dir: PathBuf,
    pub model: Option<String>,
    pub client: Option<ClientType>,
    pub request_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            mcq_validation: McqValidation::default(),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            model: None,
            client: None,
            request_timeout: None,
        }
    }
}

impl Settings {
    /// Load settings from the process environment after reading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup. Unset and blank values
    /// fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Self::default();

        if let Some(value) = get(ENV_MAX_RETRIES) {
            let max_retries = parse_number::<usize>(ENV_MAX_RETRIES, &value)?;
            if max_retries == 0 {
                return Err(invalid(ENV_MAX_RETRIES, &value, "must be at least 1"));
            }
            settings.retry.max_retries = max_retries;
        }
        if let Some(value) = get(ENV_RETRY_DELAY_MS) {
            settings.retry.delay = Duration::from_millis(parse_number(ENV_RETRY_DELAY_MS, &value)?);
        }
        if let Some(value) = get(ENV_RESULTS_DIR) {
            settings.results_dir = PathBuf::from(value);
        }
        if let Some(value) = get(ENV_MCQ_VALIDATION) {
            settings.mcq_validation = McqValidation::from_str(&value)
                .map_err(|reason| invalid(ENV_MCQ_VALIDATION, &value, &reason))?;
        }
        if let Some(value) = get(ENV_CLIENT) {
            settings.client = Some(
                ClientType::from_str(&value).map_err(|reason| invalid(ENV_CLIENT, &value, &reason))?,
            );
        }
        if let Some(value) = get(ENV_REQUEST_TIMEOUT_SECS) {
            settings.request_timeout =
                Some(Duration::from_secs(parse_number(ENV_REQUEST_TIMEOUT_SECS, &value)?));
        }
        settings.model = get(ENV_MODEL);

        debug!(?settings, "Resolved settings");
        Ok(settings)
    }
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| invalid(key, value, &e.to_string()))
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.retry.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(settings.results_dir, PathBuf::from("results"));
        assert_eq!(settings.mcq_validation, McqValidation::Lenient);
    }

    #[test]
    fn reads_every_key() {
        let settings = Settings::from_lookup(lookup(&[
            (ENV_MAX_RETRIES, "5"),
            (ENV_RETRY_DELAY_MS, "250"),
            (ENV_RESULTS_DIR, "out"),
            (ENV_MCQ_VALIDATION, "STRICT"),
            (ENV_MODEL, "llama-3.3-70b-versatile"),
            (ENV_CLIENT, "mock"),
            (ENV_REQUEST_TIMEOUT_SECS, "20"),
        ]))
        .unwrap();

        assert_eq!(settings.retry.max_retries, 5);
        assert_eq!(settings.retry.delay, Duration::from_millis(250));
        assert_eq!(settings.results_dir, PathBuf::from("out"));
        assert_eq!(settings.mcq_validation, McqValidation::Strict);
        assert_eq!(settings.model.as_deref(), Some("llama-3.3-70b-versatile"));
        assert_eq!(settings.client, Some(ClientType::Mock));
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(20)));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let settings = Settings::from_lookup(lookup(&[(ENV_MAX_RETRIES, "  "), (ENV_MODEL, "")])).unwrap();
        assert_eq!(settings.retry.max_retries, DEFAULT_MAX_RETRIES);
        assert!(settings.model.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        let err = Settings::from_lookup(lookup(&[(ENV_MAX_RETRIES, "three")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_MAX_RETRIES, .. }));

        let err = Settings::from_lookup(lookup(&[(ENV_MAX_RETRIES, "0")])).unwrap_err();
        assert!(err.to_string().contains("at least 1"));

        assert!(Settings::from_lookup(lookup(&[(ENV_MCQ_VALIDATION, "sometimes")])).is_err());
        assert!(Settings::from_lookup(lookup(&[(ENV_CLIENT, "claude")])).is_err());
    }
}
