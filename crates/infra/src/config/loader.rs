//! Configuration loader
//!
//! Loads policy envelopes from files and environment variables.
//!
//! ## Loading Strategy
//! 1. Loads `.env` from the working directory if present (`dotenvy`)
//! 2. Probes standard paths for a config file (JSON or TOML); no file means
//!    an empty config
//! 3. Applies `VOXGUARD_RETRY_<DOMAIN>_<FIELD>` environment overrides
//! 4. Appends presets for known domains the config leaves out
//! 5. Validates every envelope
//!
//! ## Environment Variables
//! - `VOXGUARD_CONFIG`: explicit config file path, skips probing
//! - `VOXGUARD_RETRY_<DOMAIN>_<FIELD>`: one envelope field, e.g.
//!   `VOXGUARD_RETRY_AUTH_MAX_ATTEMPTS=6`. `<FIELD>` is the upper-cased
//!   envelope field name (`POLICY`, `INITIAL_DELAY_MS`, `MULTIPLIER`,
//!   `MAX_DELAY_MS`, `MAX_ATTEMPTS`, `JITTER_STRATEGY`, `COOL_DOWN_MS`,
//!   `FAILURE_BUDGET_MS`, `CONSECUTIVE_FAILURE_THRESHOLD`). The threshold
//!   accepts `none` to disable it.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./voxguard.toml` or `./voxguard.json` (current working directory)
//! 2. `./config/voxguard.toml` or `./config/voxguard.json`
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use voxguard_common::resilience::{BackoffPolicy, JitterStrategy, PolicyEnvelope};

use super::ResilienceConfig;
use crate::errors::{InfraError, InfraResult};

/// Prefix for per-domain envelope overrides
pub const ENV_PREFIX: &str = "VOXGUARD_RETRY_";

/// Explicit config file path
const ENV_CONFIG_PATH: &str = "VOXGUARD_CONFIG";

const CONFIG_FILE_NAMES: [&str; 2] = ["voxguard.toml", "voxguard.json"];

/// Envelope fields settable from the environment, as upper-case suffixes
const ENV_FIELDS: [&str; 9] = [
    "POLICY",
    "INITIAL_DELAY_MS",
    "MULTIPLIER",
    "MAX_DELAY_MS",
    "MAX_ATTEMPTS",
    "JITTER_STRATEGY",
    "COOL_DOWN_MS",
    "FAILURE_BUDGET_MS",
    "CONSECUTIVE_FAILURE_THRESHOLD",
];

/// Load configuration with the full strategy described in the module docs
///
/// # Errors
/// Returns `InfraError` if:
/// - `VOXGUARD_CONFIG` names a missing file
/// - The config file cannot be read or parsed
/// - An environment override has an invalid value
/// - Any resulting envelope fails validation
pub fn load() -> InfraResult<ResilienceConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
    }

    let explicit = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
    let mut config = match explicit.or_else(probe_config_paths) {
        Some(path) => read_config(&path)?,
        None => {
            tracing::info!("No config file found, using built-in presets");
            ResilienceConfig::default()
        }
    };

    let applied = apply_env_overrides(&mut config)?;
    if applied > 0 {
        tracing::info!(overrides = applied, "Applied environment overrides");
    }

    config.fill_presets();
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file, without environment overrides
///
/// If `path` is `None`, probes the standard locations. Presets fill any
/// missing known domains and the result is validated.
///
/// # Errors
/// Returns `InfraError::Config` if the file is missing or has an unsupported
/// extension, `InfraError::Common` if it fails to parse, and
/// `InfraError::Envelope` if an envelope is invalid.
pub fn load_from_file(path: Option<PathBuf>) -> InfraResult<ResilienceConfig> {
    let config_path = match path {
        Some(p) => p,
        None => probe_config_paths().ok_or_else(|| {
            InfraError::config("No config file found in any of the standard locations")
        })?,
    };

    let mut config = read_config(&config_path)?;
    config.fill_presets();
    config.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> InfraResult<ResilienceConfig> {
    if !path.exists() {
        return Err(InfraError::config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents, path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `InfraError::Config` for an unsupported extension and
/// `InfraError::Common` if parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> InfraResult<ResilienceConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => Ok(toml::from_str(contents)?),
        "json" => Ok(serde_json::from_str(contents)?),
        _ => Err(InfraError::config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe standard paths for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join("config"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
            dirs.push(exe_dir.join("config"));
        }
    }

    dirs.into_iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Apply every `VOXGUARD_RETRY_<DOMAIN>_<FIELD>` variable to `config`
///
/// Domains without an envelope get their preset, or the default shape,
/// before the override is applied. Variables are applied in sorted order.
///
/// # Returns
/// The number of overrides applied.
///
/// # Errors
/// Returns `InfraError::Config` naming the variable if a value does not
/// parse.
pub fn apply_env_overrides(config: &mut ResilienceConfig) -> InfraResult<usize> {
    let mut overrides: Vec<(String, String)> =
        std::env::vars().filter(|(key, _)| key.starts_with(ENV_PREFIX)).collect();
    overrides.sort();

    let mut applied = 0;
    for (key, value) in overrides {
        let Some((domain, field)) = parse_env_key(&key) else {
            tracing::warn!(variable = %key, "Ignoring unrecognized retry override");
            continue;
        };

        apply_field(config.envelope_mut(&domain), field, value.trim()).map_err(|reason| {
            InfraError::config(format!("Invalid value for {}: {}", key, reason))
        })?;
        tracing::debug!(domain = %domain, field = field, "Applied retry override");
        applied += 1;
    }

    Ok(applied)
}

/// Split `VOXGUARD_RETRY_<DOMAIN>_<FIELD>` into a lower-case domain and field
fn parse_env_key(key: &str) -> Option<(String, &'static str)> {
    let rest = key.strip_prefix(ENV_PREFIX)?;
    ENV_FIELDS.iter().find_map(|field| {
        let domain = rest.strip_suffix(field)?.strip_suffix('_')?;
        (!domain.is_empty()).then(|| (domain.to_ascii_lowercase(), *field))
    })
}

fn apply_field(envelope: &mut PolicyEnvelope, field: &str, value: &str) -> Result<(), String> {
    match field {
        "POLICY" => envelope.policy = BackoffPolicy::from_name(value),
        "INITIAL_DELAY_MS" => envelope.initial_delay_ms = parse_number(value)?,
        "MULTIPLIER" => envelope.multiplier = parse_number(value)?,
        "MAX_DELAY_MS" => envelope.max_delay_ms = parse_number(value)?,
        "MAX_ATTEMPTS" => envelope.max_attempts = parse_number(value)?,
        "JITTER_STRATEGY" => {
            envelope.jitter_strategy =
                JitterStrategy::from_str(value).map_err(|e| e.to_string())?;
        }
        "COOL_DOWN_MS" => envelope.cool_down_ms = parse_number(value)?,
        "FAILURE_BUDGET_MS" => envelope.failure_budget_ms = parse_number(value)?,
        "CONSECUTIVE_FAILURE_THRESHOLD" => {
            envelope.consecutive_failure_threshold =
                if matches!(value.to_ascii_lowercase().as_str(), "none" | "off" | "") {
                    None
                } else {
                    Some(parse_number(value)?)
                };
        }
        other => return Err(format!("unknown field {}", other)),
    }
    Ok(())
}

fn parse_number<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| format!("'{}' ({})", value, e))
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
///
/// # Returns
/// The parsed boolean value, or `default` if not set.
pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn clear_retry_env() {
        for (key, _) in std::env::vars().filter(|(key, _)| key.starts_with(ENV_PREFIX)) {
            std::env::remove_var(key);
        }
    }

    fn write_temp(contents: &str, extension: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("VOXGUARD_TEST_BOOL_TRUE", "Yes");
        std::env::set_var("VOXGUARD_TEST_BOOL_FALSE", "off");
        std::env::remove_var("VOXGUARD_TEST_BOOL_MISSING");

        assert!(env_bool("VOXGUARD_TEST_BOOL_TRUE", false));
        assert!(!env_bool("VOXGUARD_TEST_BOOL_FALSE", true));
        assert!(env_bool("VOXGUARD_TEST_BOOL_MISSING", true));
        assert!(!env_bool("VOXGUARD_TEST_BOOL_MISSING", false));

        std::env::remove_var("VOXGUARD_TEST_BOOL_TRUE");
        std::env::remove_var("VOXGUARD_TEST_BOOL_FALSE");
    }

    #[test]
    fn test_parse_env_key() {
        assert_eq!(
            parse_env_key("VOXGUARD_RETRY_AUTH_MAX_ATTEMPTS"),
            Some(("auth".to_string(), "MAX_ATTEMPTS"))
        );
        assert_eq!(
            parse_env_key("VOXGUARD_RETRY_MEDIA_RELAY_MAX_DELAY_MS"),
            Some(("media_relay".to_string(), "MAX_DELAY_MS"))
        );
        assert_eq!(parse_env_key("VOXGUARD_RETRY_MAX_ATTEMPTS"), None);
        assert_eq!(parse_env_key("VOXGUARD_RETRY_AUTH_COLOR"), None);
        assert_eq!(parse_env_key("OTHER_AUTH_MAX_ATTEMPTS"), None);
    }

    #[test]
    fn test_apply_env_overrides() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_retry_env();

        std::env::set_var("VOXGUARD_RETRY_AUTH_MAX_ATTEMPTS", "6");
        std::env::set_var("VOXGUARD_RETRY_AUTH_JITTER_STRATEGY", "full");
        std::env::set_var("VOXGUARD_RETRY_SESSION_CONSECUTIVE_FAILURE_THRESHOLD", "none");
        std::env::set_var("VOXGUARD_RETRY_BILLING_POLICY", "linear");

        let mut config = ResilienceConfig::default();
        let applied = apply_env_overrides(&mut config).unwrap();

        assert_eq!(applied, 4);
        let auth = config.envelope("auth").unwrap();
        assert_eq!(auth.max_attempts, 6);
        assert_eq!(auth.jitter_strategy, JitterStrategy::DeterministicFull);
        assert_eq!(auth.cool_down_ms, PolicyEnvelope::auth().cool_down_ms);
        assert_eq!(config.envelope("session").unwrap().consecutive_failure_threshold, None);
        assert_eq!(config.envelope("billing").unwrap().policy, BackoffPolicy::Linear);

        clear_retry_env();
    }

    #[test]
    fn test_apply_env_overrides_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_retry_env();

        std::env::set_var("VOXGUARD_RETRY_TRANSPORT_MAX_ATTEMPTS", "lots");

        let mut config = ResilienceConfig::default();
        let err = apply_env_overrides(&mut config).unwrap_err();

        match err {
            InfraError::Config(message) => {
                assert!(message.contains("VOXGUARD_RETRY_TRANSPORT_MAX_ATTEMPTS"));
            }
            other => panic!("expected Config error, got {:?}", other),
        }

        clear_retry_env();
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
[[envelopes]]
domain = "auth"
policy = "linear"
initial_delay_ms = 100
multiplier = 50.0
max_attempts = 5
jitter_strategy = "none"
"#;
        let path = write_temp(toml_content, "toml");

        let config = load_from_file(Some(path.clone())).unwrap();

        let auth = config.envelope("auth").unwrap();
        assert_eq!(auth.policy, BackoffPolicy::Linear);
        assert_eq!(auth.multiplier, 50.0);
        assert_eq!(auth.max_attempts, 5);
        assert_eq!(auth.cool_down_ms, 30_000);
        assert_eq!(config.domains(), vec!["auth", "transport", "session"]);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "envelopes": [
                { "domain": "transport", "max_attempts": 8, "consecutive_failure_threshold": null }
            ]
        }"#;
        let path = write_temp(json_content, "json");

        let config = load_from_file(Some(path.clone())).unwrap();

        let transport = config.envelope("transport").unwrap();
        assert_eq!(transport.max_attempts, 8);
        assert_eq!(transport.consecutive_failure_threshold, None);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_rejects_invalid_envelope() {
        let path = write_temp("[[envelopes]]\ndomain = \"auth\"\nmax_attempts = 0\n", "toml");

        let err = load_from_file(Some(path.clone())).unwrap_err();
        assert!(matches!(err, InfraError::Envelope(_)), "got {:?}", err);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/voxguard.toml")));
        assert!(matches!(result, Err(InfraError::Config(_))));
    }

    #[test]
    fn test_parse_config_invalid_json() {
        let result = parse_config(r#"{ "envelopes": "#, Path::new("voxguard.json"));
        assert!(matches!(result, Err(InfraError::Common(_))));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("envelopes: []", Path::new("voxguard.yaml"));
        assert!(matches!(result, Err(InfraError::Config(_))));
    }

    #[test]
    fn test_parse_config_empty_toml() {
        let config = parse_config("", Path::new("voxguard.toml")).unwrap();
        assert!(config.envelopes.is_empty());
    }
}
