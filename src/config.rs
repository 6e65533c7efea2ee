use std::path::PathBuf;

/// Environment variable holding the Trassir host (and optional port), no scheme.
pub const ENV_ADDRESS: &str = "TRASSIR_ADDRESS";
/// Environment variable holding the Trassir account name.
pub const ENV_USERNAME: &str = "TRASSIR_USERNAME";
/// Environment variable holding the Trassir account password.
pub const ENV_PASSWORD: &str = "TRASSIR_PASSWORD";
/// Environment variable toggling TLS certificate checks ("0"/"false" to enforce them).
pub const ENV_ACCEPT_INVALID_CERTS: &str = "TRASSIR_ACCEPT_INVALID_CERTS";
/// Environment variable overriding the audit log path.
pub const ENV_AUDIT_LOG: &str = "TRASSIR_AUDIT_LOG";

/// Connection settings for the Trassir server.
///
/// All of it comes from the process environment at startup; there is no
/// config file. A missing variable leaves the field empty rather than
/// failing, and [`TrassirConfig::is_configured`] is the check callers use
/// before expecting vendor calls to go anywhere.
#[derive(Debug, Clone)]
pub struct TrassirConfig {
    /// Host (and optional port) of the Trassir server, without a scheme.
    pub address: String,
    pub username: String,
    pub password: String,
    /// Trassir installations ship self-signed certificates, so checks are
    /// off unless explicitly enforced.
    pub accept_invalid_certs: bool,
    /// Where door-open audit records are appended.
    pub audit_log: PathBuf,
}

impl TrassirConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            address: get(ENV_ADDRESS).unwrap_or_default(),
            username: get(ENV_USERNAME).unwrap_or_default(),
            password: get(ENV_PASSWORD).unwrap_or_default(),
            accept_invalid_certs: flag(get(ENV_ACCEPT_INVALID_CERTS).as_deref(), true),
            audit_log: get(ENV_AUDIT_LOG)
                .map(PathBuf::from)
                .unwrap_or_else(default_audit_log),
        }
    }

    /// True only when address, username and password are all non-empty.
    /// A pure check; it says nothing about whether the credentials work.
    pub fn is_configured(&self) -> bool {
        !self.address.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }

    /// Names of the required environment variables that are empty or unset.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.address.is_empty() {
            missing.push(ENV_ADDRESS);
        }
        if self.username.is_empty() {
            missing.push(ENV_USERNAME);
        }
        if self.password.is_empty() {
            missing.push(ENV_PASSWORD);
        }
        missing
    }
}

/// Parse a boolean-ish environment value; anything but an explicit "off"
/// spelling counts as the default.
fn flag(value: Option<&str>, default: bool) -> bool {
    match value.map(str::trim) {
        Some("0") | Some("false") | Some("no") | Some("off") => false,
        Some("1") | Some("true") | Some("yes") | Some("on") => true,
        _ => default,
    }
}

fn default_audit_log() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".trassir-doors")
        .join("door-log.jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> TrassirConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TrassirConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_is_configured_requires_all_three() {
        let full = config_from(&[
            (ENV_ADDRESS, "doors.example.org"),
            (ENV_USERNAME, "portal"),
            (ENV_PASSWORD, "secret"),
        ]);
        assert!(full.is_configured());

        for skip in [ENV_ADDRESS, ENV_USERNAME, ENV_PASSWORD] {
            let vars: Vec<(&str, &str)> = [
                (ENV_ADDRESS, "doors.example.org"),
                (ENV_USERNAME, "portal"),
                (ENV_PASSWORD, "secret"),
            ]
            .into_iter()
            .filter(|(k, _)| *k != skip)
            .collect();
            let partial = config_from(&vars);
            assert!(!partial.is_configured(), "should fail without {}", skip);
            assert_eq!(partial.missing(), vec![skip]);
        }
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let cfg = config_from(&[
            (ENV_ADDRESS, "doors.example.org"),
            (ENV_USERNAME, ""),
            (ENV_PASSWORD, "secret"),
        ]);
        assert!(!cfg.is_configured());
        assert_eq!(cfg.missing(), vec![ENV_USERNAME]);
    }

    #[test]
    fn test_unconfigured_by_default() {
        let cfg = config_from(&[]);
        assert!(!cfg.is_configured());
        assert_eq!(cfg.missing().len(), 3);
        assert!(cfg.accept_invalid_certs);
    }

    #[test]
    fn test_flag_spellings() {
        assert!(flag(None, true));
        assert!(!flag(None, false));
        assert!(!flag(Some("0"), true));
        assert!(!flag(Some("false"), true));
        assert!(!flag(Some(" no "), true));
        assert!(flag(Some("1"), false));
        assert!(flag(Some("yes"), false));
        // unrecognized spellings fall back to the default
        assert!(flag(Some("maybe"), true));
        assert!(!flag(Some("maybe"), false));
    }

    #[test]
    fn test_audit_log_override() {
        let cfg = config_from(&[(ENV_AUDIT_LOG, "/var/log/doors.jsonl")]);
        assert_eq!(cfg.audit_log, PathBuf::from("/var/log/doors.jsonl"));
    }

    #[test]
    fn test_tls_checks_can_be_enforced() {
        let cfg = config_from(&[(ENV_ACCEPT_INVALID_CERTS, "false")]);
        assert!(!cfg.accept_invalid_certs);
    }
}
