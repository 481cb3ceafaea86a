//! Runtime settings.
//!
//! Read from `ROLLCALL_*` environment variables; the server binary lets command-line flags
//! override them. Missing or unparseable settings never abort startup: they are collected as
//! [`ConfigError`]s, logged by the caller, and the affected feature falls back to a default or
//! is disabled.

use std::time::Duration;

use crate::cache::{DEFAULT_ACTIVITY_TTL, DEFAULT_FETCH_TIMEOUT, DEFAULT_ROSTER_TTL};
use crate::error::ConfigError;
use crate::identity::AdminCredentials;

pub const ENV_HTTP_PORT: &str = "ROLLCALL_HTTP_PORT";
pub const ENV_UPSTREAM_URL: &str = "ROLLCALL_UPSTREAM_URL";
pub const ENV_ADMIN_USER: &str = "ROLLCALL_ADMIN_USER";
pub const ENV_ADMIN_PASSWORD: &str = "ROLLCALL_ADMIN_PASSWORD";
pub const ENV_ROSTER_TTL: &str = "ROLLCALL_ROSTER_TTL_SECS";
pub const ENV_ACTIVITY_TTL: &str = "ROLLCALL_ACTIVITY_TTL_SECS";
pub const ENV_FETCH_TIMEOUT: &str = "ROLLCALL_FETCH_TIMEOUT_SECS";

pub const DEFAULT_HTTP_PORT: u16 = 7878;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub http_port: u16,
    /// `None` disables upstream access; only the admin bypass can log in.
    pub upstream_url: Option<String>,
    /// `None` disables the admin bypass.
    pub admin: Option<AdminCredentials>,
    pub roster_ttl: Duration,
    pub activity_ttl: Duration,
    pub fetch_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            upstream_url: None,
            admin: None,
            roster_ttl: DEFAULT_ROSTER_TTL,
            activity_ttl: DEFAULT_ACTIVITY_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl Settings {
    pub fn from_env() -> (Self, Vec<ConfigError>) {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<ConfigError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut problems = Vec::new();
        let mut s = Settings::default();

        if let Some(v) = get(ENV_HTTP_PORT) {
            match v.parse::<u16>() {
                Ok(p) => s.http_port = p,
                Err(_) => problems.push(ConfigError::Invalid { key: ENV_HTTP_PORT, value: v }),
            }
        }

        s.upstream_url = get(ENV_UPSTREAM_URL);
        if s.upstream_url.is_none() {
            problems.push(ConfigError::Missing(ENV_UPSTREAM_URL));
        }

        // Password is not trimmed: admin comparison is exact.
        let admin_pw = lookup(ENV_ADMIN_PASSWORD).filter(|v| !v.is_empty());
        match (get(ENV_ADMIN_USER), admin_pw) {
            (Some(username), Some(password)) => s.admin = Some(AdminCredentials { username, password }),
            (None, None) => {}
            (None, Some(_)) => problems.push(ConfigError::Missing(ENV_ADMIN_USER)),
            (Some(_), None) => problems.push(ConfigError::Missing(ENV_ADMIN_PASSWORD)),
        }

        if let Some(d) = parse_secs(&get, ENV_ROSTER_TTL, &mut problems) { s.roster_ttl = d; }
        if let Some(d) = parse_secs(&get, ENV_ACTIVITY_TTL, &mut problems) { s.activity_ttl = d; }
        if let Some(d) = parse_secs(&get, ENV_FETCH_TIMEOUT, &mut problems) {
            if d.is_zero() {
                problems.push(ConfigError::Invalid { key: ENV_FETCH_TIMEOUT, value: "0".into() });
            } else {
                s.fetch_timeout = d;
            }
        }

        (s, problems)
    }
}

fn parse_secs<G>(get: &G, key: &'static str, problems: &mut Vec<ConfigError>) -> Option<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    let v = get(key)?;
    match v.parse::<u64>() {
        Ok(n) => Some(Duration::from_secs(n)),
        Err(_) => {
            problems.push(ConfigError::Invalid { key, value: v });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> (Settings, Vec<ConfigError>) {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_empty() {
        let (s, problems) = from_pairs(&[]);
        assert_eq!(s.http_port, 7878);
        assert_eq!(s.roster_ttl, Duration::from_secs(300));
        assert_eq!(s.activity_ttl, Duration::from_secs(120));
        assert!(s.admin.is_none());
        assert!(s.upstream_url.is_none());
        assert_eq!(problems, vec![ConfigError::Missing(ENV_UPSTREAM_URL)]);
    }

    #[test]
    fn reads_all_settings() {
        let (s, problems) = from_pairs(&[
            (ENV_HTTP_PORT, "9000"),
            (ENV_UPSTREAM_URL, " https://dir.example/api "),
            (ENV_ADMIN_USER, "admin"),
            (ENV_ADMIN_PASSWORD, " secret"),
            (ENV_ROSTER_TTL, "60"),
            (ENV_ACTIVITY_TTL, "30"),
            (ENV_FETCH_TIMEOUT, "5"),
        ]);
        assert!(problems.is_empty(), "{problems:?}");
        assert_eq!(s.http_port, 9000);
        assert_eq!(s.upstream_url.as_deref(), Some("https://dir.example/api"));
        assert_eq!(s.admin, Some(AdminCredentials { username: "admin".into(), password: " secret".into() }));
        assert_eq!(s.roster_ttl, Duration::from_secs(60));
        assert_eq!(s.activity_ttl, Duration::from_secs(30));
        assert_eq!(s.fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn half_configured_admin_is_disabled() {
        let (s, problems) = from_pairs(&[(ENV_UPSTREAM_URL, "http://x"), (ENV_ADMIN_USER, "admin")]);
        assert!(s.admin.is_none());
        assert_eq!(problems, vec![ConfigError::Missing(ENV_ADMIN_PASSWORD)]);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let (s, problems) = from_pairs(&[
            (ENV_UPSTREAM_URL, "http://x"),
            (ENV_HTTP_PORT, "seventy"),
            (ENV_ROSTER_TTL, "-1"),
            (ENV_FETCH_TIMEOUT, "0"),
        ]);
        assert_eq!(s.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(s.roster_ttl, DEFAULT_ROSTER_TTL);
        assert_eq!(s.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().all(|p| matches!(p, ConfigError::Invalid { .. })));
    }
}
