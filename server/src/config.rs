use std::time::Duration;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_SIMPLIFIER_URL: &str = "http://127.0.0.1:5000";
// Simplification of a full day of points can take a while upstream.
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn server_port() -> u16 {
    non_empty_var("SERVER_PORT")
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

/// Base URL of the simplification service, without a trailing slash.
pub fn simplifier_url() -> String {
    non_empty_var("SIMPLIFIER_URL")
        .filter(|value| value.starts_with("http://") || value.starts_with("https://"))
        .map(|value| value.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_SIMPLIFIER_URL.to_string())
}

pub fn upstream_http_timeout() -> Duration {
    non_empty_var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    non_empty_var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

pub fn static_dir() -> String {
    non_empty_var("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        temp_env::with_vars_unset(
            [
                "SERVER_PORT",
                "SIMPLIFIER_URL",
                "UPSTREAM_HTTP_TIMEOUT_SECS",
                "UPSTREAM_CONNECT_TIMEOUT_SECS",
                "STATIC_DIR",
            ],
            || {
                assert_eq!(server_port(), 3000);
                assert_eq!(simplifier_url(), "http://127.0.0.1:5000");
                assert_eq!(upstream_http_timeout(), Duration::from_secs(120));
                assert_eq!(upstream_connect_timeout(), Duration::from_secs(3));
                assert_eq!(static_dir(), "client/dist");
            },
        );
    }

    #[test]
    fn valid_values_override_defaults() {
        temp_env::with_vars(
            [
                ("SERVER_PORT", Some("8080")),
                ("SIMPLIFIER_URL", Some("https://simplifier.internal:9000/")),
                ("UPSTREAM_HTTP_TIMEOUT_SECS", Some(" 30 ")),
                ("STATIC_DIR", Some("/srv/dashboard")),
            ],
            || {
                assert_eq!(server_port(), 8080);
                assert_eq!(simplifier_url(), "https://simplifier.internal:9000");
                assert_eq!(upstream_http_timeout(), Duration::from_secs(30));
                assert_eq!(static_dir(), "/srv/dashboard");
            },
        );
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        temp_env::with_vars(
            [
                ("SERVER_PORT", Some("not-a-port")),
                ("SIMPLIFIER_URL", Some("localhost:5000")),
                ("UPSTREAM_HTTP_TIMEOUT_SECS", Some("0")),
                ("UPSTREAM_CONNECT_TIMEOUT_SECS", Some("-4")),
                ("STATIC_DIR", Some("   ")),
            ],
            || {
                assert_eq!(server_port(), DEFAULT_SERVER_PORT);
                assert_eq!(simplifier_url(), DEFAULT_SIMPLIFIER_URL);
                assert_eq!(
                    upstream_http_timeout(),
                    Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS)
                );
                assert_eq!(
                    upstream_connect_timeout(),
                    Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS)
                );
                assert_eq!(static_dir(), DEFAULT_STATIC_DIR);
            },
        );
    }
}
