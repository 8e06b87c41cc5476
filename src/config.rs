//! Portal configuration from environment variables and command-line flags.
//! Flags override environment, which overrides built-in defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::identity::DEFAULT_SESSION_TTL;

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub http_port: u16,
    /// Holds persisted session slots under `sessions/`.
    pub state_dir: PathBuf,
    pub login_latency: Duration,
    /// Signed-in sessions end this long after their login.
    pub session_ttl: Duration,
    /// PostgREST base URL; the in-memory backend is used when unset.
    pub data_url: Option<String>,
    pub data_key: Option<String>,
    /// JSON `{table: [rows]}` loaded into the in-memory backend at startup.
    pub seed_file: Option<PathBuf>,
    pub secure_cookie: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            http_port: 7979,
            state_dir: PathBuf::from("portal_state"),
            login_latency: Duration::from_millis(300),
            session_ttl: DEFAULT_SESSION_TTL,
            data_url: None,
            data_key: None,
            seed_file: None,
            secure_cookie: true,
        }
    }
}

fn parse_u16_env(name: &str) -> Option<u16> { env::var(name).ok().and_then(|v| v.trim().parse::<u16>().ok()) }

fn parse_u64_env(name: &str) -> Option<u64> { env::var(name).ok().and_then(|v| v.trim().parse::<u64>().ok()) }

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_bool_env(name: &str) -> Option<bool> { env::var(name).ok().and_then(|v| parse_bool(&v)) }

fn non_empty_env(name: &str) -> Option<String> { env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) }

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].as_str());
        }
        if let Some(v) = args[i].strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
            return Some(v);
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool { args.iter().any(|a| a == flag) }

impl PortalConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(p) = parse_u16_env("CSP_PORTAL_HTTP_PORT") { cfg.http_port = p; }
        if let Some(d) = non_empty_env("CSP_PORTAL_STATE_DIR") { cfg.state_dir = PathBuf::from(d); }
        if let Some(ms) = parse_u64_env("CSP_PORTAL_LOGIN_LATENCY_MS") { cfg.login_latency = Duration::from_millis(ms); }
        if let Some(secs) = parse_u64_env("CSP_PORTAL_SESSION_TTL_SECS").filter(|s| *s > 0) { cfg.session_ttl = Duration::from_secs(secs); }
        cfg.data_url = non_empty_env("CSP_PORTAL_DATA_URL");
        cfg.data_key = non_empty_env("CSP_PORTAL_DATA_KEY");
        cfg.seed_file = non_empty_env("CSP_PORTAL_SEED_FILE").map(PathBuf::from);
        if let Some(b) = parse_bool_env("CSP_PORTAL_SECURE_COOKIE") { cfg.secure_cookie = b; }
        cfg
    }

    /// Apply `--port`, `--state-dir`, `--latency-ms`, `--session-ttl-secs`,
    /// `--data-url`, `--seed-file` and `--insecure-cookie`. Unparseable values are ignored.
    pub fn apply_args(mut self, args: &[String]) -> Self {
        if let Some(p) = flag_value(args, "--port").and_then(|v| v.parse::<u16>().ok()) { self.http_port = p; }
        if let Some(d) = flag_value(args, "--state-dir") { self.state_dir = PathBuf::from(d); }
        if let Some(ms) = flag_value(args, "--latency-ms").and_then(|v| v.parse::<u64>().ok()) { self.login_latency = Duration::from_millis(ms); }
        if let Some(secs) = flag_value(args, "--session-ttl-secs").and_then(|v| v.parse::<u64>().ok()).filter(|s| *s > 0) {
            self.session_ttl = Duration::from_secs(secs);
        }
        if let Some(u) = flag_value(args, "--data-url") { self.data_url = Some(u.to_string()); }
        if let Some(f) = flag_value(args, "--seed-file") { self.seed_file = Some(PathBuf::from(f)); }
        if has_flag(args, "--insecure-cookie") { self.secure_cookie = false; }
        self
    }

    pub fn sessions_dir(&self) -> PathBuf { self.state_dir.join("sessions") }
}
