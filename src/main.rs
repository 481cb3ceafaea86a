//!
//! rollcall server binary
//! ----------------------
//! Command-line entry point. Settings come from `ROLLCALL_*` environment variables; the flags
//! below override them.

use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use rollcall::config::Settings;

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].parse::<T>().ok();
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("rollcall server\n\nUSAGE:\n  rollcall [--http-port N] [--upstream-url URL] [--cache-ttl-secs N]\n\nOPTIONS:\n  --http-port N         HTTP port (env: ROLLCALL_HTTP_PORT, default 7878)\n  --upstream-url URL    Upstream directory base URL (env: ROLLCALL_UPSTREAM_URL)\n  --cache-ttl-secs N    Roster cache TTL in seconds (env: ROLLCALL_ROSTER_TTL_SECS, default 300)\n\nOther settings: ROLLCALL_ADMIN_USER, ROLLCALL_ADMIN_PASSWORD, ROLLCALL_ACTIVITY_TTL_SECS, ROLLCALL_FETCH_TIMEOUT_SECS\n");
        return Ok(());
    }

    let (mut settings, mut problems) = Settings::from_env();

    // CLI arguments override environment
    if let Some(port) = parse_arg::<u16>(&args, "--http-port") {
        settings.http_port = port;
    }
    if let Some(url) = parse_arg::<String>(&args, "--upstream-url") {
        settings.upstream_url = Some(url);
        problems.retain(|p| !matches!(p, rollcall::error::ConfigError::Missing(k) if *k == rollcall::config::ENV_UPSTREAM_URL));
    }
    if let Some(secs) = parse_arg::<u64>(&args, "--cache-ttl-secs") {
        settings.roster_ttl = Duration::from_secs(secs);
    }

    rollcall::server::run_with_settings(settings, &problems).await
}
