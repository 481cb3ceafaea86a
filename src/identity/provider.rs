use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::cache::RosterCache;
use crate::normalize::normalize;
use crate::tprintln;

use super::leadership::is_leader;
use super::matcher::resolve;
use super::principal::{Principal, Role};

pub const MSG_SUCCESS: &str = "login successful";
pub const MSG_NOT_FOUND: &str = "user not found";
pub const MSG_BAD_CREDENTIAL: &str = "invalid credential";
pub const MSG_NOT_LEADER: &str = "not authorized: requires leadership";
pub const MSG_UNAVAILABLE: &str = "directory unavailable";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Configured administrator pair. When present it is checked before the directory is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// Terminal state of a login attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    Success,
    /// Expected, user-facing refusal.
    Denied,
    /// The directory could not be consulted.
    ServerError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthOutcome {
    pub ok: bool,
    pub status: LoginStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl AuthOutcome {
    fn success(principal: Principal) -> Self {
        Self {
            ok: true,
            status: LoginStatus::Success,
            message: MSG_SUCCESS.to_string(),
            principal_name: Some(principal.name),
            role: Some(principal.role),
        }
    }

    fn denied(message: &str) -> Self {
        Self { ok: false, status: LoginStatus::Denied, message: message.to_string(), principal_name: None, role: None }
    }

    fn server_error() -> Self {
        Self { ok: false, status: LoginStatus::ServerError, message: MSG_UNAVAILABLE.to_string(), principal_name: None, role: None }
    }

    /// Map to HTTP status code: 200 / 401 / 503.
    pub fn http_status(&self) -> u16 {
        match self.status {
            LoginStatus::Success => 200,
            LoginStatus::Denied => 401,
            LoginStatus::ServerError => 503,
        }
    }
}

/// Login orchestration: admin bypass, roster lookup, name resolution, credential check and
/// leadership check. Every path ends in an [`AuthOutcome`]; nothing escapes as an error.
#[derive(Clone)]
pub struct AuthEngine {
    admin: Option<AdminCredentials>,
    roster: RosterCache,
}

impl AuthEngine {
    pub fn new(roster: RosterCache, admin: Option<AdminCredentials>) -> Self {
        Self { admin, roster }
    }

    pub fn admin_enabled(&self) -> bool { self.admin.is_some() }

    pub async fn login(&self, username: &str, password: &str) -> AuthOutcome {
        if let Some(admin) = self.admin_match(username, password) {
            info!(target: "rollcall::auth", user = %admin.username, "admin login");
            return AuthOutcome::success(Principal { name: admin.username.clone(), role: Role::Admin });
        }

        let roster = match self.roster.get().await {
            Ok(r) if !r.is_empty() => r,
            Ok(_) => {
                error!(target: "rollcall::auth", "login refused: directory returned an empty roster");
                self.roster.invalidate();
                return AuthOutcome::server_error();
            }
            Err(e) => {
                error!(target: "rollcall::auth", kind = e.kind(), "login refused: {}", e);
                return AuthOutcome::server_error();
            }
        };

        let found = resolve(username, &roster);
        tprintln!("auth.resolve user={:?} tier={:?}", username, found.tier);
        let Some(member) = found.member else {
            info!(target: "rollcall::auth", user = %username, "denied: {}", MSG_NOT_FOUND);
            return AuthOutcome::denied(MSG_NOT_FOUND);
        };

        // A blank credential on file never authenticates, not even against a blank password.
        let credential = member.credential.trim();
        if credential.is_empty() || credential != password.trim() {
            info!(target: "rollcall::auth", user = %member.name, tier = ?found.tier, "denied: {}", MSG_BAD_CREDENTIAL);
            return AuthOutcome::denied(MSG_BAD_CREDENTIAL);
        }

        if !is_leader(member, &roster) {
            info!(target: "rollcall::auth", user = %member.name, "denied: {}", MSG_NOT_LEADER);
            return AuthOutcome::denied(MSG_NOT_LEADER);
        }

        info!(target: "rollcall::auth", user = %member.name, tier = ?found.tier, "leader login");
        AuthOutcome::success(Principal { name: member.name.clone(), role: Role::Leader })
    }

    pub async fn login_request(&self, req: &LoginRequest) -> AuthOutcome {
        self.login(&req.username, &req.password).await
    }

    fn admin_match(&self, username: &str, password: &str) -> Option<&AdminCredentials> {
        let admin = self.admin.as_ref()?;
        let same_user = !admin.username.trim().is_empty() && normalize(username) == normalize(&admin.username);
        (same_user && password == admin.password).then_some(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use futures_util::FutureExt;

    use crate::cache::{Loader, RefreshCache};
    use crate::directory::Member;
    use crate::error::FetchError;

    fn engine_with(result: Result<Vec<Member>, FetchError>, admin: Option<AdminCredentials>) -> AuthEngine {
        let loader: Loader<Vec<Member>> = Arc::new(move || {
            let r = result.clone();
            async move { r }.boxed()
        });
        let cache = RefreshCache::new("roster", Duration::from_secs(60), Duration::from_secs(1), loader);
        AuthEngine::new(cache, admin)
    }

    fn admin() -> Option<AdminCredentials> {
        Some(AdminCredentials { username: "admin".into(), password: "secret".into() })
    }

    #[tokio::test]
    async fn admin_bypass_skips_directory() {
        let engine = engine_with(Err(FetchError::Unconfigured), admin());
        let out = engine.login("Admin", "secret").await;
        assert!(out.ok);
        assert_eq!(out.role, Some(Role::Admin));
        assert_eq!(out.principal_name.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn admin_password_is_exact() {
        let engine = engine_with(Err(FetchError::Unconfigured), admin());
        let out = engine.login("admin", " secret").await;
        // Falls through to the directory, which is down.
        assert_eq!(out.status, LoginStatus::ServerError);
    }

    #[tokio::test]
    async fn empty_roster_is_server_error() {
        let engine = engine_with(Ok(vec![]), None);
        let out = engine.login("ana", "1").await;
        assert_eq!(out.status, LoginStatus::ServerError);
        assert_eq!(out.message, MSG_UNAVAILABLE);
        assert_eq!(out.http_status(), 503);
    }

    #[tokio::test]
    async fn credential_compared_trimmed() {
        let roster = vec![Member::new("Ana Lima", " 42 ").with_role("Líder")];
        let engine = engine_with(Ok(roster), None);
        let out = engine.login("ana", "42 ").await;
        assert!(out.ok, "{out:?}");
        assert_eq!(out.role, Some(Role::Leader));
        assert_eq!(out.principal_name.as_deref(), Some("Ana Lima"));
    }

    #[tokio::test]
    async fn credential_is_case_sensitive() {
        let roster = vec![Member::new("Ana Lima", "AbC").with_role("Líder")];
        let engine = engine_with(Ok(roster), None);
        assert_eq!(engine.login("Ana Lima", "abc").await.message, MSG_BAD_CREDENTIAL);
    }

    #[tokio::test]
    async fn empty_roster_is_retried_on_next_login() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let loader: Loader<Vec<Member>> = Arc::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let members = if n == 0 { vec![] } else { vec![Member::new("Ana Lima", "42").with_role("Líder")] };
                Ok::<_, FetchError>(members)
            }
            .boxed()
        });
        let cache = RefreshCache::new("roster", Duration::from_secs(300), Duration::from_secs(1), loader);
        let engine = AuthEngine::new(cache, None);

        assert_eq!(engine.login("ana", "42").await.status, LoginStatus::ServerError);
        let out = engine.login("ana", "42").await;
        assert!(out.ok, "{out:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn blank_credential_on_file_never_matches() {
        let roster = vec![Member::new("Ana Lima", "  ").with_role("Líder")];
        let engine = engine_with(Ok(roster), None);
        assert_eq!(engine.login("ana", "").await.message, MSG_BAD_CREDENTIAL);
        assert_eq!(engine.login("ana", "   ").await.message, MSG_BAD_CREDENTIAL);
    }

    #[test]
    fn outcome_serializes_for_request_layer() {
        let v = serde_json::to_value(AuthOutcome::denied(MSG_NOT_FOUND)).unwrap();
        assert_eq!(v["ok"], false);
        assert_eq!(v["status"], "denied");
        assert!(v.get("principalName").is_none());
        let v = serde_json::to_value(AuthOutcome::success(Principal { name: "Ana".into(), role: Role::Leader })).unwrap();
        assert_eq!(v["role"], "leader");
        assert_eq!(v["principalName"], "Ana");
    }
}
