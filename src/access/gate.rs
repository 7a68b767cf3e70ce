use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, error, info};

use super::state::{derive_access_state, AccessState};
use crate::{
    auth::{jwt::JwtKeys, session},
    error::AppError,
    state::AppState,
};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const ONBOARDING_PATH: &str = "/onboarding";
pub const PENDING_APPROVAL_PATH: &str = "/pending-approval";
pub const COMPLETE_PROFILE_PATH: &str = "/api/complete-profile";

const ADMIN_PREFIXES: [&str; 2] = ["/admin", "/api/admin"];

/// Outcome of the state machine for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    ToLogin,
    ToOnboarding,
    ToPendingApproval,
    ToDashboard,
}

impl Verdict {
    pub fn location(self) -> Option<&'static str> {
        match self {
            Verdict::Allow => None,
            Verdict::ToLogin => Some(LOGIN_PATH),
            Verdict::ToOnboarding => Some(ONBOARDING_PATH),
            Verdict::ToPendingApproval => Some(PENDING_APPROVAL_PATH),
            Verdict::ToDashboard => Some(DASHBOARD_PATH),
        }
    }

    /// API callers get a status code instead of a redirect.
    fn api_error(self) -> AppError {
        match self {
            Verdict::ToLogin => AppError::Unauthenticated("Not authenticated".into()),
            Verdict::ToOnboarding => AppError::Forbidden("Profile is incomplete".into()),
            Verdict::ToPendingApproval => {
                AppError::Forbidden("Account is pending administrator approval".into())
            }
            Verdict::ToDashboard | Verdict::Allow => AppError::Forbidden("Unauthorized access".into()),
        }
    }
}

/// `path` equals `prefix` or continues it with a `/`.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// The allow-list of route prefixes the gate applies to.
pub fn is_gated(path: &str) -> bool {
    under(path, DASHBOARD_PATH)
        || path == ONBOARDING_PATH
        || path == PENDING_APPROVAL_PATH
        || under(path, COMPLETE_PROFILE_PATH)
        || ADMIN_PREFIXES.iter().any(|p| under(path, p))
}

pub fn is_admin_route(path: &str) -> bool {
    ADMIN_PREFIXES.iter().any(|p| under(path, p))
}

fn is_api(path: &str) -> bool {
    under(path, "/api")
}

/// The state machine, rules checked in priority order.
pub fn evaluate(state: AccessState, path: &str, is_admin: bool) -> Verdict {
    if !is_gated(path) {
        return Verdict::Allow;
    }
    let completing_profile = under(path, COMPLETE_PROFILE_PATH);

    match state {
        AccessState::Unauthenticated => Verdict::ToLogin,
        AccessState::NeedsOnboarding if path != ONBOARDING_PATH && !completing_profile => {
            Verdict::ToOnboarding
        }
        AccessState::PendingApproval if path != PENDING_APPROVAL_PATH && !completing_profile => {
            Verdict::ToPendingApproval
        }
        _ if is_admin_route(path) && !is_admin => Verdict::ToDashboard,
        _ => Verdict::Allow,
    }
}

fn reject(path: &str, verdict: Verdict) -> Response {
    if is_api(path) {
        return verdict.api_error().into_response();
    }
    match verdict.location() {
        Some(location) => Redirect::temporary(location).into_response(),
        None => verdict.api_error().into_response(),
    }
}

/// Middleware gating every navigable request.
///
/// Materializes the session once, hands it to downstream extractors through
/// the request extensions and, for cookie sessions, rewrites the cookie with
/// the re-synced snapshot.
pub async fn access_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if !is_gated(&path) {
        return next.run(request).await;
    }

    let resolved = match session::resolve(&state, request.headers(), &jar).await {
        Ok(resolved) => resolved,
        Err(e) => {
            error!(error = %e, path = %path, "session materialization failed");
            return e.into_response();
        }
    };

    let user = resolved.as_ref().map(|r| &r.user);
    let access = derive_access_state(user);
    let is_admin = user.is_some_and(|u| state.admin.is_admin(&u.email));
    let verdict = evaluate(access, &path, is_admin);

    if verdict != Verdict::Allow {
        info!(
            email = user_email(user),
            path = %path,
            state = ?access,
            verdict = ?verdict,
            "access gate redirect"
        );
        return reject(&path, verdict);
    }
    // Allow on a gated path implies a session.
    let Some(resolved) = resolved else {
        return reject(&path, Verdict::ToLogin);
    };
    debug!(email = %resolved.user.email, path = %path, "access granted");

    let refreshed_cookie = match resolved.source {
        session::TokenSource::Cookie => match JwtKeys::from(&state.config.jwt).sign_access(&resolved.user) {
            Ok(token) => Some(session::session_cookie(token, &state.config)),
            Err(e) => {
                error!(error = %e, "failed to re-sign session token");
                None
            }
        },
        session::TokenSource::Header => None,
    };

    request.extensions_mut().insert(resolved.user);
    let response = next.run(request).await;

    match refreshed_cookie {
        Some(cookie) => (jar.add(cookie), response).into_response(),
        None => response,
    }
}

fn user_email(user: Option<&crate::auth::SessionUser>) -> &str {
    user.map(|u| u.email.as_str()).unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    const GATED: [&str; 7] = [
        "/dashboard",
        "/dashboard/schedule",
        "/onboarding",
        "/pending-approval",
        "/api/complete-profile",
        "/api/admin/users",
        "/admin/manage-users",
    ];

    #[test]
    fn allow_list_matches_declared_prefixes() {
        for path in GATED {
            assert!(is_gated(path), "{path} should be gated");
        }
        for path in ["/", "/login", "/register", "/api/register", "/api/auth/login", "/dashboards", "/administrator"] {
            assert!(!is_gated(path), "{path} should be public");
        }
    }

    #[test]
    fn public_paths_always_allowed() {
        for state in [
            AccessState::Unauthenticated,
            AccessState::NeedsOnboarding,
            AccessState::PendingApproval,
        ] {
            assert_eq!(evaluate(state, "/login", false), Verdict::Allow);
            assert_eq!(evaluate(state, "/", false), Verdict::Allow);
        }
    }

    #[test]
    fn unauthenticated_goes_to_login() {
        for path in GATED {
            assert_eq!(evaluate(AccessState::Unauthenticated, path, false), Verdict::ToLogin);
        }
    }

    #[test]
    fn incomplete_profile_goes_to_onboarding_except_onboarding_itself() {
        let s = AccessState::NeedsOnboarding;
        assert_eq!(evaluate(s, "/dashboard", false), Verdict::ToOnboarding);
        assert_eq!(evaluate(s, "/pending-approval", false), Verdict::ToOnboarding);
        assert_eq!(evaluate(s, "/admin/manage-users", true), Verdict::ToOnboarding);
        assert_eq!(evaluate(s, "/onboarding", false), Verdict::Allow);
        assert_eq!(evaluate(s, "/api/complete-profile", false), Verdict::Allow);
    }

    #[test]
    fn pending_goes_to_pending_approval_except_page_and_profile_endpoint() {
        let s = AccessState::PendingApproval;
        assert_eq!(evaluate(s, "/dashboard", false), Verdict::ToPendingApproval);
        assert_eq!(evaluate(s, "/onboarding", false), Verdict::ToPendingApproval);
        assert_eq!(evaluate(s, "/api/admin/users", true), Verdict::ToPendingApproval);
        assert_eq!(evaluate(s, "/pending-approval", false), Verdict::Allow);
        assert_eq!(evaluate(s, "/api/complete-profile", false), Verdict::Allow);
    }

    #[test]
    fn admin_routes_need_the_administrator() {
        let s = AccessState::Approved;
        assert_eq!(evaluate(s, "/admin/manage-users", false), Verdict::ToDashboard);
        assert_eq!(evaluate(s, "/api/admin/toggle-approval", false), Verdict::ToDashboard);
        assert_eq!(evaluate(s, "/admin/manage-users", true), Verdict::Allow);
        assert_eq!(evaluate(s, "/api/admin/users", true), Verdict::Allow);
    }

    #[test]
    fn non_admins_never_reach_admin_routes() {
        for state in [
            AccessState::Unauthenticated,
            AccessState::NeedsOnboarding,
            AccessState::PendingApproval,
            AccessState::Approved,
        ] {
            for path in ["/admin", "/admin/manage-users", "/api/admin/users"] {
                assert_ne!(evaluate(state, path, false), Verdict::Allow, "{state:?} {path}");
            }
        }
    }

    #[test]
    fn approved_users_reach_everything_else() {
        let s = AccessState::Approved;
        for path in ["/dashboard", "/onboarding", "/pending-approval", "/api/complete-profile"] {
            assert_eq!(evaluate(s, path, false), Verdict::Allow);
        }
    }

    #[test]
    fn api_rejections_use_status_codes() {
        let resp = reject("/api/admin/users", Verdict::ToDashboard);
        assert_eq!(resp.status(), axum::http::StatusCode::FORBIDDEN);
        let resp = reject("/api/complete-profile", Verdict::ToLogin);
        assert_eq!(resp.status(), axum::http::StatusCode::UNAUTHORIZED);
        let resp = reject("/dashboard", Verdict::ToPendingApproval);
        assert_eq!(resp.status(), axum::http::StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers()[axum::http::header::LOCATION], PENDING_APPROVAL_PATH);
    }
}
