// ── Navigation and route guard ──

use std::fmt;

use crate::auth::AuthContext;

/// Screens a client can navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    MachineDetail(String),
}

impl Route {
    /// Routes that need a signed-in user.
    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Dashboard | Self::MachineDetail(_))
    }

    /// Parse a path such as `/details/M_L_15`.
    pub fn parse(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Self::Dashboard),
            "/login" => Some(Self::Login),
            "/register" => Some(Self::Register),
            other => other
                .strip_prefix("/details/")
                .filter(|id| !id.is_empty() && !id.contains('/'))
                .map(|id| Self::MachineDetail(id.to_owned())),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("/login"),
            Self::Register => f.write_str("/register"),
            Self::Dashboard => f.write_str("/"),
            Self::MachineDetail(id) => write!(f, "/details/{id}"),
        }
    }
}

/// Where navigation to `route` actually lands: protected routes redirect
/// to [`Route::Login`] while no user is signed in.
pub fn guard(route: Route, auth: &AuthContext) -> Route {
    if route.is_protected() && !auth.is_authenticated() {
        Route::Login
    } else {
        route
    }
}

#[cfg(test)]
mod tests {
    use forgewatch_api::{SessionStore, User};

    use super::*;

    #[test]
    fn unauthenticated_redirects_to_login() {
        let auth = AuthContext::restore(SessionStore::in_memory());
        assert_eq!(guard(Route::Dashboard, &auth), Route::Login);
        assert_eq!(
            guard(Route::MachineDetail("M_1".into()), &auth),
            Route::Login
        );
        assert_eq!(guard(Route::Register, &auth), Route::Register);
    }

    #[test]
    fn authenticated_passes_through() {
        let auth = AuthContext::restore(SessionStore::in_memory());
        auth.login(User::default());
        assert_eq!(guard(Route::Dashboard, &auth), Route::Dashboard);
    }

    #[test]
    fn parse_paths() {
        assert_eq!(Route::parse("/"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(
            Route::parse("/details/M_H_23"),
            Some(Route::MachineDetail("M_H_23".into()))
        );
        assert_eq!(Route::parse("/details/"), None);
        assert_eq!(Route::parse("/nowhere"), None);
        assert_eq!(Route::MachineDetail("X".into()).to_string(), "/details/X");
    }
}
