//! Screen identifiers and their mapping to navigation routes.

use std::fmt;

use forgewatch_core::Route;

/// Every screen the app can show. Only the tabbed ones are reachable by
/// number keys; the rest are entered through navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Login,
    Register,
    Dashboard, // 1
    Alerts,    // 2
    Chat,      // 3
    /// Machine detail, opened from the dashboard table.
    Detail,
}

impl ScreenId {
    /// Tabbed screens in tab-bar order.
    pub const TABS: [ScreenId; 3] = [Self::Dashboard, Self::Alerts, Self::Chat];

    /// Number key for tabbed screens, 0 otherwise.
    pub fn number(self) -> u8 {
        match self {
            Self::Dashboard => 1,
            Self::Alerts => 2,
            Self::Chat => 3,
            Self::Login | Self::Register | Self::Detail => 0,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Dashboard),
            2 => Some(Self::Alerts),
            3 => Some(Self::Chat),
            _ => None,
        }
    }

    /// Next tab (wraps around). Non-tab screens go to the first tab.
    pub fn next(self) -> Self {
        Self::TABS
            .iter()
            .position(|&s| s == self)
            .map_or(Self::Dashboard, |idx| Self::TABS[(idx + 1) % Self::TABS.len()])
    }

    pub fn prev(self) -> Self {
        Self::TABS
            .iter()
            .position(|&s| s == self)
            .map_or(Self::Dashboard, |idx| {
                Self::TABS[(idx + Self::TABS.len() - 1) % Self::TABS.len()]
            })
    }

    /// Screens that need a signed-in user.
    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Login | Self::Register)
    }

    /// Auth screens take the whole frame, without tab or status bar.
    pub fn is_fullscreen(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "Sign in",
            Self::Register => "Register",
            Self::Dashboard => "Machines",
            Self::Alerts => "Alerts",
            Self::Chat => "Assistant",
            Self::Detail => "Detail",
        }
    }
}

impl From<&Route> for ScreenId {
    fn from(route: &Route) -> Self {
        match route {
            Route::Login => Self::Login,
            Route::Register => Self::Register,
            Route::Dashboard => Self::Dashboard,
            Route::MachineDetail(_) => Self::Detail,
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn tabs_cycle() {
        assert_eq!(ScreenId::Dashboard.next(), ScreenId::Alerts);
        assert_eq!(ScreenId::Chat.next(), ScreenId::Dashboard);
        assert_eq!(ScreenId::Dashboard.prev(), ScreenId::Chat);
        assert_eq!(ScreenId::Detail.next(), ScreenId::Dashboard);
    }

    #[test]
    fn numbers_round_trip_for_tabs_only() {
        for id in ScreenId::TABS {
            assert_eq!(ScreenId::from_number(id.number()), Some(id));
        }
        assert_eq!(ScreenId::from_number(0), None);
        assert_eq!(ScreenId::Detail.number(), 0);
    }

    #[test]
    fn routes_map_to_screens() {
        assert_eq!(
            ScreenId::from(&Route::MachineDetail("M-1".into())),
            ScreenId::Detail
        );
        assert_eq!(ScreenId::from(&Route::Register), ScreenId::Register);
        assert!(!ScreenId::Login.is_protected());
        assert!(ScreenId::Chat.is_protected());
    }
}
