//! Screen implementations. Each screen is a top-level Component.

pub mod alerts;
pub mod chat;
pub mod dashboard;
pub mod detail;
pub mod login;
pub mod register;

use forgewatch_core::Backend;

use crate::component::Component;
use crate::screen::ScreenId;

/// Create every screen component. `email` prefills the sign-in form.
pub fn create_screens(backend: &Backend, email: Option<String>) -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (
            ScreenId::Login,
            Box::new(login::LoginScreen::new(backend.clone(), email)),
        ),
        (
            ScreenId::Register,
            Box::new(register::RegisterScreen::new(backend.clone())),
        ),
        (
            ScreenId::Dashboard,
            Box::new(dashboard::DashboardScreen::new(backend.clone())),
        ),
        (
            ScreenId::Alerts,
            Box::new(alerts::AlertsScreen::new(backend.clone())),
        ),
        (ScreenId::Chat, Box::new(chat::ChatScreen::new(backend.clone()))),
        (
            ScreenId::Detail,
            Box::new(detail::DetailScreen::new(backend.clone())),
        ),
    ]
}
