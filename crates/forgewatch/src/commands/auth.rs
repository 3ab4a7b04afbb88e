//! Session command handlers: login, register, logout, whoami, profile.

use secrecy::{ExposeSecret, SecretString};

use forgewatch_core::{Backend, Registration, User};

use crate::cli::{GlobalOpts, LoginArgs, RegisterArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(user: &User) -> String {
    let mut lines = vec![
        format!("Username:  {}", user.username.as_deref().unwrap_or("-")),
        format!("Email:     {}", user.email.as_deref().unwrap_or("-")),
        format!(
            "ID:        {}",
            user.id.as_ref().map_or_else(|| "-".into(), ToString::to_string)
        ),
    ];
    for (key, value) in &user.extra {
        lines.push(format!(
            "{:<10} {}",
            format!("{key}:"),
            forgewatch_core::display_value(value)
        ));
    }
    lines.join("\n")
}

fn render_user(user: &User, global: &GlobalOpts) {
    let out = output::render_single(&global.output, user, detail, User::display_name);
    output::print_output(&out, global.quiet);
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn login(
    backend: &Backend,
    args: LoginArgs,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let email = match args.email.or_else(|| resolved.profile.email.clone()) {
        Some(email) => email,
        None => util::prompt_text("Email", None)?,
    };
    if email.trim().is_empty() {
        return Err(CliError::Validation {
            field: "email".into(),
            reason: "email cannot be empty".into(),
        });
    }
    let password = util::read_password(args.password_stdin, "Password: ")?;

    let user = backend.login(email.trim(), &password).await?;
    util::status(
        &format!(
            "✓ Logged in as {} (profile '{}')",
            user.display_name(),
            resolved.name
        ),
        global,
    );
    Ok(())
}

pub async fn register(
    backend: &Backend,
    args: RegisterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let username = match args.username {
        Some(u) => u,
        None => util::prompt_text("Username", None)?,
    };
    let email = match args.email {
        Some(e) => e,
        None => util::prompt_text("Email", None)?,
    };

    let (password, confirm_password) = if args.password_stdin {
        let password = util::read_password(true, "")?;
        let confirm = SecretString::from(password.expose_secret().to_owned());
        (password, confirm)
    } else {
        (
            util::read_password(false, "Password: ")?,
            util::read_password(false, "Confirm password: ")?,
        )
    };

    let registration = Registration {
        username,
        email,
        password,
        confirm_password,
    };
    let resp = backend.register(&registration).await?;

    let message = resp
        .message
        .unwrap_or_else(|| "Registration successful".into());
    util::status(&format!("✓ {message}"), global);
    util::status(
        &format!(
            "  Sign in with: forgewatch login --email {}",
            registration.email.trim()
        ),
        global,
    );
    Ok(())
}

pub fn logout(backend: &Backend, global: &GlobalOpts) -> Result<(), CliError> {
    let was_signed_in = backend.auth().is_authenticated();
    backend.logout()?;
    if was_signed_in {
        util::status("✓ Logged out", global);
    } else {
        util::status("Not logged in; stored session cleared", global);
    }
    Ok(())
}

/// The stored user. No request is made.
pub fn whoami(backend: &Backend, global: &GlobalOpts) -> Result<(), CliError> {
    let user = backend.auth().user().ok_or_else(|| CliError::NotLoggedIn {
        profile: "default".into(),
    })?;
    render_user(&user, global);
    Ok(())
}

pub async fn profile(backend: &Backend, global: &GlobalOpts) -> Result<(), CliError> {
    let user = backend.refresh_profile().await?;
    render_user(&user, global);
    Ok(())
}
