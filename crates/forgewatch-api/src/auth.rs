// Account endpoints
//
// Register and login are the only unauthenticated calls. A successful
// login persists the issued tokens and user through the client's
// `SessionStore`; logout is purely local.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{
    DataEnvelope, LoginRequest, LoginResponse, OneOrSingleton, RegisterRequest, RegisterResponse,
    Session, User,
};

fn login_failure(_status: u16) -> String {
    "Login failed".into()
}

fn registration_failure(_status: u16) -> String {
    "Registration failed".into()
}

impl ApiClient {
    /// Create an account.
    ///
    /// `POST /register` with `{username, email, password, confirmPassword}`.
    /// Nothing is persisted; the caller logs in afterwards.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &SecretString,
        confirm_password: &SecretString,
    ) -> Result<RegisterResponse, Error> {
        let url = self.endpoint(&["register"])?;
        debug!(username, email, "registering account");

        let body = RegisterRequest {
            username,
            email,
            password: password.expose_secret(),
            confirm_password: confirm_password.expose_secret(),
        };
        self.post_public(url, &body, registration_failure).await
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// `POST /login` with `{email, password}`. The response must carry
    /// `data.accessToken`; when `data.user` is absent the stored user is
    /// built from the submitted email and `data.id`.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session, Error> {
        let url = self.endpoint(&["login"])?;
        debug!(email, "logging in");

        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let resp: LoginResponse = self.post_public(url, &body, login_failure).await?;

        let data = resp.data.ok_or_else(no_token)?;
        let token = data
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(no_token)?;

        let user = data.user.unwrap_or_else(|| User {
            id: data.id,
            email: Some(email.to_owned()),
            ..User::default()
        });

        let session = Session {
            access_token: SecretString::from(token),
            refresh_token: data
                .refresh_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            user,
        };
        self.session().save(&session)?;

        info!(user = %session.user.display_name(), "logged in");
        Ok(session)
    }

    /// Forget the stored token and user. No request is made.
    pub fn logout(&self) -> Result<(), Error> {
        self.session().clear()
    }

    /// The persisted user record, if any.
    pub fn current_user(&self) -> Result<Option<User>, Error> {
        self.session().current_user()
    }

    /// The persisted access token, if any.
    pub fn token(&self) -> Result<Option<SecretString>, Error> {
        self.session().token()
    }

    /// `true` when an access token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    /// Fetch the signed-in user and overwrite the persisted record.
    ///
    /// `GET /profile`. `data` may be the user or a one-element array.
    pub async fn profile(&self) -> Result<User, Error> {
        let url = self.endpoint(&["profile"])?;
        let resp: DataEnvelope<OneOrSingleton<User>> = self.get(url).await?;
        let user = resp.data.into_single("user")?;
        self.session().set_user(&user)?;
        Ok(user)
    }
}

fn no_token() -> Error {
    Error::MalformedResponse {
        message: "Login failed: No token received".into(),
    }
}
