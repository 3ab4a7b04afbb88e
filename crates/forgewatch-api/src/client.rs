// Backend HTTP client
//
// Wraps `reqwest::Client` with URL construction, bearer-token attachment,
// and envelope decoding. Endpoint groups (auth, machines, alerts, chat) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::ErrorBody;
use crate::session::SessionStore;
use crate::transport::TransportConfig;

/// Default backend root.
pub const DEFAULT_BASE_URL: &str = "https://ac-02-be.vercel.app";

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// How much of an unreadable body to echo into error messages.
const BODY_PREVIEW_CHARS: usize = 200;

/// HTTP client for the forgewatch backend.
///
/// The bearer token is read from the injected [`SessionStore`] on every
/// authenticated call; when it is missing the call fails with
/// [`Error::MissingToken`] before anything goes on the wire.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionStore,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(
        base_url: Url,
        session: SessionStore,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, session))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, session: SessionStore) -> Self {
        Self {
            http,
            base_url,
            session,
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Session storage this client reads its token from.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append path segments to the base URL. Segments are percent-encoded,
    /// so ids and search terms can carry any characters.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    /// Like [`endpoint`](Self::endpoint), with query parameters appended.
    pub(crate) fn endpoint_with_query(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<Url, Error> {
        let mut url = self.endpoint(segments)?;
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Authenticated GET, decoding the body as `T`.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let token = self.session.require_token()?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::decode(resp, generic_failure).await
    }

    /// Authenticated POST with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let token = self.session.require_token()?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::decode(resp, generic_failure).await
    }

    /// Authenticated PATCH without a body.
    pub(crate) async fn patch<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let token = self.session.require_token()?;
        debug!("PATCH {}", url);

        let resp = self
            .http
            .patch(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::decode(resp, generic_failure).await
    }

    /// Unauthenticated POST (login, register). `failure` supplies the
    /// message used when an error body carries none.
    pub(crate) async fn post_public<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
        failure: fn(u16) -> String,
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::decode(resp, failure).await
    }

    /// Check the status, then parse the body as `T`.
    ///
    /// Non-2xx responses become [`Error::Authentication`] (401/403) or
    /// [`Error::Http`], carrying the body's `message` when there is one.
    async fn decode<T: DeserializeOwned>(
        resp: reqwest::Response,
        failure: fn(u16) -> String,
    ) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body, failure));
        }

        parse_json(&body)
    }
}

/// Fallback message for authenticated endpoints.
fn generic_failure(status: u16) -> String {
    format!("HTTP error! status: {status}")
}

fn error_from_body(status: u16, body: &str, failure: fn(u16) -> String) -> Error {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());

    if matches!(status, 401 | 403) {
        return Error::Authentication {
            message: message.unwrap_or_else(|| "session expired or invalid credentials".into()),
        };
    }

    Error::Http {
        status,
        message: message.unwrap_or_else(|| failure(status)),
    }
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            SessionStore::in_memory(),
        )
    }

    #[test]
    fn endpoint_joins_segments() {
        let c = client("https://backend.example");
        let url = c.endpoint(&["api", "machines", "statistics"]).unwrap();
        assert_eq!(url.as_str(), "https://backend.example/api/machines/statistics");
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        let c = client("https://backend.example/v1/");
        let url = c.endpoint(&["login"]).unwrap();
        assert_eq!(url.as_str(), "https://backend.example/v1/login");
    }

    #[test]
    fn endpoint_escapes_segments() {
        let c = client("https://backend.example");
        let url = c.endpoint(&["api", "machines", "M 1/x"]).unwrap();
        assert_eq!(url.as_str(), "https://backend.example/api/machines/M%201%2Fx");
    }

    #[test]
    fn query_params_are_encoded() {
        let c = client("https://backend.example");
        let url = c
            .endpoint_with_query(
                &["api", "machines", "search"],
                &[("name", "M&L".into()), ("page", "2".into())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://backend.example/api/machines/search?name=M%26L&page=2"
        );
    }

    #[test]
    fn error_body_message_wins() {
        let err = error_from_body(500, r#"{"message":"db down"}"#, generic_failure);
        assert!(matches!(err, Error::Http { status: 500, ref message } if message == "db down"));
    }

    #[test]
    fn generic_message_without_body() {
        let err = error_from_body(502, "<html>bad gateway</html>", generic_failure);
        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }

    #[test]
    fn unauthorized_maps_to_authentication() {
        let err = error_from_body(401, r#"{"message":"jwt expired"}"#, generic_failure);
        assert!(err.is_auth_expired());
        assert_eq!(err.to_string(), "Authentication failed: jwt expired");
    }

    #[test]
    fn forbidden_maps_to_authentication() {
        let err = error_from_body(403, r#"{"message":"not allowed"}"#, generic_failure);
        assert!(matches!(err, Error::Authentication { ref message } if message == "not allowed"));
        let err = error_from_body(403, "", generic_failure);
        assert!(err.is_auth_expired());
    }
}
