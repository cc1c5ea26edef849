//! Managed backend connection.
//!
//! The backend exposes a PostgREST database API under `/rest/v1`, a GoTrue
//! auth API under `/auth/v1` and public object storage under `/storage/v1`.
//! Every domain repository shares one [`PostgrestClient`].

use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::auth::AccessToken;

mod errors;
mod range;

pub use errors::BackendError;
pub use range::{PageRange, parse_total};

/// Header used to request an exact row count.
pub(crate) const PREFER_COUNT_EXACT: &str = "count=exact";

/// Header used to have writes echo the affected rows.
pub(crate) const PREFER_RETURN_REPRESENTATION: &str = "return=representation";

/// Header used for writes whose body is not needed.
pub(crate) const PREFER_RETURN_MINIMAL: &str = "return=minimal";

/// Header turning an insert into an upsert on the primary key.
pub(crate) const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=minimal";

/// Connection settings for the managed backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project base URL, e.g. `"https://project.supabase.co"`.
    pub url: String,

    /// Public anonymous API key sent with every request.
    pub anon_key: String,

    /// Per-request timeout applied by the transport.
    pub timeout: Duration,
}

/// HTTP client for the managed backend.
///
/// Requests are authorised with the signed-in user's access token when one
/// is set, falling back to the anonymous key.
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    config: Arc<BackendConfig>,
    http: Client,
    access_token: Arc<RwLock<Option<AccessToken>>>,
}

impl PostgrestClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP transport cannot be initialised.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            config: Arc::new(config),
            http,
            access_token: Arc::default(),
        })
    }

    /// Replace the bearer token used for subsequent requests.
    pub fn set_access_token(&self, token: Option<AccessToken>) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Project base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base()
    }

    pub(crate) fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, &format!("{}/rest/v1/{table}", self.base()))
    }

    pub(crate) fn rpc(&self, function: &str) -> RequestBuilder {
        self.request(
            Method::POST,
            &format!("{}/rest/v1/rpc/{function}", self.base()),
        )
    }

    pub(crate) fn auth(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, &format!("{}/auth/v1/{path}", self.base()))
    }

    /// Send a request, turning non-success responses into [`BackendError`]s.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        Err(BackendError::from_response(status, &body))
    }

    /// Send a request and decode its JSON body.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.send(request).await?.bytes().await?;

        Ok(serde_json::from_slice(&body)?)
    }

    /// Send a request and discard its body.
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.send(request).await.map(drop)
    }

    fn base(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self
            .access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or_else(|| self.config.anon_key.clone(), |token| token.expose().to_string());

        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }
}

/// Render a PostgREST `in.(...)` filter for the given values.
pub(crate) fn in_filter<I, T>(values: I) -> String
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    let joined = values
        .into_iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(",");

    format!("in.({joined})")
}

/// Render a PostgREST equality filter.
pub(crate) fn eq_filter(value: impl ToString) -> String {
    format!("eq.{}", value.to_string())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn client(url: &str) -> Result<PostgrestClient, BackendError> {
        PostgrestClient::new(BackendConfig {
            url: url.to_string(),
            anon_key: "anon".to_string(),
            timeout: Duration::from_secs(5),
        })
    }

    #[test]
    fn base_url_ignores_trailing_slash() -> TestResult {
        let client = client("https://project.example.co/")?;

        assert_eq!(client.base_url(), "https://project.example.co");

        let request = client.auth(Method::POST, "logout").build()?;

        assert_eq!(request.url().as_str(), "https://project.example.co/auth/v1/logout");

        Ok(())
    }

    #[test]
    fn requests_use_the_anon_key_until_signed_in() -> TestResult {
        let client = client("https://project.example.co")?;

        let request = client.table(Method::GET, "tattoos").build()?;

        assert_eq!(request.url().as_str(), "https://project.example.co/rest/v1/tattoos");
        assert_eq!(
            request.headers().get("authorization").map(|v| v.as_bytes()),
            Some(&b"Bearer anon"[..])
        );

        client.set_access_token(Some(AccessToken::new("user-jwt".to_string())));

        let request = client.rpc("purchase_cart").build()?;

        assert_eq!(
            request.url().as_str(),
            "https://project.example.co/rest/v1/rpc/purchase_cart"
        );
        assert_eq!(
            request.headers().get("authorization").map(|v| v.as_bytes()),
            Some(&b"Bearer user-jwt"[..])
        );

        Ok(())
    }

    #[test]
    fn in_filter_joins_values() {
        assert_eq!(in_filter(["a", "b", "c"]), "in.(a,b,c)");
        assert_eq!(eq_filter(42), "eq.42");
    }
}
