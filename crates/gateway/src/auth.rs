//! Attaches the auth context to outbound requests.

use reqwest::RequestBuilder;
use reqwest::header::{AUTHORIZATION, COOKIE};

use pingate_shared::AuthContext;

/// Header carrying the pending action's identifier on execute calls.
pub const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

/// Adds `Authorization` and `Cookie` headers for whatever credentials exist.
pub fn authorize(mut request: RequestBuilder, auth: &AuthContext) -> RequestBuilder {
    if let Some(value) = auth.authorization_header() {
        request = request.header(AUTHORIZATION, value);
    }
    if let Some(value) = auth.cookie_header() {
        request = request.header(COOKIE, value);
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(auth: &AuthContext) -> reqwest::header::HeaderMap {
        let client = reqwest::Client::new();
        authorize(client.post("http://localhost/verify"), auth)
            .build()
            .unwrap()
            .headers()
            .clone()
    }

    #[test]
    fn test_bearer_only() {
        let headers = headers(&AuthContext::bearer("tok"));
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert!(headers.get(COOKIE).is_none());
    }

    #[test]
    fn test_both_credentials_are_sent() {
        let auth = AuthContext::bearer("tok").with_session_cookie("session", "abc");
        let headers = headers(&auth);
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(headers[COOKIE], "session=abc");
    }

    #[test]
    fn test_anonymous_adds_nothing() {
        let headers = headers(&AuthContext::default());
        assert!(headers.get(AUTHORIZATION).is_none());
        assert!(headers.get(COOKIE).is_none());
    }
}
