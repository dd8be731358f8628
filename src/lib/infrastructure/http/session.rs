//! Session identification.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use crate::domain::settings::DEFAULT_SESSION;

/// Header carrying the caller's session identifier.
pub const SESSION_HEADER: &str = "x-session-id";

/// The session a request belongs to. Read from the `x-session-id` header;
/// requests without one share the default session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Infallible> {
        let session = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_SESSION);

        Ok(Self(session.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::FromRequestParts, http::Request};
    use testresult::TestResult;

    use super::*;

    async fn extract(request: Request<()>) -> SessionId {
        let (mut parts, _) = request.into_parts();

        FromRequestParts::from_request_parts(&mut parts, &())
            .await
            .expect("infallible extractor")
    }

    #[tokio::test]
    async fn test_header_value_is_used() -> TestResult {
        let request = Request::builder()
            .header(SESSION_HEADER, "session-1")
            .body(())?;

        assert_eq!(extract(request).await, SessionId("session-1".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_header_falls_back_to_default() -> TestResult {
        let request = Request::builder().body(())?;

        assert_eq!(extract(request).await, SessionId(DEFAULT_SESSION.to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_blank_header_falls_back_to_default() -> TestResult {
        let request = Request::builder().header(SESSION_HEADER, "   ").body(())?;

        assert_eq!(extract(request).await, SessionId(DEFAULT_SESSION.to_string()));

        Ok(())
    }
}
