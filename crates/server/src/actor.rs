use axum::{extract::FromRequestParts, http::request::Parts};
use shared_types::AppError;

/// Identity recorded in audit columns when no header is sent.
pub const SYSTEM_ACTOR: &str = "system";

const MAX_ACTOR_LEN: usize = 64;

/// Extractor that resolves the acting user from the `X-User-Id` header.
///
/// The value is only used for audit columns (`created_by`, `updated_by`,
/// `allocated_by`, ...). Missing or unusable headers fall back to
/// [`SYSTEM_ACTOR`].
#[derive(Debug, Clone, PartialEq)]
pub struct Actor(pub String);

impl Actor {
    pub fn system() -> Self {
        Actor(SYSTEM_ACTOR.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Keep alphanumerics and `-_.@`, capped at 64 chars.
    fn sanitize(raw: &str) -> String {
        raw.trim()
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
            .take(MAX_ACTOR_LEN)
            .collect()
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(val) = parts.headers.get("x-user-id") {
            if let Ok(s) = val.to_str() {
                let sanitized = Self::sanitize(s);
                if !sanitized.is_empty() {
                    return Ok(Actor(sanitized));
                }
            }
        }

        Ok(Actor::system())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Actor {
        let mut builder = Request::builder().uri("/api/cases");
        if let Some(h) = header {
            builder = builder.header("x-user-id", h);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Actor::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_system() {
        assert_eq!(extract(None).await, Actor::system());
    }

    #[tokio::test]
    async fn header_is_sanitized() {
        assert_eq!(extract(Some("  ops.user@bank  ")).await.0, "ops.user@bank");
        assert_eq!(extract(Some("a;DROP TABLE")).await.0, "aDROPTABLE");
    }

    #[tokio::test]
    async fn unusable_header_falls_back() {
        assert_eq!(extract(Some(";;;")).await, Actor::system());
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "x".repeat(200);
        assert_eq!(Actor::sanitize(&long).len(), MAX_ACTOR_LEN);
    }
}
