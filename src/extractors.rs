use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use uuid::Uuid;

pub const OWNER_HEADER: &str = "x-owner-id";

/// Owner of the collections a request works on, taken from `X-Owner-Id`.
///
/// Session handling lives in front of this service; by the time a request
/// arrives here the header is trusted.
#[derive(Debug, Clone, Copy)]
pub struct Owner(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "missing X-Owner-Id header".into()))?;

        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| (StatusCode::BAD_REQUEST, "invalid X-Owner-Id header".into()))?;

        Ok(Owner(id))
    }
}
