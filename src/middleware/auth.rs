use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::request::Parts,
};

use crate::compliance::session::{RequestSession, SessionUser};
use crate::error::ApiError;

/// Session the host's auth layer attached to this request (anonymous if none)
pub fn request_session(request: &Request) -> RequestSession {
    RequestSession(request.extensions().get::<SessionUser>().cloned())
}

/// Extractor for handlers that need an authenticated admin
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        if !user.is_sys_admin {
            return Err(ApiError::forbidden("Only administrators can access this resource."));
        }
        Ok(AdminSession(user))
    }
}
