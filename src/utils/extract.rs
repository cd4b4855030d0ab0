//! Request extractors that reject with `AppError`, so every failure is a JSON body

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;

use crate::models::errors::AppError;
use crate::AppState;

/// The user behind a verified `Authorization: Bearer <token>` header
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn ensure_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::forbidden("Administrator privileges required"))
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Malformed Authorization header"))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AppError::unauthorized("Expected a Bearer token")),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.verify(token)?;

        tracing::debug!("Authenticated request as {} ({})", claims.username, claims.sub);
        Ok(Self {
            id: claims.sub,
            username: claims.username,
            is_admin: claims.admin,
        })
    }
}

/// `Json<T>` whose rejection is a validation error instead of axum's plain-text body
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::validation_failed(rejection.body_text())),
        }
    }
}

/// `Query<T>` rejecting malformed or repeated parameters with a validation error
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::validation_failed(rejection.body_text())),
        }
    }
}

/// `Path<T>` whose rejection (e.g. a segment that is not valid UTF-8) is a validation error
#[derive(Debug)]
pub struct PathParam<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::validation_failed(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))).unwrap(), "abc");
        assert_eq!(bearer_token(&parts_with(Some("bearer  abc "))).unwrap(), "abc");
        assert!(bearer_token(&parts_with(None)).is_err());
        assert!(bearer_token(&parts_with(Some("Basic abc"))).is_err());
        assert!(bearer_token(&parts_with(Some("Bearer "))).is_err());
        assert!(bearer_token(&parts_with(Some("abc"))).is_err());
    }

    #[tokio::test]
    async fn test_query_rejection_is_validation_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Filter {
            #[allow(dead_code)]
            author: Option<String>,
        }

        let mut parts = HttpRequest::builder()
            .uri("/posts?author=a&author=b")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = QueryParams::<Filter>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::ValidationError { .. })));
    }

    #[test]
    fn test_ensure_admin() {
        let mut user = AuthUser {
            id: "1".into(),
            username: "alice".into(),
            is_admin: false,
        };
        assert!(matches!(user.ensure_admin(), Err(AppError::Forbidden { .. })));

        user.is_admin = true;
        assert!(user.ensure_admin().is_ok());
    }
}
