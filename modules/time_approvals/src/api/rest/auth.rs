//! Principal extraction from trusted gateway headers.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap, StatusCode};
use uuid::Uuid;

use crate::api::rest::error::from_parts;
use crate::api::rest::problem::ProblemResponse;
use crate::contract::model::{Principal, Role};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authenticated caller. Rejects with 401 when a header is missing or malformed.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Principal);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, String> {
    headers
        .get(name)
        .ok_or_else(|| format!("missing '{}' header", name))?
        .to_str()
        .map_err(|_| format!("'{}' header is not valid text", name))
}

fn uuid_header(headers: &HeaderMap, name: &str) -> Result<Uuid, String> {
    let raw = header(headers, name)?;
    Uuid::parse_str(raw.trim()).map_err(|_| format!("'{}' header is not a UUID", name))
}

pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, String> {
    let user_id = uuid_header(headers, USER_ID_HEADER)?;
    let tenant_id = uuid_header(headers, TENANT_ID_HEADER)?;
    let role_raw = header(headers, USER_ROLE_HEADER)?;
    let role =
        Role::parse(role_raw).ok_or_else(|| format!("unknown role '{}'", role_raw.trim()))?;
    Ok(Principal::new(user_id, tenant_id, role))
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers)
            .map(Caller)
            .map_err(|detail| {
                from_parts(
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    "Unauthenticated",
                    detail,
                    parts.uri.path(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(user: &str, tenant: &str, role: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(USER_ID_HEADER, HeaderValue::from_str(user).unwrap());
        h.insert(TENANT_ID_HEADER, HeaderValue::from_str(tenant).unwrap());
        h.insert(USER_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        h
    }

    #[test]
    fn parses_valid_headers() {
        let user = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let p = principal_from_headers(&headers(&user.to_string(), &tenant.to_string(), "Admin"))
            .unwrap();
        assert_eq!(p.user_id, user);
        assert_eq!(p.tenant_id, tenant);
        assert!(p.is_admin());
    }

    #[test]
    fn rejects_missing_and_malformed() {
        assert!(principal_from_headers(&HeaderMap::new())
            .unwrap_err()
            .contains("x-user-id"));

        let err = principal_from_headers(&headers("nope", &Uuid::new_v4().to_string(), "admin"))
            .unwrap_err();
        assert!(err.contains("not a UUID"));

        let err = principal_from_headers(&headers(
            &Uuid::new_v4().to_string(),
            &Uuid::new_v4().to_string(),
            "owner",
        ))
        .unwrap_err();
        assert!(err.contains("unknown role"));
    }
}
