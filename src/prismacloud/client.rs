use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};

use super::ApiError;
use super::types::{LoginRequest, LoginResponse, SearchRequest, SearchResult, StatusEntry, UserRole};

const PRISMA_API_BASE: &str = "https://api.prismacloud.io";
const AUTH_HEADER: &str = "x-redlock-auth";
const STATUS_HEADER: &str = "x-redlock-status";

#[derive(Clone)]
pub struct PrismaClient {
    client: reqwest::Client,
    base_url: String,
}

impl PrismaClient {
    pub fn new(token: String) -> Result<Self, ApiError> {
        Self::with_base_url(token, PRISMA_API_BASE.to_string())
    }

    /// NOTE: Primarily used for testing with mock servers.
    pub fn with_base_url(token: String, base_url: String) -> Result<Self, ApiError> {
        Self::create_client(&token, base_url, None)
    }

    pub fn with_timeout(
        token: String,
        base_url: String,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        Self::create_client(&token, base_url, timeout)
    }

    /// Exchanges API credentials for a session token.
    pub async fn login(
        base_url: &str,
        username: &str,
        password: &str,
        customer_name: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let url = format!("{}/login", base_url);

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::Network)?;

        let response = http
            .post(&url)
            .json(&LoginRequest {
                username,
                password,
                customer_name,
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth {
                message: status_message(response.headers())
                    .unwrap_or_else(|| "invalid credentials".to_string()),
            });
        }
        if !status.is_success() {
            return Err(error_for_status(status, response.headers(), "login"));
        }

        let body: LoginResponse = response.json().await.map_err(|e| ApiError::Auth {
            message: format!("Failed to parse login response: {}", e),
        })?;

        tracing::info!("Prisma Cloud login succeeded");

        Self::create_client(&body.token, base_url, timeout)
    }

    fn create_client(
        token: &str,
        base_url: String,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut header_value = HeaderValue::from_str(token).map_err(|_| ApiError::Auth {
            message: "Invalid token format".to_string(),
        })?;
        header_value.set_sensitive(true);
        headers.insert(AUTH_HEADER, header_value);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.base_url
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult, ApiError> {
        let url = format!("{}/{}", self.base_url, request.search_type.endpoint());
        let what = format!("{} search", request.search_type);

        tracing::debug!(
            search_type = %request.search_type,
            search_id = request.id.as_deref().unwrap_or(""),
            "running RQL search"
        );

        let response = self.client.post(&url).json(&request.body()).send().await?;
        let body = read_json(response, &what).await?;

        SearchResult::from_response(request.search_type, body)
    }

    pub async fn list_roles(&self) -> Result<Vec<UserRole>, ApiError> {
        let url = format!("{}/user/role", self.base_url);

        let response = self.client.get(&url).send().await?;
        let body = read_json(response, "user roles").await?;

        serde_json::from_value(body).map_err(|e| ApiError::Decode {
            what: "user roles".to_string(),
            message: e.to_string(),
        })
    }

    pub async fn get_role(&self, id: &str) -> Result<UserRole, ApiError> {
        let url = format!("{}/user/role/{}", self.base_url, urlencoding::encode(id));
        let what = format!("user role '{}'", id);

        let response = self.client.get(&url).send().await?;
        let body = read_json(response, &what).await?;

        serde_json::from_value(body).map_err(|e| ApiError::Decode {
            what,
            message: e.to_string(),
        })
    }
}

async fn read_json(response: reqwest::Response, what: &str) -> Result<serde_json::Value, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_for_status(status, response.headers(), what));
    }

    response.json().await.map_err(|e| ApiError::Decode {
        what: what.to_string(),
        message: format!("Failed to parse response: {}", e),
    })
}

fn error_for_status(status: StatusCode, headers: &HeaderMap, what: &str) -> ApiError {
    let message = status_message(headers);

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound {
            what: what.to_string(),
        },
        StatusCode::UNAUTHORIZED => ApiError::Auth {
            message: message.unwrap_or_else(|| "session token rejected".to_string()),
        },
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        _ if message.as_deref().is_some_and(|m| m.contains("not_found")) => {
            ApiError::NotFound {
                what: what.to_string(),
            }
        }
        _ => ApiError::Api {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            }),
        },
    }
}

// NOTE: Prisma Cloud reports error details in a JSON header, not the body
fn status_message(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(STATUS_HEADER)?.to_str().ok()?;
    let entries: Vec<StatusEntry> = serde_json::from_str(raw).ok()?;
    let first = entries.into_iter().next()?;

    Some(match first.subject {
        Some(subject) if !subject.is_empty() => format!("{} ({})", first.i18n_key, subject),
        _ => first.i18n_key,
    })
}

impl std::fmt::Debug for PrismaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrismaClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PrismaClient::new("test_token".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_token_rejected() {
        let result = PrismaClient::new("bad\ntoken".to_string());
        assert!(matches!(result, Err(ApiError::Auth { .. })));
    }

    #[test]
    fn test_debug_does_not_expose_token() {
        let client = PrismaClient::new("super_secret_token_12345".to_string()).unwrap();
        let debug_output = format!("{:?}", client);

        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_token_12345"),
            "Debug output must NOT contain the actual token"
        );
    }

    #[test]
    fn test_api_base_url_trailing_slash_trimmed() {
        let client =
            PrismaClient::with_base_url("t".to_string(), "https://api2.prismacloud.io/".to_string())
                .unwrap();
        assert_eq!(client.api_base(), "https://api2.prismacloud.io");
    }

    #[test]
    fn test_status_message_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            STATUS_HEADER,
            HeaderValue::from_static(r#"[{"i18nKey":"invalid_rql_query","severity":"error","subject":"foo"}]"#),
        );
        assert_eq!(
            status_message(&headers),
            Some("invalid_rql_query (foo)".to_string())
        );
    }

    #[test]
    fn test_error_for_status_mapping() {
        let empty = HeaderMap::new();
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, &empty, "x"),
            ApiError::NotFound { .. }
        ));
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, &empty, "x"),
            ApiError::RateLimited
        ));
        assert!(matches!(
            error_for_status(StatusCode::BAD_GATEWAY, &empty, "x"),
            ApiError::Api { status: 502, .. }
        ));

        let mut headers = HeaderMap::new();
        headers.insert(
            STATUS_HEADER,
            HeaderValue::from_static(r#"[{"i18nKey":"saved_search_not_found","severity":"error"}]"#),
        );
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, &headers, "x"),
            ApiError::NotFound { .. }
        ));
    }
}
