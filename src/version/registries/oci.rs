//! OCI distribution API registry implementation
//!
//! Lists tags through `/v2/<name>/tags/list`. Registries such as ghcr.io and
//! quay.io answer anonymous requests with a `Bearer` challenge; a pull-scoped
//! anonymous token is fetched from the advertised realm and the request is
//! retried once with it.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, LINK, WWW_AUTHENTICATE};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{OCI_MAX_PAGES, OCI_PAGE_SIZE};
use crate::image::RepositoryKey;
use crate::version::error::RegistryError;
use crate::version::registry::Registry;

use super::{build_client, check_status};

static AUTH_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("valid auth-param pattern"));

static NEXT_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="?next"?"#).expect("valid link pattern"));

/// Response from the tags/list endpoint
#[derive(Debug, Deserialize)]
struct TagList {
    // Some registries send `null` for repositories without tags
    tags: Option<Vec<String>>,
}

/// Response from a token realm
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Parsed `WWW-Authenticate: Bearer ...` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
struct BearerChallenge {
    realm: String,
    service: Option<String>,
    scope: Option<String>,
}

impl BearerChallenge {
    fn parse(header: &str) -> Option<Self> {
        let (scheme, params) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let mut realm = None;
        let mut service = None;
        let mut scope = None;
        for caps in AUTH_PARAM_RE.captures_iter(params) {
            let value = caps[2].to_string();
            match &caps[1] {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        Some(Self {
            realm: realm?,
            service,
            scope,
        })
    }
}

/// Extract the target of a `Link: <...>; rel="next"` header
fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(LINK)?.to_str().ok()?;
    NEXT_LINK_RE
        .captures(value)
        .map(|caps| caps[1].to_string())
}

/// Registry implementation for the OCI distribution API
pub struct OciRegistry {
    client: reqwest::Client,
    base_url: String,
    max_pages: usize,
}

impl OciRegistry {
    /// Creates a new OciRegistry with a custom base URL
    pub fn new(base_url: &str) -> Result<Self, RegistryError> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_pages: OCI_MAX_PAGES,
        })
    }

    /// Creates a registry client for a hostname as it appears in image references
    pub fn for_host(host: &str, insecure: bool) -> Result<Self, RegistryError> {
        let scheme = if insecure { "http" } else { "https" };
        Self::new(&format!("{}://{}", scheme, host))
    }

    async fn get(&self, url: &str, token: Option<&str>) -> Result<reqwest::Response, RegistryError> {
        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        Ok(request.send().await?)
    }

    async fn fetch_token(
        &self,
        challenge: &BearerChallenge,
        repository: &RepositoryKey,
    ) -> Result<String, RegistryError> {
        let scope = challenge
            .scope
            .clone()
            .unwrap_or_else(|| format!("repository:{}:pull", repository.path()));

        let mut params = vec![("scope", scope)];
        if let Some(service) = &challenge.service {
            params.push(("service", service.clone()));
        }

        let url = reqwest::Url::parse_with_params(&challenge.realm, &params)
            .map_err(|e| RegistryError::InvalidResponse(format!("Invalid token realm: {}", e)))?;

        debug!("Requesting anonymous token for {} from {}", repository, challenge.realm);
        let response = self.client.get(url).send().await?;
        let response = check_status(response, repository)?;

        let body: TokenResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse token response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        body.token
            .or(body.access_token)
            .ok_or_else(|| RegistryError::InvalidResponse("Token response without token".to_string()))
    }

    fn resolve_link(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            format!("{}{}", self.base_url, link)
        }
    }
}

#[async_trait::async_trait]
impl Registry for OciRegistry {
    fn name(&self) -> &'static str {
        "oci"
    }

    async fn list_tags(&self, repository: &RepositoryKey) -> Result<Vec<String>, RegistryError> {
        let mut url = format!(
            "{}/v2/{}/tags/list?n={}",
            self.base_url,
            repository.path(),
            OCI_PAGE_SIZE
        );
        let mut token: Option<String> = None;
        let mut tags = Vec::new();

        for _ in 0..self.max_pages {
            debug!("Fetching OCI tags from {}", url);
            let mut response = self.get(&url, token.as_deref()).await?;

            if response.status() == StatusCode::UNAUTHORIZED && token.is_none() {
                let challenge = response
                    .headers()
                    .get(WWW_AUTHENTICATE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(BearerChallenge::parse)
                    .ok_or_else(|| {
                        RegistryError::Unauthorized(format!(
                            "{} requires credentials",
                            repository
                        ))
                    })?;

                token = Some(self.fetch_token(&challenge, repository).await?);
                response = self.get(&url, token.as_deref()).await?;
            }

            let response = check_status(response, repository)?;
            let next = next_link(response.headers());

            let body: TagList = response.json().await.map_err(|e| {
                warn!("Failed to parse OCI tag list: {}", e);
                RegistryError::InvalidResponse(e.to_string())
            })?;
            tags.extend(body.tags.unwrap_or_default());

            match next {
                Some(link) => url = self.resolve_link(&link),
                None => return Ok(tags),
            }
        }

        debug!(
            "Stopped listing {} after {} pages ({} tags)",
            repository,
            self.max_pages,
            tags.len()
        );
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageReference;
    use mockito::{Matcher, Server};
    use rstest::rstest;

    fn repository() -> RepositoryKey {
        RepositoryKey::new("ghcr.io", "owner", "tool")
    }

    #[rstest]
    #[case(
        r#"Bearer realm="https://ghcr.io/token",service="ghcr.io",scope="repository:owner/tool:pull""#,
        Some(BearerChallenge {
            realm: "https://ghcr.io/token".to_string(),
            service: Some("ghcr.io".to_string()),
            scope: Some("repository:owner/tool:pull".to_string()),
        })
    )]
    #[case(
        r#"bearer realm="https://auth.example.com/token""#,
        Some(BearerChallenge {
            realm: "https://auth.example.com/token".to_string(),
            service: None,
            scope: None,
        })
    )]
    #[case(r#"Basic realm="registry""#, None)]
    #[case(r#"Bearer service="ghcr.io""#, None)]
    fn bearer_challenge_parse_returns_expected(
        #[case] header: &str,
        #[case] expected: Option<BearerChallenge>,
    ) {
        assert_eq!(BearerChallenge::parse(header), expected);
    }

    #[tokio::test]
    async fn list_tags_returns_tags_without_auth() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v2/owner/tool/tags/list")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "owner/tool", "tags": ["1.0.0", "1.1.0", "latest"]}"#)
            .create_async()
            .await;

        let registry = OciRegistry::new(&server.url()).unwrap();
        let result = registry.list_tags(&repository()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, vec!["1.0.0", "1.1.0", "latest"]);
    }

    #[tokio::test]
    async fn list_tags_omits_defaulted_namespace_from_request_path() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v2/app/tags/list")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "app", "tags": ["1.0.0", "1.1.0"]}"#)
            .create_async()
            .await;

        let key = ImageReference::parse("localhost:5000/app:1.0.0")
            .unwrap()
            .repository_key();
        let registry = OciRegistry::new(&server.url()).unwrap();
        let result = registry.list_tags(&key).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, vec!["1.0.0", "1.1.0"]);
    }

    #[tokio::test]
    async fn list_tags_fetches_anonymous_token_on_bearer_challenge() {
        let mut server = Server::new_async().await;
        let challenge = format!(
            r#"Bearer realm="{}/token",service="ghcr.io",scope="repository:owner/tool:pull""#,
            server.url()
        );

        let unauthorized = server
            .mock("GET", "/v2/owner/tool/tags/list")
            .match_query(Matcher::Any)
            .match_header("authorization", Matcher::Missing)
            .with_status(401)
            .with_header("www-authenticate", &challenge)
            .create_async()
            .await;

        let token = server
            .mock("GET", "/token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("scope".into(), "repository:owner/tool:pull".into()),
                Matcher::UrlEncoded("service".into(), "ghcr.io".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token": "anon-token"}"#)
            .create_async()
            .await;

        let authorized = server
            .mock("GET", "/v2/owner/tool/tags/list")
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer anon-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "owner/tool", "tags": ["2.0.0"]}"#)
            .create_async()
            .await;

        let registry = OciRegistry::new(&server.url()).unwrap();
        let result = registry.list_tags(&repository()).await.unwrap();

        unauthorized.assert_async().await;
        token.assert_async().await;
        authorized.assert_async().await;
        assert_eq!(result, vec!["2.0.0"]);
    }

    #[tokio::test]
    async fn list_tags_follows_link_pagination() {
        let mut server = Server::new_async().await;

        let first = server
            .mock("GET", "/v2/owner/tool/tags/list")
            .match_query(Matcher::Exact("n=100".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header(
                "link",
                r#"</v2/owner/tool/tags/list?last=1.1.0&n=2>; rel="next""#,
            )
            .with_body(r#"{"name": "owner/tool", "tags": ["1.0.0", "1.1.0"]}"#)
            .create_async()
            .await;

        let second = server
            .mock("GET", "/v2/owner/tool/tags/list")
            .match_query(Matcher::Exact("last=1.1.0&n=2".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "owner/tool", "tags": ["1.2.0"]}"#)
            .create_async()
            .await;

        let registry = OciRegistry::new(&server.url()).unwrap();
        let result = registry.list_tags(&repository()).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(result, vec!["1.0.0", "1.1.0", "1.2.0"]);
    }

    #[tokio::test]
    async fn list_tags_returns_empty_for_null_tags() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v2/owner/tool/tags/list")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "owner/tool", "tags": null}"#)
            .create_async()
            .await;

        let registry = OciRegistry::new(&server.url()).unwrap();
        let result = registry.list_tags(&repository()).await.unwrap();

        mock.assert_async().await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn list_tags_returns_unauthorized_without_bearer_challenge() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v2/owner/tool/tags/list")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_header("www-authenticate", r#"Basic realm="registry""#)
            .create_async()
            .await;

        let registry = OciRegistry::new(&server.url()).unwrap();
        let result = registry.list_tags(&repository()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn list_tags_returns_not_found_for_unknown_repository() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/v2/owner/tool/tags/list")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let registry = OciRegistry::new(&server.url()).unwrap();
        let result = registry.list_tags(&repository()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn for_host_selects_scheme() {
        assert_eq!(
            OciRegistry::for_host("ghcr.io", false).unwrap().base_url,
            "https://ghcr.io"
        );
        assert_eq!(
            OciRegistry::for_host("localhost:5000", true).unwrap().base_url,
            "http://localhost:5000"
        );
    }
}
