//! GitHub REST client for the repository listing and release lookups.
//!
//! Endpoints used:
//! - `GET /user/repos?sort=pushed&per_page=N&affiliation=owner` (token present)
//! - `GET /users/{user}/repos?sort=pushed&per_page=N` (public only)
//! - `GET /repos/{owner}/{name}/releases/latest` (404 when nothing is published)

use std::time::Duration;

use futures_util::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{Release, ReleaseLookup, Repository};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure of the listing request. Release lookups never produce one.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to GitHub failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("GitHub API request failed: {status}")]
    Status { status: StatusCode, body: String },
    #[error("unexpected repository list format: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Settings for one loader instance
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub username: String,
    pub count: u32,
    pub token: Option<String>,
}

/// Which listing endpoint a load uses. Chosen once per load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Owner's repositories including private ones
    Authenticated { token: String },
    /// Public repositories of a named user
    Public { username: String },
}

impl Endpoint {
    pub fn select(config: &ClientConfig) -> Self {
        match config.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Endpoint::Authenticated {
                token: token.to_string(),
            },
            _ => Endpoint::Public {
                username: config.username.clone(),
            },
        }
    }

    fn path(&self) -> String {
        match self {
            Endpoint::Authenticated { .. } => "/user/repos".to_string(),
            Endpoint::Public { username } => format!("/users/{username}/repos"),
        }
    }

    fn token(&self) -> Option<&str> {
        match self {
            Endpoint::Authenticated { token } => Some(token),
            Endpoint::Public { .. } => None,
        }
    }
}

/// Loader for repository records
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    config: ClientConfig,
}

impl GithubClient {
    pub fn new(config: ClientConfig) -> Result<Self, LoadError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("folio-tui/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(LoadError::Client)?;

        Ok(GithubClient { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: RequestBuilder, endpoint: &Endpoint) -> RequestBuilder {
        match endpoint.token() {
            Some(token) => builder.header(AUTHORIZATION, format!("token {token}")),
            None => builder,
        }
    }

    /// Load the listing, then resolve every record's latest release.
    ///
    /// All release lookups run concurrently and are joined before returning,
    /// so the caller sees either a fully resolved list or the listing error.
    pub async fn load(&self) -> Result<Vec<Repository>, LoadError> {
        let endpoint = Endpoint::select(&self.config);
        let mut repos = self.fetch_repositories(&endpoint).await?;

        let lookups = repos
            .iter()
            .map(|repo| self.fetch_latest_release(&endpoint, &repo.owner.login, &repo.name));
        let releases = join_all(lookups).await;

        for (repo, lookup) in repos.iter_mut().zip(releases) {
            repo.latest_release = lookup.into_option();
        }

        let with_release = repos.iter().filter(|r| r.latest_release.is_some()).count();
        info!(
            total = repos.len(),
            with_release, "Repository list loaded"
        );
        Ok(repos)
    }

    /// Fetch the ordered repository list, most recently pushed first
    pub async fn fetch_repositories(&self, endpoint: &Endpoint) -> Result<Vec<Repository>, LoadError> {
        let url = self.url(&endpoint.path());
        let per_page = self.config.count.to_string();
        let mut query = vec![("sort", "pushed"), ("per_page", per_page.as_str())];

        match endpoint {
            Endpoint::Authenticated { token } => {
                query.push(("affiliation", "owner"));
                let prefix: String = token.chars().take(8).collect();
                info!(token_prefix = %prefix, "Using authenticated endpoint, private repositories included");
            }
            Endpoint::Public { username } => {
                warn!(%username, "No GitHub token configured, only public repositories are visible");
            }
        }

        debug!(%url, "Requesting repository list");
        let request = self.authorize(self.client.get(&url).query(&query), endpoint);
        let response = request.send().await.map_err(LoadError::Transport)?;
        log_rate_limit(&response);

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "GitHub API returned an error");
            return Err(LoadError::Status { status, body });
        }

        let repos: Vec<Repository> = response.json().await.map_err(LoadError::Decode)?;
        let private = repos.iter().filter(|r| r.private).count();
        info!(
            private,
            public = repos.len() - private,
            "Fetched repositories"
        );
        Ok(repos)
    }

    /// Look up the latest release. Every failure maps to `Absent`.
    pub async fn fetch_latest_release(
        &self,
        endpoint: &Endpoint,
        owner: &str,
        name: &str,
    ) -> ReleaseLookup {
        let url = self.url(&format!("/repos/{owner}/{name}/releases/latest"));
        let request = self.authorize(self.client.get(&url), endpoint);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%owner, %name, error = %e, "Release lookup failed");
                return ReleaseLookup::Absent;
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%owner, %name, "No published release");
            return ReleaseLookup::Absent;
        }
        if !status.is_success() {
            debug!(%owner, %name, %status, "Release lookup unsuccessful");
            return ReleaseLookup::Absent;
        }

        match response.json::<Release>().await {
            Ok(release) => ReleaseLookup::Found(release),
            Err(e) => {
                debug!(%owner, %name, error = %e, "Release response not understood");
                ReleaseLookup::Absent
            }
        }
    }

    /// Warm up preview references with `HEAD` requests.
    ///
    /// Returns `(url, resolved)` in input order. Failures are only logged.
    pub async fn check_previews(&self, urls: Vec<String>) -> Vec<(String, bool)> {
        let checks = urls.into_iter().map(|url| async move {
            let resolved = match self.client.head(&url).send().await {
                Ok(response) => response.status().is_success(),
                Err(e) => {
                    debug!(%url, error = %e, "Preview check failed");
                    false
                }
            };
            (url, resolved)
        });
        join_all(checks).await
    }
}

fn log_rate_limit(response: &Response) {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("?")
            .to_string()
    };
    debug!(
        status = %response.status(),
        remaining = %header("x-ratelimit-remaining"),
        limit = %header("x-ratelimit-limit"),
        "GitHub rate limit"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo_json(name: &str) -> serde_json::Value {
        json!({
            "id": 1,
            "name": name,
            "owner": {"login": "likahang"},
            "description": format!("{name} description"),
            "homepage": null,
            "html_url": format!("https://github.com/likahang/{name}"),
            "language": "Rust",
            "private": false,
            "default_branch": "main",
            "pushed_at": "2024-03-07T10:00:00Z"
        })
    }

    fn client(server: &MockServer, token: Option<&str>) -> GithubClient {
        GithubClient::new(ClientConfig {
            api_url: server.uri(),
            username: "likahang".to_string(),
            count: 20,
            token: token.map(str::to_string),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_selection() {
        let mut config = ClientConfig {
            api_url: "http://localhost".to_string(),
            username: "likahang".to_string(),
            count: 5,
            token: None,
        };
        assert_eq!(
            Endpoint::select(&config),
            Endpoint::Public {
                username: "likahang".to_string()
            }
        );

        config.token = Some("  ".to_string());
        assert!(matches!(Endpoint::select(&config), Endpoint::Public { .. }));

        config.token = Some("ghp_secret".to_string());
        assert_eq!(
            Endpoint::select(&config),
            Endpoint::Authenticated {
                token: "ghp_secret".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_public_load_keeps_order_and_defaults_missing_releases() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/likahang/repos"))
            .and(query_param("sort", "pushed"))
            .and(query_param("per_page", "20"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([repo_json("alpha"), repo_json("beta"), repo_json("gamma")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/likahang/alpha/releases/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tag_name": "v1.0.0"})))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/likahang/beta/releases/latest"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/likahang/gamma/releases/latest"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let repos = client(&server, None).load().await.unwrap();

        let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta", "gamma"]);
        assert_eq!(repos[0].release_tag(), "v1.0.0");
        assert_eq!(repos[1].release_tag(), "N/A");
        assert_eq!(repos[2].release_tag(), "N/A");
    }

    #[tokio::test]
    async fn test_authenticated_load_uses_owner_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .and(query_param("affiliation", "owner"))
            .and(header("authorization", "token ghp_secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([repo_json("private-one")])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/likahang/private-one/releases/latest"))
            .and(header("authorization", "token ghp_secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tag_name": "v0.3.1"})))
            .expect(1)
            .mount(&server)
            .await;

        let repos = client(&server, Some("ghp_secret")).load().await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].release_tag(), "v0.3.1");
    }

    #[tokio::test]
    async fn test_non_success_listing_fails_whole_load() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/likahang/repos"))
            .respond_with(ResponseTemplate::new(403).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client(&server, None).load().await.unwrap_err();
        match err {
            LoadError::Status { status, body } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_fails_whole_load() {
        // Reserve a free port, then release it so nothing answers there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = GithubClient::new(ClientConfig {
            api_url: format!("http://127.0.0.1:{port}"),
            username: "likahang".to_string(),
            count: 20,
            token: None,
        })
        .unwrap();

        let err = client.load().await.unwrap_err();
        assert!(matches!(err, LoadError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_empty_listing_loads_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/likahang/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let repos = client(&server, None).load().await.unwrap();
        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn test_check_previews_reports_each_url() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/likahang/alpha/main/preview.png"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let urls = vec![
            format!("{}/likahang/alpha/main/preview.png", server.uri()),
            format!("{}/likahang/beta/main/preview.png", server.uri()),
        ];
        let results = client(&server, None).check_previews(urls.clone()).await;

        assert_eq!(results, vec![(urls[0].clone(), true), (urls[1].clone(), false)]);
    }
}
