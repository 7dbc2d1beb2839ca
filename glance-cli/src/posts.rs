//! Work items fetched from the JSONPlaceholder API

use glance::{ConfigError, RetryPolicy};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const POSTS_URL: &str = "https://jsonplaceholder.typicode.com/posts";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// API retries wait `2^attempt` seconds, independent of `RETRY_DELAY`.
pub fn api_retry_policy(max_attempts: u32) -> Result<RetryPolicy, ConfigError> {
    RetryPolicy::new(max_attempts, Duration::from_secs(1))
}

/// A blog post from JSONPlaceholder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(rename = "userId")]
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum PostsError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to fetch posts after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: reqwest::Error,
    },
}

pub struct PostsClient {
    http: reqwest::Client,
    url: String,
    policy: RetryPolicy,
}

impl PostsClient {
    pub fn new(url: impl Into<String>, policy: RetryPolicy) -> Result<Self, PostsError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(PostsError::Client)?;
        Ok(Self {
            http,
            url: url.into(),
            policy,
        })
    }

    /// Fetch the first `count` posts, retrying failed requests with exponential backoff.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self, count: usize) -> Result<Vec<Post>, PostsError> {
        let max = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            match self.fetch_once().await {
                Ok(mut posts) => {
                    posts.truncate(count);
                    info!("Retrieved {} posts", posts.len());
                    return Ok(posts);
                }
                Err(e) => {
                    warn!("API request failed (attempt {}/{}): {}", attempt + 1, max, e);
                    if attempt + 1 >= max {
                        return Err(PostsError::Exhausted {
                            attempts: max,
                            last: e,
                        });
                    }

                    let delay = self.policy.delay_for(attempt);
                    info!("Retrying in {:.1}s...", delay.as_secs_f64());
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn fetch_once(&self) -> Result<Vec<Post>, reqwest::Error> {
        self.http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Post>>()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    const BODY: &str = r#"[
        {"userId": 1, "id": 1, "title": "first", "body": "one"},
        {"userId": 1, "id": 2, "title": "second", "body": "two"},
        {"userId": 2, "id": 3, "title": "third", "body": "three"}
    ]"#;

    /// Serves `failures` HTTP 500 responses, then the fixture body. Returns the URL and a
    /// request counter.
    fn start_test_server(failures: usize) -> (String, Arc<AtomicUsize>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        thread::spawn(move || {
            for request in server.incoming_requests() {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let response = if n < failures {
                    tiny_http::Response::from_string("unavailable").with_status_code(500)
                } else {
                    let header: tiny_http::Header =
                        "Content-Type: application/json".parse().unwrap();
                    tiny_http::Response::from_string(BODY).with_header(header)
                };
                let _ = request.respond(response);
            }
        });

        (format!("http://127.0.0.1:{port}/posts"), hits)
    }

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO).unwrap()
    }

    #[test]
    fn test_api_backoff_is_whole_seconds() {
        let policy = api_retry_policy(4).unwrap();
        assert_eq!(policy.max_attempts(), 4);
        let delays: Vec<_> = (0..3).map(|i| policy.delay_for(i)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
        assert!(api_retry_policy(0).is_err());
    }

    #[tokio::test]
    async fn test_fetch_truncates_to_count() {
        let (url, hits) = start_test_server(0);
        let client = PostsClient::new(url, instant_policy(3)).unwrap();

        let posts = client.fetch(2).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(
            posts[1],
            Post {
                id: 2,
                user_id: 1,
                title: "second".into(),
                body: "two".into(),
            }
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_retries_server_errors() {
        let (url, hits) = start_test_server(2);
        let client = PostsClient::new(url, instant_policy(3)).unwrap();

        let posts = client.fetch(10).await.unwrap();
        assert_eq!(posts.len(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_max_attempts() {
        let (url, hits) = start_test_server(usize::MAX);
        let client = PostsClient::new(url, instant_policy(3)).unwrap();

        match client.fetch(10).await {
            Err(PostsError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
            }
            other => panic!("Expected Exhausted, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
