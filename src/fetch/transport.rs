use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::error::FetchError;

/// HTTP method of a fetch. Only `Get` responses are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Per-call options for [`DedupFetcher::fetch`](super::DedupFetcher::fetch).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    pub method: Method,
    /// JSON body; also part of the cache key
    pub body: Option<Value>,
    /// Overrides the cache's default TTL for this response
    pub cache_ttl: Option<Duration>,
}

impl FetchOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }
}

/// One outbound request handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

/// Cache key for a request: `METHOD:url:body`, body empty when absent.
pub fn cache_key(method: Method, url: &str, body: Option<&Value>) -> String {
    let body = body.map(Value::to_string).unwrap_or_default();
    format!("{}:{}:{}", method, url, body)
}

/// Performs a request and yields its parsed JSON body.
///
/// Non-success statuses must be reported as [`FetchError::Status`].
pub trait HttpTransport: Send + Sync + 'static {
    fn send(&self, request: FetchRequest) -> BoxFuture<'static, Result<Value, FetchError>>;
}

/// Production transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &CacheConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: FetchRequest) -> BoxFuture<'static, Result<Value, FetchError>> {
        let client = self.client.clone();
        async move {
            let FetchRequest { method, url, body } = request;

            let mut builder = client.request(method.into(), &url);
            if let Some(body) = &body {
                builder = builder.json(body);
            }

            let resp = builder
                .send()
                .await
                .map_err(|e| transport_error(&url, e))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            let bytes = resp.bytes().await.map_err(|e| transport_error(&url, e))?;
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Json {
                url,
                message: e.to_string(),
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_cache_key_includes_body() {
        assert_eq!(cache_key(Method::Get, "/api/stats", None), "GET:/api/stats:");
        assert_eq!(
            cache_key(Method::Post, "/api/stats", Some(&json!({"range": 30}))),
            r#"POST:/api/stats:{"range":30}"#
        );
        assert_ne!(
            cache_key(Method::Get, "/api/stats", Some(&json!({"range": 30}))),
            cache_key(Method::Get, "/api/stats", Some(&json!({"range": 7})))
        );
    }

    #[test]
    fn test_options_builder() {
        let opts = FetchOptions::get()
            .method(Method::Post)
            .body(json!([1]))
            .cache_ttl(Duration::from_secs(5));
        assert_eq!(opts.method, Method::Post);
        assert_eq!(opts.body, Some(json!([1])));
        assert_eq!(opts.cache_ttl, Some(Duration::from_secs(5)));
        assert_eq!(FetchOptions::default().method, Method::Get);
    }
}
