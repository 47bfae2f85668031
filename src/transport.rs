use reqwest::header::{HeaderMap, HeaderValue, LOCATION, USER_AGENT};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use url::Url;

use crate::config::Config;
use crate::entity::Mapping;
use crate::resource::RESOURCE_URI_KEY;
use crate::{HydroShareError, Result};

/// Blocking JSON calls against the API root.
///
/// Paths are relative to the API root and carry their trailing slash,
/// e.g. `resource/` or `resource/12/`. An empty response body reads as
/// JSON `null`.
pub trait Transport {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value>;

    fn post(&self, path: &str, body: &Mapping) -> Result<Value>;

    fn put(&self, path: &str, body: &Mapping) -> Result<Value>;

    /// True if the service accepted the deletion.
    fn delete(&self, path: &str) -> Result<bool>;
}

/// [Transport] over HTTP with basic authentication.
pub struct HttpTransport {
    base_url: Url,
    username: String,
    password: Option<String>,
    client: reqwest::Client,
    runtime: Runtime,
}

struct Reply {
    status: StatusCode,
    location: Option<String>,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Result<Value> {
        if self.body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let mut header = HeaderMap::new();
        header.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|_| {
                HydroShareError::Config(format!(
                    "invalid user agent {}",
                    config.user_agent
                ))
            })?,
        );

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let mut builder = reqwest::Client::builder().default_headers(header);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = {
            let _guard = runtime.enter();
            builder.build()?
        };

        Ok(Self {
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
            runtime,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        log::debug!("{} {}", method, url);
        Ok(self
            .client
            .request(method, url)
            .basic_auth(&self.username, self.password.as_ref()))
    }

    /// Send the request, blocking until the whole body is read.
    fn execute(&self, request: RequestBuilder) -> Result<Reply> {
        self.runtime.block_on(Self::send(request))
    }

    async fn send(request: RequestBuilder) -> Result<Reply> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?.to_vec();
        log::trace!("{} from {} ({} bytes)", status, url, body.len());

        if status == StatusCode::NOT_FOUND {
            return Err(HydroShareError::NotFound(url));
        }
        if !status.is_success() {
            log::warn!("Request to {} failed with {}", url, status);
            return Err(HydroShareError::Status { status, url });
        }
        Ok(Reply {
            status,
            location,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let request = self.request(Method::GET, path)?.query(query);
        self.execute(request)?.json()
    }

    fn post(&self, path: &str, body: &Mapping) -> Result<Value> {
        let request = self.request(Method::POST, path)?.json(body);
        let reply = self.execute(request)?;
        match (reply.json()?, reply.location) {
            // Created without a body, the new resource is only referenced
            (Value::Null, Some(location)) => {
                log::debug!("{} created {}", reply.status, location);
                Ok(json!({ RESOURCE_URI_KEY: location }))
            }
            (value, _) => Ok(value),
        }
    }

    fn put(&self, path: &str, body: &Mapping) -> Result<Value> {
        let request = self.request(Method::PUT, path)?.json(body);
        self.execute(request)?.json()
    }

    fn delete(&self, path: &str) -> Result<bool> {
        let request = self.request(Method::DELETE, path)?;
        let reply = self.execute(request)?;
        Ok(reply.status.is_success())
    }
}
