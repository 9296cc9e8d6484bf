//! Blocking `Transport` backed by `ureq`.
//!
//! Status codes are returned as data (`http_status_as_error(false)`) so the
//! client's parsers decide what a 404 or 500 means. Only failures that yield
//! no response at all become `ApiError::Transport`.

use std::io::Read;
use std::time::Duration;

use tracing::debug;
use ureq::{Agent, RequestBuilder, SendBody};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    access_token: Option<String>,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self {
            agent,
            access_token: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let transport = Self::new(Duration::from_secs(config.timeout_secs));
        match config.access_token.as_deref() {
            Some(token) => transport.with_access_token(token),
            None => transport,
        }
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    fn decorate<B>(&self, mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(token) = &self.access_token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS))
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let result = match request.method {
            HttpMethod::Get => self.decorate(self.agent.get(&request.path), &request).call(),
            HttpMethod::Post => {
                let builder = self.decorate(self.agent.post(&request.path), &request);
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = self.decorate(self.agent.put(&request.path), &request);
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        into_response(result)
    }

    fn send_reader(
        &self,
        request: HttpRequest,
        body: &mut dyn Read,
    ) -> Result<HttpResponse, ApiError> {
        let result = match request.method {
            HttpMethod::Post => self
                .decorate(self.agent.post(&request.path), &request)
                .send(SendBody::from_reader(body)),
            HttpMethod::Put => self
                .decorate(self.agent.put(&request.path), &request)
                .send(SendBody::from_reader(body)),
            HttpMethod::Get => {
                return Err(ApiError::InvalidUsage(
                    "GET requests cannot carry a streamed body".to_string(),
                ))
            }
        };
        into_response(result)
    }
}

fn into_response(
    result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
) -> Result<HttpResponse, ApiError> {
    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    debug!(status, "received response");
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
