use std::time::Instant;

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, info, warn};

use crate::catalog::RequestDefinition;
use crate::http::{
    ExecutionError, ExecutionLimits, HttpDelegate, HttpOutcome, build_url, encode_form_body,
    is_success, sends_body, split_header,
};

/// In-process HTTP delegate on top of `reqwest`.
#[derive(Clone)]
pub struct NativeClient {
    inner: reqwest::Client,
}

impl NativeClient {
    pub fn new(limits: ExecutionLimits) -> Result<Self, ExecutionError> {
        let inner = reqwest::Client::builder()
            .connect_timeout(limits.connect_timeout)
            .timeout(limits.max_time)
            .build()
            .map_err(ExecutionError::Client)?;
        Ok(Self { inner })
    }

    fn build(&self, def: &RequestDefinition) -> Result<reqwest::RequestBuilder, ExecutionError> {
        let spec = &def.request;
        let url = build_url(spec)?;
        let method = Method::from_bytes(spec.method.as_bytes())
            .map_err(|_| ExecutionError::InvalidMethod(spec.method.clone()))?;

        let mut req = self.inner.request(method, url);

        for header in &spec.headers {
            let (name, value) = split_header(header)?;
            req = req.header(name, value);
        }

        if !spec.basic_auth.is_empty() {
            req = match spec.basic_auth.split_once(':') {
                Some((user, password)) => req.basic_auth(user, Some(password)),
                None => req.basic_auth(&spec.basic_auth, None::<&str>),
            };
        }

        if sends_body(&spec.method, &spec.post_body) {
            let body = if def.is_form_encoded() {
                encode_form_body(&spec.post_body)
            } else {
                spec.post_body.clone()
            };
            req = req.body(body);
        }

        Ok(req)
    }
}

#[async_trait]
impl HttpDelegate for NativeClient {
    async fn execute(&self, def: &RequestDefinition) -> Result<HttpOutcome, ExecutionError> {
        let req = self.build(def)?;

        debug!("Executing endpoint request \"{}\"", def.request.endpoint);
        info!("Description: \"{}\"", def.request.description);

        let start = Instant::now();
        let response = req
            .send()
            .await
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;

        let status = response.status().as_u16().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;

        debug!("Status: {}, Duration: {}ms", status, start.elapsed().as_millis());

        if !is_success(&status) {
            warn!("Non-2xx status code received: status {}", status);
            return Err(ExecutionError::Status { status });
        }

        Ok(HttpOutcome {
            body: body.to_vec(),
            status,
        })
    }
}
