//! Single-shot HTTP requests. Retrying is the caller's business.

use crate::error::TransportError;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub address: &'a str,
    pub method: Method,
    pub headers: HeaderMap,
    pub timeout: Duration,
}

impl<'a> Request<'a> {
    pub fn get(address: &'a str, timeout: Duration) -> Self {
        Self {
            address,
            method: Method::GET,
            headers: HeaderMap::new(),
            timeout,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes exactly one network attempt per call.
pub trait Transport: Send + Sync {
    fn fetch(
        &self,
        request: Request<'_>,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http })
    }

    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    async fn fetch(&self, request: Request<'_>) -> Result<Response, TransportError> {
        let url = Url::parse(request.address)
            .map_err(|_| TransportError::InvalidAddress(request.address.to_string()))?;

        let resp = self
            .http
            .request(request.method, url)
            .headers(request.headers)
            .timeout(request.timeout)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        tracing::trace!(address = request.address, status, bytes = body.len(), "fetched");
        Ok(Response { status, body })
    }
}
