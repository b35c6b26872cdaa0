//! [`Transport`] over HTTP, backed by `reqwest`.
//!
//! One client is kept per redirect mode so `fetch-redirect` can be honoured
//! per request without rebuilding connection state.

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use log::{debug, trace};
use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use afetch_core::error::TransportError;
use afetch_core::transport::{CancellationToken, Transport, TransportResponse};
use afetch_core::types::{ActivationRequest, Blob, FormData, FormValue, RequestBody};

mod options;

pub use options::RedirectMode;

const DEFAULT_FILE_NAME: &str = "blob";

pub struct HttpTransport {
    follow: Client,
    manual: Client,
    error: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_builder(Client::builder)
    }

    /// Builds the three clients from the same base configuration, e.g. to
    /// set a user agent or a connect timeout.
    pub fn with_builder(base: impl Fn() -> ClientBuilder) -> Result<Self, reqwest::Error> {
        Ok(Self {
            follow: base().build()?,
            manual: base().redirect(Policy::none()).build()?,
            error: base()
                .redirect(Policy::custom(|attempt| attempt.error("redirect refused by fetch-redirect=error")))
                .build()?,
        })
    }

    fn client(&self, mode: RedirectMode) -> &Client {
        match mode {
            RedirectMode::Follow => &self.follow,
            RedirectMode::Manual => &self.manual,
            RedirectMode::Error => &self.error,
        }
    }

    fn prepare(&self, request: ActivationRequest) -> Result<RequestBuilder, TransportError> {
        let ActivationRequest {
            url,
            method,
            mut headers,
            body,
            options,
            ..
        } = request;

        options::apply(&options, &url, &mut headers);
        let client = self.client(RedirectMode::parse(options.redirect.as_deref()));

        let builder = match body {
            RequestBody::Empty => client.request(method, url).headers(headers),
            RequestBody::Bytes(bytes) => client.request(method, url).headers(headers).body(bytes),
            RequestBody::Multipart(data) => {
                // reqwest writes the boundary into its own content type
                headers.remove(CONTENT_TYPE);
                client.request(method, url).headers(headers).multipart(multipart(&data)?)
            }
        };
        Ok(builder)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: ActivationRequest,
        cancellation: CancellationToken,
    ) -> Result<TransportResponse, TransportError> {
        debug!("{} {}", request.method, request.url);
        let builder = self.prepare(request)?;

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(TransportError::Cancelled),
            result = exchange(builder) => result,
        }
    }
}

/// Sends the request and buffers the whole body.
async fn exchange(builder: RequestBuilder) -> Result<TransportResponse, TransportError> {
    let response = builder.send().await.map_err(network)?;
    let url = response.url().clone();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(network)?;
    trace!("{url} answered {status} with {} bytes", body.len());

    Ok(TransportResponse {
        url,
        status,
        headers,
        body: body.to_vec(),
    })
}

fn network(error: reqwest::Error) -> TransportError {
    if error.is_builder() {
        TransportError::invalid_request(error.to_string())
    } else {
        TransportError::network(error.to_string())
    }
}

fn multipart(data: &FormData) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for (name, value) in data.entries() {
        form = match value {
            FormValue::Text(text) => form.text(name.clone(), text.clone()),
            FormValue::File(blob) => form.part(name.clone(), file_part(blob)?),
        };
    }
    Ok(form)
}

fn file_part(blob: &Blob) -> Result<Part, TransportError> {
    let name = blob.name.clone().unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    let part = Part::bytes(blob.bytes.clone()).file_name(name);
    match &blob.content_type {
        Some(content_type) => part
            .mime_str(content_type)
            .map_err(|error| TransportError::invalid_request(error.to_string())),
        None => Ok(part),
    }
}
