use std::fmt::Display;
use std::future::Future;

use trajview_shared::{SimplifyRequest, SimplifyResponse};

use crate::coordinator::TrajectoryBackend;
use crate::error::RequestError;

/// Talks to the dashboard server over `fetch`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl TrajectoryBackend for HttpBackend {
    fn simplify(
        &self,
        request: SimplifyRequest,
    ) -> impl Future<Output = Result<SimplifyResponse, RequestError>> + 'static {
        let endpoint = self.endpoint.clone();
        async move {
            let body = encode_request(&request)?;

            let resp = gloo_net::http::Request::post(&endpoint)
                .header("Content-Type", "application/json")
                .body(body)
                .map_err(|e| RequestError::Network(format!("fetch error: {e}")))?
                .send()
                .await
                .map_err(|e| RequestError::Network(format!("fetch error: {e}")))?;

            if !resp.ok() {
                return Err(RequestError::BadResponse(format!("HTTP {}", resp.status())));
            }

            decode_body(resp.text().await)
        }
    }
}

fn encode_request(request: &SimplifyRequest) -> Result<String, RequestError> {
    serde_json::to_string(request).map_err(|e| RequestError::BadResponse(format!("encode error: {e}")))
}

/// A 2xx body that cannot be read or decoded is a bad response, not a transport failure.
fn decode_body<E: Display>(text: Result<String, E>) -> Result<SimplifyResponse, RequestError> {
    let text = text.map_err(|e| RequestError::BadResponse(format!("read error: {e}")))?;
    SimplifyResponse::from_json_str(&text)
        .map_err(|e| RequestError::BadResponse(format!("parse error: {e}")))
}
