//! GraphQL-over-HTTP transport.

use crate::{GraphQlError, Operation, Outcome, Transport, TransportError, TransportResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestBody<'a> {
    operation_name: &'a str,
    query: &'a str,
    variables: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Posts operations as JSON to one GraphQL endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url, timeout: Duration) -> TransportResult<Self> {
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(TransportError::InvalidEndpoint(format!(
                "unsupported scheme {:?} in {}",
                endpoint.scheme(),
                endpoint
            )));
        }

        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, operation: &Operation) -> Outcome {
        let body = RequestBody {
            operation_name: &operation.name,
            query: &operation.document,
            variables: &operation.variables,
        };

        let mut request = self.http_client.post(self.endpoint.clone()).json(&body);
        for (name, value) in &operation.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(operation = %operation.name, request_id = %operation.id, error = %e, "GraphQL request failed");
                return Outcome::network_failure(e.to_string());
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Outcome::network_failure(format!("reading response: {}", e)),
        };

        debug!(
            operation = %operation.name,
            request_id = %operation.id,
            status,
            body = %summarize_response_body(&text),
            "GraphQL response received"
        );

        parse_response(status, &text)
    }
}

/// Map an HTTP status and body to an [`Outcome`].
///
/// A GraphQL body wins over the status code. A bare 401 becomes an
/// `UNAUTHENTICATED` error so the pipeline can refresh on it.
pub(crate) fn parse_response(status: u16, body: &str) -> Outcome {
    if let Ok(parsed) = serde_json::from_str::<ResponseBody>(body) {
        let errors = parsed.errors.unwrap_or_default();
        let data = parsed.data.filter(|d| !d.is_null());
        if data.is_some() || !errors.is_empty() {
            return Outcome {
                data,
                errors,
                network_failure: None,
            };
        }
    }

    if status == 401 {
        return Outcome::errors(vec![GraphQlError::unauthenticated("Unauthorized")]);
    }

    if !(200..300).contains(&status) {
        return Outcome::network_failure(format!(
            "HTTP {} ({})",
            status,
            summarize_response_body(body)
        ));
    }

    Outcome::network_failure(format!(
        "malformed GraphQL response ({})",
        summarize_response_body(body)
    ))
}
