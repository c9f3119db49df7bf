//! Maps transport outcomes onto `ClientError`.

use crate::error::{ClientError, ClientResult};
use crate::transport::HttpResponse;
use serde::de::DeserializeOwned;

/// Maps a raw transport outcome.
///
/// Transport failures become `Transport`; a response with a non-2xx status
/// becomes `Protocol` carrying the status and raw body.
pub fn normalize_outcome(outcome: Result<HttpResponse, String>) -> ClientResult<HttpResponse> {
    let response = outcome.map_err(ClientError::transport)?;
    if !response.is_success() {
        return Err(ClientError::Protocol {
            status: response.status,
            body: response.text(),
        });
    }
    Ok(response)
}

/// Decodes a successful response body as JSON.
///
/// An empty body is a decode error: every endpoint decoded through here
/// promises a payload.
pub fn decode_body<T: DeserializeOwned>(response: &HttpResponse) -> ClientResult<T> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Err(ClientError::Decode("empty response body".into()));
    }
    serde_json::from_slice(&response.body).map_err(|e| ClientError::Decode(e.to_string()))
}
