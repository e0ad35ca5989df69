//! Response assertion engine.
//!
//! One generic validator for every endpoint: transport error first, then
//! status code, then (only when a success predicate is given) envelope and
//! payload decoding, then the predicate. Non-2xx bodies are never decoded.

use serde::de::DeserializeOwned;

use crate::agent::RawResponse;
use crate::error::{CheckError, TransportError};
use crate::types::Envelope;

type Predicate<'a, T> = Box<dyn FnOnce(&T) -> Result<(), CheckError> + Send + 'a>;

/// What a response must look like to pass a check.
pub struct Expectation<'a, T> {
    status: u16,
    predicate: Option<Predicate<'a, T>>,
}

impl<'a, T: DeserializeOwned> Expectation<'a, T> {
    /// Satisfied by the status code alone.
    pub fn status(code: u16) -> Self {
        Self {
            status: code,
            predicate: None,
        }
    }

    /// Decode the payload as `T` and require `predicate` to hold.
    pub fn success<F>(code: u16, predicate: F) -> Self
    where
        F: FnOnce(&T) -> Result<(), CheckError> + Send + 'a,
    {
        Self {
            status: code,
            predicate: Some(Box::new(predicate)),
        }
    }

    pub fn expected_status(&self) -> u16 {
        self.status
    }

    /// Evaluate `response` against this expectation.
    ///
    /// Returns the decoded payload when a predicate was supplied and held.
    pub fn evaluate(
        self,
        response: Result<RawResponse, TransportError>,
    ) -> Result<Option<T>, CheckError> {
        let response = response?;
        if response.status != self.status {
            return Err(CheckError::StatusMismatch {
                want: self.status,
                got: response.status,
            });
        }
        let Some(predicate) = self.predicate else {
            return Ok(None);
        };
        let payload = decode_payload::<T>(&response.body)?;
        predicate(&payload)?;
        Ok(Some(payload))
    }
}

/// Decode `{status: true, data: T}`.
pub fn decode_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T, CheckError> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| CheckError::Decode(format!("invalid envelope: {e}")))?;
    if !envelope.status {
        return Err(CheckError::Decode(
            "envelope status is false on a success response".to_string(),
        ));
    }
    serde_json::from_value(envelope.data)
        .map_err(|e| CheckError::Decode(format!("unexpected payload shape: {e}")))
}
