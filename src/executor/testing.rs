//! In-process transport for unit tests.

use super::error::RequestError;
use super::transport::{HttpTransport, OutgoingRequest, TransportResponse};
use async_trait::async_trait;
use std::sync::Mutex;

type Handler = dyn Fn(&OutgoingRequest) -> Result<TransportResponse, RequestError> + Send + Sync;

/// Transport answering from a closure and recording every request it sees.
pub(crate) struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<OutgoingRequest>>,
}

impl MockTransport {
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&OutgoingRequest) -> Result<TransportResponse, RequestError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with the same JSON body.
    pub(crate) fn json(status: u16, body: serde_json::Value) -> Self {
        Self::new(move |_| {
            Ok(TransportResponse::new(status, body.to_string())
                .with_header("Content-Type", "application/json"))
        })
    }

    /// Fails every request with a connection error.
    pub(crate) fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_| Err(RequestError::NetworkError(message.clone())))
    }

    pub(crate) fn requests(&self) -> Vec<OutgoingRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> OutgoingRequest {
        self.requests().pop().expect("no request was sent")
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<TransportResponse, RequestError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(&request)
    }
}
