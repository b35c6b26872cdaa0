use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use async_trait::async_trait;
use crate::error::TransportError;
use crate::transport::{CancellationToken, Transport, TransportResponse};
use crate::types::ActivationRequest;

type Responder = dyn Fn(&ActivationRequest) -> Result<TransportResponse, TransportError> + Send + Sync;

/// Transport answering from a closure, recording every request it sees.
pub struct ScriptedTransport {
    responder: Option<Arc<Responder>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<ActivationRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ActivationRequest) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Arc::new(responder)),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Never resolves unless cancelled.
    pub fn pending() -> Self {
        Self {
            responder: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(TransportError::network(message.clone())))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ActivationRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last_request(&self) -> Option<ActivationRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: ActivationRequest,
        cancellation: CancellationToken,
    ) -> Result<TransportResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let exchange = async {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.responder {
                Some(responder) => responder(&request),
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            result = exchange => result,
            () = cancellation.cancelled() => Err(TransportError::Cancelled),
        }
    }
}
