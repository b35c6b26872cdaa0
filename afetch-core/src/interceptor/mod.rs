use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use futures::FutureExt;
use uuid::Uuid;
use crate::error::{ExchangeError, TransportError};
use crate::hook::panic_message;
use crate::interceptor::priority::PriorityRanges;
use crate::surface::ElementRef;
use crate::transport::{CancellationToken, Transport, TransportResponse};
use crate::types::ActivationRequest;

pub mod manager;
pub mod priority;
pub mod timeout;

pub use manager::InterceptorManager;
pub use timeout::TimeoutInterceptor;

/// Everything one exchange needs, moved down the chain stage by stage.
#[derive(Debug, Clone)]
pub struct ExchangeContext {
    pub activation_id: Uuid,
    pub element: ElementRef,
    pub request: ActivationRequest,
    pub cancellation: CancellationToken,
}

pub type ExchangeResult = Result<TransportResponse, ExchangeError>;

pub type ExchangeFuture<'a> = Pin<Box<dyn Future<Output = ExchangeResult> + Send + 'a>>;

/// Rest of the chain, ending in the transport.
pub type Next<'a> = Box<dyn FnOnce(ExchangeContext) -> ExchangeFuture<'a> + Send + 'a>;

/// Stage wrapping the transport call (Filter Chain Pattern)
#[async_trait::async_trait]
pub trait DispatchInterceptor: Send + Sync {
    fn name(&self) -> &str;

    /// Higher runs first
    fn priority(&self) -> i32 {
        PriorityRanges::NORMAL.start
    }

    fn should_activate(&self, _context: &ExchangeContext) -> bool {
        true
    }

    async fn intercept<'a>(&'a self, context: ExchangeContext, next: Next<'a>) -> ExchangeResult;
}

/// Runs `context` through `chain` in order, then the transport.
pub fn run_chain<'a>(
    chain: &'a [Arc<dyn DispatchInterceptor>],
    transport: &'a dyn Transport,
    context: ExchangeContext,
) -> ExchangeFuture<'a> {
    match chain.split_first() {
        Some((head, rest)) if head.should_activate(&context) => {
            log::trace!("interceptor '{}' ({})", head.name(), head.priority());
            let next: Next<'a> = Box::new(move |context| run_chain(rest, transport, context));
            head.intercept(context, next)
        }
        Some((_, rest)) => run_chain(rest, transport, context),
        None => Box::pin(async move {
            let ExchangeContext { request, cancellation, .. } = context;
            // A panicking transport fails this exchange only.
            match AssertUnwindSafe(transport.send(request, cancellation)).catch_unwind().await {
                Ok(result) => Ok(result?),
                Err(payload) => Err(TransportError::network(format!(
                    "transport panicked: {}",
                    panic_message(payload.as_ref())
                ))
                .into()),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use http::{HeaderValue, StatusCode};
    use url::Url;
    use crate::memory::{MemoryElement, ScriptedTransport};
    use crate::types::{FetchOptions, RequestBody};

    struct Tagging {
        name: &'static str,
        priority: i32,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait::async_trait]
    impl DispatchInterceptor for Tagging {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn intercept<'a>(&'a self, mut context: ExchangeContext, next: Next<'a>) -> ExchangeResult {
            self.order.lock().unwrap().push(self.name);
            context.request.headers.append("x-stage", HeaderValue::from_static(self.name));
            next(context).await
        }
    }

    fn context() -> ExchangeContext {
        ExchangeContext {
            activation_id: Uuid::new_v4(),
            element: Arc::new(MemoryElement::new("button")),
            request: ActivationRequest {
                url: Url::parse("http://localhost/x").unwrap(),
                method: http::Method::GET,
                headers: http::HeaderMap::new(),
                body: RequestBody::Empty,
                query: Vec::new(),
                deadline: None,
                options: FetchOptions::default(),
            },
            cancellation: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn chain_runs_in_order_and_ends_in_the_transport() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let chain: Vec<Arc<dyn DispatchInterceptor>> = vec![
            Arc::new(Tagging { name: "outer", priority: 8000, order: order.clone() }),
            Arc::new(Tagging { name: "inner", priority: 100, order: order.clone() }),
        ];
        let transport = ScriptedTransport::new(|request| {
            Ok(TransportResponse::new(request.url.clone(), StatusCode::OK))
        });

        let response = run_chain(&chain, &transport, context()).await.unwrap();
        assert!(response.ok());
        assert_eq!(*order.lock().unwrap(), vec!["outer", "inner"]);

        let sent = transport.last_request().unwrap();
        let stages: Vec<_> = sent.headers.get_all("x-stage").iter().map(|v| v.to_str().unwrap().to_string()).collect();
        assert_eq!(stages, vec!["outer", "inner"]);
    }
}
