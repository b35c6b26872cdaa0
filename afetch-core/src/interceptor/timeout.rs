use log::debug;
use crate::error::TimeoutError;
use crate::interceptor::priority::PriorityRanges;
use crate::interceptor::{DispatchInterceptor, ExchangeContext, ExchangeResult, Next};

/// Races the rest of the chain against the request deadline. On expiry the
/// shared token is cancelled and the in-flight exchange is dropped.
pub struct TimeoutInterceptor;

#[async_trait::async_trait]
impl DispatchInterceptor for TimeoutInterceptor {
    fn name(&self) -> &str {
        "timeout"
    }

    fn priority(&self) -> i32 {
        PriorityRanges::BUILTIN.start + 500
    }

    fn should_activate(&self, context: &ExchangeContext) -> bool {
        context.request.deadline.is_some_and(|deadline| !deadline.is_zero())
    }

    async fn intercept<'a>(&'a self, context: ExchangeContext, next: Next<'a>) -> ExchangeResult {
        let Some(deadline) = context.request.deadline else {
            return next(context).await;
        };
        let cancellation = context.cancellation.clone();
        let exchange = next(context);

        tokio::select! {
            biased;
            result = exchange => result,
            () = tokio::time::sleep(deadline) => {
                debug!("deadline of {}ms elapsed", deadline.as_millis());
                cancellation.cancel();
                Err(TimeoutError::new(deadline).into())
            }
        }
    }
}
