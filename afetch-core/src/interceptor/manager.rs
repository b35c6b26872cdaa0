use std::sync::Arc;
use crate::error::{AfetchError, AfetchResult};
use crate::interceptor::priority::PriorityRanges;
use crate::interceptor::DispatchInterceptor;

/// Priority ordered interceptor chain
#[derive(Clone, Default)]
pub struct InterceptorManager {
    interceptors: Vec<Arc<dyn DispatchInterceptor>>,
}

impl InterceptorManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host interceptor. Its priority must lie in one of the
    /// host ranges; the built-in range is rejected.
    pub fn register(&mut self, interceptor: Arc<dyn DispatchInterceptor>) -> AfetchResult<()> {
        let priority = interceptor.priority();
        if !PriorityRanges::is_host_priority(priority) {
            return Err(AfetchError::InterceptorPriority {
                name: interceptor.name().to_string(),
                priority,
            });
        }
        self.insert(interceptor)
    }

    pub(crate) fn register_builtin(&mut self, interceptor: Arc<dyn DispatchInterceptor>) -> AfetchResult<()> {
        let priority = interceptor.priority();
        if !PriorityRanges::BUILTIN.contains(&priority) {
            return Err(AfetchError::InterceptorPriority {
                name: interceptor.name().to_string(),
                priority,
            });
        }
        self.insert(interceptor)
    }

    fn insert(&mut self, interceptor: Arc<dyn DispatchInterceptor>) -> AfetchResult<()> {
        if self.interceptors.iter().any(|existing| existing.name() == interceptor.name()) {
            return Err(AfetchError::DuplicateInterceptor(interceptor.name().to_string()));
        }
        self.interceptors.push(interceptor);
        self.interceptors.sort_by(|a, b| b.priority().cmp(&a.priority()));
        Ok(())
    }

    pub fn chain(&self) -> &[Arc<dyn DispatchInterceptor>] {
        &self.interceptors
    }

    pub fn names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|interceptor| interceptor.name()).collect()
    }
}
