use std::sync::Arc;
use std::time::Duration;
use http::Method;
use log::{debug, error, info, log};
use crate::attribute::ElementConfig;
use crate::body;
use crate::classifier;
use crate::config::DispatcherConfig;
use crate::error::{
    ActivationError, AfetchResult, BodyBuildError, ExchangeError, ScriptError, TimeoutError, TransportError,
};
use crate::event::{ActivationEventChannel, DispatchEventKind};
use crate::hook::{HandlerRegistry, HookDetail, HookInvoker, HookKind};
use crate::interceptor::{run_chain, DispatchInterceptor, ExchangeContext, InterceptorManager, TimeoutInterceptor};
use crate::render;
use crate::script::ScriptHost;
use crate::surface::{closest_activatable, Document, ElementRef, UiEvent};
use crate::transport::{CancellationToken, Transport, TransportResponse};
use crate::types::{ActivationRequest, Payload};

mod activation;
pub mod state;

use activation::Activation;
pub use state::{ActivationOutcome, ActivationReport, ActivationState};

/// Runs activations: attributes in, one request out, one outcome rendered.
///
/// Collaborators are injected once and shared immutably by every
/// activation, so concurrent activations never observe each other.
pub struct Dispatcher {
    document: Arc<dyn Document>,
    transport: Arc<dyn Transport>,
    hooks: HookInvoker,
    scripts: Option<Arc<dyn ScriptHost>>,
    interceptors: InterceptorManager,
    config: DispatcherConfig,
    events: Option<ActivationEventChannel>,
}

pub struct DispatcherBuilder {
    document: Arc<dyn Document>,
    transport: Arc<dyn Transport>,
    handlers: Arc<HandlerRegistry>,
    scripts: Option<Arc<dyn ScriptHost>>,
    interceptors: Vec<Arc<dyn DispatchInterceptor>>,
    config: DispatcherConfig,
    events: Option<ActivationEventChannel>,
}

impl DispatcherBuilder {
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn script_host(mut self, host: Arc<dyn ScriptHost>) -> Self {
        self.scripts = Some(host);
        self
    }

    /// Priority is validated by `build`.
    pub fn interceptor(mut self, interceptor: Arc<dyn DispatchInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn events(mut self, channel: ActivationEventChannel) -> Self {
        self.events = Some(channel);
        self
    }

    pub fn build(self) -> AfetchResult<Dispatcher> {
        let mut interceptors = InterceptorManager::new();
        interceptors.register_builtin(Arc::new(TimeoutInterceptor))?;
        for interceptor in self.interceptors {
            interceptors.register(interceptor)?;
        }

        Ok(Dispatcher {
            document: self.document,
            transport: self.transport,
            hooks: HookInvoker::new(self.handlers),
            scripts: self.scripts,
            interceptors,
            config: self.config,
            events: self.events,
        })
    }
}

impl Dispatcher {
    pub fn builder(document: Arc<dyn Document>, transport: Arc<dyn Transport>) -> DispatcherBuilder {
        DispatcherBuilder {
            document,
            transport,
            handlers: Arc::new(HandlerRegistry::new()),
            scripts: None,
            interceptors: Vec::new(),
            config: DispatcherConfig::default(),
            events: None,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn document(&self) -> &Arc<dyn Document> {
        &self.document
    }

    pub fn interceptors(&self) -> &InterceptorManager {
        &self.interceptors
    }

    /// Entry point for host UI events. Click, Enter and Space on a
    /// qualifying element (or inside one) suppress the default action and
    /// activate it; anything else is ignored.
    pub async fn handle_event(&self, event: &UiEvent) -> Option<ActivationReport> {
        if !event.is_activation() {
            return None;
        }
        let element = closest_activatable(&event.target)?;
        event.prevent_default();
        Some(self.activate(element).await)
    }

    pub async fn activate(&self, element: ElementRef) -> ActivationReport {
        let mut activation = Activation::new(self, element.clone());
        activation.fire(HookKind::Before, || HookDetail::Before);

        let config = ElementConfig::read(element.as_ref(), &self.config);
        let Some(raw_url) = config.url.clone() else {
            debug!("activation {}: element has no fetch url, skipped", activation.id);
            return activation.skip();
        };

        activation.transition(ActivationState::Building);
        let request = match self.build_request(&mut activation, &config, &raw_url) {
            Ok(request) => request,
            Err(error) => {
                let outcome = self.body_build_failed(&mut activation, &config, error);
                return activation.complete(outcome);
            }
        };

        activation.request = Some(request.clone());
        activation.engage(&config);
        activation.fire(HookKind::Start, || HookDetail::Start { request: request.clone() });
        activation.transition(ActivationState::Sent);
        info!("activation {}: {} {}", activation.id, request.method, request.url);

        for interceptor in self.interceptors.chain() {
            activation.emit(DispatchEventKind::InterceptorTriggered {
                interceptor_name: interceptor.name().to_string(),
                priority: interceptor.priority(),
            });
        }

        let context = ExchangeContext {
            activation_id: activation.id,
            element,
            request,
            cancellation: CancellationToken::new(),
        };
        let outcome = match run_chain(self.interceptors.chain(), self.transport.as_ref(), context).await {
            Ok(response) => self.handle_response(&mut activation, &config, response),
            Err(ExchangeError::Timeout(error)) => self.timed_out(&mut activation, error),
            Err(ExchangeError::Transport(error)) => self.failed(&mut activation, error),
        };
        activation.complete(outcome)
    }

    fn build_request(
        &self,
        activation: &mut Activation<'_>,
        config: &ElementConfig,
        raw_url: &str,
    ) -> Result<ActivationRequest, BodyBuildError> {
        let method = Method::from_bytes(config.method.as_bytes())
            .map_err(|_| BodyBuildError::InvalidMethod(config.method.clone()))?;
        let mut url = self
            .document
            .base_url()
            .join(raw_url)
            .map_err(|source| BodyBuildError::InvalidUrl { url: raw_url.to_string(), source })?;
        activation.url = Some(url.clone());
        activation.method = Some(method.clone());

        let built = body::build(self.document.as_ref(), activation.element.as_ref(), &method)?;
        for message in built.diagnostics {
            activation.diagnostic(message);
        }

        let method = built.method_override.unwrap_or(method);
        let query = built.query.unwrap_or_default();
        body::apply_query(&mut url, &query);
        activation.url = Some(url.clone());
        activation.method = Some(method.clone());

        Ok(ActivationRequest {
            url,
            method,
            headers: built.headers,
            body: built.body,
            query,
            deadline: (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms)),
            options: config.options.clone(),
        })
    }

    fn body_build_failed(
        &self,
        activation: &mut Activation<'_>,
        config: &ElementConfig,
        error: BodyBuildError,
    ) -> ActivationOutcome {
        activation.transition(ActivationState::BodyBuildFailed);
        let failure: ActivationError = error.clone().into();
        log_failure(activation, &failure);

        activation.fire(HookKind::BodyBuildError, || HookDetail::BodyBuildError { error: error.clone() });
        activation.fire(HookKind::Error, || HookDetail::Error { error: failure });
        self.render(config, &format!("Invalid fetch-body: {error}"));
        ActivationOutcome::BodyBuildFailed(error)
    }

    fn handle_response(
        &self,
        activation: &mut Activation<'_>,
        config: &ElementConfig,
        response: TransportResponse,
    ) -> ActivationOutcome {
        let response = Arc::new(response);
        activation.fire(HookKind::Response, || HookDetail::Response { response: response.clone() });

        let parsed = match classifier::parse(config.response, &response) {
            Ok(parsed) => parsed,
            Err(error) => {
                activation.transition(ActivationState::ParseFailed);
                let failure: ActivationError = error.clone().into();
                log_failure(activation, &failure);

                activation.fire(HookKind::ParseError, || HookDetail::ParseError {
                    error: error.clone(),
                    response: response.clone(),
                });
                activation.fire(HookKind::Error, || HookDetail::Error { error: failure });
                let content = if error.raw.is_empty() { error.to_string() } else { error.raw.clone() };
                self.render(config, &content);
                return ActivationOutcome::ParseFailed(error);
            }
        };

        if !parsed.status_ok {
            activation.transition(ActivationState::Rejected);
            let error = ActivationError::Rejected {
                status: response.status,
                response: parsed.clone(),
            };
            log_failure(activation, &error);
            activation.fire(HookKind::Failure, || HookDetail::Failure { error: error.clone() });
            activation.fire(HookKind::Error, || HookDetail::Error { error });
            self.render(config, &parsed.payload.render_text(&self.config.binary_placeholder));
            return ActivationOutcome::Rejected {
                status: response.status,
                response: parsed,
            };
        }

        activation.transition(ActivationState::Succeeded);
        activation.fire(HookKind::for_kind(parsed.kind()), || HookDetail::Data {
            parsed: parsed.clone(),
            response: response.clone(),
        });
        if let Payload::Script(source) = &parsed.payload {
            if config.execute_scripts {
                self.execute_script(activation, source);
            }
        }
        self.render(config, &parsed.payload.render_text(&self.config.binary_placeholder));
        ActivationOutcome::Succeeded(parsed)
    }

    fn timed_out(&self, activation: &mut Activation<'_>, error: TimeoutError) -> ActivationOutcome {
        activation.transition(ActivationState::TimedOut);
        let failure: ActivationError = error.into();
        log_failure(activation, &failure);

        activation.fire(HookKind::Timeout, || HookDetail::Timeout { timeout_ms: error.timeout_ms });
        activation.fire(HookKind::Error, || HookDetail::Error { error: failure });
        ActivationOutcome::TimedOut(error)
    }

    fn failed(&self, activation: &mut Activation<'_>, error: TransportError) -> ActivationOutcome {
        activation.transition(ActivationState::Failed);
        let failure: ActivationError = error.clone().into();
        log_failure(activation, &failure);

        activation.fire(HookKind::Failure, || HookDetail::Failure { error: failure.clone() });
        activation.fire(HookKind::Error, || HookDetail::Error { error: failure });
        ActivationOutcome::Failed(error)
    }

    fn execute_script(&self, activation: &mut Activation<'_>, source: &str) {
        let result = match &self.scripts {
            Some(host) => host.execute(source, &activation.element),
            None => Err(ScriptError::Unavailable),
        };
        if let Err(error) = &result {
            error!("activation {}: {error}", activation.id);
        }
        activation.emit(DispatchEventKind::ScriptExecuted { success: result.is_ok() });
    }

    fn render(&self, config: &ElementConfig, content: &str) {
        render::render_to_selector(self.document.as_ref(), config.target.as_deref(), content, config.render);
    }
}

/// Outcome logging; the level follows the error's severity.
fn log_failure(activation: &Activation<'_>, error: &ActivationError) {
    log!(error.severity().level(), "activation {}: {error}", activation.id);
}
