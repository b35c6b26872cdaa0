use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use url::Url;
use afetch_core::attribute::names;
use afetch_core::event::ActivationEventChannel;
use afetch_core::memory::{MemoryDocument, MemoryElement};
use afetch_core::surface::Element;
use afetch_core::{
    ActivationOutcome, Dispatcher, DispatcherConfig, HandlerRegistry, HandlerResult, HookEvent, HookKind, Registrar,
    UiEvent,
};
use afetch_http::HttpTransport;

/// Activates a headless element declared on the command line and prints
/// what would be rendered into its target.
#[derive(Parser, Debug)]
#[command(name = "afetch", version)]
struct Cli {
    /// Value of `fetch`: absolute, or relative to --base
    url: String,

    /// Document URL relative requests resolve against
    #[arg(long, default_value = "http://localhost:8080/")]
    base: Url,

    #[arg(short = 'X', long)]
    method: Option<String>,

    /// JSON for `fetch-body`
    #[arg(short, long)]
    body: Option<String>,

    /// JSON object for `fetch-headers`
    #[arg(short = 'H', long)]
    headers: Option<String>,

    /// json, text or blob
    #[arg(long)]
    response: Option<String>,

    /// Deadline in milliseconds
    #[arg(long)]
    timeout: Option<u64>,

    /// html or text
    #[arg(long)]
    format: Option<String>,

    /// 0 replaces, 1 appends, -1 prepends
    #[arg(long, allow_hyphen_values = true)]
    mode: Option<String>,

    #[arg(long)]
    redirect: Option<String>,

    /// Extra attribute as name=value, repeatable
    #[arg(long = "attr", value_name = "NAME=VALUE")]
    attributes: Vec<String>,

    /// JSON file with dispatcher settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not hand script responses to a script host
    #[arg(long)]
    no_exec: bool,

    /// Text rendered for binary responses
    #[arg(long)]
    placeholder: Option<String>,

    /// Print every lifecycle event after the activation
    #[arg(long)]
    events: bool,
}

impl Cli {
    fn dispatcher_config(&self) -> Result<DispatcherConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
                DispatcherConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => DispatcherConfig::default(),
        };
        if self.no_exec {
            config.execute_scripts = false;
        }
        if let Some(placeholder) = &self.placeholder {
            config.binary_placeholder = placeholder.clone();
        }
        // A one-shot document never mutates after setup.
        config.disable_auto_observe = true;
        Ok(config)
    }

    fn element(&self) -> Result<MemoryElement> {
        let timeout = self.timeout.map(|timeout| timeout.to_string());
        let declared = [
            (names::METHOD, self.method.as_deref()),
            (names::BODY, self.body.as_deref()),
            (names::HEADERS, self.headers.as_deref()),
            (names::RESPONSE, self.response.as_deref()),
            (names::TIMEOUT, timeout.as_deref()),
            (names::TARGET_FORMAT, self.format.as_deref()),
            (names::TARGET_MODE, self.mode.as_deref()),
            (names::REDIRECT, self.redirect.as_deref()),
        ];

        let mut element = MemoryElement::new("button")
            .with_attribute(names::URL, &self.url)
            .with_attribute(names::TARGET, "#out");
        for (name, value) in declared {
            if let Some(value) = value {
                element = element.with_attribute(name, value);
            }
        }
        for attribute in &self.attributes {
            let Some((name, value)) = attribute.split_once('=') else {
                bail!("--attr expects NAME=VALUE, got {attribute:?}");
            };
            element = element.with_attribute(name.trim(), value);
        }
        for hook in HookKind::ALL {
            element = element.with_attribute(hook.attribute(), &handler_name(hook));
        }
        Ok(element)
    }
}

fn handler_name(hook: HookKind) -> String {
    format!("cli.{}", hook.attribute().trim_start_matches("fetch-"))
}

fn hook_logger() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for hook in HookKind::ALL {
        registry.register(handler_name(hook), move |event: &HookEvent| -> HandlerResult {
            info!("{hook} fired for activation {}", event.activation_id);
            Ok(())
        });
    }
    registry
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = cli.dispatcher_config()?;

    let document = Arc::new(MemoryDocument::new(cli.base.clone()));
    let target = document.append(MemoryElement::new("div").with_attribute("id", "out"));
    let button = document.append(cli.element()?);

    let (channel, mut events) = ActivationEventChannel::new();
    let registrar = Registrar::new(document.clone(), config.clone()).with_events(channel.clone());
    info!("{} element(s) registered", registrar.refresh());

    let transport = HttpTransport::new().context("building the http client")?;
    let dispatcher = Dispatcher::builder(document.clone(), Arc::new(transport))
        .handlers(hook_logger())
        .config(config.clone())
        .events(channel)
        .build()?;

    let click = UiEvent::click(button);
    let Some(report) = dispatcher.handle_event(&click).await else {
        bail!("element did not qualify for activation");
    };

    if cli.events {
        while let Ok(event) = events.try_recv() {
            eprintln!("{} {:?}", event.timestamp.to_rfc3339(), event.kind);
        }
    }
    for diagnostic in &report.diagnostics {
        eprintln!("diagnostic: {diagnostic}");
    }
    let trace: Vec<String> = report.trace.iter().map(ToString::to_string).collect();
    eprintln!("trace: {}", trace.join(" -> "));

    let rendered = if cli.format.as_deref().is_some_and(|format| !format.eq_ignore_ascii_case("html")) {
        target.text_content()
    } else {
        target.inner_markup()
    };
    println!("{rendered}");

    match report.outcome {
        ActivationOutcome::Succeeded(_) => Ok(()),
        ActivationOutcome::Skipped => bail!("element declares no url"),
        ActivationOutcome::Rejected { status, .. } => bail!("server answered {status}"),
        ActivationOutcome::BodyBuildFailed(error) => Err(error.into()),
        ActivationOutcome::Failed(error) => Err(error.into()),
        ActivationOutcome::TimedOut(error) => Err(error.into()),
        ActivationOutcome::ParseFailed(error) => Err(error.into()),
    }
}
