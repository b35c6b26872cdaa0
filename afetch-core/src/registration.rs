use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use log::{debug, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use crate::attribute::{self, names};
use crate::config::DispatcherConfig;
use crate::event::{ActivationEventChannel, DispatchEventKind};
use crate::surface::{is_activatable, Document, ElementRef, MutationRecord};

/// Marks qualifying elements as activatable and keeps doing so for
/// elements inserted later.
pub struct Registrar {
    document: Arc<dyn Document>,
    config: DispatcherConfig,
    events: Option<ActivationEventChannel>,
    initialized: AtomicBool,
}

impl Registrar {
    pub fn new(document: Arc<dyn Document>, config: DispatcherConfig) -> Self {
        Self {
            document,
            config,
            events: None,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn with_events(mut self, channel: ActivationEventChannel) -> Self {
        self.events = Some(channel);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Upgrades the whole document once and starts the mutation watcher,
    /// unless auto observation is disabled or the document cannot be
    /// observed. Later calls do nothing.
    pub fn init(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("registrar already initialized");
            return None;
        }

        let upgraded = self.refresh();
        info!("registrar initialized, {upgraded} element(s) upgraded");

        if self.config.disable_auto_observe {
            return None;
        }
        let records = self.document.observe()?;
        Some(self.clone().spawn_watcher(records))
    }

    /// Re-scans the document; already marked elements are left alone.
    pub fn refresh(&self) -> usize {
        self.upgrade(None)
    }

    pub fn upgrade(&self, root: Option<&ElementRef>) -> usize {
        let marker = self.config.marker_attribute.as_str();
        let mut upgraded = 0;
        for element in self.document.subtree(root) {
            if !is_activatable(element.as_ref()) || element.has_attribute(marker) {
                continue;
            }
            element.set_attribute(marker, "1");

            if self.config.upgrade_anchors && element.tag_name() == "a" {
                for (name, value) in [("role", "button"), ("tabindex", "0"), ("href", "#")] {
                    if !element.has_attribute(name) {
                        element.set_attribute(name, value);
                    }
                }
            }
            if let Some(selector) = attribute::non_empty(element.as_ref(), names::SPINNER) {
                for spinner in self.document.query_selector_all(&selector) {
                    spinner.set_displayed(false);
                }
            }

            if let Some(channel) = &self.events {
                channel.emit_with_context(
                    None,
                    DispatchEventKind::ElementRegistered { tag: element.tag_name() },
                    HashMap::new(),
                );
            }
            upgraded += 1;
        }
        upgraded
    }

    pub fn spawn_watcher(self: Arc<Self>, mut records: mpsc::UnboundedReceiver<MutationRecord>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(record) = records.recv().await {
                for node in &record.added {
                    let upgraded = self.upgrade(Some(node));
                    if upgraded > 0 {
                        debug!("watcher upgraded {upgraded} inserted element(s)");
                    }
                }
            }
            debug!("mutation stream closed, watcher stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use crate::memory::{MemoryDocument, MemoryElement};
    use crate::surface::Element;

    fn document() -> Arc<MemoryDocument> {
        Arc::new(MemoryDocument::new(Url::parse("http://localhost/").unwrap()))
    }

    #[test]
    fn anchors_get_button_semantics_and_spinners_are_hidden() {
        let document = document();
        let spinner = document.append(MemoryElement::new("span").with_attribute("class", "spin"));
        let anchor = document.append(
            MemoryElement::new("a")
                .with_attribute("fetch", "/x")
                .with_attribute("href", "/keep")
                .with_attribute("fetch-spinner", ".spin"),
        );
        let plain = document.append(MemoryElement::new("a").with_attribute("href", "/plain"));

        let registrar = Registrar::new(document.clone(), DispatcherConfig::default());
        assert_eq!(registrar.refresh(), 1);

        assert_eq!(anchor.attribute("data-afetch").as_deref(), Some("1"));
        assert_eq!(anchor.attribute("role").as_deref(), Some("button"));
        assert_eq!(anchor.attribute("tabindex").as_deref(), Some("0"));
        assert_eq!(anchor.attribute("href").as_deref(), Some("/keep"));
        assert!(!spinner.is_displayed());
        assert!(!plain.has_attribute("data-afetch"));
    }

    #[test]
    fn anchor_upgrade_can_be_turned_off_without_skipping_registration() {
        let document = document();
        let spinner = document.append(MemoryElement::new("span").with_attribute("id", "spin"));
        let anchor = document.append(
            MemoryElement::new("a")
                .with_attribute("fetch", "/x")
                .with_attribute("fetch-spinner", "#spin"),
        );
        let config = DispatcherConfig {
            upgrade_anchors: false,
            ..DispatcherConfig::default()
        };

        assert_eq!(Registrar::new(document.clone(), config).refresh(), 1);
        assert_eq!(anchor.attribute("data-afetch").as_deref(), Some("1"));
        assert!(!anchor.has_attribute("role"));
        assert!(!anchor.has_attribute("tabindex"));
        assert!(!anchor.has_attribute("href"));
        assert!(!spinner.is_displayed());
    }

    #[test]
    fn refresh_is_idempotent() {
        let document = document();
        document.append(MemoryElement::new("button").with_attribute("fetch", "/x"));
        let registrar = Registrar::new(document.clone(), DispatcherConfig::default());

        assert_eq!(registrar.refresh(), 1);
        assert_eq!(registrar.refresh(), 0);
    }

    #[tokio::test]
    async fn init_runs_once() {
        let document = document();
        let registrar = Arc::new(Registrar::new(
            document.clone(),
            DispatcherConfig { disable_auto_observe: true, ..DispatcherConfig::default() },
        ));

        assert!(registrar.init().is_none());
        assert!(registrar.is_initialized());
        assert!(registrar.init().is_none());
    }

    #[tokio::test]
    async fn watcher_upgrades_inserted_elements() {
        let document = document();
        let registrar = Arc::new(Registrar::new(document.clone(), DispatcherConfig::default()));
        let watcher = registrar.init().expect("memory documents are observable");

        let section = document.append(MemoryElement::new("section"));
        let button = document.append_child(&section, MemoryElement::new("button").with_attribute("fetch", "/late"));

        for _ in 0..10 {
            if button.has_attribute("data-afetch") {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(button.has_attribute("data-afetch"));
        watcher.abort();
    }
}
