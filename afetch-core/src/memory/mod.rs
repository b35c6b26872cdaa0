//! Headless document, transport and script host used by embedders without a
//! browser, the command line tool and the test suites.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use url::Url;
use crate::surface::{same_element, Document, Element, ElementRef, MutationRecord};
use crate::types::FormData;

pub mod element;
pub mod script;
pub mod selector;
pub mod transport;

pub use element::MemoryElement;
pub use script::RecordingScriptHost;
pub use selector::Selector;
pub use transport::ScriptedTransport;

pub struct MemoryDocument {
    base_url: Url,
    root: Arc<MemoryElement>,
    body: Arc<MemoryElement>,
    observers: Mutex<Vec<mpsc::UnboundedSender<MutationRecord>>>,
}

impl MemoryDocument {
    pub fn new(base_url: Url) -> Self {
        let root = Arc::new(MemoryElement::new("html"));
        let body = Arc::new(MemoryElement::new("body"));
        root.adopt(&body);
        Self {
            base_url,
            root,
            body,
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn body(&self) -> Arc<MemoryElement> {
        self.body.clone()
    }

    /// Appends to `<body>`.
    pub fn append(&self, child: MemoryElement) -> Arc<MemoryElement> {
        let body = self.body.clone();
        self.append_child(&body, child)
    }

    /// Attaches `child` under `parent` and notifies observers.
    pub fn append_child(&self, parent: &Arc<MemoryElement>, child: MemoryElement) -> Arc<MemoryElement> {
        let child = Arc::new(child);
        parent.adopt(&child);

        let added: ElementRef = child.clone();
        let record = MutationRecord { added: vec![added] };
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|observer| observer.send(record.clone()).is_ok());
        child
    }

    fn walk(&self, from: &Arc<MemoryElement>) -> Vec<Arc<MemoryElement>> {
        let mut out = Vec::new();
        let mut stack = vec![from.clone()];
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    fn find(&self, element: &ElementRef) -> Option<Arc<MemoryElement>> {
        self.walk(&self.root).into_iter().find(|node| {
            let candidate: ElementRef = node.clone();
            same_element(&candidate, element)
        })
    }

    fn collect_controls(form: &Arc<MemoryElement>, data: &mut FormData, walk: Vec<Arc<MemoryElement>>) {
        for control in walk.into_iter().filter(|node| !Arc::ptr_eq(node, form)) {
            let Some(name) = control.attribute("name").filter(|name| !name.is_empty()) else {
                continue;
            };
            if control.is_disabled() {
                continue;
            }
            match control.tag_name().as_str() {
                "input" => {
                    let kind = control.attribute("type").unwrap_or_default().to_ascii_lowercase();
                    match kind.as_str() {
                        "checkbox" | "radio" => {
                            if control.has_attribute("checked") {
                                data.append(name, control.attribute("value").unwrap_or_else(|| "on".to_string()));
                            }
                        }
                        "file" => {
                            for file in control.files() {
                                data.append_file(name.clone(), file);
                            }
                        }
                        "submit" | "button" | "reset" | "image" => {}
                        _ => data.append(name, control.attribute("value").unwrap_or_default()),
                    }
                }
                "select" => data.append(name, control.attribute("value").unwrap_or_default()),
                "textarea" => data.append(
                    name,
                    control.attribute("value").unwrap_or_else(|| control.text_content()),
                ),
                _ => {}
            }
        }
    }
}

impl Document for MemoryDocument {
    fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        let found: ElementRef = self
            .walk(&self.root)
            .into_iter()
            .find(|node| node.attribute("id").as_deref() == Some(id))?;
        Some(found)
    }

    fn query_selector_all(&self, selector: &str) -> Vec<ElementRef> {
        let Some(selector) = Selector::parse(selector) else {
            log::warn!("unsupported selector '{selector}'");
            return Vec::new();
        };
        self.walk(&self.root)
            .into_iter()
            .filter(|node| selector.matches(node.as_ref()))
            .map(|node| node as ElementRef)
            .collect()
    }

    fn subtree(&self, root: Option<&ElementRef>) -> Vec<ElementRef> {
        let start = match root {
            None => self.root.clone(),
            Some(element) => match self.find(element) {
                Some(node) => node,
                None => return vec![element.clone()],
            },
        };
        self.walk(&start).into_iter().map(|node| node as ElementRef).collect()
    }

    fn form_data(&self, form_id: &str) -> Option<FormData> {
        let form = self
            .walk(&self.root)
            .into_iter()
            .find(|node| node.tag_name() == "form" && node.attribute("id").as_deref() == Some(form_id))?;
        let mut data = FormData::new();
        let controls = self.walk(&form);
        Self::collect_controls(&form, &mut data, controls);
        Some(data)
    }

    fn observe(&self) -> Option<mpsc::UnboundedReceiver<MutationRecord>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.observers.lock().unwrap_or_else(PoisonError::into_inner).push(sender);
        Some(receiver)
    }
}
