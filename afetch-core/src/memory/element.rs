use std::sync::{Arc, PoisonError, RwLock, Weak};
use lazy_static::lazy_static;
use regex::Regex;
use smart_default::SmartDefault;
use crate::surface::{AdjacentPosition, Element, ElementRef};
use crate::types::Blob;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
enum ContentNode {
    Markup(String),
    Text(String),
}

#[derive(Debug, SmartDefault)]
struct ElementState {
    attributes: Vec<(String, String)>,
    content: Vec<ContentNode>,
    files: Vec<Blob>,
    #[default = true]
    displayed: bool,
}

/// Headless element. Rendered content is kept apart from structural
/// children, which only the owning document appends.
#[derive(Debug)]
pub struct MemoryElement {
    tag: String,
    state: RwLock<ElementState>,
    parent: RwLock<Weak<MemoryElement>>,
    children: RwLock<Vec<Arc<MemoryElement>>>,
}

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            state: RwLock::new(ElementState::default()),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
        }
    }

    pub fn with_attribute(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Selected files of an `input[type=file]`.
    pub fn with_file(self, blob: Blob) -> Self {
        self.write().files.push(blob);
        self
    }

    pub fn files(&self) -> Vec<Blob> {
        self.read().files.clone()
    }

    pub fn is_displayed(&self) -> bool {
        self.read().displayed
    }

    pub fn children(&self) -> Vec<Arc<MemoryElement>> {
        self.children.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn adopt(self: &Arc<Self>, child: &Arc<MemoryElement>) {
        *child.parent.write().unwrap_or_else(PoisonError::into_inner) = Arc::downgrade(self);
        self.children.write().unwrap_or_else(PoisonError::into_inner).push(child.clone());
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ElementState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ElementState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, position: AdjacentPosition, node: ContentNode) {
        let mut state = self.write();
        match position {
            AdjacentPosition::AfterBegin => state.content.insert(0, node),
            AdjacentPosition::BeforeEnd => state.content.push(node),
        }
    }
}

impl Element for MemoryElement {
    fn tag_name(&self) -> String {
        self.tag.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.read()
            .attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone())
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let mut state = self.write();
        match state.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => state.attributes.push((name, value.to_string())),
        }
    }

    fn remove_attribute(&self, name: &str) {
        let name = name.to_ascii_lowercase();
        self.write().attributes.retain(|(key, _)| *key != name);
    }

    fn parent(&self) -> Option<ElementRef> {
        let parent: ElementRef = self.parent.read().unwrap_or_else(PoisonError::into_inner).upgrade()?;
        Some(parent)
    }

    fn is_disabled(&self) -> bool {
        self.has_attribute("disabled")
    }

    fn set_disabled(&self, disabled: bool) {
        if disabled {
            self.set_attribute("disabled", "");
        } else {
            self.remove_attribute("disabled");
        }
    }

    fn set_displayed(&self, displayed: bool) {
        self.write().displayed = displayed;
    }

    fn set_inner_markup(&self, markup: &str) {
        self.write().content = vec![ContentNode::Markup(markup.to_string())];
    }

    fn set_text_content(&self, text: &str) {
        self.write().content = vec![ContentNode::Text(text.to_string())];
    }

    fn insert_markup(&self, position: AdjacentPosition, markup: &str) {
        self.insert(position, ContentNode::Markup(markup.to_string()));
    }

    fn insert_text(&self, position: AdjacentPosition, text: &str) {
        self.insert(position, ContentNode::Text(text.to_string()));
    }

    fn inner_markup(&self) -> String {
        self.read()
            .content
            .iter()
            .map(|node| match node {
                ContentNode::Markup(markup) => markup.clone(),
                ContentNode::Text(text) => escape_markup(text),
            })
            .collect()
    }

    fn text_content(&self) -> String {
        self.read()
            .content
            .iter()
            .map(|node| match node {
                ContentNode::Markup(markup) => unescape_markup(&TAG.replace_all(markup, "")),
                ContentNode::Text(text) => text.clone(),
            })
            .collect()
    }
}

pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape_markup(markup: &str) -> String {
    markup
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
