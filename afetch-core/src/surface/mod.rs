use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;
use crate::types::FormData;

pub mod event;

pub use event::{UiEvent, UiEventKind};

pub type ElementRef = Arc<dyn Element>;

/// Where adjacent content goes relative to the existing children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacentPosition {
    AfterBegin,
    BeforeEnd,
}

/// The slice of a DOM element the dispatcher reads and mutates.
///
/// Implementations use interior mutability: handles are shared between the
/// dispatcher, the registrar and hook handlers.
pub trait Element: Send + Sync {
    /// Lower-case tag name
    fn tag_name(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    fn set_attribute(&self, name: &str, value: &str);

    fn remove_attribute(&self, name: &str);

    fn parent(&self) -> Option<ElementRef>;

    fn is_disabled(&self) -> bool;

    fn set_disabled(&self, disabled: bool);

    fn set_displayed(&self, displayed: bool);

    fn set_inner_markup(&self, markup: &str);

    fn set_text_content(&self, text: &str);

    fn insert_markup(&self, position: AdjacentPosition, markup: &str);

    fn insert_text(&self, position: AdjacentPosition, text: &str);

    fn inner_markup(&self) -> String;

    fn text_content(&self) -> String;
}

impl fmt::Debug for dyn Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Element");
        out.field("tag", &self.tag_name());
        if let Some(id) = self.attribute("id") {
            out.field("id", &id);
        }
        out.finish()
    }
}

/// Identity comparison of two element handles.
pub fn same_element(a: &ElementRef, b: &ElementRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Elements added to the document since the previous record.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub added: Vec<ElementRef>,
}

pub trait Document: Send + Sync {
    /// Base against which relative `fetch` URLs resolve.
    fn base_url(&self) -> Url;

    fn element_by_id(&self, id: &str) -> Option<ElementRef>;

    fn query_selector_all(&self, selector: &str) -> Vec<ElementRef>;

    fn query_selector(&self, selector: &str) -> Option<ElementRef> {
        self.query_selector_all(selector).into_iter().next()
    }

    /// `root` and everything below it in document order; the whole document
    /// when `root` is `None`.
    fn subtree(&self, root: Option<&ElementRef>) -> Vec<ElementRef>;

    /// Successful controls of the form with the given id. `None` when no
    /// such form exists.
    fn form_data(&self, form_id: &str) -> Option<FormData>;

    /// Stream of structural changes, or `None` if the document cannot be
    /// observed.
    fn observe(&self) -> Option<mpsc::UnboundedReceiver<MutationRecord>> {
        None
    }
}

pub const ACTIVATION_TAGS: [&str; 2] = ["a", "button"];

/// True for `a[fetch]` and `button[fetch]`.
pub fn is_activatable(element: &dyn Element) -> bool {
    ACTIVATION_TAGS.contains(&element.tag_name().as_str()) && element.has_attribute(crate::attribute::names::URL)
}

/// Closest activatable element starting from `element` itself.
pub fn closest_activatable(element: &ElementRef) -> Option<ElementRef> {
    let mut current = Some(element.clone());
    while let Some(candidate) = current {
        if is_activatable(candidate.as_ref()) {
            return Some(candidate);
        }
        current = candidate.parent();
    }
    None
}
