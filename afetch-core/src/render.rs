use crate::surface::{AdjacentPosition, Document, Element};
use crate::types::{Placement, RenderDirective, RenderFormat};

/// Writes `content` into `target`. Markup is inserted as-is, unsanitized.
pub fn render(target: &dyn Element, content: &str, directive: RenderDirective) {
    match (directive.placement, directive.format) {
        (Placement::Replace, RenderFormat::Markup) => target.set_inner_markup(content),
        (Placement::Replace, RenderFormat::PlainText) => target.set_text_content(content),
        (Placement::Append, RenderFormat::Markup) => target.insert_markup(AdjacentPosition::BeforeEnd, content),
        (Placement::Append, RenderFormat::PlainText) => target.insert_text(AdjacentPosition::BeforeEnd, content),
        (Placement::Prepend, RenderFormat::Markup) => target.insert_markup(AdjacentPosition::AfterBegin, content),
        (Placement::Prepend, RenderFormat::PlainText) => target.insert_text(AdjacentPosition::AfterBegin, content),
    }
}

/// Resolves `selector` and renders into the first match; no match is a no-op.
pub fn render_to_selector(document: &dyn Document, selector: Option<&str>, content: &str, directive: RenderDirective) -> bool {
    let Some(selector) = selector else {
        return false;
    };
    match document.query_selector(selector) {
        Some(target) => {
            render(target.as_ref(), content, directive);
            true
        }
        None => {
            log::debug!("render target '{selector}' not found");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use crate::memory::{MemoryDocument, MemoryElement};

    fn directive(format: RenderFormat, placement: Placement) -> RenderDirective {
        RenderDirective { format, placement }
    }

    #[test]
    fn append_and_prepend_keep_existing_content() {
        let target = MemoryElement::new("div");
        target.set_text_content("middle");

        render(&target, "<i>end</i>", directive(RenderFormat::Markup, Placement::Append));
        render(&target, "<start>", directive(RenderFormat::PlainText, Placement::Prepend));

        assert_eq!(target.inner_markup(), "&lt;start&gt;middle<i>end</i>");
        assert_eq!(target.text_content(), "<start>middleend");
    }

    #[test]
    fn replace_clears_previous_content() {
        let target = MemoryElement::new("div");
        target.set_inner_markup("<p>old</p>");
        render(&target, "new", directive(RenderFormat::PlainText, Placement::Replace));
        assert_eq!(target.text_content(), "new");
    }

    #[test]
    fn missing_target_is_a_no_op() {
        let document = MemoryDocument::new(Url::parse("http://localhost/").unwrap());
        assert!(!render_to_selector(&document, Some("#nowhere"), "x", RenderDirective::default()));
        assert!(!render_to_selector(&document, None, "x", RenderDirective::default()));
    }
}
