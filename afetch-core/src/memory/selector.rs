use lazy_static::lazy_static;
use regex::Regex;
use crate::surface::Element;

lazy_static! {
    static ref COMPOUND: Regex =
        Regex::new(r"^(\*|[A-Za-z][\w-]*)?((?:[#.][\w-]+|\[[^\]]+\])*)$").unwrap();
    static ref PART: Regex =
        Regex::new(r#"([#.])([\w-]+)|\[\s*([\w-]+)\s*(?:=\s*["']?([^"'\]]*)["']?\s*)?\]"#).unwrap();
}

/// Subset of CSS selectors: tag, `*`, `#id`, `.class`, `[attr]`, `[attr=v]`,
/// compounds of those and comma separated lists. No combinators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn parse(selector: &str) -> Option<Self> {
        let alternatives = selector
            .split(',')
            .map(|part| Compound::parse(part.trim()))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { alternatives })
    }

    pub fn matches(&self, element: &dyn Element) -> bool {
        self.alternatives.iter().any(|compound| compound.matches(element))
    }
}

impl Compound {
    fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        let captures = COMPOUND.captures(text)?;
        let mut compound = Compound {
            tag: captures
                .get(1)
                .map(|tag| tag.as_str().to_ascii_lowercase())
                .filter(|tag| tag != "*"),
            ..Compound::default()
        };

        let rest = captures.get(2).map(|rest| rest.as_str()).unwrap_or_default();
        for part in PART.captures_iter(rest) {
            match (part.get(1).map(|m| m.as_str()), part.get(2), part.get(3)) {
                (Some("#"), Some(id), _) => compound.id = Some(id.as_str().to_string()),
                (Some(_), Some(class), _) => compound.classes.push(class.as_str().to_string()),
                (None, _, Some(name)) => compound.attributes.push((
                    name.as_str().to_ascii_lowercase(),
                    part.get(4).map(|value| value.as_str().to_string()),
                )),
                _ => return None,
            }
        }
        Some(compound)
    }

    fn matches(&self, element: &dyn Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag_name() != *tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attribute("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class = element.attribute("class").unwrap_or_default();
            let present: Vec<&str> = class.split_whitespace().collect();
            if !self.classes.iter().all(|wanted| present.contains(&wanted.as_str())) {
                return false;
            }
        }
        self.attributes.iter().all(|(name, expected)| match (element.attribute(name), expected) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == *expected,
        })
    }
}
