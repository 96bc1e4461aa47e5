// HTML query capability: id lookup and tag enumeration over a parsed page.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Owned snapshot of one element: tag, attributes and concatenated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomElement {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
}

impl DomElement {
    pub fn new(tag: impl Into<String>, attributes: Vec<(String, String)>, text: String) -> Self {
        Self {
            tag: tag.into(),
            attributes,
            text,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Read-only queries over a parsed page.
pub trait HtmlDocument {
    /// First `tag` element whose `id` attribute equals `id`.
    fn find_by_id(&self, tag: &str, id: &str) -> Option<DomElement>;
    /// All `tag` descendants of `scope`, in document order. `scope` must carry an id.
    fn find_all_by_tag(&self, scope: &DomElement, tag: &str) -> Vec<DomElement>;
}

pub trait HtmlParser: Send + Sync {
    fn parse(&self, html: &str) -> Box<dyn HtmlDocument>;
}

/// `scraper`-backed parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScraperParser;

impl HtmlParser for ScraperParser {
    fn parse(&self, html: &str) -> Box<dyn HtmlDocument> {
        Box::new(ScraperDocument(Html::parse_document(html)))
    }
}

struct ScraperDocument(Html);

impl ScraperDocument {
    fn element_by_id(&self, tag: &str, id: &str) -> Option<ElementRef<'_>> {
        // Attribute form, since ids like `download:link` are not valid `#` selectors.
        let css = format!("{}[id=\"{}\"]", tag, id.replace('\\', "\\\\").replace('"', "\\\""));
        let selector = match Selector::parse(&css) {
            Ok(selector) => selector,
            Err(e) => {
                debug!("invalid selector {}: {:?}", css, e);
                return None;
            }
        };
        let found = self.0.select(&selector).next();
        found
    }
}

impl HtmlDocument for ScraperDocument {
    fn find_by_id(&self, tag: &str, id: &str) -> Option<DomElement> {
        self.element_by_id(tag, id).map(snapshot)
    }

    fn find_all_by_tag(&self, scope: &DomElement, tag: &str) -> Vec<DomElement> {
        let Some(scope_el) = scope.id().and_then(|id| self.element_by_id(scope.tag(), id)) else {
            return Vec::new();
        };
        let Ok(selector) = Selector::parse(tag) else {
            return Vec::new();
        };
        let elements: Vec<DomElement> = scope_el.select(&selector).map(snapshot).collect();
        elements
    }
}

fn snapshot(el: ElementRef<'_>) -> DomElement {
    let value = el.value();
    let attributes = value
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    DomElement::new(value.name(), attributes, el.text().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <input name="outside" value="x">
          <form id="download" method="post">
            <input type="hidden" name="download" value="download">
            <input type="hidden" name="javax.faces.ViewState" value="-123:456">
            <a id="download:link_download_arquivo" href="javascript:void(0)">tese.pdf</a>
          </form>
        </body></html>
    "#;

    #[test]
    fn test_find_by_id_with_colon() {
        let doc = ScraperParser.parse(PAGE);
        let link = doc.find_by_id("a", "download:link_download_arquivo").unwrap();
        assert_eq!(link.tag(), "a");
        assert_eq!(link.text(), "tese.pdf");
        assert!(doc.find_by_id("form", "missing").is_none());
    }

    #[test]
    fn test_find_all_by_tag_is_scoped() {
        let doc = ScraperParser.parse(PAGE);
        let form = doc.find_by_id("form", "download").unwrap();
        let inputs = doc.find_all_by_tag(&form, "input");
        let names: Vec<_> = inputs.iter().filter_map(|i| i.attr("name")).collect();
        assert_eq!(names, vec!["download", "javax.faces.ViewState"]);
        assert_eq!(inputs[1].attr("value"), Some("-123:456"));
    }
}
