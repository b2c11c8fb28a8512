//! Minimal namespace-aware XML element tree.
//!
//! CAP and RSS payloads are small, so they are read into an owned tree of
//! [`XmlElement`]s with `quick-xml`'s namespace resolver and then walked by
//! local name and namespace URI.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::FeedError;

/// An XML element with its resolved namespace, text content and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Local name (without prefix).
    pub name: String,
    /// Namespace URI, if the element is bound to one.
    pub namespace: Option<String>,
    /// Concatenated text and CDATA content directly inside this element.
    pub text: String,
    /// Child elements in document order.
    pub children: Vec<Self>,
}

impl XmlElement {
    /// Whether this element has local name `name` in namespace `ns`.
    /// `ns = None` matches any namespace.
    #[must_use]
    pub fn is(&self, ns: Option<&str>, name: &str) -> bool {
        self.name == name && ns.is_none_or(|ns| self.namespace.as_deref() == Some(ns))
    }

    /// Child elements matching `ns` / `name`.
    pub fn children_named<'a>(
        &'a self,
        ns: Option<&'a str>,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |child| child.is(ns, name))
    }

    /// First child matching `ns` / `name`.
    #[must_use]
    pub fn child(&self, ns: Option<&str>, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.is(ns, name))
    }

    /// Trimmed text of the first matching child, if non-empty.
    #[must_use]
    pub fn child_text(&self, ns: Option<&str>, name: &str) -> Option<String> {
        self.child(ns, name).and_then(Self::trimmed_text)
    }

    /// Trimmed text of this element, if non-empty.
    #[must_use]
    pub fn trimmed_text(&self) -> Option<String> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// All descendants (depth-first, document order) matching `ns` /
    /// `name`. Does not include `self`.
    #[must_use]
    pub fn descendants_named(&self, ns: Option<&str>, name: &str) -> Vec<&Self> {
        let mut found = Vec::new();
        let mut stack: Vec<&Self> = self.children.iter().rev().collect();
        while let Some(element) = stack.pop() {
            if element.is(ns, name) {
                found.push(element);
            }
            stack.extend(element.children.iter().rev());
        }
        found
    }
}

/// Parses an XML document into its root element.
///
/// # Errors
///
/// Returns [`FeedError::Xml`] for syntax errors and [`FeedError::Format`]
/// when the document has no root element or unclosed elements.
pub fn parse_document(xml: &str) -> Result<XmlElement, FeedError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(start)) => {
                stack.push(XmlElement {
                    name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                    namespace: namespace_uri(&ns),
                    ..XmlElement::default()
                });
            }
            (ns, Event::Empty(empty)) => {
                let element = XmlElement {
                    name: String::from_utf8_lossy(empty.local_name().as_ref()).into_owned(),
                    namespace: namespace_uri(&ns),
                    ..XmlElement::default()
                };
                attach(&mut stack, &mut root, element)?;
            }
            (_, Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| FeedError::format("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            (_, Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    let decoded = text.unescape().map_or_else(
                        |_| String::from_utf8_lossy(&text).into_owned(),
                        std::borrow::Cow::into_owned,
                    );
                    current.text.push_str(&decoded);
                }
            }
            (_, Event::CData(cdata)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(FeedError::format(format!(
            "unclosed element <{}>",
            stack.last().map_or("", |e| e.name.as_str())
        )));
    }

    root.ok_or_else(|| FeedError::format("document has no root element"))
}

fn namespace_uri(ns: &ResolveResult<'_>) -> Option<String> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        _ => None,
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), FeedError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(FeedError::format("multiple root elements"));
    }
    *root = Some(element);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tree_with_namespaces() {
        let doc = parse_document(
            r#"<?xml version="1.0"?>
            <rss xmlns:georss="http://www.georss.org/georss">
              <channel>
                <item>
                  <title>Fire &amp; smoke</title>
                  <georss:point>-42.8 147.3</georss:point>
                  <description><![CDATA[Type: Bushfire<br />]]></description>
                  <empty/>
                </item>
              </channel>
            </rss>"#,
        )
        .unwrap();

        assert_eq!(doc.name, "rss");
        let items = doc.descendants_named(None, "item");
        assert_eq!(items.len(), 1);
        let item = items[0];
        assert_eq!(item.child_text(None, "title").as_deref(), Some("Fire & smoke"));
        assert_eq!(
            item.child_text(Some("http://www.georss.org/georss"), "point")
                .as_deref(),
            Some("-42.8 147.3")
        );
        assert!(item.child(Some("urn:other"), "point").is_none());
        assert_eq!(
            item.child_text(None, "description").as_deref(),
            Some("Type: Bushfire<br />")
        );
        assert!(item.child(None, "empty").is_some());
        assert!(item.child_text(None, "empty").is_none());
    }

    #[test]
    fn default_namespace_applies_to_children() {
        let doc = parse_document(
            r#"<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2"><identifier>A1</identifier></alert>"#,
        )
        .unwrap();
        assert!(doc.is(Some("urn:oasis:names:tc:emergency:cap:1.2"), "alert"));
        assert_eq!(
            doc.child_text(Some("urn:oasis:names:tc:emergency:cap:1.2"), "identifier")
                .as_deref(),
            Some("A1")
        );
    }

    #[test]
    fn malformed_documents_are_errors() {
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("<a>").is_err());
        assert!(parse_document("").is_err());
        assert!(parse_document("   ").is_err());
    }
}
