//! Minimal element tree over `xml-rs` events.
//!
//! Market documents are small and shallow, so they are parsed into an owned
//! tree and queried by local name, ignoring namespaces and case.

use xml::reader::{EventReader, XmlEvent};

use entsoe_types::{EntsoeError, Result};

/// An XML element with its local name, text content and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// Parses a document and returns its root element.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::Decode`] if the document is malformed or empty.
    pub fn parse(document: &[u8]) -> Result<Self> {
        let mut stack: Vec<Self> = Vec::new();
        let mut root = None;

        for event in EventReader::new(document) {
            match event.map_err(|e| EntsoeError::Decode(format!("malformed XML: {e}")))? {
                XmlEvent::StartElement { name, .. } => stack.push(Self {
                    name: name.local_name,
                    ..Self::default()
                }),
                XmlEvent::EndElement { .. } => {
                    let Some(done) = stack.pop() else {
                        return Err(EntsoeError::Decode("unbalanced XML".to_string()));
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => root = Some(done),
                    }
                }
                XmlEvent::Characters(data) | XmlEvent::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&data);
                    }
                }
                _ => {}
            }
        }

        root.ok_or_else(|| EntsoeError::Decode("empty XML document".to_string()))
    }

    /// Returns the local (namespace-free) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the local name matches, ignoring case.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Returns the trimmed text content.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Returns the direct children.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Returns the first direct child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.is(name))
    }

    /// Returns the first descendant with the given name, depth-first.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        self.children
            .iter()
            .find_map(|c| if c.is(name) { Some(c) } else { c.find(name) })
    }

    /// Returns every descendant with the given name, in document order.
    #[must_use]
    pub fn find_all(&self, name: &str) -> Vec<&Self> {
        let mut out = Vec::new();
        self.collect(name, &mut out);
        out
    }

    fn collect<'a>(&'a self, name: &str, out: &mut Vec<&'a Self>) {
        for child in &self.children {
            if child.is(name) {
                out.push(child);
            }
            child.collect(name, out);
        }
    }

    /// Returns the trimmed text of the first descendant with the given name.
    #[must_use]
    pub fn find_text(&self, name: &str) -> Option<&str> {
        self.find(name).map(Self::text)
    }

    /// Returns the text of the first descendant at a slash-separated path of
    /// direct children, e.g. `"docStatus/value"`.
    #[must_use]
    pub fn path_text(&self, path: &str) -> Option<&str> {
        path.split('/')
            .try_fold(self, |node, segment| node.child(segment))
            .map(Self::text)
    }
}
