//! Namespace-agnostic XML element tree.
//!
//! Market documents are small (a few hundred kilobytes at most), so the whole
//! document is read into an owned [`XmlElement`] tree with namespace prefixes
//! stripped from element and attribute names. Lookups then work on local names
//! only.

use std::borrow::Cow;

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

/// One element with its attributes, concatenated text content and children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

/// Parse a complete document and return its root element.
///
/// Returns `Ok(None)` when the input holds no element at all.
pub fn parse_document(xml: &str) -> Result<Option<XmlElement>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => stack.push(element_from_start(e)?),
            Event::Empty(ref e) => {
                let element = element_from_start(e)?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(t) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(quick_xml::Error::UnexpectedEof(format!(
            "element <{}> is not closed",
            open.name
        )));
    }

    Ok(root)
}

fn element_from_start(start: &BytesStart) -> Result<XmlElement, quick_xml::Error> {
    let name = local_name(start.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes().with_checks(false) {
        let attr = attr?;
        let key = local_name(attr.key.local_name().as_ref()).into_owned();
        // Namespace declarations are not data.
        if key == "xmlns" || attr.key.as_ref().starts_with(b"xmlns:") {
            continue;
        }
        attributes.push((key, attr.unescape_value()?.into_owned()));
    }

    Ok(XmlElement {
        name,
        attributes,
        ..Default::default()
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn local_name(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

impl XmlElement {
    /// Trimmed text content, `None` when empty.
    pub fn text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Value of the attribute with the given local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child whose name equals `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All direct children whose name equals `name`, in document order.
    ///
    /// Always a sequence, whether the document holds zero, one or many.
    pub fn children_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Resolve a dotted path such as `production_RegisteredResource.location.name`.
    ///
    /// ENTSO-E schemas flatten some nesting into dotted element names
    /// (`<unavailability_Time_Period.timeInterval>`), and the same logical path may
    /// appear nested in other producers' files. At every step, any run of the
    /// remaining segments may be matched as one dotted element name; the longest
    /// run is tried first.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Some(self);
        }
        self.find_segments(&segments)
    }

    fn find_segments(&self, segments: &[&str]) -> Option<&XmlElement> {
        if segments.is_empty() {
            return Some(self);
        }
        for take in (1..=segments.len()).rev() {
            let name = segments[..take].join(".");
            for child in self.children_named(&name) {
                if let Some(found) = child.find_segments(&segments[take..]) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Every element matching the dotted path, in document order.
    pub fn find_all(&self, path: &str) -> Vec<&XmlElement> {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        let mut found = Vec::new();
        self.collect_segments(&segments, &mut found);
        found
    }

    fn collect_segments<'a>(&'a self, segments: &[&str], found: &mut Vec<&'a XmlElement>) {
        if segments.is_empty() {
            found.push(self);
            return;
        }
        for take in (1..=segments.len()).rev() {
            let name = segments[..take].join(".");
            for child in self.children_named(&name) {
                child.collect_segments(&segments[take..], found);
            }
        }
    }

    /// Trimmed text at the dotted path, `None` when missing or empty.
    pub fn text_at(&self, path: &str) -> Option<&str> {
        self.find(path).and_then(XmlElement::text)
    }
}
