//! Names, namespaces and attributes shared between the tokenizer and the
//! tree builder.

use std::fmt;

use tendril::StrTendril;

/// An interned element or attribute name.
pub type LocalName = string_cache::DefaultAtom;

/// The namespaces the HTML parser can produce. Elements live in Html, Svg
/// or MathMl; the remaining three occur only on adjusted foreign attributes.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
    XLink,
    Xml,
    XmlNs,
}

impl Namespace {
    /// Prefix used by the html5lib tree-construction test format, e.g.
    /// `<svg g>` or `xlink href`.
    pub fn test_format_prefix(&self) -> Option<&'static str> {
        match self {
            Namespace::Html => None,
            Namespace::Svg => Some("svg"),
            Namespace::MathMl => Some("math"),
            Namespace::XLink => Some("xlink"),
            Namespace::Xml => Some("xml"),
            Namespace::XmlNs => Some("xmlns"),
        }
    }
}

/// A namespace-qualified name. The prefix is carried verbatim for adjusted
/// foreign attributes (`xlink:href` and friends) and is None everywhere
/// else.
#[derive(PartialEq, Eq, Clone, Hash, Debug)]
pub struct QualName {
    pub prefix: Option<&'static str>,
    pub ns: Namespace,
    pub local: LocalName,
}

impl QualName {
    pub fn new(prefix: Option<&'static str>, ns: Namespace, local: LocalName) -> QualName {
        QualName { prefix, ns, local }
    }

    pub fn html(local: &str) -> QualName {
        QualName {
            prefix: None,
            ns: Namespace::Html,
            local: LocalName::from(local),
        }
    }

    pub fn is_html(&self, local: &str) -> bool {
        self.ns == Namespace::Html && &*self.local == local
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix {
            Some(p) => write!(f, "{}:{}", p, self.local),
            None => self.local.fmt(f),
        }
    }
}

/// A single tag attribute.
#[derive(PartialEq, Eq, Clone, Hash, Debug)]
pub struct Attribute {
    pub name: QualName,
    pub value: StrTendril,
}

/// The document's quirks mode, as determined by the DOCTYPE.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum QuirksMode {
    Quirks,
    LimitedQuirks,
    NoQuirks,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn qual_name_display() {
        let plain = QualName::html("div");
        assert_eq!(plain.to_string(), "div");
        assert!(plain.is_html("div"));

        let prefixed = QualName::new(Some("xlink"), Namespace::XLink, LocalName::from("href"));
        assert_eq!(prefixed.to_string(), "xlink:href");
        assert!(!prefixed.is_html("href"));
    }
}
