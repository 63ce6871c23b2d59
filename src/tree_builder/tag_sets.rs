//! Named sets of tag names, and the scope predicates built on them.

use phf::phf_set;

use crate::interface::Namespace;
use crate::interface::Namespace::*;

/// Declare an HTML-namespace tag set as a predicate function.
macro_rules! declare_tag_set (
    (pub $name:ident = $($tag:tt)|+) => {
        pub(crate) fn $name(ns: Namespace, name: &str) -> bool {
            ns == crate::interface::Namespace::Html && matches!(name, $($tag)|+)
        }
    };
    ($name:ident = $($tag:tt)|+) => {
        fn $name(ns: Namespace, name: &str) -> bool {
            ns == crate::interface::Namespace::Html && matches!(name, $($tag)|+)
        }
    };
);

pub(crate) use declare_tag_set;

fn mathml_boundary(ns: Namespace, name: &str) -> bool {
    ns == MathMl && matches!(name, "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml")
}

fn svg_boundary(ns: Namespace, name: &str) -> bool {
    ns == Svg && matches!(name, "foreignObject" | "desc" | "title")
}

declare_tag_set!(html_default_scope =
    "applet" | "caption" | "html" | "table" | "td" | "th" | "marquee" | "object" | "template");

/// The default "has an element in scope" boundary set.
pub(crate) fn default_scope(ns: Namespace, name: &str) -> bool {
    html_default_scope(ns, name) || mathml_boundary(ns, name) || svg_boundary(ns, name)
}

pub(crate) fn button_scope(ns: Namespace, name: &str) -> bool {
    default_scope(ns, name) || (ns == Html && name == "button")
}

pub(crate) fn list_item_scope(ns: Namespace, name: &str) -> bool {
    default_scope(ns, name) || (ns == Html && matches!(name, "ol" | "ul"))
}

declare_tag_set!(pub table_scope = "html" | "table" | "template");

/// Select scope is inverted: everything except optgroup/option is a
/// boundary.
pub(crate) fn select_scope(ns: Namespace, name: &str) -> bool {
    !(ns == Html && matches!(name, "optgroup" | "option"))
}

declare_tag_set!(pub cursory_implied_end =
    "dd" | "dt" | "li" | "option" | "optgroup" | "p" | "rb" | "rp" | "rt" | "rtc");

pub(crate) fn thorough_implied_end(ns: Namespace, name: &str) -> bool {
    cursory_implied_end(ns, name)
        || (ns == Html
            && matches!(
                name,
                "caption" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
            ))
}

declare_tag_set!(pub heading_tag = "h1" | "h2" | "h3" | "h4" | "h5" | "h6");

declare_tag_set!(pub td_th = "td" | "th");

declare_tag_set!(pub table_body_context = "tbody" | "tfoot" | "thead" | "template" | "html");

declare_tag_set!(pub table_row_context = "tr" | "template" | "html");

declare_tag_set!(pub foster_target = "table" | "tbody" | "tfoot" | "thead" | "tr");

declare_tag_set!(pub table_outer = "table" | "tbody" | "tfoot" | "thead" | "tr");

declare_tag_set!(pub body_end_ok =
    "dd" | "dt" | "li" | "optgroup" | "option" | "p" | "rb" | "rp" | "rt" | "rtc" | "tbody"
    | "td" | "tfoot" | "th" | "thead" | "tr" | "body" | "html");

static SPECIAL_HTML: phf::Set<&'static str> = phf_set! {
    "address", "applet", "area", "article", "aside", "base", "basefont", "bgsound",
    "blockquote", "body", "br", "button", "caption", "center", "col", "colgroup", "dd",
    "details", "dir", "div", "dl", "dt", "embed", "fieldset", "figcaption", "figure",
    "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head",
    "header", "hgroup", "hr", "html", "iframe", "img", "input", "keygen", "li", "link",
    "listing", "main", "marquee", "menu", "meta", "nav", "noembed", "noframes", "noscript",
    "object", "ol", "p", "param", "plaintext", "pre", "script", "search", "section",
    "select", "source", "style", "summary", "table", "tbody", "td", "template", "textarea",
    "tfoot", "th", "thead", "title", "tr", "track", "ul", "wbr", "xmp",
};

/// The "special" element category, i.e. the possible furthest blocks of the
/// adoption agency.
pub(crate) fn special_tag(ns: Namespace, name: &str) -> bool {
    match ns {
        Html => SPECIAL_HTML.contains(name),
        _ => mathml_boundary(ns, name) || svg_boundary(ns, name),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scope_sets() {
        assert!(default_scope(Html, "table"));
        assert!(default_scope(Svg, "foreignObject"));
        assert!(default_scope(MathMl, "mi"));
        assert!(!default_scope(Html, "button"));
        assert!(button_scope(Html, "button"));
        assert!(list_item_scope(Html, "ul"));
        assert!(!table_scope(Html, "td"));
        assert!(select_scope(Html, "div"));
        assert!(!select_scope(Html, "option"));
    }

    #[test]
    fn special_category() {
        assert!(special_tag(Html, "p"));
        assert!(special_tag(Html, "address"));
        assert!(special_tag(Svg, "desc"));
        assert!(!special_tag(Html, "b"));
        assert!(!special_tag(Svg, "path"));
    }
}
