//! Serialization to the html5lib tree-construction test format.
//!
//! Each node becomes a `| `-prefixed line indented two spaces per depth
//! level; attributes are sorted and printed one per line; foreign elements
//! and namespaced attributes carry their namespace as a word prefix
//! (`<svg g>`, `xlink href`); template contents nest under a `content`
//! line.

use crate::dom::{Document, NodeData, NodeId};

/// Render a document (or parsed fragment) in the test format.
pub fn to_test_format(doc: &Document) -> String {
    let mut buf = String::new();
    let root = doc.fragment.unwrap_or_else(|| doc.root());
    for &child in &doc[root].children {
        serialize(doc, &mut buf, 1, child);
    }
    buf
}

fn write_indent(buf: &mut String, indent: usize) {
    buf.push('|');
    for _ in 0..indent {
        buf.push(' ');
    }
}

fn serialize(doc: &Document, buf: &mut String, indent: usize, id: NodeId) {
    write_indent(buf, indent);

    let node = &doc[id];
    match &node.data {
        NodeData::Document | NodeData::Fragment => panic!("should not reach a root node"),

        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => {
            buf.push_str("<!DOCTYPE ");
            buf.push_str(name);
            if !public_id.is_empty() || !system_id.is_empty() {
                buf.push_str(&format!(" \"{public_id}\" \"{system_id}\""));
            }
            buf.push_str(">\n");
        },

        NodeData::Text { contents } => {
            buf.push('"');
            buf.push_str(contents);
            buf.push_str("\"\n");
        },

        NodeData::Comment { contents } => {
            buf.push_str("<!-- ");
            buf.push_str(contents);
            buf.push_str(" -->\n");
        },

        NodeData::Element { name, attrs, .. } => {
            buf.push('<');
            if let Some(prefix) = name.ns.test_format_prefix() {
                buf.push_str(prefix);
                buf.push(' ');
            }
            buf.push_str(&name.local);
            buf.push_str(">\n");

            // Sort lexicographically by the printed name, so "xlink href"
            // sorts as a whole.
            let printed = |attr: &crate::interface::Attribute| match attr.name.ns.test_format_prefix()
            {
                Some(prefix) => format!("{} {}", prefix, attr.name.local),
                None => attr.name.local.to_string(),
            };
            let mut attrs: Vec<_> = attrs.iter().collect();
            attrs.sort_by_key(|a| printed(a));

            for attr in attrs {
                write_indent(buf, indent + 2);
                if let Some(prefix) = attr.name.ns.test_format_prefix() {
                    buf.push_str(prefix);
                    buf.push(' ');
                }
                buf.push_str(&format!("{}=\"{}\"\n", attr.name.local, attr.value));
            }
        },
    }

    for &child in &node.children {
        serialize(doc, buf, indent + 2, child);
    }

    if let NodeData::Element {
        template_contents: Some(contents),
        ..
    } = &node.data
    {
        write_indent(buf, indent + 2);
        buf.push_str("content\n");
        for &child in &doc[*contents].children {
            serialize(doc, buf, indent + 4, child);
        }
    }
}
