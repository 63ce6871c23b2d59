//! The arena DOM produced by parsing.
//!
//! `Document` owns every node in a single vector; a [`NodeId`] is an index
//! into it. Parent links are plain ids, children are ordered id lists, and
//! the parser's stacks hold ids too, which makes the clone/replace surgery
//! of the adoption agency cheap and keeps the tree free of reference
//! counting.

use tendril::StrTendril;

use crate::errors::{ParseError, Position};
use crate::interface::{Attribute, QualName, QuirksMode};

/// Index of a node inside its [`Document`].
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node is.
#[derive(Debug)]
pub enum NodeData {
    /// The document root.
    Document,

    /// The root of a parsed fragment, and of every `template` element's
    /// contents.
    Fragment,

    /// A `<!DOCTYPE>` with name, public id and system id.
    Doctype {
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    },

    /// A text node.
    Text { contents: StrTendril },

    /// A comment.
    Comment { contents: StrTendril },

    /// An element.
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Fragment node holding this template's contents. Always Some for
        /// `template` elements, whose own child list stays empty.
        template_contents: Option<NodeId>,
        /// MathML `annotation-xml` whose `encoding` is text/html or
        /// application/xhtml+xml.
        annotation_xml_integration_point: bool,
    },
}

#[derive(Debug)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
    /// Source position of the token that created this node, when position
    /// tracking is enabled.
    pub position: Option<Position>,
}

impl Node {
    fn new(data: NodeData) -> Node {
        Node {
            parent: None,
            children: Vec::new(),
            data,
            position: None,
        }
    }
}

/// Either a finished node or a run of text to insert. Text is merged into
/// an adjacent text sibling where one exists.
#[derive(Debug)]
pub enum NodeOrText {
    AppendNode(NodeId),
    AppendText(StrTendril),
}

/// The result of parsing: an arena of nodes plus everything the parse
/// learned about the document.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    /// Parse errors in source order, when collection was enabled.
    pub errors: Vec<ParseError>,
    /// Quirks mode as determined by the DOCTYPE.
    pub quirks_mode: QuirksMode,
    /// Root of the parsed fragment, for `parse_fragment` results.
    pub fragment: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Document {
        Document {
            nodes: vec![Node::new(NodeData::Document)],
            errors: Vec::new(),
            quirks_mode: QuirksMode::NoQuirks,
            fragment: None,
        }
    }
}

impl std::ops::Index<NodeId> for Document {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl std::ops::IndexMut<NodeId> for Document {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

impl Document {
    pub fn new() -> Document {
        Document::default()
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena, the document node included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn new_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    /// Create an element node. `template` elements get a fresh contents
    /// fragment; MathML `annotation-xml` gets its integration-point flag
    /// from the encoding attribute.
    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        let template_contents = if name.is_html("template") {
            Some(self.new_node(NodeData::Fragment))
        } else {
            None
        };
        let annotation_xml_integration_point = name.ns == crate::interface::Namespace::MathMl
            && &*name.local == "annotation-xml"
            && attrs.iter().any(|a| {
                a.name.is_html("encoding")
                    && (a.value.eq_ignore_ascii_case("text/html")
                        || a.value.eq_ignore_ascii_case("application/xhtml+xml"))
            });
        self.new_node(NodeData::Element {
            name,
            attrs,
            template_contents,
            annotation_xml_integration_point,
        })
    }

    pub fn create_comment(&mut self, contents: StrTendril) -> NodeId {
        self.new_node(NodeData::Comment { contents })
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.new_node(NodeData::Fragment)
    }

    /// The qualified name of an element node.
    ///
    /// Panics on non-element nodes; parser code only asks about nodes it
    /// has pushed on the open-elements stack, which are all elements.
    pub fn elem_name(&self, id: NodeId) -> &QualName {
        match &self[id].data {
            NodeData::Element { name, .. } => name,
            _ => panic!("not an element"),
        }
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match &self[id].data {
            NodeData::Element { attrs, .. } => attrs,
            _ => panic!("not an element"),
        }
    }

    pub fn template_contents(&self, id: NodeId) -> NodeId {
        match &self[id].data {
            NodeData::Element {
                template_contents: Some(contents),
                ..
            } => *contents,
            _ => panic!("not a template element"),
        }
    }

    pub fn is_annotation_xml_integration_point(&self, id: NodeId) -> bool {
        match &self[id].data {
            NodeData::Element {
                annotation_xml_integration_point,
                ..
            } => *annotation_xml_integration_point,
            _ => false,
        }
    }

    fn append_text_to(&mut self, id: NodeId, text: &StrTendril) -> bool {
        match &mut self[id].data {
            NodeData::Text { contents } => {
                contents.push_tendril(text);
                true
            },
            _ => false,
        }
    }

    /// Append a node or text as the last child of `parent`. Text merges
    /// into a trailing text sibling, keeping adjacent text nodes impossible.
    pub fn append(&mut self, parent: NodeId, child: NodeOrText) {
        let child = match child {
            NodeOrText::AppendText(text) => {
                if let Some(&last) = self[parent].children.last() {
                    if self.append_text_to(last, &text) {
                        return;
                    }
                }
                self.new_node(NodeData::Text { contents: text })
            },
            NodeOrText::AppendNode(node) => node,
        };
        self.remove_from_parent(child);
        self[child].parent = Some(parent);
        self[parent].children.push(child);
    }

    /// Insert a node or text immediately before `sibling`. Text merges into
    /// the preceding text sibling where one exists.
    pub fn append_before_sibling(&mut self, sibling: NodeId, child: NodeOrText) {
        let parent = self[sibling].parent.expect("sibling has no parent");
        let i = self.position_in_parent(parent, sibling);

        let child = match child {
            NodeOrText::AppendText(text) => {
                if i > 0 {
                    let prev = self[parent].children[i - 1];
                    if self.append_text_to(prev, &text) {
                        return;
                    }
                }
                self.new_node(NodeData::Text { contents: text })
            },
            NodeOrText::AppendNode(node) => node,
        };
        self.remove_from_parent(child);
        // The sibling may have shifted if the child was earlier under the
        // same parent.
        let i = self.position_in_parent(parent, sibling);
        self[child].parent = Some(parent);
        self[parent].children.insert(i, child);
    }

    /// Insert before `element` if it has a parent, otherwise append to
    /// `prev_element`. This is the fallback step of foster parenting, for
    /// tables that have been removed from the tree.
    pub fn append_based_on_parent_node(
        &mut self,
        element: NodeId,
        prev_element: NodeId,
        child: NodeOrText,
    ) {
        if self[element].parent.is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    pub fn append_doctype(
        &mut self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let node = self.new_node(NodeData::Doctype {
            name,
            public_id,
            system_id,
        });
        self.append(self.root(), NodeOrText::AppendNode(node));
    }

    /// Add attributes the element does not already have. Used for the
    /// `<html>`/`<body>` attribute-merging rules.
    pub fn add_attrs_if_missing(&mut self, target: NodeId, new_attrs: Vec<Attribute>) {
        let NodeData::Element { attrs, .. } = &mut self[target].data else {
            panic!("not an element");
        };
        for attr in new_attrs {
            if !attrs.iter().any(|a| a.name == attr.name) {
                attrs.push(attr);
            }
        }
    }

    pub fn remove_from_parent(&mut self, target: NodeId) {
        if let Some(parent) = self[target].parent.take() {
            let i = self.position_in_parent(parent, target);
            self[parent].children.remove(i);
        }
    }

    /// Move all children of `node` onto the end of `new_parent`'s child
    /// list, preserving order.
    pub fn reparent_children(&mut self, node: NodeId, new_parent: NodeId) {
        let children = std::mem::take(&mut self[node].children);
        for &child in &children {
            self[child].parent = Some(new_parent);
        }
        self[new_parent].children.extend(children);
    }

    fn position_in_parent(&self, parent: NodeId, child: NodeId) -> usize {
        self[parent]
            .children
            .iter()
            .position(|&c| c == child)
            .expect("child not found under its parent")
    }

    pub fn parse_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Check the parent/child link invariant over the whole arena.
    /// Test-support; O(n²) in the worst case.
    #[doc(hidden)]
    pub fn assert_consistent(&self) {
        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            for &child in &node.children {
                assert_eq!(self[child].parent, Some(id), "bad parent link");
            }
            if let Some(parent) = node.parent {
                assert!(
                    self[parent].children.contains(&id),
                    "node missing from its parent's children"
                );
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interface::QualName;

    fn text(s: &str) -> NodeOrText {
        NodeOrText::AppendText(StrTendril::from_slice(s))
    }

    #[test]
    fn append_merges_text() {
        let mut doc = Document::new();
        let div = doc.create_element(QualName::html("div"), vec![]);
        doc.append(doc.root(), NodeOrText::AppendNode(div));
        doc.append(div, text("a"));
        doc.append(div, text("b"));
        assert_eq!(doc[div].children.len(), 1);
        let child = doc[div].children[0];
        match &doc[child].data {
            NodeData::Text { contents } => assert_eq!(&**contents, "ab"),
            _ => panic!("expected text node"),
        }
        doc.assert_consistent();
    }

    #[test]
    fn insert_before_merges_into_previous_text() {
        let mut doc = Document::new();
        let div = doc.create_element(QualName::html("div"), vec![]);
        let span = doc.create_element(QualName::html("span"), vec![]);
        doc.append(div, text("x"));
        doc.append(div, NodeOrText::AppendNode(span));
        doc.append_before_sibling(span, text("y"));
        assert_eq!(doc[div].children.len(), 2);
        match &doc[doc[div].children[0]].data {
            NodeData::Text { contents } => assert_eq!(&**contents, "xy"),
            _ => panic!("expected text node"),
        }
    }

    #[test]
    fn template_gets_contents_fragment() {
        let mut doc = Document::new();
        let template = doc.create_element(QualName::html("template"), vec![]);
        let contents = doc.template_contents(template);
        assert!(matches!(doc[contents].data, NodeData::Fragment));
        assert!(doc[template].children.is_empty());
    }

    #[test]
    fn reparent_moves_all_children() {
        let mut doc = Document::new();
        let a = doc.create_element(QualName::html("a"), vec![]);
        let b = doc.create_element(QualName::html("b"), vec![]);
        doc.append(a, text("1"));
        let c = doc.create_element(QualName::html("i"), vec![]);
        doc.append(a, NodeOrText::AppendNode(c));
        doc.reparent_children(a, b);
        assert!(doc[a].children.is_empty());
        assert_eq!(doc[b].children.len(), 2);
        assert_eq!(doc[c].parent, Some(b));
        doc.assert_consistent();
    }
}
