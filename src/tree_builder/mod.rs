//! The HTML5 tree builder: consumes tokens, maintains the stack of open
//! elements and the list of active formatting elements, and mutates the
//! arena DOM.

use std::collections::VecDeque;

use log::debug;
use tendril::StrTendril;

use self::tag_sets::*;
use self::types::*;

use crate::dom::{Document, NodeId, NodeOrText::*};
use crate::errors::{ErrorCode, ParseError, Position};
use crate::interface::{Attribute, LocalName, Namespace, QualName, QuirksMode};
use crate::tokenizer::states::RawKind;
use crate::tokenizer::{self, Doctype, EndTag, StartTag, Tag, TokenSink, TokenSinkResult};

mod data;
pub mod foreign;
mod rules;
mod tag_sets;
mod types;

/// Tree builder options, with an impl for Default.
#[derive(Copy, Clone)]
pub struct TreeBuilderOpts {
    /// Record tree-construction parse errors on the document?
    /// Default: false.
    pub collect_errors: bool,

    /// Is scripting enabled? This decides how `<noscript>` parses.
    /// Default: true.
    pub scripting_enabled: bool,

    /// Is this document the `srcdoc` of an `<iframe>`? Exempts it from
    /// doctype quirks. Default: false.
    pub iframe_srcdoc: bool,

    /// Drop the DOCTYPE (if any) from the tree? Default: false.
    pub drop_doctype: bool,

    /// Initial quirks mode. Default: NoQuirks.
    pub quirks_mode: QuirksMode,

    /// Record the source position of each created node? Default: false.
    pub track_positions: bool,
}

impl Default for TreeBuilderOpts {
    fn default() -> TreeBuilderOpts {
        TreeBuilderOpts {
            collect_errors: false,
            scripting_enabled: true,
            iframe_srcdoc: false,
            drop_doctype: false,
            quirks_mode: QuirksMode::NoQuirks,
            track_positions: false,
        }
    }
}

pub enum PushFlag {
    Push,
    NoPush,
}

enum Bookmark {
    Replace(NodeId),
    InsertAfter(NodeId),
}

/// The HTML tree builder.
pub struct TreeBuilder {
    /// Options controlling the behavior of the tree builder.
    opts: TreeBuilderOpts,

    /// The document being built.
    pub doc: Document,

    /// Insertion mode.
    mode: InsertionMode,

    /// Original insertion mode, used by Text and InTableText modes.
    orig_mode: Option<InsertionMode>,

    /// Stack of template insertion modes.
    template_modes: Vec<InsertionMode>,

    /// Pending table character tokens.
    pending_table_text: Vec<(SplitStatus, StrTendril)>,

    /// Quirks mode as set by the parser.
    quirks_mode: QuirksMode,

    /// Stack of open elements, most recently added at end.
    open_elems: Vec<NodeId>,

    /// List of active formatting elements.
    active_formatting: Vec<FormatEntry>,

    //§ the-element-pointers
    /// Head element pointer.
    head_elem: Option<NodeId>,

    /// Form element pointer.
    form_elem: Option<NodeId>,
    //§ END
    /// Frameset-ok flag.
    frameset_ok: bool,

    /// Ignore a following U+000A LINE FEED?
    ignore_lf: bool,

    /// Is foster parenting enabled?
    foster_parenting: bool,

    /// The context element for the fragment parsing algorithm.
    context_elem: Option<NodeId>,

    /// Position of the token being processed.
    position: Position,
}

/// Description of the context element for fragment parsing.
#[derive(Clone, Debug)]
pub struct FragmentContext {
    pub ns: Namespace,
    pub local: LocalName,
}

impl FragmentContext {
    pub fn html(local: &str) -> FragmentContext {
        FragmentContext {
            ns: Namespace::Html,
            local: LocalName::from(local),
        }
    }
}

impl TreeBuilder {
    /// Create a new tree builder. The tree builder is also a `TokenSink`.
    pub fn new(opts: TreeBuilderOpts) -> TreeBuilder {
        TreeBuilder {
            opts,
            doc: Document::new(),
            mode: InsertionMode::Initial,
            orig_mode: None,
            template_modes: vec![],
            pending_table_text: vec![],
            quirks_mode: opts.quirks_mode,
            open_elems: vec![],
            active_formatting: vec![],
            head_elem: None,
            form_elem: None,
            frameset_ok: true,
            ignore_lf: false,
            foster_parenting: false,
            context_elem: None,
            position: Position::start(),
        }
    }

    /// Create a tree builder for parsing a fragment in the given context.
    pub fn new_for_fragment(opts: TreeBuilderOpts, context: FragmentContext) -> TreeBuilder {
        let mut tb = TreeBuilder::new(opts);

        let context_elem = tb
            .doc
            .create_element(QualName::new(None, context.ns, context.local.clone()), vec![]);
        tb.context_elem = Some(context_elem);
        if context.ns == Namespace::Html && &*context.local == "template" {
            tb.template_modes.push(InsertionMode::InTemplate);
        }

        // The fragment algorithm: a bare html element is the root, and the
        // insertion mode is reset against the context element.
        tb.create_root(vec![]);
        tb.mode = tb.reset_insertion_mode();
        tb
    }

    /// The tokenizer state a fragment parse starts in, as determined by the
    /// context element.
    pub fn tokenizer_state_for_context_elem(&self) -> crate::tokenizer::states::State {
        use crate::tokenizer::states::*;

        let Some(context_elem) = self.context_elem else {
            return Data;
        };
        let name = self.doc.elem_name(context_elem);
        if name.ns != Namespace::Html {
            return Data;
        }
        match &*name.local {
            "title" | "textarea" => RawData(Rcdata),

            "style" | "xmp" | "iframe" | "noembed" | "noframes" => RawData(Rawtext),

            "script" => RawData(ScriptData),

            "noscript" => {
                if self.opts.scripting_enabled {
                    RawData(Rawtext)
                } else {
                    Data
                }
            },

            "plaintext" => Plaintext,

            _ => Data,
        }
    }

    /// The name of the context element, for the tokenizer's "appropriate
    /// end tag" check when a fragment starts inside raw text.
    pub fn context_elem_name(&self) -> Option<String> {
        self.context_elem
            .map(|id| self.doc.elem_name(id).local.to_string())
    }

    /// Finish parsing and hand back the document.
    pub fn finish(mut self) -> Document {
        self.doc.quirks_mode = self.quirks_mode;
        self.doc
    }

    /// Finish a fragment parse: the parsed content (the children of the
    /// bare html root) moves under a fragment node.
    pub fn finish_fragment(mut self) -> Document {
        self.doc.quirks_mode = self.quirks_mode;
        let fragment = self.doc.create_fragment();
        if let Some(&html_root) = self.doc[self.doc.root()].children.first() {
            self.doc.reparent_children(html_root, fragment);
        }
        self.doc.fragment = Some(fragment);
        self.doc
    }

    fn debug_step(&self, mode: InsertionMode, token: &Token) {
        debug!("processing {token:?} in insertion mode {mode:?}");
    }

    fn process_to_completion(&mut self, mut token: Token) -> TokenSinkResult {
        // Queue of additional tokens yet to be processed. This stays empty
        // in the common case where we don't split whitespace.
        let mut more_tokens = VecDeque::new();

        loop {
            let should_have_acked_self_closing = matches!(
                token,
                Token::Tag(Tag {
                    self_closing: true,
                    kind: StartTag,
                    ..
                })
            );
            let result = if self.is_foreign(&token) {
                self.step_foreign(token)
            } else {
                let mode = self.mode;
                self.step(mode, token)
            };
            match result {
                ProcessResult::Done => {
                    if should_have_acked_self_closing {
                        self.parse_error(ErrorCode::NonVoidHtmlElementStartTagWithTrailingSolidus);
                    }
                    let Some(new_token) = more_tokens.pop_front() else {
                        return TokenSinkResult::Continue;
                    };
                    token = new_token;
                },
                ProcessResult::DoneAckSelfClosing => {
                    let Some(new_token) = more_tokens.pop_front() else {
                        return TokenSinkResult::Continue;
                    };
                    token = new_token;
                },
                ProcessResult::Reprocess(m, t) => {
                    self.mode = m;
                    token = t;
                },
                ProcessResult::SplitWhitespace(mut buf) => {
                    let p = buf.pop_front_char_run(|c| c.is_ascii_whitespace());
                    let Some((first, is_ws)) = p else {
                        return TokenSinkResult::Continue;
                    };
                    let status = if is_ws {
                        SplitStatus::Whitespace
                    } else {
                        SplitStatus::NotWhitespace
                    };
                    token = Token::Characters(status, first);

                    if buf.len32() > 0 {
                        more_tokens.push_back(Token::Characters(SplitStatus::NotSplit, buf));
                    }
                },
                ProcessResult::ToPlaintext => {
                    assert!(more_tokens.is_empty());
                    return TokenSinkResult::Plaintext;
                },
                ProcessResult::ToRawData(k) => {
                    assert!(more_tokens.is_empty());
                    return TokenSinkResult::RawData(k);
                },
            }
        }
    }

    /// Are we parsing a HTML fragment?
    pub fn is_fragment(&self) -> bool {
        self.context_elem.is_some()
    }

    //§ appropriate-place-for-inserting-a-node
    fn appropriate_place_for_insertion(&self, override_target: Option<NodeId>) -> InsertionPoint {
        let target = override_target.unwrap_or_else(|| self.current_node());
        if !(self.foster_parenting && self.elem_in(target, foster_target)) {
            if self.html_elem_named(target, "template") {
                // No foster parenting (inside template).
                return InsertionPoint::LastChild(self.doc.template_contents(target));
            }
            // No foster parenting (the common case).
            return InsertionPoint::LastChild(target);
        }

        // Foster parenting.
        let mut iter = self.open_elems.iter().rev().peekable();
        while let Some(&elem) = iter.next() {
            if self.html_elem_named(elem, "template") {
                return InsertionPoint::LastChild(self.doc.template_contents(elem));
            } else if self.html_elem_named(elem, "table") {
                return InsertionPoint::TableFosterParenting {
                    element: elem,
                    prev_element: **iter.peek().unwrap(),
                };
            }
        }
        InsertionPoint::LastChild(self.html_elem())
    }

    fn insert_at(&mut self, insertion_point: InsertionPoint, child: crate::dom::NodeOrText) {
        match insertion_point {
            InsertionPoint::LastChild(parent) => self.doc.append(parent, child),
            InsertionPoint::TableFosterParenting {
                element,
                prev_element,
            } => self
                .doc
                .append_based_on_parent_node(element, prev_element, child),
        }
    }

    fn parse_error(&mut self, code: ErrorCode) {
        if self.opts.collect_errors {
            let error = ParseError::new(code, self.position);
            self.doc.parse_error(error);
        }
    }

    /// The error code for an unexpected token in the current insertion
    /// mode.
    fn mode_error_code(&self) -> ErrorCode {
        match self.mode {
            InsertionMode::Initial => ErrorCode::UnexpectedTokenInInitialMode,
            InsertionMode::BeforeHtml => ErrorCode::UnexpectedTokenBeforeHtml,
            InsertionMode::BeforeHead => ErrorCode::UnexpectedTokenBeforeHead,
            InsertionMode::InHead => ErrorCode::UnexpectedTokenInHead,
            InsertionMode::InHeadNoscript => ErrorCode::UnexpectedTokenInHeadNoscript,
            InsertionMode::AfterHead => ErrorCode::UnexpectedTokenAfterHead,
            InsertionMode::InBody => ErrorCode::UnexpectedTokenInBody,
            InsertionMode::Text => ErrorCode::UnexpectedTokenInTextMode,
            InsertionMode::InTable => ErrorCode::UnexpectedTokenInTable,
            InsertionMode::InTableText => ErrorCode::UnexpectedTokenInTableText,
            InsertionMode::InCaption => ErrorCode::UnexpectedTokenInCaption,
            InsertionMode::InColumnGroup => ErrorCode::UnexpectedTokenInColumnGroup,
            InsertionMode::InTableBody => ErrorCode::UnexpectedTokenInTableBody,
            InsertionMode::InRow => ErrorCode::UnexpectedTokenInRow,
            InsertionMode::InCell => ErrorCode::UnexpectedTokenInCell,
            InsertionMode::InSelect | InsertionMode::InSelectInTable => {
                ErrorCode::UnexpectedTokenInSelect
            },
            InsertionMode::InTemplate => ErrorCode::UnexpectedTokenInTemplate,
            InsertionMode::AfterBody => ErrorCode::UnexpectedTokenAfterBody,
            InsertionMode::InFrameset => ErrorCode::UnexpectedTokenInFrameset,
            InsertionMode::AfterFrameset => ErrorCode::UnexpectedTokenAfterFrameset,
            InsertionMode::AfterAfterBody => ErrorCode::UnexpectedTokenAfterAfterBody,
            InsertionMode::AfterAfterFrameset => ErrorCode::UnexpectedTokenAfterAfterFrameset,
        }
    }

    fn unexpected<T: std::fmt::Debug>(&mut self, _thing: &T) -> ProcessResult {
        debug!("unexpected {:?} in insertion mode {:?}", _thing, self.mode);
        let code = self.mode_error_code();
        self.parse_error(code);
        ProcessResult::Done
    }

    /// Iterate the active formatting elements (with index) from the end to
    /// the last marker, or the beginning if there are no markers.
    fn active_formatting_end_to_marker(&self) -> impl Iterator<Item = (usize, NodeId, &Tag)> {
        self.active_formatting
            .iter()
            .enumerate()
            .rev()
            .map_while(|(i, entry)| match entry {
                FormatEntry::Marker => None,
                FormatEntry::Element(id, tag) => Some((i, *id, tag)),
            })
    }

    fn position_in_active_formatting(&self, element: NodeId) -> Option<usize> {
        self.active_formatting.iter().position(|n| match n {
            FormatEntry::Marker => false,
            FormatEntry::Element(id, _) => *id == element,
        })
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
        self.doc.quirks_mode = mode;
    }

    fn stop_parsing(&mut self) -> ProcessResult {
        ProcessResult::Done
    }

    //§ parsing-elements-that-contain-only-text
    // Switch to `Text` insertion mode, save the old mode, and switch the
    // tokenizer to a raw-data state. The latter only takes effect after
    // the current `process_token` returns.
    fn to_raw_text_mode(&mut self, k: RawKind) -> ProcessResult {
        self.orig_mode = Some(self.mode);
        self.mode = InsertionMode::Text;
        ProcessResult::ToRawData(k)
    }

    // The generic raw text / RCDATA parsing algorithm.
    fn parse_raw_data(&mut self, tag: Tag, k: RawKind) -> ProcessResult {
        self.insert_element_for(tag);
        self.to_raw_text_mode(k)
    }
    //§ END

    fn current_node(&self) -> NodeId {
        *self.open_elems.last().expect("no current element")
    }

    fn adjusted_current_node(&self) -> NodeId {
        if self.open_elems.len() == 1 {
            if let Some(ctx) = self.context_elem {
                return ctx;
            }
        }
        self.current_node()
    }

    fn current_node_in<TagSet>(&self, set: TagSet) -> bool
    where
        TagSet: Fn(Namespace, &str) -> bool,
    {
        self.elem_in(self.current_node(), set)
    }

    // Insert at the "appropriate place for inserting a node".
    fn insert_appropriately(&mut self, child: crate::dom::NodeOrText, override_target: Option<NodeId>) {
        let insertion_point = self.appropriate_place_for_insertion(override_target);
        self.insert_at(insertion_point, child);
    }

    //§ the-adoption-agency-algorithm
    pub(crate) fn adoption_agency(&mut self, subject: LocalName) {
        // 1. 2.
        if self.current_node_named(&subject)
            && self
                .position_in_active_formatting(self.current_node())
                .is_none()
        {
            self.pop();
            return;
        }

        // 3. 4.
        for _ in 0..8 {
            // Find the formatting element, searching back to the last
            // marker.
            let maybe_fmt_entry = self
                .active_formatting_end_to_marker()
                .find(|&(_, _, tag)| tag.name == subject)
                .map(|(i, id, tag)| (i, id, tag.clone()));

            let Some((fmt_elem_index, fmt_elem, fmt_elem_tag)) = maybe_fmt_entry else {
                return self.process_end_tag_in_body(Tag {
                    kind: EndTag,
                    name: subject,
                    self_closing: false,
                    attrs: vec![],
                });
            };

            let Some(fmt_elem_stack_index) =
                self.open_elems.iter().rposition(|&n| n == fmt_elem)
            else {
                self.parse_error(ErrorCode::FormattingElementNotOpen);
                self.active_formatting.remove(fmt_elem_index);
                return;
            };

            if !self.in_scope(default_scope, |n| n == fmt_elem) {
                self.parse_error(ErrorCode::FormattingElementNotInScope);
                return;
            }

            if self.current_node() != fmt_elem {
                self.parse_error(ErrorCode::FormattingElementNotCurrentNode);
            }

            // Find the furthest block: the topmost special element below
            // the formatting element on the stack.
            let maybe_furthest_block = self
                .open_elems
                .iter()
                .enumerate()
                .skip(fmt_elem_stack_index)
                .find(|&(_, &open_element)| self.elem_in(open_element, special_tag))
                .map(|(i, &id)| (i, id));

            let Some((furthest_block_index, furthest_block)) = maybe_furthest_block else {
                // Simple case: pop through the formatting element and drop
                // its entry.
                self.open_elems.truncate(fmt_elem_stack_index);
                self.active_formatting.remove(fmt_elem_index);
                return;
            };

            let common_ancestor = self.open_elems[fmt_elem_stack_index - 1];

            let mut bookmark = Bookmark::Replace(fmt_elem);

            // Walk down from the furthest block toward the formatting
            // element, cloning intermediate formatting entries.
            let mut node;
            let mut node_index = furthest_block_index;
            let mut last_node = furthest_block;

            let mut inner_counter = 0;
            loop {
                inner_counter += 1;

                node_index -= 1;
                node = self.open_elems[node_index];

                if node == fmt_elem {
                    break;
                }

                if inner_counter > 3 {
                    if let Some(position) = self.position_in_active_formatting(node) {
                        self.active_formatting.remove(position);
                    }
                    self.open_elems.remove(node_index);
                    continue;
                }

                let Some(node_formatting_index) = self.position_in_active_formatting(node) else {
                    self.open_elems.remove(node_index);
                    continue;
                };

                let tag = match self.active_formatting[node_formatting_index] {
                    FormatEntry::Element(id, ref t) => {
                        assert_eq!(id, node);
                        t.clone()
                    },
                    FormatEntry::Marker => panic!("found marker during adoption agency"),
                };
                let new_element = self.doc.create_element(
                    QualName::new(None, Namespace::Html, tag.name.clone()),
                    tag.attrs.clone(),
                );
                self.open_elems[node_index] = new_element;
                self.active_formatting[node_formatting_index] =
                    FormatEntry::Element(new_element, tag);
                node = new_element;

                if last_node == furthest_block {
                    bookmark = Bookmark::InsertAfter(node);
                }

                self.doc.remove_from_parent(last_node);
                self.doc.append(node, AppendNode(last_node));

                last_node = node;
            }

            // Place the last node at the appropriate place under the
            // common ancestor, honoring foster parenting.
            self.doc.remove_from_parent(last_node);
            self.insert_appropriately(AppendNode(last_node), Some(common_ancestor));

            // Fresh clone of the formatting element; the furthest block's
            // children move into it.
            let new_element = self.doc.create_element(
                QualName::new(None, Namespace::Html, fmt_elem_tag.name.clone()),
                fmt_elem_tag.attrs.clone(),
            );
            let new_entry = FormatEntry::Element(new_element, fmt_elem_tag);

            self.doc.reparent_children(furthest_block, new_element);
            self.doc.append(furthest_block, AppendNode(new_element));

            // Drop the old entry, put the new one at the bookmark.
            match bookmark {
                Bookmark::Replace(to_replace) => {
                    let index = self
                        .position_in_active_formatting(to_replace)
                        .expect("bookmark not found in active formatting elements");
                    self.active_formatting[index] = new_entry;
                },
                Bookmark::InsertAfter(previous) => {
                    let index = self
                        .position_in_active_formatting(previous)
                        .expect("bookmark not found in active formatting elements")
                        + 1;
                    self.active_formatting.insert(index, new_entry);
                    let old_index = self
                        .position_in_active_formatting(fmt_elem)
                        .expect("formatting element not found in active formatting elements");
                    self.active_formatting.remove(old_index);
                },
            }

            // The new element goes on the stack right after the furthest
            // block.
            self.remove_from_stack(fmt_elem);
            let new_furthest_block_index = self
                .open_elems
                .iter()
                .position(|&n| n == furthest_block)
                .expect("furthest block missing from open element stack");
            self.open_elems
                .insert(new_furthest_block_index + 1, new_element);
        }
    }
    //§ END

    fn push(&mut self, elem: NodeId) {
        self.open_elems.push(elem);
    }

    fn pop(&mut self) -> NodeId {
        self.open_elems.pop().expect("no current element")
    }

    fn remove_from_stack(&mut self, elem: NodeId) {
        if let Some(position) = self.open_elems.iter().rposition(|&x| x == elem) {
            self.open_elems.remove(position);
        }
    }

    fn is_marker_or_open(&self, entry: &FormatEntry) -> bool {
        match *entry {
            FormatEntry::Marker => true,
            FormatEntry::Element(node, _) => self.open_elems.iter().rev().any(|&n| n == node),
        }
    }

    //§ reconstruct-the-active-formatting-elements
    fn reconstruct_active_formatting_elements(&mut self) {
        {
            let Some(last) = self.active_formatting.last() else {
                return;
            };
            if self.is_marker_or_open(last) {
                return;
            }
        }

        // Rewind to the most recent entry that is a marker or still open,
        // then re-clone everything after it in order.
        let mut entry_index = self.active_formatting.len() - 1;
        loop {
            if entry_index == 0 {
                break;
            }
            entry_index -= 1;
            if self.is_marker_or_open(&self.active_formatting[entry_index]) {
                entry_index += 1;
                break;
            }
        }

        loop {
            let tag = match self.active_formatting[entry_index] {
                FormatEntry::Element(_, ref t) => t.clone(),
                FormatEntry::Marker => {
                    panic!("found marker during formatting element reconstruction")
                },
            };

            let new_element =
                self.insert_element(PushFlag::Push, Namespace::Html, tag.name.clone(), tag.attrs.clone());
            self.active_formatting[entry_index] = FormatEntry::Element(new_element, tag);

            if entry_index == self.active_formatting.len() - 1 {
                break;
            }
            entry_index += 1;
        }
    }
    //§ END

    /// Get the first element on the stack, which will be the <html>
    /// element.
    fn html_elem(&self) -> NodeId {
        self.open_elems[0]
    }

    /// Get the second element on the stack, if it's a HTML body element.
    fn body_elem(&self) -> Option<NodeId> {
        if self.open_elems.len() <= 1 {
            return None;
        }
        let node = self.open_elems[1];
        if self.html_elem_named(node, "body") {
            Some(node)
        } else {
            None
        }
    }

    /// Signal an error depending on the state of the stack of open
    /// elements at the end of the body.
    fn check_body_end(&mut self) {
        for i in 0..self.open_elems.len() {
            let elem = self.open_elems[i];
            if !self.elem_in(elem, body_end_ok) {
                self.parse_error(ErrorCode::UnclosedElementsAtEndOfBody);
                return;
            }
        }
    }

    fn in_scope<TagSet, Pred>(&self, scope: TagSet, pred: Pred) -> bool
    where
        TagSet: Fn(Namespace, &str) -> bool,
        Pred: Fn(NodeId) -> bool,
    {
        for &node in self.open_elems.iter().rev() {
            if pred(node) {
                return true;
            }
            let name = self.doc.elem_name(node);
            if scope(name.ns, &name.local) {
                return false;
            }
        }

        // supposed to be impossible, because <html> is always in scope
        false
    }

    fn elem_in<TagSet>(&self, elem: NodeId, set: TagSet) -> bool
    where
        TagSet: Fn(Namespace, &str) -> bool,
    {
        let name = self.doc.elem_name(elem);
        set(name.ns, &name.local)
    }

    fn html_elem_named(&self, elem: NodeId, name: &str) -> bool {
        self.doc.elem_name(elem).is_html(name)
    }

    fn in_html_elem_named(&self, name: &str) -> bool {
        self.open_elems
            .iter()
            .any(|&elem| self.html_elem_named(elem, name))
    }

    fn current_node_named(&self, name: &str) -> bool {
        self.html_elem_named(self.current_node(), name)
    }

    fn in_scope_named<TagSet>(&self, scope: TagSet, name: &str) -> bool
    where
        TagSet: Fn(Namespace, &str) -> bool,
    {
        self.in_scope(scope, |elem| self.html_elem_named(elem, name))
    }

    //§ generate-implied-end-tags
    fn generate_implied_end_tags<TagSet>(&mut self, set: TagSet)
    where
        TagSet: Fn(Namespace, &str) -> bool,
    {
        loop {
            {
                let Some(&elem) = self.open_elems.last() else {
                    return;
                };
                if !self.elem_in(elem, &set) {
                    return;
                }
            }
            self.pop();
        }
    }

    fn generate_implied_end_except(&mut self, except: &str) {
        self.generate_implied_end_tags(|ns, name| {
            if ns == Namespace::Html && name == except {
                false
            } else {
                cursory_implied_end(ns, name)
            }
        });
    }
    //§ END

    // Pop elements until the current element is in the set.
    fn pop_until_current<TagSet>(&mut self, tag_set: TagSet)
    where
        TagSet: Fn(Namespace, &str) -> bool,
    {
        while !self.current_node_in(&tag_set) {
            self.open_elems.pop();
        }
    }

    // Pop elements until an element from the set has been popped. Returns
    // the number of elements popped.
    fn pop_until<P>(&mut self, pred: P) -> usize
    where
        P: Fn(Namespace, &str) -> bool,
    {
        let mut n = 0;
        loop {
            n += 1;
            match self.open_elems.pop() {
                None => break,
                Some(elem) => {
                    if self.elem_in(elem, &pred) {
                        break;
                    }
                },
            }
        }
        n
    }

    fn pop_until_named(&mut self, name: &str) -> usize {
        self.pop_until(|ns, n| ns == Namespace::Html && n == name)
    }

    /// Pop elements until one with the specified name has been popped.
    /// Signal an error if it was not the first one.
    fn expect_to_close(&mut self, name: &str) {
        if self.pop_until_named(name) != 1 {
            self.parse_error(ErrorCode::EndTagWithoutMatchingOpenElement);
        }
    }

    fn close_p_element(&mut self) {
        self.generate_implied_end_except("p");
        self.expect_to_close("p");
    }

    fn close_p_element_in_button_scope(&mut self) {
        if self.in_scope_named(button_scope, "p") {
            self.close_p_element();
        }
    }

    // Check <input> tags for type=hidden.
    fn is_type_hidden(&self, tag: &Tag) -> bool {
        match tag.attribute("type") {
            None => false,
            Some(value) => value.eq_ignore_ascii_case("hidden"),
        }
    }

    fn foster_parent_in_body(&mut self, token: Token) -> ProcessResult {
        self.foster_parenting = true;
        let res = self.step(InsertionMode::InBody, token);
        self.foster_parenting = false;
        res
    }

    fn process_chars_in_table(&mut self, token: Token) -> ProcessResult {
        if self.current_node_in(table_outer) {
            assert!(self.pending_table_text.is_empty());
            self.orig_mode = Some(self.mode);
            ProcessResult::Reprocess(InsertionMode::InTableText, token)
        } else {
            self.parse_error(ErrorCode::UnexpectedCharactersInTable);
            self.foster_parent_in_body(token)
        }
    }

    //§ reset-the-insertion-mode-appropriately
    fn reset_insertion_mode(&self) -> InsertionMode {
        for (i, mut node) in self.open_elems.iter().copied().enumerate().rev() {
            let last = i == 0usize;
            if let (true, Some(ctx)) = (last, self.context_elem) {
                node = ctx;
            }
            let name = self.doc.elem_name(node);
            if name.ns != Namespace::Html {
                continue;
            }
            match &*name.local {
                "select" => {
                    for &ancestor in self.open_elems[0..i].iter().rev() {
                        if self.html_elem_named(ancestor, "template") {
                            return InsertionMode::InSelect;
                        } else if self.html_elem_named(ancestor, "table") {
                            return InsertionMode::InSelectInTable;
                        }
                    }
                    return InsertionMode::InSelect;
                },
                "td" | "th" => {
                    if !last {
                        return InsertionMode::InCell;
                    }
                },
                "tr" => return InsertionMode::InRow,
                "tbody" | "thead" | "tfoot" => return InsertionMode::InTableBody,
                "caption" => return InsertionMode::InCaption,
                "colgroup" => return InsertionMode::InColumnGroup,
                "table" => return InsertionMode::InTable,
                "template" => return *self.template_modes.last().unwrap(),
                "head" => {
                    if !last {
                        return InsertionMode::InHead;
                    }
                },
                "body" => return InsertionMode::InBody,
                "frameset" => return InsertionMode::InFrameset,
                "html" => match self.head_elem {
                    None => return InsertionMode::BeforeHead,
                    Some(_) => return InsertionMode::AfterHead,
                },
                _ => (),
            }
        }
        InsertionMode::InBody
    }
    //§ END

    fn close_the_cell(&mut self) {
        self.generate_implied_end_tags(cursory_implied_end);
        if self.pop_until(td_th) != 1 {
            self.parse_error(ErrorCode::EndTagWithoutMatchingOpenElement);
        }
        self.clear_active_formatting_to_marker();
    }

    fn append_text(&mut self, text: StrTendril) -> ProcessResult {
        self.insert_appropriately(AppendText(text), None);
        ProcessResult::Done
    }

    fn append_comment(&mut self, text: StrTendril) -> ProcessResult {
        let comment = self.doc.create_comment(text);
        self.insert_appropriately(AppendNode(comment), None);
        ProcessResult::Done
    }

    fn append_comment_to_doc(&mut self, text: StrTendril) -> ProcessResult {
        let comment = self.doc.create_comment(text);
        self.doc.append(self.doc.root(), AppendNode(comment));
        ProcessResult::Done
    }

    fn append_comment_to_html(&mut self, text: StrTendril) -> ProcessResult {
        let target = self.html_elem();
        let comment = self.doc.create_comment(text);
        self.doc.append(target, AppendNode(comment));
        ProcessResult::Done
    }

    //§ creating-and-inserting-nodes
    fn create_root(&mut self, attrs: Vec<Attribute>) {
        let elem = self.doc.create_element(QualName::html("html"), attrs);
        self.push(elem);
        self.doc.append(self.doc.root(), AppendNode(elem));
    }

    fn insert_element(
        &mut self,
        push: PushFlag,
        ns: Namespace,
        name: LocalName,
        attrs: Vec<Attribute>,
    ) -> NodeId {
        let qname = QualName::new(None, ns, name);
        let elem = self.doc.create_element(qname, attrs);
        if self.opts.track_positions {
            self.doc[elem].position = Some(self.position);
        }

        let insertion_point = self.appropriate_place_for_insertion(None);
        self.insert_at(insertion_point, AppendNode(elem));

        match push {
            PushFlag::Push => self.push(elem),
            PushFlag::NoPush => (),
        }
        elem
    }

    fn insert_element_for(&mut self, tag: Tag) -> NodeId {
        self.insert_element(PushFlag::Push, Namespace::Html, tag.name, tag.attrs)
    }

    fn insert_and_pop_element_for(&mut self, tag: Tag) -> NodeId {
        self.insert_element(PushFlag::NoPush, Namespace::Html, tag.name, tag.attrs)
    }

    fn insert_phantom(&mut self, name: &str) -> NodeId {
        self.insert_element(PushFlag::Push, Namespace::Html, LocalName::from(name), vec![])
    }
    //§ END

    /// Insert a formatting element, enforcing the Noah's Ark clause: at
    /// most three equivalent entries since the last marker.
    fn create_formatting_element_for(&mut self, tag: Tag) -> NodeId {
        let mut first_match = None;
        let mut matches = 0usize;
        for (i, _, old_tag) in self.active_formatting_end_to_marker() {
            if tag.equiv_modulo_attr_order(old_tag) {
                first_match = Some(i);
                matches += 1;
            }
        }

        if matches >= 3 {
            self.active_formatting
                .remove(first_match.expect("matches with no index"));
        }

        let elem = self.insert_element(
            PushFlag::Push,
            Namespace::Html,
            tag.name.clone(),
            tag.attrs.clone(),
        );
        self.active_formatting
            .push(FormatEntry::Element(elem, tag));
        elem
    }

    fn clear_active_formatting_to_marker(&mut self) {
        loop {
            match self.active_formatting.pop() {
                None | Some(FormatEntry::Marker) => break,
                _ => (),
            }
        }
    }

    /// The "any other end tag" rules of InBody.
    fn process_end_tag_in_body(&mut self, tag: Tag) {
        // Look back for a matching open element.
        let mut match_idx = None;
        for (i, &elem) in self.open_elems.iter().enumerate().rev() {
            if self.html_elem_named(elem, &tag.name) {
                match_idx = Some(i);
                break;
            }

            if self.elem_in(elem, special_tag) {
                self.parse_error(ErrorCode::EndTagWithoutMatchingOpenElement);
                return;
            }
        }

        let Some(match_idx) = match_idx else {
            // This is impossible, because the root <html> element is in
            // the special category.
            self.unexpected(&tag);
            return;
        };

        self.generate_implied_end_except(&tag.name.clone());

        if match_idx != self.open_elems.len() - 1 {
            // mis-nested tags
            self.unexpected(&tag);
        }
        self.open_elems.truncate(match_idx);
    }

    /// An `<a>` start tag with an `<a>` still in the active formatting
    /// list runs the agency, then drops the stale entry.
    fn handle_misnested_a_tags(&mut self, tag: &Tag) {
        let Some(node) = self
            .active_formatting_end_to_marker()
            .find(|&(_, n, _)| self.html_elem_named(n, "a"))
            .map(|(_, n, _)| n)
        else {
            return;
        };

        self.unexpected(tag);
        self.adoption_agency(LocalName::from("a"));
        if let Some(index) = self.position_in_active_formatting(node) {
            self.active_formatting.remove(index);
        }
        self.remove_from_stack(node);
    }

    //§ tree-construction
    fn is_foreign(&self, token: &Token) -> bool {
        if let Token::Eof = *token {
            return false;
        }

        if self.open_elems.is_empty() {
            return false;
        }

        let current = self.adjusted_current_node();
        let name = self.doc.elem_name(current).clone();
        if name.ns == Namespace::Html {
            return false;
        }

        if foreign::is_mathml_text_integration_point(name.ns, &name.local) {
            match *token {
                Token::Characters(..) | Token::NullCharacter => return false,
                Token::Tag(Tag {
                    kind: StartTag,
                    ref name,
                    ..
                }) if !matches!(&**name, "mglyph" | "malignmark") => {
                    return false;
                },
                _ => (),
            }
        }

        if name.ns == Namespace::Svg
            && foreign::is_html_integration_point(name.ns, &name.local, false)
        {
            match *token {
                Token::Characters(..) | Token::NullCharacter => return false,
                Token::Tag(Tag { kind: StartTag, .. }) => return false,
                _ => (),
            }
        }

        if name.ns == Namespace::MathMl && &*name.local == "annotation-xml" {
            if let Token::Tag(Tag {
                kind: StartTag,
                ref name,
                ..
            }) = *token
            {
                if &**name == "svg" {
                    return false;
                }
            }
            if matches!(
                *token,
                Token::Characters(..) | Token::NullCharacter | Token::Tag(Tag { kind: StartTag, .. })
            ) {
                return !self.doc.is_annotation_xml_integration_point(current);
            }
        }

        true
    }
    //§ END

    fn enter_foreign(&mut self, mut tag: Tag, ns: Namespace) -> ProcessResult {
        match ns {
            Namespace::MathMl => foreign::adjust_mathml_attributes(&mut tag),
            Namespace::Svg => foreign::adjust_svg_attributes(&mut tag),
            _ => (),
        }
        foreign::adjust_foreign_attributes(&mut tag);

        if tag.self_closing {
            self.insert_element(PushFlag::NoPush, ns, tag.name, tag.attrs);
            ProcessResult::DoneAckSelfClosing
        } else {
            self.insert_element(PushFlag::Push, ns, tag.name, tag.attrs);
            ProcessResult::Done
        }
    }

    fn foreign_start_tag(&mut self, mut tag: Tag) -> ProcessResult {
        let current_ns = self.doc.elem_name(self.adjusted_current_node()).ns;
        match current_ns {
            Namespace::MathMl => foreign::adjust_mathml_attributes(&mut tag),
            Namespace::Svg => {
                foreign::adjust_svg_tag_name(&mut tag);
                foreign::adjust_svg_attributes(&mut tag);
            },
            _ => (),
        }
        foreign::adjust_foreign_attributes(&mut tag);
        if tag.self_closing {
            self.insert_element(PushFlag::NoPush, current_ns, tag.name, tag.attrs);
            ProcessResult::DoneAckSelfClosing
        } else {
            self.insert_element(PushFlag::Push, current_ns, tag.name, tag.attrs);
            ProcessResult::Done
        }
    }

    fn unexpected_start_tag_in_foreign_content(&mut self, tag: Tag) -> ProcessResult {
        self.parse_error(ErrorCode::ForeignContentBreakout);
        while !self.current_node_in(|ns, name| {
            ns == Namespace::Html
                || foreign::is_mathml_text_integration_point(ns, name)
                || (ns == Namespace::Svg && foreign::is_html_integration_point(ns, name, false))
        }) {
            self.pop();
        }
        self.step(self.mode, Token::Tag(tag))
    }
}

impl TokenSink for TreeBuilder {
    fn process_token(&mut self, token: tokenizer::Token, position: Position) -> TokenSinkResult {
        self.position = position;
        let ignore_lf = std::mem::take(&mut self.ignore_lf);

        // Handle `Error` and `Doctype` tokens; convert everything else to
        // the local `Token` type.
        let token = match token {
            tokenizer::Token::Error(e) => {
                self.doc.parse_error(e);
                return TokenSinkResult::Continue;
            },

            tokenizer::Token::Doctype(dt) => {
                if self.mode == InsertionMode::Initial {
                    let (err, quirk) = data::doctype_error_and_quirks(&dt, self.opts.iframe_srcdoc);
                    if err {
                        self.parse_error(ErrorCode::UnexpectedBadDoctype);
                    }
                    let Doctype {
                        name,
                        public_id,
                        system_id,
                        force_quirks: _,
                    } = dt;
                    if !self.opts.drop_doctype {
                        self.doc.append_doctype(
                            name.unwrap_or_default(),
                            public_id.unwrap_or_default(),
                            system_id.unwrap_or_default(),
                        );
                    }
                    self.set_quirks_mode(quirk);

                    self.mode = InsertionMode::BeforeHtml;
                } else {
                    self.parse_error(ErrorCode::UnexpectedDoctype);
                }
                return TokenSinkResult::Continue;
            },

            tokenizer::Token::Tag(x) => Token::Tag(x),
            tokenizer::Token::Comment(x) => Token::Comment(x),
            tokenizer::Token::NullCharacter => Token::NullCharacter,
            tokenizer::Token::Eof => Token::Eof,

            tokenizer::Token::Characters(mut x) => {
                if ignore_lf && x.starts_with("\n") {
                    x.pop_front(1);
                }
                if x.is_empty() {
                    return TokenSinkResult::Continue;
                }
                Token::Characters(SplitStatus::NotSplit, x)
            },
        };

        self.process_to_completion(token)
    }

    fn end(&mut self) {
        self.open_elems.clear();
    }

    fn adjusted_current_node_in_foreign_content(&self) -> bool {
        !self.open_elems.is_empty()
            && self.doc.elem_name(self.adjusted_current_node()).ns != Namespace::Html
    }
}
