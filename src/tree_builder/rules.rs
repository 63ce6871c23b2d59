//! The tree builder rules: one function per insertion mode, with explicit
//! match arms on token kind and tag name.

use tendril::SliceExt;

use super::tag_sets::*;
use super::types::*;
use super::{foreign, TreeBuilder};

use crate::errors::ErrorCode;
use crate::interface::{LocalName, Namespace, QuirksMode};
use crate::tokenizer::states::{Rawtext, Rcdata, ScriptData};
use crate::tokenizer::{EndTag, StartTag, Tag};
use crate::util::str::any_not_whitespace;

use self::InsertionMode::*;
use self::ProcessResult::{Done, DoneAckSelfClosing, Reprocess, ToPlaintext};
use self::SplitStatus::{NotSplit, Whitespace};

impl TreeBuilder {
    pub(crate) fn step(&mut self, mode: InsertionMode, token: Token) -> ProcessResult {
        self.debug_step(mode, &token);

        match mode {
            Initial => self.process_initial(token),
            BeforeHtml => self.process_before_html(token),
            BeforeHead => self.process_before_head(token),
            InHead => self.process_in_head(token),
            InHeadNoscript => self.process_in_head_noscript(token),
            AfterHead => self.process_after_head(token),
            InBody => self.process_in_body(token),
            Text => self.process_text(token),
            InTable => self.process_in_table(token),
            InTableText => self.process_in_table_text(token),
            InCaption => self.process_in_caption(token),
            InColumnGroup => self.process_in_column_group(token),
            InTableBody => self.process_in_table_body(token),
            InRow => self.process_in_row(token),
            InCell => self.process_in_cell(token),
            InSelect => self.process_in_select(token),
            InSelectInTable => self.process_in_select_in_table(token),
            InTemplate => self.process_in_template(token),
            AfterBody => self.process_after_body(token),
            InFrameset => self.process_in_frameset(token),
            AfterFrameset => self.process_after_frameset(token),
            AfterAfterBody => self.process_after_after_body(token),
            AfterAfterFrameset => self.process_after_after_frameset(token),
        }
    }

    //§ the-initial-insertion-mode
    fn process_initial(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, _) => Done,
            Token::Comment(text) => self.append_comment_to_doc(text),
            token => {
                if !self.opts.iframe_srcdoc {
                    self.parse_error(ErrorCode::MissingDoctype);
                    self.set_quirks_mode(QuirksMode::Quirks);
                }
                Reprocess(BeforeHtml, token)
            },
        }
    }

    //§ the-before-html-insertion-mode
    fn process_before_html(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, _) => Done,
            Token::Comment(text) => self.append_comment_to_doc(text),
            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => {
                        self.create_root(tag.attrs);
                        self.mode = BeforeHead;
                        Done
                    },
                    (EndTag, "head" | "body" | "html" | "br") => {
                        self.before_html_anything(Token::Tag(tag))
                    },
                    (EndTag, _) => self.unexpected(&tag),
                    _ => self.before_html_anything(Token::Tag(tag)),
                }
            },
            token => self.before_html_anything(token),
        }
    }

    fn before_html_anything(&mut self, token: Token) -> ProcessResult {
        self.create_root(vec![]);
        Reprocess(BeforeHead, token)
    }

    //§ the-before-head-insertion-mode
    fn process_before_head(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, _) => Done,
            Token::Comment(text) => self.append_comment(text),
            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => self.step(InBody, Token::Tag(tag)),
                    (StartTag, "head") => {
                        self.head_elem = Some(self.insert_element_for(tag));
                        self.mode = InHead;
                        Done
                    },
                    (EndTag, "head" | "body" | "html" | "br") => {
                        self.before_head_anything(Token::Tag(tag))
                    },
                    (EndTag, _) => self.unexpected(&tag),
                    _ => self.before_head_anything(Token::Tag(tag)),
                }
            },
            token => self.before_head_anything(token),
        }
    }

    fn before_head_anything(&mut self, token: Token) -> ProcessResult {
        self.head_elem = Some(self.insert_phantom("head"));
        Reprocess(InHead, token)
    }

    //§ parsing-main-inhead
    fn process_in_head(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, text) => self.append_text(text),
            Token::Comment(text) => self.append_comment(text),
            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => self.step(InBody, Token::Tag(tag)),
                    (StartTag, "base" | "basefont" | "bgsound" | "link" | "meta") => {
                        self.insert_and_pop_element_for(tag);
                        DoneAckSelfClosing
                    },
                    (StartTag, "title") => self.parse_raw_data(tag, Rcdata),
                    (StartTag, "noframes" | "style" | "noscript") => {
                        if !self.opts.scripting_enabled && &*name == "noscript" {
                            self.insert_element_for(tag);
                            self.mode = InHeadNoscript;
                            Done
                        } else {
                            self.parse_raw_data(tag, Rawtext)
                        }
                    },
                    (StartTag, "script") => {
                        self.insert_element_for(tag);
                        self.to_raw_text_mode(ScriptData)
                    },
                    (EndTag, "head") => {
                        self.pop();
                        self.mode = AfterHead;
                        Done
                    },
                    (EndTag, "body" | "html" | "br") => self.in_head_anything(Token::Tag(tag)),
                    (StartTag, "template") => {
                        self.active_formatting.push(FormatEntry::Marker);
                        self.frameset_ok = false;
                        self.mode = InTemplate;
                        self.template_modes.push(InTemplate);
                        self.insert_element_for(tag);
                        Done
                    },
                    (EndTag, "template") => {
                        if !self.in_html_elem_named("template") {
                            self.unexpected(&tag);
                        } else {
                            self.generate_implied_end_tags(thorough_implied_end);
                            self.expect_to_close("template");
                            self.clear_active_formatting_to_marker();
                            self.template_modes.pop();
                            self.mode = self.reset_insertion_mode();
                        }
                        Done
                    },
                    (StartTag, "head") => self.unexpected(&tag),
                    (EndTag, _) => self.unexpected(&tag),
                    _ => self.in_head_anything(Token::Tag(tag)),
                }
            },
            token => self.in_head_anything(token),
        }
    }

    fn in_head_anything(&mut self, token: Token) -> ProcessResult {
        self.pop();
        Reprocess(AfterHead, token)
    }

    //§ parsing-main-inheadnoscript
    fn process_in_head_noscript(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, _) => self.step(InHead, token),
            Token::Comment(_) => self.step(InHead, token),
            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => self.step(InBody, Token::Tag(tag)),
                    (EndTag, "noscript") => {
                        self.pop();
                        self.mode = InHead;
                        Done
                    },
                    (
                        StartTag,
                        "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style",
                    ) => self.step(InHead, Token::Tag(tag)),
                    (EndTag, "br") => self.in_head_noscript_anything(Token::Tag(tag)),
                    (StartTag, "head" | "noscript") => self.unexpected(&tag),
                    (EndTag, _) => self.unexpected(&tag),
                    _ => self.in_head_noscript_anything(Token::Tag(tag)),
                }
            },
            token => self.in_head_noscript_anything(token),
        }
    }

    fn in_head_noscript_anything(&mut self, token: Token) -> ProcessResult {
        self.unexpected(&token);
        self.pop();
        Reprocess(InHead, token)
    }

    //§ the-after-head-insertion-mode
    fn process_after_head(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, text) => self.append_text(text),
            Token::Comment(text) => self.append_comment(text),
            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => self.step(InBody, Token::Tag(tag)),
                    (StartTag, "body") => {
                        self.insert_element_for(tag);
                        self.frameset_ok = false;
                        self.mode = InBody;
                        Done
                    },
                    (StartTag, "frameset") => {
                        self.insert_element_for(tag);
                        self.mode = InFrameset;
                        Done
                    },
                    (
                        StartTag,
                        "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                        | "style" | "template" | "title",
                    ) => {
                        self.unexpected(&tag);
                        let head = self.head_elem.expect("no head element");
                        self.push(head);
                        let result = self.step(InHead, Token::Tag(tag));
                        self.remove_from_stack(head);
                        result
                    },
                    (EndTag, "template") => self.step(InHead, Token::Tag(tag)),
                    (EndTag, "body" | "html" | "br") => self.after_head_anything(Token::Tag(tag)),
                    (StartTag, "head") => self.unexpected(&tag),
                    (EndTag, _) => self.unexpected(&tag),
                    _ => self.after_head_anything(Token::Tag(tag)),
                }
            },
            token => self.after_head_anything(token),
        }
    }

    fn after_head_anything(&mut self, token: Token) -> ProcessResult {
        self.insert_phantom("body");
        Reprocess(InBody, token)
    }

    //§ parsing-main-inbody
    fn process_in_body(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::NullCharacter => self.unexpected(&token),

            Token::Characters(_, text) => {
                self.reconstruct_active_formatting_elements();
                if any_not_whitespace(&text) {
                    self.frameset_ok = false;
                }
                self.append_text(text)
            },

            Token::Comment(text) => self.append_comment(text),

            Token::Eof => {
                if !self.template_modes.is_empty() {
                    self.step(InTemplate, token)
                } else {
                    self.check_body_end();
                    self.stop_parsing()
                }
            },

            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => {
                        self.unexpected(&tag);
                        if !self.in_html_elem_named("template") {
                            let top = self.html_elem();
                            self.doc.add_attrs_if_missing(top, tag.attrs);
                        }
                        Done
                    },

                    (
                        StartTag,
                        "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                        | "style" | "template" | "title",
                    )
                    | (EndTag, "template") => self.step(InHead, Token::Tag(tag)),

                    (StartTag, "body") => {
                        self.unexpected(&tag);
                        match self.body_elem() {
                            Some(node)
                                if self.open_elems.len() != 1
                                    && !self.in_html_elem_named("template") =>
                            {
                                self.frameset_ok = false;
                                self.doc.add_attrs_if_missing(node, tag.attrs);
                            },
                            _ => (),
                        }
                        Done
                    },

                    (StartTag, "frameset") => {
                        self.unexpected(&tag);
                        if !self.frameset_ok {
                            return Done;
                        }
                        let Some(body) = self.body_elem() else {
                            return Done;
                        };
                        self.doc.remove_from_parent(body);
                        self.open_elems.truncate(1);
                        self.insert_element_for(tag);
                        self.mode = InFrameset;
                        Done
                    },

                    (EndTag, "body") => {
                        if self.in_scope_named(default_scope, "body") {
                            self.check_body_end();
                            self.mode = AfterBody;
                        } else {
                            self.unexpected(&tag);
                        }
                        Done
                    },

                    (EndTag, "html") => {
                        if self.in_scope_named(default_scope, "body") {
                            self.check_body_end();
                            Reprocess(AfterBody, Token::Tag(tag))
                        } else {
                            self.unexpected(&tag)
                        }
                    },

                    (
                        StartTag,
                        "address" | "article" | "aside" | "blockquote" | "center" | "details"
                        | "dialog" | "dir" | "div" | "dl" | "fieldset" | "figcaption" | "figure"
                        | "footer" | "header" | "hgroup" | "main" | "menu" | "nav" | "ol" | "p"
                        | "search" | "section" | "summary" | "ul",
                    ) => {
                        self.close_p_element_in_button_scope();
                        self.insert_element_for(tag);
                        Done
                    },

                    (StartTag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                        self.close_p_element_in_button_scope();
                        if self.current_node_in(heading_tag) {
                            self.unexpected(&tag);
                            self.pop();
                        }
                        self.insert_element_for(tag);
                        Done
                    },

                    (StartTag, "pre" | "listing") => {
                        self.close_p_element_in_button_scope();
                        self.insert_element_for(tag);
                        self.ignore_lf = true;
                        self.frameset_ok = false;
                        Done
                    },

                    (StartTag, "form") => {
                        if self.form_elem.is_some() && !self.in_html_elem_named("template") {
                            self.unexpected(&tag);
                        } else {
                            self.close_p_element_in_button_scope();
                            let elem = self.insert_element_for(tag);
                            if !self.in_html_elem_named("template") {
                                self.form_elem = Some(elem);
                            }
                        }
                        Done
                    },

                    (StartTag, "li" | "dd" | "dt") => {
                        declare_tag_set!(close_list = "li");
                        declare_tag_set!(close_defn = "dd" | "dt");
                        fn extra_special(ns: Namespace, name: &str) -> bool {
                            special_tag(ns, name)
                                && !(ns == Namespace::Html
                                    && matches!(name, "address" | "div" | "p"))
                        }
                        let list = &*name == "li";

                        self.frameset_ok = false;

                        let mut to_close = None;
                        for &node in self.open_elems.iter().rev() {
                            let nname = self.doc.elem_name(node).clone();
                            let can_close = if list {
                                close_list(nname.ns, &nname.local)
                            } else {
                                close_defn(nname.ns, &nname.local)
                            };
                            if can_close {
                                to_close = Some(nname.local);
                                break;
                            }
                            if extra_special(nname.ns, &nname.local) {
                                break;
                            }
                        }

                        if let Some(name) = to_close {
                            self.generate_implied_end_except(&name);
                            self.expect_to_close(&name);
                        }

                        self.close_p_element_in_button_scope();
                        self.insert_element_for(tag);
                        Done
                    },

                    (StartTag, "plaintext") => {
                        self.close_p_element_in_button_scope();
                        self.insert_element_for(tag);
                        ToPlaintext
                    },

                    (StartTag, "button") => {
                        if self.in_scope_named(default_scope, "button") {
                            self.unexpected(&tag);
                            self.generate_implied_end_tags(cursory_implied_end);
                            self.pop_until_named("button");
                        }
                        self.reconstruct_active_formatting_elements();
                        self.insert_element_for(tag);
                        self.frameset_ok = false;
                        Done
                    },

                    (
                        EndTag,
                        "address" | "article" | "aside" | "blockquote" | "button" | "center"
                        | "details" | "dialog" | "dir" | "div" | "dl" | "fieldset" | "figcaption"
                        | "figure" | "footer" | "header" | "hgroup" | "listing" | "main" | "menu"
                        | "nav" | "ol" | "pre" | "search" | "section" | "summary" | "ul",
                    ) => {
                        if !self.in_scope_named(default_scope, &name) {
                            self.unexpected(&tag);
                        } else {
                            self.generate_implied_end_tags(cursory_implied_end);
                            self.expect_to_close(&name);
                        }
                        Done
                    },

                    (EndTag, "form") => {
                        if !self.in_html_elem_named("template") {
                            let Some(node) = self.form_elem.take() else {
                                self.unexpected(&tag);
                                return Done;
                            };
                            if !self.in_scope(default_scope, |n| n == node) {
                                self.unexpected(&tag);
                                return Done;
                            }
                            self.generate_implied_end_tags(cursory_implied_end);
                            let current = self.current_node();
                            self.remove_from_stack(node);
                            if current != node {
                                self.unexpected(&tag);
                            }
                        } else {
                            if !self.in_scope_named(default_scope, "form") {
                                self.unexpected(&tag);
                                return Done;
                            }
                            self.generate_implied_end_tags(cursory_implied_end);
                            if !self.current_node_named("form") {
                                self.unexpected(&tag);
                            }
                            self.pop_until_named("form");
                        }
                        Done
                    },

                    (EndTag, "p") => {
                        if !self.in_scope_named(button_scope, "p") {
                            self.unexpected(&tag);
                            self.insert_phantom("p");
                        }
                        self.close_p_element();
                        Done
                    },

                    (EndTag, "li" | "dd" | "dt") => {
                        let in_scope = if &*name == "li" {
                            self.in_scope_named(list_item_scope, &name)
                        } else {
                            self.in_scope_named(default_scope, &name)
                        };
                        if in_scope {
                            self.generate_implied_end_except(&name);
                            self.expect_to_close(&name);
                        } else {
                            self.unexpected(&tag);
                        }
                        Done
                    },

                    (EndTag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                        if self.in_scope(default_scope, |n| self.elem_in(n, heading_tag)) {
                            self.generate_implied_end_tags(cursory_implied_end);
                            if !self.current_node_named(&name) {
                                self.unexpected(&tag);
                            }
                            self.pop_until(heading_tag);
                        } else {
                            self.unexpected(&tag);
                        }
                        Done
                    },

                    (StartTag, "a") => {
                        self.handle_misnested_a_tags(&tag);
                        self.reconstruct_active_formatting_elements();
                        self.create_formatting_element_for(tag);
                        Done
                    },

                    (
                        StartTag,
                        "b" | "big" | "code" | "em" | "font" | "i" | "s" | "small" | "strike"
                        | "strong" | "tt" | "u",
                    ) => {
                        self.reconstruct_active_formatting_elements();
                        self.create_formatting_element_for(tag);
                        Done
                    },

                    (StartTag, "nobr") => {
                        self.reconstruct_active_formatting_elements();
                        if self.in_scope_named(default_scope, "nobr") {
                            self.unexpected(&tag);
                            self.adoption_agency(LocalName::from("nobr"));
                            self.reconstruct_active_formatting_elements();
                        }
                        self.create_formatting_element_for(tag);
                        Done
                    },

                    (
                        EndTag,
                        "a" | "b" | "big" | "code" | "em" | "font" | "i" | "nobr" | "s" | "small"
                        | "strike" | "strong" | "tt" | "u",
                    ) => {
                        self.adoption_agency(tag.name);
                        Done
                    },

                    (StartTag, "applet" | "marquee" | "object") => {
                        self.reconstruct_active_formatting_elements();
                        self.insert_element_for(tag);
                        self.active_formatting.push(FormatEntry::Marker);
                        self.frameset_ok = false;
                        Done
                    },

                    (EndTag, "applet" | "marquee" | "object") => {
                        if !self.in_scope_named(default_scope, &name) {
                            self.unexpected(&tag);
                        } else {
                            self.generate_implied_end_tags(cursory_implied_end);
                            self.expect_to_close(&name);
                            self.clear_active_formatting_to_marker();
                        }
                        Done
                    },

                    (StartTag, "table") => {
                        if self.quirks_mode != QuirksMode::Quirks {
                            self.close_p_element_in_button_scope();
                        }
                        self.insert_element_for(tag);
                        self.frameset_ok = false;
                        self.mode = InTable;
                        Done
                    },

                    (EndTag, "br") => {
                        self.unexpected(&tag);
                        self.step(
                            InBody,
                            Token::Tag(Tag {
                                kind: StartTag,
                                attrs: vec![],
                                ..tag
                            }),
                        )
                    },

                    (StartTag, "area" | "br" | "embed" | "img" | "keygen" | "wbr" | "input") => {
                        let keep_frameset_ok = &*name == "input" && self.is_type_hidden(&tag);
                        self.reconstruct_active_formatting_elements();
                        self.insert_and_pop_element_for(tag);
                        if !keep_frameset_ok {
                            self.frameset_ok = false;
                        }
                        DoneAckSelfClosing
                    },

                    (StartTag, "param" | "source" | "track") => {
                        self.insert_and_pop_element_for(tag);
                        DoneAckSelfClosing
                    },

                    (StartTag, "hr") => {
                        self.close_p_element_in_button_scope();
                        self.insert_and_pop_element_for(tag);
                        self.frameset_ok = false;
                        DoneAckSelfClosing
                    },

                    (StartTag, "image") => {
                        self.unexpected(&tag);
                        self.step(
                            InBody,
                            Token::Tag(Tag {
                                name: LocalName::from("img"),
                                ..tag
                            }),
                        )
                    },

                    (StartTag, "textarea") => {
                        self.ignore_lf = true;
                        self.frameset_ok = false;
                        self.parse_raw_data(tag, Rcdata)
                    },

                    (StartTag, "xmp") => {
                        self.close_p_element_in_button_scope();
                        self.reconstruct_active_formatting_elements();
                        self.frameset_ok = false;
                        self.parse_raw_data(tag, Rawtext)
                    },

                    (StartTag, "iframe") => {
                        self.frameset_ok = false;
                        self.parse_raw_data(tag, Rawtext)
                    },

                    (StartTag, "noembed") => self.parse_raw_data(tag, Rawtext),

                    (StartTag, "select") => {
                        self.reconstruct_active_formatting_elements();
                        self.insert_element_for(tag);
                        self.frameset_ok = false;
                        // NB: mode == InBody but possibly self.mode != mode,
                        // if we're processing "as in the rules for InBody".
                        self.mode = match self.mode {
                            InTable | InCaption | InTableBody | InRow | InCell => InSelectInTable,
                            _ => InSelect,
                        };
                        Done
                    },

                    (StartTag, "optgroup" | "option") => {
                        if self.current_node_named("option") {
                            self.pop();
                        }
                        self.reconstruct_active_formatting_elements();
                        self.insert_element_for(tag);
                        Done
                    },

                    (StartTag, "rb" | "rtc") => {
                        if self.in_scope_named(default_scope, "ruby") {
                            self.generate_implied_end_tags(cursory_implied_end);
                        }
                        if !self.current_node_named("ruby") {
                            self.unexpected(&tag);
                        }
                        self.insert_element_for(tag);
                        Done
                    },

                    (StartTag, "rp" | "rt") => {
                        if self.in_scope_named(default_scope, "ruby") {
                            self.generate_implied_end_except("rtc");
                        }
                        if !self.current_node_named("rtc") && !self.current_node_named("ruby") {
                            self.unexpected(&tag);
                        }
                        self.insert_element_for(tag);
                        Done
                    },

                    (StartTag, "math") => self.enter_foreign(tag, Namespace::MathMl),

                    (StartTag, "svg") => self.enter_foreign(tag, Namespace::Svg),

                    (
                        StartTag,
                        "caption" | "col" | "colgroup" | "frame" | "head" | "tbody" | "td"
                        | "tfoot" | "th" | "thead" | "tr",
                    ) => {
                        self.unexpected(&tag);
                        Done
                    },

                    (StartTag, _) => {
                        if self.opts.scripting_enabled && &*name == "noscript" {
                            self.parse_raw_data(tag, Rawtext)
                        } else {
                            self.reconstruct_active_formatting_elements();
                            self.insert_element_for(tag);
                            Done
                        }
                    },

                    (EndTag, _) => {
                        self.process_end_tag_in_body(tag);
                        Done
                    },
                }
            },
        }
    }

    //§ parsing-main-incdata
    fn process_text(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(_, text) => self.append_text(text),

            Token::Eof => {
                self.unexpected(&token);
                self.pop();
                Reprocess(self.orig_mode.take().unwrap(), token)
            },

            Token::Tag(Tag { kind: EndTag, .. }) => {
                self.pop();
                self.mode = self.orig_mode.take().unwrap();
                Done
            },

            // The spec doesn't say what to do here. Other tokens are
            // impossible?
            _ => panic!("impossible case in Text mode"),
        }
    }

    //§ parsing-main-intable
    fn process_in_table(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::NullCharacter | Token::Characters(..) => self.process_chars_in_table(token),

            Token::Comment(text) => self.append_comment(text),

            Token::Eof => self.step(InBody, token),

            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "caption") => {
                        self.pop_until_current(table_scope);
                        self.active_formatting.push(FormatEntry::Marker);
                        self.insert_element_for(tag);
                        self.mode = InCaption;
                        Done
                    },

                    (StartTag, "colgroup") => {
                        self.pop_until_current(table_scope);
                        self.insert_element_for(tag);
                        self.mode = InColumnGroup;
                        Done
                    },

                    (StartTag, "col") => {
                        self.pop_until_current(table_scope);
                        self.insert_phantom("colgroup");
                        Reprocess(InColumnGroup, Token::Tag(tag))
                    },

                    (StartTag, "tbody" | "tfoot" | "thead") => {
                        self.pop_until_current(table_scope);
                        self.insert_element_for(tag);
                        self.mode = InTableBody;
                        Done
                    },

                    (StartTag, "td" | "th" | "tr") => {
                        self.pop_until_current(table_scope);
                        self.insert_phantom("tbody");
                        Reprocess(InTableBody, Token::Tag(tag))
                    },

                    (StartTag, "table") => {
                        self.unexpected(&tag);
                        if self.in_scope_named(table_scope, "table") {
                            self.pop_until_named("table");
                            Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                        } else {
                            Done
                        }
                    },

                    (EndTag, "table") => {
                        if self.in_scope_named(table_scope, "table") {
                            self.pop_until_named("table");
                            self.mode = self.reset_insertion_mode();
                        } else {
                            self.unexpected(&tag);
                        }
                        Done
                    },

                    (
                        EndTag,
                        "body" | "caption" | "col" | "colgroup" | "html" | "tbody" | "td"
                        | "tfoot" | "th" | "thead" | "tr",
                    ) => self.unexpected(&tag),

                    (StartTag, "style" | "script" | "template") | (EndTag, "template") => {
                        self.step(InHead, Token::Tag(tag))
                    },

                    (StartTag, "input") => {
                        self.unexpected(&tag);
                        if self.is_type_hidden(&tag) {
                            self.insert_and_pop_element_for(tag);
                            DoneAckSelfClosing
                        } else {
                            self.foster_parent_in_body(Token::Tag(tag))
                        }
                    },

                    (StartTag, "form") => {
                        self.unexpected(&tag);
                        if !self.in_html_elem_named("template") && self.form_elem.is_none() {
                            self.form_elem = Some(self.insert_and_pop_element_for(tag));
                        }
                        Done
                    },

                    _ => {
                        self.unexpected(&tag);
                        self.foster_parent_in_body(Token::Tag(tag))
                    },
                }
            },
        }
    }

    //§ parsing-main-intabletext
    fn process_in_table_text(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::NullCharacter => self.unexpected(&token),

            Token::Characters(split, text) => {
                self.pending_table_text.push((split, text));
                Done
            },

            token => {
                let pending = std::mem::take(&mut self.pending_table_text);
                let contains_nonspace = pending.iter().any(|&(split, ref text)| match split {
                    SplitStatus::Whitespace => false,
                    SplitStatus::NotWhitespace => true,
                    SplitStatus::NotSplit => any_not_whitespace(text),
                });

                if contains_nonspace {
                    self.parse_error(ErrorCode::UnexpectedCharactersInTable);
                    for (split, text) in pending {
                        match self.foster_parent_in_body(Token::Characters(split, text)) {
                            Done => (),
                            _ => panic!("not prepared to handle this!"),
                        }
                    }
                } else {
                    for (_, text) in pending {
                        self.append_text(text);
                    }
                }

                Reprocess(self.orig_mode.take().unwrap(), token)
            },
        }
    }

    //§ parsing-main-incaption
    fn process_in_caption(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (
                        StartTag,
                        "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th"
                        | "thead" | "tr",
                    )
                    | (EndTag, "table" | "caption") => {
                        if self.in_scope_named(table_scope, "caption") {
                            self.generate_implied_end_tags(cursory_implied_end);
                            self.expect_to_close("caption");
                            self.clear_active_formatting_to_marker();
                            match (tag.kind, &*name) {
                                (EndTag, "caption") => {
                                    self.mode = InTable;
                                    Done
                                },
                                _ => Reprocess(InTable, Token::Tag(tag)),
                            }
                        } else {
                            self.unexpected(&tag);
                            Done
                        }
                    },

                    (
                        EndTag,
                        "body" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot" | "th"
                        | "thead" | "tr",
                    ) => self.unexpected(&tag),

                    _ => self.step(InBody, Token::Tag(tag)),
                }
            },
            token => self.step(InBody, token),
        }
    }

    //§ parsing-main-incolgroup
    fn process_in_column_group(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, text) => self.append_text(text),
            Token::Comment(text) => self.append_comment(text),

            Token::Eof => self.step(InBody, token),

            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => self.step(InBody, Token::Tag(tag)),

                    (StartTag, "col") => {
                        self.insert_and_pop_element_for(tag);
                        DoneAckSelfClosing
                    },

                    (EndTag, "colgroup") => {
                        if self.current_node_named("colgroup") {
                            self.pop();
                            self.mode = InTable;
                        } else {
                            self.unexpected(&tag);
                        }
                        Done
                    },

                    (EndTag, "col") => self.unexpected(&tag),

                    (StartTag, "template") | (EndTag, "template") => {
                        self.step(InHead, Token::Tag(tag))
                    },

                    _ => self.in_column_group_anything(Token::Tag(tag)),
                }
            },
            token => self.in_column_group_anything(token),
        }
    }

    fn in_column_group_anything(&mut self, token: Token) -> ProcessResult {
        if self.current_node_named("colgroup") {
            self.pop();
            Reprocess(InTable, token)
        } else {
            self.unexpected(&token)
        }
    }

    //§ parsing-main-intbody
    fn process_in_table_body(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "tr") => {
                        self.pop_until_current(table_body_context);
                        self.insert_element_for(tag);
                        self.mode = InRow;
                        Done
                    },

                    (StartTag, "th" | "td") => {
                        self.unexpected(&tag);
                        self.pop_until_current(table_body_context);
                        self.insert_phantom("tr");
                        Reprocess(InRow, Token::Tag(tag))
                    },

                    (EndTag, "tbody" | "tfoot" | "thead") => {
                        if self.in_scope_named(table_scope, &name) {
                            self.pop_until_current(table_body_context);
                            self.pop();
                            self.mode = InTable;
                        } else {
                            self.unexpected(&tag);
                        }
                        Done
                    },

                    (StartTag, "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead")
                    | (EndTag, "table") => {
                        declare_tag_set!(table_sections = "table" | "tbody" | "tfoot");
                        if self.in_scope(table_scope, |e| self.elem_in(e, table_sections)) {
                            self.pop_until_current(table_body_context);
                            self.pop();
                            Reprocess(InTable, Token::Tag(tag))
                        } else {
                            self.unexpected(&tag)
                        }
                    },

                    (
                        EndTag,
                        "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th" | "tr",
                    ) => self.unexpected(&tag),

                    _ => self.step(InTable, Token::Tag(tag)),
                }
            },
            token => self.step(InTable, token),
        }
    }

    //§ parsing-main-intr
    fn process_in_row(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "th" | "td") => {
                        self.pop_until_current(table_row_context);
                        self.insert_element_for(tag);
                        self.mode = InCell;
                        self.active_formatting.push(FormatEntry::Marker);
                        Done
                    },

                    (EndTag, "tr") => {
                        if self.in_scope_named(table_scope, "tr") {
                            self.pop_until_current(table_row_context);
                            let node = self.pop();
                            assert!(self.html_elem_named(node, "tr"));
                            self.mode = InTableBody;
                        } else {
                            self.unexpected(&tag);
                        }
                        Done
                    },

                    (StartTag, "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "tr")
                    | (EndTag, "table") => {
                        if self.in_scope_named(table_scope, "tr") {
                            self.pop_until_current(table_row_context);
                            let node = self.pop();
                            assert!(self.html_elem_named(node, "tr"));
                            Reprocess(InTableBody, Token::Tag(tag))
                        } else {
                            self.unexpected(&tag)
                        }
                    },

                    (EndTag, "tbody" | "tfoot" | "thead") => {
                        if self.in_scope_named(table_scope, &name) {
                            if self.in_scope_named(table_scope, "tr") {
                                self.pop_until_current(table_row_context);
                                let node = self.pop();
                                assert!(self.html_elem_named(node, "tr"));
                                Reprocess(InTableBody, Token::Tag(tag))
                            } else {
                                Done
                            }
                        } else {
                            self.unexpected(&tag)
                        }
                    },

                    (EndTag, "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th") => {
                        self.unexpected(&tag)
                    },

                    _ => self.step(InTable, Token::Tag(tag)),
                }
            },
            token => self.step(InTable, token),
        }
    }

    //§ parsing-main-intd
    fn process_in_cell(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (EndTag, "td" | "th") => {
                        if self.in_scope_named(table_scope, &name) {
                            self.generate_implied_end_tags(cursory_implied_end);
                            self.expect_to_close(&name);
                            self.clear_active_formatting_to_marker();
                            self.mode = InRow;
                        } else {
                            self.unexpected(&tag);
                        }
                        Done
                    },

                    (
                        StartTag,
                        "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th"
                        | "thead" | "tr",
                    ) => {
                        if self.in_scope(table_scope, |n| self.elem_in(n, td_th)) {
                            self.close_the_cell();
                            Reprocess(InRow, Token::Tag(tag))
                        } else {
                            self.unexpected(&tag)
                        }
                    },

                    (EndTag, "body" | "caption" | "col" | "colgroup" | "html") => {
                        self.unexpected(&tag)
                    },

                    (EndTag, "table" | "tbody" | "tfoot" | "thead" | "tr") => {
                        if self.in_scope_named(table_scope, &name) {
                            self.close_the_cell();
                            Reprocess(InRow, Token::Tag(tag))
                        } else {
                            self.unexpected(&tag)
                        }
                    },

                    _ => self.step(InBody, Token::Tag(tag)),
                }
            },
            token => self.step(InBody, token),
        }
    }

    //§ parsing-main-inselect
    fn process_in_select(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::NullCharacter => self.unexpected(&token),
            Token::Characters(_, text) => self.append_text(text),
            Token::Comment(text) => self.append_comment(text),
            Token::Eof => self.step(InBody, token),

            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => self.step(InBody, Token::Tag(tag)),

                    (StartTag, "option") => {
                        if self.current_node_named("option") {
                            self.pop();
                        }
                        self.insert_element_for(tag);
                        Done
                    },

                    (StartTag, "optgroup") => {
                        if self.current_node_named("option") {
                            self.pop();
                        }
                        if self.current_node_named("optgroup") {
                            self.pop();
                        }
                        self.insert_element_for(tag);
                        Done
                    },

                    (StartTag, "hr") => {
                        if self.current_node_named("option") {
                            self.pop();
                        }
                        if self.current_node_named("optgroup") {
                            self.pop();
                        }
                        self.insert_element_for(tag);
                        self.pop();
                        DoneAckSelfClosing
                    },

                    (EndTag, "optgroup") => {
                        if self.open_elems.len() >= 2
                            && self.current_node_named("option")
                            && self.html_elem_named(
                                self.open_elems[self.open_elems.len() - 2],
                                "optgroup",
                            )
                        {
                            self.pop();
                        }
                        if self.current_node_named("optgroup") {
                            self.pop();
                        } else {
                            self.unexpected(&tag);
                        }
                        Done
                    },

                    (EndTag, "option") => {
                        if self.current_node_named("option") {
                            self.pop();
                        } else {
                            self.unexpected(&tag);
                        }
                        Done
                    },

                    (StartTag, "select") | (EndTag, "select") => {
                        let in_scope = self.in_scope_named(select_scope, "select");

                        if !in_scope || tag.kind == StartTag {
                            self.unexpected(&tag);
                        }

                        if in_scope {
                            self.pop_until_named("select");
                            self.mode = self.reset_insertion_mode();
                        }
                        Done
                    },

                    (StartTag, "input" | "keygen" | "textarea") => {
                        self.unexpected(&tag);
                        if self.in_scope_named(select_scope, "select") {
                            self.pop_until_named("select");
                            Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                        } else {
                            Done
                        }
                    },

                    (StartTag, "script" | "template") | (EndTag, "template") => {
                        self.step(InHead, Token::Tag(tag))
                    },

                    _ => self.unexpected(&tag),
                }
            },
        }
    }

    //§ parsing-main-inselectintable
    fn process_in_select_in_table(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (
                        StartTag,
                        "caption" | "table" | "tbody" | "tfoot" | "thead" | "tr" | "td" | "th",
                    ) => {
                        self.unexpected(&tag);
                        self.pop_until_named("select");
                        Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                    },

                    (
                        EndTag,
                        "caption" | "table" | "tbody" | "tfoot" | "thead" | "tr" | "td" | "th",
                    ) => {
                        self.unexpected(&tag);
                        if self.in_scope_named(table_scope, &name) {
                            self.pop_until_named("select");
                            Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                        } else {
                            Done
                        }
                    },

                    _ => self.step(InSelect, Token::Tag(tag)),
                }
            },
            token => self.step(InSelect, token),
        }
    }

    //§ parsing-main-intemplate
    fn process_in_template(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(_, _) | Token::Comment(_) => self.step(InBody, token),

            Token::Eof => {
                if !self.in_html_elem_named("template") {
                    self.stop_parsing()
                } else {
                    self.unexpected(&token);
                    self.pop_until_named("template");
                    self.clear_active_formatting_to_marker();
                    self.template_modes.pop();
                    let mode = self.reset_insertion_mode();
                    self.mode = mode;
                    Reprocess(mode, token)
                }
            },

            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (
                        StartTag,
                        "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                        | "style" | "template" | "title",
                    )
                    | (EndTag, "template") => self.step(InHead, Token::Tag(tag)),

                    (StartTag, "caption" | "colgroup" | "tbody" | "tfoot" | "thead") => {
                        self.template_modes.pop();
                        self.template_modes.push(InTable);
                        Reprocess(InTable, Token::Tag(tag))
                    },

                    (StartTag, "col") => {
                        self.template_modes.pop();
                        self.template_modes.push(InColumnGroup);
                        Reprocess(InColumnGroup, Token::Tag(tag))
                    },

                    (StartTag, "tr") => {
                        self.template_modes.pop();
                        self.template_modes.push(InTableBody);
                        Reprocess(InTableBody, Token::Tag(tag))
                    },

                    (StartTag, "td" | "th") => {
                        self.template_modes.pop();
                        self.template_modes.push(InRow);
                        Reprocess(InRow, Token::Tag(tag))
                    },

                    (StartTag, _) => {
                        self.template_modes.pop();
                        self.template_modes.push(InBody);
                        Reprocess(InBody, Token::Tag(tag))
                    },

                    (EndTag, _) => self.unexpected(&tag),
                }
            },

            token => self.unexpected(&token),
        }
    }

    //§ parsing-main-afterbody
    fn process_after_body(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, _) => self.step(InBody, token),
            Token::Comment(text) => self.append_comment_to_html(text),
            Token::Eof => self.stop_parsing(),

            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => self.step(InBody, Token::Tag(tag)),

                    (EndTag, "html") => {
                        if self.is_fragment() {
                            self.unexpected(&tag);
                        } else {
                            self.mode = AfterAfterBody;
                        }
                        Done
                    },

                    _ => {
                        self.unexpected(&tag);
                        Reprocess(InBody, Token::Tag(tag))
                    },
                }
            },

            token => {
                self.unexpected(&token);
                Reprocess(InBody, token)
            },
        }
    }

    //§ parsing-main-inframeset
    fn process_in_frameset(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, text) => self.append_text(text),
            Token::Comment(text) => self.append_comment(text),

            Token::Eof => {
                if self.open_elems.len() != 1 {
                    self.unexpected(&token);
                }
                self.stop_parsing()
            },

            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => self.step(InBody, Token::Tag(tag)),

                    (StartTag, "frameset") => {
                        self.insert_element_for(tag);
                        Done
                    },

                    (EndTag, "frameset") => {
                        if self.open_elems.len() == 1 {
                            self.unexpected(&tag);
                        } else {
                            self.pop();
                            if !self.is_fragment() && !self.current_node_named("frameset") {
                                self.mode = AfterFrameset;
                            }
                        }
                        Done
                    },

                    (StartTag, "frame") => {
                        self.insert_and_pop_element_for(tag);
                        DoneAckSelfClosing
                    },

                    (StartTag, "noframes") => self.step(InHead, Token::Tag(tag)),

                    _ => self.unexpected(&tag),
                }
            },

            token => self.unexpected(&token),
        }
    }

    //§ parsing-main-afterframeset
    fn process_after_frameset(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, text) => self.append_text(text),
            Token::Comment(text) => self.append_comment(text),
            Token::Eof => self.stop_parsing(),

            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => self.step(InBody, Token::Tag(tag)),

                    (EndTag, "html") => {
                        self.mode = AfterAfterFrameset;
                        Done
                    },

                    (StartTag, "noframes") => self.step(InHead, Token::Tag(tag)),

                    _ => self.unexpected(&tag),
                }
            },

            token => self.unexpected(&token),
        }
    }

    //§ the-after-after-body-insertion-mode
    fn process_after_after_body(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, _) => self.step(InBody, token),
            Token::Comment(text) => self.append_comment_to_doc(text),
            Token::Eof => self.stop_parsing(),

            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => self.step(InBody, Token::Tag(tag)),
                    _ => {
                        self.unexpected(&tag);
                        Reprocess(InBody, Token::Tag(tag))
                    },
                }
            },

            token => {
                self.unexpected(&token);
                Reprocess(InBody, token)
            },
        }
    }

    //§ the-after-after-frameset-insertion-mode
    fn process_after_after_frameset(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::Characters(NotSplit, text) => ProcessResult::SplitWhitespace(text),
            Token::Characters(Whitespace, _) => self.step(InBody, token),
            Token::Comment(text) => self.append_comment_to_doc(text),
            Token::Eof => self.stop_parsing(),

            Token::Tag(tag) => {
                let name = tag.name.clone();
                match (tag.kind, &*name) {
                    (StartTag, "html") => self.step(InBody, Token::Tag(tag)),
                    (StartTag, "noframes") => self.step(InHead, Token::Tag(tag)),
                    _ => self.unexpected(&tag),
                }
            },

            token => self.unexpected(&token),
        }
    }
    //§ END

    //§ parsing-main-inforeign
    pub(crate) fn step_foreign(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::NullCharacter => {
                self.unexpected(&token);
                self.append_text("\u{fffd}".to_tendril())
            },

            Token::Characters(_, text) => {
                if any_not_whitespace(&text) {
                    self.frameset_ok = false;
                }
                self.append_text(text)
            },

            Token::Comment(text) => self.append_comment(text),

            Token::Tag(tag) => match tag.kind {
                StartTag => {
                    if foreign::is_breakout_tag(&tag) {
                        self.unexpected_start_tag_in_foreign_content(tag)
                    } else {
                        self.foreign_start_tag(tag)
                    }
                },

                EndTag if matches!(&*tag.name, "br" | "p") => {
                    self.unexpected_start_tag_in_foreign_content(tag)
                },

                EndTag => {
                    let mut first = true;
                    let mut stack_idx = self.open_elems.len() - 1;
                    loop {
                        if stack_idx == 0 {
                            return Done;
                        }

                        let node = self.open_elems[stack_idx];
                        let node_name = self.doc.elem_name(node).clone();
                        let html = node_name.ns == Namespace::Html;
                        let eq = node_name.local.eq_ignore_ascii_case(&tag.name);

                        if !first && html {
                            let mode = self.mode;
                            return self.step(mode, Token::Tag(tag));
                        }

                        if eq {
                            self.open_elems.truncate(stack_idx);
                            return Done;
                        }

                        if first {
                            self.unexpected(&tag);
                            first = false;
                        }
                        stack_idx -= 1;
                    }
                },
            },

            Token::Eof => panic!("impossible case in foreign content"),
        }
    }
}
