//! High-level parsing entry points.

use crate::dom::Document;
use crate::errors::ParseError;
use crate::tokenizer::{Tokenizer, TokenizerOpts};
use crate::tree_builder::{FragmentContext, TreeBuilder, TreeBuilderOpts};

/// All parser options in one place.
#[derive(Clone, Default)]
pub struct ParseOpts {
    /// Tokenizer options.
    pub tokenizer: TokenizerOpts,

    /// Tree builder options.
    pub tree_builder: TreeBuilderOpts,
}

impl ParseOpts {
    /// Options with parse-error collection switched on everywhere.
    pub fn collecting_errors() -> ParseOpts {
        ParseOpts {
            tokenizer: TokenizerOpts {
                collect_errors: true,
                ..Default::default()
            },
            tree_builder: TreeBuilderOpts {
                collect_errors: true,
                ..Default::default()
            },
        }
    }
}

/// Parse a complete document.
///
/// Never fails: malformed input always yields some tree. Enable error
/// collection in `opts` to see what was wrong with the input.
pub fn parse_document(input: &str, opts: ParseOpts) -> Document {
    let tb = TreeBuilder::new(opts.tree_builder);
    let mut tok = Tokenizer::new(tb, opts.tokenizer);
    tok.run(input);
    tok.into_sink().finish()
}

/// Parse a complete document, failing on the first parse error.
///
/// The whole input is still consumed; the error returned is the first one
/// encountered in source order.
pub fn parse_document_strict(input: &str, mut opts: ParseOpts) -> Result<Document, ParseError> {
    opts.tokenizer.collect_errors = true;
    opts.tree_builder.collect_errors = true;
    let doc = parse_document(input, opts);
    match doc.errors.first() {
        Some(&err) => Err(err),
        None => Ok(doc),
    }
}

/// Parse a fragment as if it were the content of `context`.
///
/// The returned document's `fragment` node holds the parsed children. The
/// tokenizer starts in the raw-text or PLAINTEXT state when the context
/// element demands it.
pub fn parse_fragment(input: &str, context: FragmentContext, opts: ParseOpts) -> Document {
    let tb = TreeBuilder::new_for_fragment(opts.tree_builder, context);

    let mut tok_opts = opts.tokenizer;
    tok_opts.initial_state = Some(tb.tokenizer_state_for_context_elem());
    tok_opts.last_start_tag_name = tb.context_elem_name();

    let mut tok = Tokenizer::new(tb, tok_opts);
    tok.run(input);
    tok.into_sink().finish_fragment()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn empty_input_builds_skeleton() {
        let doc = parse_document("", ParseOpts::default());
        let html = crate::serialize::to_test_format(&doc);
        assert_eq!(html, "| <html>\n|   <head>\n|   <body>\n");
    }

    #[test]
    fn strict_mode_reports_first_error() {
        // The duplicate attribute is flagged while the tag is still being
        // tokenized, before the tree builder can complain about the
        // missing doctype.
        let err = parse_document_strict("<p x=1 x=2>", ParseOpts::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateAttribute);

        assert!(parse_document_strict("<!DOCTYPE html><p>ok</p>", ParseOpts::default()).is_ok());
    }

    #[test]
    fn fragment_in_div_context() {
        let doc = parse_fragment("<b>x", FragmentContext::html("div"), ParseOpts::default());
        let out = crate::serialize::to_test_format(&doc);
        assert_eq!(out, "| <b>\n|   \"x\"\n");
    }
}
