//! Fragment parsing: content parsed as if inside a context element, with
//! the tokenizer primed for raw-text contexts.

use pretty_assertions::assert_eq;

use html5tree::serialize::to_test_format;
use html5tree::{parse_fragment, FragmentContext, ParseOpts};

fn parse_in(context: &str, input: &str) -> String {
    let doc = parse_fragment(input, FragmentContext::html(context), ParseOpts::default());
    doc.assert_consistent();
    to_test_format(&doc)
}

#[test]
fn div_context() {
    assert_eq!(parse_in("div", "<b>x"), "| <b>\n|   \"x\"\n");
}

#[test]
fn body_structure_tags_are_ignored_in_div() {
    assert_eq!(
        parse_in("div", "<html><body><p>a"),
        "| <p>\n|   \"a\"\n"
    );
}

#[test]
fn title_context_is_rcdata() {
    // Markup stays literal, entities still decode.
    assert_eq!(parse_in("title", "a<b>&amp;"), "| \"a<b>&\"\n");
}

#[test]
fn script_context_is_raw() {
    assert_eq!(parse_in("script", "a<b>&amp;"), "| \"a<b>&amp;\"\n");
}

#[test]
fn plaintext_context() {
    assert_eq!(parse_in("plaintext", "a</plaintext>b"), "| \"a</plaintext>b\"\n");
}

#[test]
fn td_context_parses_table_content() {
    assert_eq!(
        parse_in("td", "<table><tr><td>c"),
        "\
| <table>
|   <tbody>
|     <tr>
|       <td>
|         \"c\"
"
    );
}

#[test]
fn tr_context_creates_cells() {
    assert_eq!(
        parse_in("tr", "<td>a<td>b"),
        "\
| <td>
|   \"a\"
| <td>
|   \"b\"
"
    );
}

#[test]
fn template_context_uses_template_insertion_mode() {
    assert_eq!(parse_in("template", "<td>t"), "| <td>\n|   \"t\"\n");
}

#[test]
fn raw_end_tag_must_match_context() {
    // </textarea> ends the raw text; other end tags stay literal. The text
    // on either side of the stray end tag lands in one node.
    assert_eq!(
        parse_in("textarea", "a</div>b</textarea>c"),
        "| \"a</div>bc\"\n"
    );
}
