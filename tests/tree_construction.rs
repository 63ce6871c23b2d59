//! End-to-end tree construction tests, checked against the html5lib
//! tree-construction test format.

use pretty_assertions::assert_eq;

use html5tree::serialize::to_test_format;
use html5tree::{parse_document, ParseOpts};

fn parse(input: &str) -> String {
    let doc = parse_document(input, ParseOpts::default());
    doc.assert_consistent();
    to_test_format(&doc)
}

#[test]
fn empty_document() {
    assert_eq!(parse(""), "| <html>\n|   <head>\n|   <body>\n");
}

#[test]
fn doctype_and_paragraph() {
    assert_eq!(
        parse("<!DOCTYPE html><p>hi</p>"),
        "\
| <!DOCTYPE html>
| <html>
|   <head>
|   <body>
|     <p>
|       \"hi\"
"
    );
}

#[test]
fn lone_less_than_becomes_text() {
    assert_eq!(parse("<"), "| <html>\n|   <head>\n|   <body>\n|     \"<\"\n");
    assert_eq!(
        parse("</"),
        "| <html>\n|   <head>\n|   <body>\n|     \"</\"\n"
    );
}

#[test]
fn empty_comment() {
    assert_eq!(
        parse("<!---->x"),
        "\
| <!--  -->
| <html>
|   <head>
|   <body>
|     \"x\"
"
    );
}

#[test]
fn adoption_agency_simple() {
    assert_eq!(
        parse("<b><p>X</b></p>"),
        "\
| <html>
|   <head>
|   <body>
|     <b>
|     <p>
|       <b>
|         \"X\"
"
    );
}

#[test]
fn adoption_agency_reopens_formatting_in_new_paragraph() {
    assert_eq!(
        parse("<p><b>1<p>2</b>3"),
        "\
| <html>
|   <head>
|   <body>
|     <p>
|       <b>
|         \"1\"
|     <p>
|       <b>
|         \"2\"
|       \"3\"
"
    );
}

#[test]
fn misnested_anchors() {
    assert_eq!(
        parse("<a>1<a>2"),
        "\
| <html>
|   <head>
|   <body>
|     <a>
|       \"1\"
|     <a>
|       \"2\"
"
    );
}

#[test]
fn nested_formatting_elements() {
    assert_eq!(
        parse("<b><b>x"),
        "\
| <html>
|   <head>
|   <body>
|     <b>
|       <b>
|         \"x\"
"
    );
}

#[test]
fn table_with_foster_parented_formatting() {
    assert_eq!(
        parse("<table><b>X</b><tr><td>Y</table>"),
        "\
| <html>
|   <head>
|   <body>
|     <b>
|       \"X\"
|     <table>
|       <tbody>
|         <tr>
|           <td>
|             \"Y\"
"
    );
}

#[test]
fn table_text_foster_parents_nonspace() {
    assert_eq!(
        parse("<table>x<td>y</table>"),
        "\
| <html>
|   <head>
|   <body>
|     \"x\"
|     <table>
|       <tbody>
|         <tr>
|           <td>
|             \"y\"
"
    );
}

#[test]
fn table_whitespace_stays_in_table() {
    assert_eq!(
        parse("<table> </table>"),
        "\
| <html>
|   <head>
|   <body>
|     <table>
|       \" \"
"
    );
}

#[test]
fn svg_foreign_object_hosts_html() {
    assert_eq!(
        parse("<svg><foreignObject><p>x</p></foreignObject></svg>"),
        "\
| <html>
|   <head>
|   <body>
|     <svg svg>
|       <svg foreignObject>
|         <p>
|           \"x\"
"
    );
}

#[test]
fn svg_tag_names_are_case_adjusted() {
    assert_eq!(
        parse("<svg><clippath></clippath><lineargradient>"),
        "\
| <html>
|   <head>
|   <body>
|     <svg svg>
|       <svg clipPath>
|       <svg linearGradient>
"
    );
}

#[test]
fn svg_namespaced_attributes() {
    assert_eq!(
        parse("<svg xlink:href=\"#x\"></svg>"),
        "\
| <html>
|   <head>
|   <body>
|     <svg svg>
|       xlink href=\"#x\"
"
    );
}

#[test]
fn mathml_text_integration_point() {
    assert_eq!(
        parse("<math><mi>x</mi></math>"),
        "\
| <html>
|   <head>
|   <body>
|     <math math>
|       <math mi>
|         \"x\"
"
    );
}

#[test]
fn annotation_xml_with_html_encoding() {
    assert_eq!(
        parse("<math><annotation-xml encoding=\"text/html\"><div>d</div></annotation-xml></math>"),
        "\
| <html>
|   <head>
|   <body>
|     <math math>
|       <math annotation-xml>
|         encoding=\"text/html\"
|         <div>
|           \"d\"
"
    );
}

#[test]
fn html_breakout_from_svg() {
    assert_eq!(
        parse("<svg><p>x"),
        "\
| <html>
|   <head>
|   <body>
|     <svg svg>
|     <p>
|       \"x\"
"
    );
}

#[test]
fn plaintext_swallows_everything() {
    assert_eq!(
        parse("<plaintext>a<b>"),
        "\
| <html>
|   <head>
|   <body>
|     <plaintext>
|       \"a<b>\"
"
    );
}

#[test]
fn entities_decode_in_body_text() {
    assert_eq!(
        parse("&amp;&notit;&#x41;&#99999999;"),
        "\
| <html>
|   <head>
|   <body>
|     \"&\u{ac}it;A\u{fffd}\"
"
    );
}

#[test]
fn title_is_rcdata() {
    assert_eq!(
        parse("<!DOCTYPE html><title>A &amp; B</title>"),
        "\
| <!DOCTYPE html>
| <html>
|   <head>
|     <title>
|       \"A & B\"
|   <body>
"
    );
}

#[test]
fn script_double_escaping() {
    assert_eq!(
        parse("<script><!--<script>a</script>--></script>"),
        "\
| <html>
|   <head>
|     <script>
|       \"<!--<script>a</script>-->\"
|   <body>
"
    );
}

#[test]
fn template_contents_are_a_fragment() {
    assert_eq!(
        parse("<template><td>x</td></template>"),
        "\
| <html>
|   <head>
|     <template>
|       content
|         <td>
|           \"x\"
|   <body>
"
    );
}

#[test]
fn select_in_table_closed_by_cell() {
    assert_eq!(
        parse("<table><tr><td><select><td>x"),
        "\
| <html>
|   <head>
|   <body>
|     <table>
|       <tbody>
|         <tr>
|           <td>
|             <select>
|           <td>
|             \"x\"
"
    );
}

#[test]
fn frameset_document() {
    assert_eq!(
        parse("<!DOCTYPE html><frameset><frame></frameset>"),
        "\
| <!DOCTYPE html>
| <html>
|   <head>
|   <frameset>
|     <frame>
"
    );
}

#[test]
fn attributes_sort_lexicographically() {
    assert_eq!(
        parse("<p id=\"b\" class=\"a\">"),
        "\
| <html>
|   <head>
|   <body>
|     <p>
|       class=\"a\"
|       id=\"b\"
"
    );
}

#[test]
fn comment_before_html_goes_on_document() {
    assert_eq!(
        parse("<!--x--><p>a"),
        "\
| <!-- x -->
| <html>
|   <head>
|   <body>
|     <p>
|       \"a\"
"
    );
}

#[test]
fn quirks_mode_table_does_not_close_p() {
    use html5tree::QuirksMode;

    let quirky = parse_document("<p><table>", ParseOpts::default());
    assert_eq!(quirky.quirks_mode, QuirksMode::Quirks);
    assert_eq!(
        to_test_format(&quirky),
        "\
| <html>
|   <head>
|   <body>
|     <p>
|       <table>
"
    );

    let standard = parse_document("<!DOCTYPE html><p><table>", ParseOpts::default());
    assert_eq!(standard.quirks_mode, QuirksMode::NoQuirks);
    assert_eq!(
        to_test_format(&standard),
        "\
| <!DOCTYPE html>
| <html>
|   <head>
|   <body>
|     <p>
|     <table>
"
    );
}

#[test]
fn noscript_depends_on_scripting_flag() {
    assert_eq!(
        parse("<!DOCTYPE html><body><noscript><p>x"),
        "\
| <!DOCTYPE html>
| <html>
|   <head>
|   <body>
|     <noscript>
|       \"<p>x\"
"
    );

    let mut opts = ParseOpts::default();
    opts.tree_builder.scripting_enabled = false;
    let doc = parse_document("<!DOCTYPE html><body><noscript><p>x", opts);
    assert_eq!(
        to_test_format(&doc),
        "\
| <!DOCTYPE html>
| <html>
|   <head>
|   <body>
|     <noscript>
|       <p>
|         \"x\"
"
    );
}

#[test]
fn doctype_with_ids_serializes_both() {
    assert_eq!(
        parse("<!DOCTYPE html PUBLIC \"a\" \"b\">x"),
        "\
| <!DOCTYPE html \"a\" \"b\">
| <html>
|   <head>
|   <body>
|     \"x\"
"
    );
}

#[test]
fn no_adjacent_text_nodes() {
    use html5tree::dom::NodeData;

    let doc = parse_document("a<!--c-->b<b>d</b>e", ParseOpts::default());
    // No two adjacent children may both be text.
    fn walk(doc: &html5tree::dom::Document, id: html5tree::dom::NodeId) {
        let children = &doc[id].children;
        for pair in children.windows(2) {
            let both_text = matches!(doc[pair[0]].data, NodeData::Text { .. })
                && matches!(doc[pair[1]].data, NodeData::Text { .. });
            assert!(!both_text, "adjacent text nodes");
        }
        for &child in children {
            walk(doc, child);
        }
    }
    walk(&doc, doc.root());
}

#[test]
fn positions_are_tracked_when_enabled() {
    use html5tree::dom::NodeData;

    let mut opts = ParseOpts::default();
    opts.tree_builder.track_positions = true;
    let doc = parse_document("<!DOCTYPE html>\n<p>x", opts);

    fn find_p(doc: &html5tree::dom::Document, id: html5tree::dom::NodeId) -> Option<html5tree::dom::NodeId> {
        if let NodeData::Element { name, .. } = &doc[id].data {
            if &*name.local == "p" {
                return Some(id);
            }
        }
        doc[id].children.iter().find_map(|&c| find_p(doc, c))
    }

    let p = find_p(&doc, doc.root()).expect("no <p> parsed");
    let position = doc[p].position.expect("position not tracked");
    assert_eq!(position.line, 2);
}

#[test]
fn error_collection_records_positions() {
    use html5tree::ErrorCode;

    let doc = parse_document("<!DOCTYPE html>\n<p x=1 x=2>", ParseOpts::collecting_errors());
    assert!(doc
        .errors
        .iter()
        .any(|e| e.code == ErrorCode::DuplicateAttribute && e.position.line == 2));

    let clean = parse_document("<!DOCTYPE html><p>ok</p>", ParseOpts::collecting_errors());
    assert!(clean.errors.is_empty(), "errors: {:?}", clean.errors);
}
