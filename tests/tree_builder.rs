// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end tree construction: parse a string, compare the html5lib-style
//! dump of the resulting tree.

mod common;

use common::{dump, dump_fragment};

use canopy::{
    parse_document, parse_fragment, ErrorKind, Namespace, NodeData, ParseOpts, ParseStatus,
    Parser, QuirksMode, Tag,
};

fn parse(input: &str) -> canopy::ParseOutput {
    parse_document(input, ParseOpts::default())
}

fn assert_tree(input: &str, expected: &str) {
    let output = parse(input);
    assert_eq!(dump(&output.document), expected, "for input {input:?}");
}

#[test]
fn simple_document() {
    // A conforming document parses without diagnostics.
    let output = parse("<!DOCTYPE html><p>hi</p>");
    assert_eq!(
        dump(&output.document),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <p>\n\
         |       \"hi\"\n"
    );
    assert_eq!(output.errors, vec![]);
    assert_eq!(output.quirks_mode(), QuirksMode::NoQuirks);
}

#[test]
fn missing_doctype_still_builds_the_tree() {
    let output = parse("<p>hi</p>");
    assert_eq!(
        dump(&output.document),
        "| <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <p>\n\
         |       \"hi\"\n"
    );
    // The only diagnostic is the missing DOCTYPE.
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.quirks_mode(), QuirksMode::Quirks);
}

#[test]
fn implied_head_and_body() {
    assert_tree(
        "<!DOCTYPE html>x",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     \"x\"\n",
    );
}

#[test]
fn head_contents() {
    assert_tree(
        "<!DOCTYPE html><title>t</title><meta charset=utf-8><body>x",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |     <title>\n\
         |       \"t\"\n\
         |     <meta>\n\
         |       charset=\"utf-8\"\n\
         |   <body>\n\
         |     \"x\"\n",
    );
}

#[test]
fn paragraphs_close_implicitly() {
    let output = parse("<!DOCTYPE html><html><body><p>a<p>b</body>");
    assert_eq!(
        dump(&output.document),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <p>\n\
         |       \"a\"\n\
         |     <p>\n\
         |       \"b\"\n"
    );
    assert_eq!(output.errors, vec![]);
}

#[test]
fn foster_parenting() {
    // The <a> is foster-parented before the table.
    let output = parse("<!DOCTYPE html><table><a>x</a></table>");
    assert_eq!(
        dump(&output.document),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <a>\n\
         |       \"x\"\n\
         |     <table>\n"
    );
    assert!(!output.errors.is_empty());
}

#[test]
fn adoption_agency_reconstructs_formatting() {
    assert_tree(
        "<!DOCTYPE html><b><i>x</b>y</i>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <b>\n\
         |       <i>\n\
         |         \"x\"\n\
         |     <i>\n\
         |       \"y\"\n",
    );
}

#[test]
fn adoption_agency_with_furthest_block() {
    assert_tree(
        "<!DOCTYPE html><b>1<p>2</b>3</p>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <b>\n\
         |       \"1\"\n\
         |     <p>\n\
         |       <b>\n\
         |         \"2\"\n\
         |       \"3\"\n",
    );
}

#[test]
fn adoption_agency_terminates_on_pathological_input() {
    // Deep misnesting exercises the 8x3 iteration caps; success here is
    // termination with a well-formed tree.
    let mut input = String::from("<!DOCTYPE html>");
    for _ in 0..20 {
        input.push_str("<b><i><a>");
    }
    input.push('x');
    for _ in 0..20 {
        input.push_str("</b></i></a>");
    }
    let output = parse_document(&input, ParseOpts::default());
    assert!(dump(&output.document).contains("\"x\""));
}

#[test]
fn table_structure_is_implied() {
    assert_tree(
        "<!DOCTYPE html><table><td>x</td></table>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <table>\n\
         |       <tbody>\n\
         |         <tr>\n\
         |           <td>\n\
         |             \"x\"\n",
    );
}

#[test]
fn table_with_caption_and_sections() {
    assert_tree(
        "<!DOCTYPE html><table><caption>c</caption><thead><tr><th>h</table>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <table>\n\
         |       <caption>\n\
         |         \"c\"\n\
         |       <thead>\n\
         |         <tr>\n\
         |           <th>\n\
         |             \"h\"\n",
    );
}

#[test]
fn select_in_table_closes_on_table_tags() {
    assert_tree(
        "<!DOCTYPE html><table><tr><td><select><tr>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <table>\n\
         |       <tbody>\n\
         |         <tr>\n\
         |           <td>\n\
         |             <select>\n\
         |         <tr>\n",
    );
}

#[test]
fn select_drops_unexpected_markup() {
    assert_tree(
        "<!DOCTYPE html><select><option>a<option>b</select>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <select>\n\
         |       <option>\n\
         |         \"a\"\n\
         |       <option>\n\
         |         \"b\"\n",
    );
}

#[test]
fn list_items_close_each_other() {
    assert_tree(
        "<!DOCTYPE html><ul><li>a<li>b</ul>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <ul>\n\
         |       <li>\n\
         |         \"a\"\n\
         |       <li>\n\
         |         \"b\"\n",
    );
}

#[test]
fn definition_list_items_close_each_other() {
    assert_tree(
        "<!DOCTYPE html><dl><dt>t<dd>d</dl>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <dl>\n\
         |       <dt>\n\
         |         \"t\"\n\
         |       <dd>\n\
         |         \"d\"\n",
    );
}

#[test]
fn headings_do_not_nest() {
    let output = parse("<!DOCTYPE html><h1>a<h2>b");
    assert_eq!(
        dump(&output.document),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <h1>\n\
         |       \"a\"\n\
         |     <h2>\n\
         |       \"b\"\n"
    );
    assert!(output
        .errors
        .iter()
        .any(|e| e.kind == ErrorKind::NestedHeadingTags));
}

#[test]
fn pre_skips_first_newline() {
    assert_tree(
        "<!DOCTYPE html><pre>\nkeep\n</pre>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <pre>\n\
         |       \"keep\n\"\n",
    );
}

#[test]
fn textarea_is_rcdata() {
    assert_tree(
        "<!DOCTYPE html><textarea><b>&amp;</textarea>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <textarea>\n\
         |       \"<b>&\"\n",
    );
}

#[test]
fn script_contents_are_text() {
    assert_tree(
        "<!DOCTYPE html><script>if (a < b) x();</script>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |     <script>\n\
         |       \"if (a < b) x();\"\n\
         |   <body>\n",
    );
}

#[test]
fn comments_everywhere() {
    assert_tree(
        "<!--a--><!DOCTYPE html><!--b--><p>x<!--c--></p><!--d-->",
        "| <!-- a -->\n\
         | <!DOCTYPE html>\n\
         | <!-- b -->\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <p>\n\
         |       \"x\"\n\
         |       <!-- c -->\n\
         |     <!-- d -->\n",
    );
}

#[test]
fn formatting_reconstruction_after_block() {
    assert_tree(
        "<!DOCTYPE html><b>x<div>y</div>z",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <b>\n\
         |       \"x\"\n\
         |       <div>\n\
         |         \"y\"\n\
         |       \"z\"\n",
    );
}

#[test]
fn noahs_ark_limits_reconstruction_to_three() {
    // Five identical <b> elements stay open when the paragraph closes;
    // reconstruction in the next paragraph clones at most three.
    let output = parse("<!DOCTYPE html><p><b><b><b><b><b>x</p><p>y");
    let tree = dump(&output.document);
    let second_p = tree.rfind("<p>").unwrap();
    let reconstructed = tree[second_p..].matches("<b>").count();
    assert_eq!(reconstructed, 3);
}

#[test]
fn template_contents_are_a_separate_fragment() {
    let output = parse("<!DOCTYPE html><template><b>x</b></template>");
    assert_eq!(
        dump(&output.document),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |     <template>\n\
         |       content\n\
         |         <b>\n\
         |           \"x\"\n\
         |   <body>\n"
    );

    // The fragment root is a document-typed node with no parent.
    let doc = &output.document;
    let html = doc.children(doc.root())[1];
    let head = doc.children(html)[0];
    let template = doc.children(head)[0];
    let contents = doc.template_contents(template);
    assert!(matches!(doc.data(contents), NodeData::Document));
    assert_eq!(doc.parent(contents), None);
}

#[test]
fn svg_foreign_content_with_integration_point() {
    let output = parse(
        "<!DOCTYPE html><svg><foreignObject><div>hi</div></foreignObject></svg>",
    );
    assert_eq!(
        dump(&output.document),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <svg svg>\n\
         |       <svg foreignObject>\n\
         |         <div>\n\
         |           \"hi\"\n"
    );
    assert_eq!(output.errors, vec![]);
}

#[test]
fn svg_tag_and_attribute_adjustment() {
    assert_tree(
        "<!DOCTYPE html><svg><lineargradient gradientunits=\"x\"></lineargradient></svg>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <svg svg>\n\
         |       <svg linearGradient>\n\
         |         gradientUnits=\"x\"\n",
    );
}

#[test]
fn mathml_text_integration_point() {
    assert_tree(
        "<!DOCTYPE html><math><mi>x</mi></math>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <math math>\n\
         |       <math mi>\n\
         |         \"x\"\n",
    );
}

#[test]
fn foreign_breakout_tag() {
    // <p> forces the parser back into HTML content.
    let output = parse("<!DOCTYPE html><svg><p>x");
    assert_eq!(
        dump(&output.document),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <svg svg>\n\
         |     <p>\n\
         |       \"x\"\n"
    );
    assert!(output
        .errors
        .iter()
        .any(|e| e.kind == ErrorKind::ForeignContentIntegrationMismatch));
}

#[test]
fn cdata_only_in_foreign_content() {
    assert_tree(
        "<!DOCTYPE html><svg><![CDATA[<b>]]></svg>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <svg svg>\n\
         |       \"<b>\"\n",
    );

    let output = parse("<!DOCTYPE html><![CDATA[x]]>");
    assert!(output
        .errors
        .iter()
        .any(|e| e.kind == ErrorKind::CdataInHtmlContent));
}

#[test]
fn frameset_replaces_body() {
    assert_tree(
        "<!DOCTYPE html><frameset><frame></frameset>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <frameset>\n\
         |     <frame>\n",
    );
}

#[test]
fn quirky_doctype_sets_quirks_mode() {
    let output = parse("<!DOCTYPE foo><p>x");
    assert_eq!(output.quirks_mode(), QuirksMode::Quirks);

    let output = parse(r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN"><p>x"#);
    assert_eq!(output.quirks_mode(), QuirksMode::LimitedQuirks);
}

#[test]
fn html_attributes_merge_onto_root() {
    assert_tree(
        "<!DOCTYPE html><html lang=en><html lang=fr class=x>",
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   class=\"x\"\n\
         |   lang=\"en\"\n\
         |   <head>\n\
         |   <body>\n",
    );
}

#[test]
fn unclosed_elements_at_eof() {
    let output = parse("<!DOCTYPE html><div><span>x");
    assert_eq!(
        dump(&output.document),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |   <body>\n\
         |     <div>\n\
         |       <span>\n\
         |         \"x\"\n"
    );
    assert!(output
        .errors
        .iter()
        .any(|e| e.kind == ErrorKind::UnclosedElementsAtEof));
}

#[test]
fn unclosed_template_at_eof() {
    let output = parse("<!DOCTYPE html><template><div>");
    assert!(output
        .errors
        .iter()
        .any(|e| e.kind == ErrorKind::TemplateUnclosed));
}

#[test]
fn fragment_parsing_in_tr_context() {
    let output = parse_fragment(
        "<td>a</td><td>b</td>",
        (Tag::Tr, Namespace::Html),
        ParseOpts::default(),
    );
    assert_eq!(
        dump_fragment(&output.document, output.fragment_children()),
        "| <td>\n\
         |   \"a\"\n\
         | <td>\n\
         |   \"b\"\n"
    );
}

#[test]
fn fragment_parsing_in_textarea_context_is_rcdata() {
    let output = parse_fragment(
        "<b>x</b>",
        (Tag::Textarea, Namespace::Html),
        ParseOpts::default(),
    );
    assert_eq!(
        dump_fragment(&output.document, output.fragment_children()),
        "| \"<b>x</b>\"\n"
    );
}

#[test]
fn fragment_parsing_in_body_context() {
    let output = parse_fragment(
        "<p>one<p>two",
        (Tag::Body, Namespace::Html),
        ParseOpts::default(),
    );
    assert_eq!(
        dump_fragment(&output.document, output.fragment_children()),
        "| <p>\n\
         |   \"one\"\n\
         | <p>\n\
         |   \"two\"\n"
    );
}

#[test]
fn script_suspension_and_document_write() {
    let mut parser = Parser::new(ParseOpts::default());
    parser.feed("<!DOCTYPE html><script>x</script><p>done");

    let status = parser.run();
    let ParseStatus::Suspended(script) = status else {
        panic!("expected suspension, got {status:?}");
    };

    // The host "runs" the script, which document.writes a bold element.
    parser.append_at_insertion_point("<b>w</b>");
    assert_eq!(parser.run(), ParseStatus::Complete);

    let output = parser.finish();
    let doc = &output.document;
    assert!(matches!(
        doc.data(script),
        NodeData::Element(e) if e.tag == Tag::Script
    ));
    assert_eq!(
        dump(doc),
        "| <!DOCTYPE html>\n\
         | <html>\n\
         |   <head>\n\
         |     <script>\n\
         |       \"x\"\n\
         |   <body>\n\
         |     <b>\n\
         |       \"w\"\n\
         |     <p>\n\
         |       \"done\"\n"
    );
}

#[test]
fn stop_at_first_error_returns_partial_tree() {
    let opts = ParseOpts {
        stop_at_first_error: true,
        ..Default::default()
    };
    let output = parse_document("<p>x<table><a>y", opts);
    // Exactly one diagnostic is recorded.
    assert_eq!(output.errors.len(), 1);
}

#[test]
fn max_errors_caps_the_list() {
    let opts = ParseOpts {
        max_errors: Some(2),
        ..Default::default()
    };
    let output = parse_document("<p>\0x\0y\0z\0w", opts);
    assert_eq!(output.errors.len(), 2);
}

#[test]
fn exact_errors_attach_details() {
    let opts = ParseOpts {
        exact_errors: true,
        ..Default::default()
    };
    let output = parse_document("<!DOCTYPE html></div>", opts);
    let err = output
        .errors
        .iter()
        .find(|e| e.kind == ErrorKind::UnexpectedEndTag)
        .expect("expected an unexpected-end-tag error");
    assert_eq!(err.detail.as_deref(), Some("div"));
}

#[test]
fn error_positions_are_tracked() {
    let output = parse("<!DOCTYPE html>\n<p>a\n\0");
    let err = &output.errors[0];
    assert_eq!(err.kind, ErrorKind::UnexpectedNull);
    assert_eq!(err.position.line, 3);
    assert_eq!(err.position.col, 1);
}

#[test]
fn parsing_is_deterministic() {
    let input = "<!DOCTYPE html><table><a href=x>1<b>2</table><p>&notin;<svg><mi>m";
    let a = parse(input);
    let b = parse(input);
    assert_eq!(dump(&a.document), dump(&b.document));
    assert_eq!(a.errors, b.errors);
}

#[test]
fn element_positions_and_flags() {
    let output = parse("<!DOCTYPE html><p>a</p>");
    let doc = &output.document;
    let html = doc.children(doc.root())[1];
    let body = doc.children(html)[1];
    let p = doc.children(body)[0];

    let NodeData::Element(elem) = doc.data(p) else {
        panic!("expected element");
    };
    // Positions point at the tag names.
    assert_eq!(elem.start_pos.line, 1);
    assert_eq!(elem.start_pos.col, 17);
    assert_eq!(elem.end_pos.map(|p| p.col), Some(22));
    assert!(!elem.flags.implicit_end);

    let NodeData::Element(body_elem) = doc.data(body) else {
        panic!("expected element");
    };
    assert!(body_elem.flags.created_by_parser);
}

#[test]
fn whitespace_text_nodes_are_flagged() {
    let output = parse("<!DOCTYPE html><table>  <tr><td>x</table>");
    let doc = &output.document;
    let html = doc.children(doc.root())[1];
    let body = doc.children(html)[1];
    let table = doc.children(body)[0];
    match doc.data(doc.children(table)[0]) {
        NodeData::Text { whitespace, .. } => assert!(whitespace),
        _ => panic!("expected whitespace text node in table"),
    }
}
