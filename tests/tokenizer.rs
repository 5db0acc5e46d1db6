// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Token-level behavior of the tokenizer, driven through a collecting sink.

use canopy::input::Cursor;
use canopy::tendril::StrTendril;
use canopy::tokenizer::states;
use canopy::tokenizer::{
    Doctype, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use canopy::{ErrorKind, Position};

/// Flattened view of the token stream for easy assertions.
#[derive(PartialEq, Eq, Debug)]
enum Tok {
    Start(String, Vec<(String, String)>, bool),
    End(String),
    Text(String),
    Comment(String),
    Doctype(Doctype),
    Error(ErrorKind),
}

struct Collector {
    tokens: Vec<Tok>,
    text: String,
}

impl Collector {
    fn new() -> Collector {
        Collector {
            tokens: vec![],
            text: String::new(),
        }
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.tokens.push(Tok::Text(text));
        }
    }
}

impl TokenSink for Collector {
    type Handle = ();

    fn process_token(&mut self, token: Token, _pos: Position) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(t) => self.text.push_str(&t),
            Token::NullCharacterToken => self.text.push('\0'),
            Token::TagToken(tag) => {
                self.flush_text();
                let attrs = tag
                    .attrs
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect();
                self.tokens.push(match tag.kind {
                    TagKind::StartTag => Tok::Start(tag.name.to_string(), attrs, tag.self_closing),
                    TagKind::EndTag => Tok::End(tag.name.to_string()),
                });
            },
            Token::CommentToken(t) => {
                self.flush_text();
                self.tokens.push(Tok::Comment(t.to_string()));
            },
            Token::DoctypeToken(dt) => {
                self.flush_text();
                self.tokens.push(Tok::Doctype(dt));
            },
            Token::ParseErrorToken(e) => {
                self.flush_text();
                self.tokens.push(Tok::Error(e.kind));
            },
            Token::EOFToken => self.flush_text(),
        }
        TokenSinkResult::Continue
    }
}

fn tokenize_with(input: &str, opts: TokenizerOpts) -> Vec<Tok> {
    let mut tok = Tokenizer::new(Collector::new(), opts);
    let mut cursor = Cursor::new(8);
    cursor.push_back(StrTendril::from_slice(input));
    let _ = tok.feed(&mut cursor);
    tok.end(&mut cursor);
    tok.sink.tokens
}

fn tokenize(input: &str) -> Vec<Tok> {
    tokenize_with(input, TokenizerOpts::default())
}

fn start(name: &str) -> Tok {
    Tok::Start(name.to_string(), vec![], false)
}

fn end(name: &str) -> Tok {
    Tok::End(name.to_string())
}

fn text(t: &str) -> Tok {
    Tok::Text(t.to_string())
}

#[test]
fn simple_tags_and_text() {
    assert_eq!(
        tokenize("<p>hi</p>"),
        vec![start("p"), text("hi"), end("p")]
    );
}

#[test]
fn tag_names_are_lowercased() {
    assert_eq!(tokenize("<DiV></dIv>"), vec![start("div"), end("div")]);
}

#[test]
fn attributes() {
    assert_eq!(
        tokenize(r#"<a href="x" id=y checked>"#),
        vec![Tok::Start(
            "a".to_string(),
            vec![
                ("href".to_string(), "x".to_string()),
                ("id".to_string(), "y".to_string()),
                ("checked".to_string(), String::new()),
            ],
            false
        )]
    );
}

#[test]
fn self_closing_tag() {
    assert_eq!(
        tokenize("<br/>"),
        vec![Tok::Start("br".to_string(), vec![], true)]
    );
}

#[test]
fn duplicate_attribute_first_wins() {
    assert_eq!(
        tokenize(r#"<a id=1 id=2>"#),
        vec![
            Tok::Error(ErrorKind::DuplicateAttribute),
            Tok::Start(
                "a".to_string(),
                vec![("id".to_string(), "1".to_string())],
                false
            ),
        ]
    );
}

#[test]
fn comments() {
    assert_eq!(
        tokenize("<!-- hello -->"),
        vec![Tok::Comment(" hello ".to_string())]
    );
}

#[test]
fn comment_dashes() {
    assert_eq!(tokenize("<!----->"), vec![Tok::Comment("-".to_string())]);
}

#[test]
fn bogus_comment_from_question_mark() {
    assert_eq!(
        tokenize("<?php echo ?>"),
        vec![
            Tok::Error(ErrorKind::InvalidFirstTagCharacter),
            Tok::Comment("?php echo ?".to_string()),
        ]
    );
}

#[test]
fn doctype_html5() {
    assert_eq!(
        tokenize("<!DOCTYPE html>"),
        vec![Tok::Doctype(Doctype {
            name: Some(StrTendril::from_slice("html")),
            public_id: None,
            system_id: None,
            force_quirks: false,
        })]
    );
}

#[test]
fn doctype_with_identifiers() {
    let toks = tokenize(
        r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#,
    );
    assert_eq!(
        toks,
        vec![Tok::Doctype(Doctype {
            name: Some(StrTendril::from_slice("html")),
            public_id: Some(StrTendril::from_slice("-//W3C//DTD HTML 4.01//EN")),
            system_id: Some(StrTendril::from_slice(
                "http://www.w3.org/TR/html4/strict.dtd"
            )),
            force_quirks: false,
        })]
    );
}

#[test]
fn eof_in_tag_recovers() {
    assert_eq!(
        tokenize("<p"),
        vec![Tok::Error(ErrorKind::EofInTag)]
    );
}

#[test]
fn eof_in_comment_emits_comment() {
    assert_eq!(
        tokenize("<!--x"),
        vec![
            Tok::Error(ErrorKind::EofInComment),
            Tok::Comment("x".to_string()),
        ]
    );
}

#[test]
fn lone_ampersand_is_literal() {
    assert_eq!(tokenize("a & b"), vec![text("a & b")]);
}

#[test]
fn named_char_ref() {
    assert_eq!(tokenize("&amp;"), vec![text("&")]);
    assert_eq!(tokenize("&notin;"), vec![text("\u{2209}")]);
    assert_eq!(tokenize("&AElig;"), vec![text("\u{c6}")]);
}

#[test]
fn named_char_ref_two_codepoints() {
    assert_eq!(tokenize("&NotEqualTilde;"), vec![text("\u{2242}\u{338}")]);
}

#[test]
fn named_char_ref_without_semicolon() {
    assert_eq!(
        tokenize("&not"),
        vec![
            Tok::Error(ErrorKind::CharRefWithoutSemicolon),
            text("\u{ac}"),
        ]
    );
}

#[test]
fn longest_match_wins() {
    // &not is a match, but &notin; is longer.
    assert_eq!(tokenize("&notin;x"), vec![text("\u{2209}x")]);
    // No longer match completes, fall back to &not plus literal text.
    assert_eq!(
        tokenize("&notit;"),
        vec![
            Tok::Error(ErrorKind::CharRefWithoutSemicolon),
            text("\u{ac}it;"),
        ]
    );
}

#[test]
fn invalid_named_ref() {
    assert_eq!(
        tokenize("&frobnicate;"),
        vec![
            Tok::Error(ErrorKind::CharRefNamedInvalid),
            text("&frobnicate;"),
        ]
    );
}

#[test]
fn named_ref_in_attribute_with_alnum_follower_is_unmatched() {
    // Legacy rule: "&notin" inside an attribute followed by "=" or an
    // alphanumeric keeps the literal text.
    assert_eq!(
        tokenize(r#"<a href="?a&amp=b">"#),
        vec![Tok::Start(
            "a".to_string(),
            vec![("href".to_string(), "?a&amp=b".to_string())],
            false
        )]
    );

    // With the semicolon, it resolves normally.
    assert_eq!(
        tokenize(r#"<a href="&notin;">"#),
        vec![Tok::Start(
            "a".to_string(),
            vec![("href".to_string(), "\u{2209}".to_string())],
            false
        )]
    );

    // Without the semicolon and without a troublesome follower, the
    // prefix match is accepted, with an error.
    assert_eq!(
        tokenize(r#"<a href="&not">"#),
        vec![
            Tok::Error(ErrorKind::CharRefWithoutSemicolon),
            Tok::Start(
                "a".to_string(),
                vec![("href".to_string(), "\u{ac}".to_string())],
                false
            ),
        ]
    );
}

#[test]
fn numeric_char_refs() {
    assert_eq!(tokenize("&#65;"), vec![text("A")]);
    assert_eq!(tokenize("&#x41;"), vec![text("A")]);
    assert_eq!(tokenize("&#X41;"), vec![text("A")]);
}

#[test]
fn numeric_char_ref_missing_semicolon() {
    assert_eq!(
        tokenize("&#65 "),
        vec![Tok::Error(ErrorKind::CharRefWithoutSemicolon), text("A ")]
    );
}

#[test]
fn numeric_char_ref_no_digits() {
    assert_eq!(
        tokenize("&#;"),
        vec![Tok::Error(ErrorKind::CharRefNoDigits), text("&#;")]
    );
}

#[test]
fn windows_1252_remap() {
    // Every C1 code point remaps per the fixed table, with a parse error.
    let cases: &[(u32, char)] = &[
        (0x80, '\u{20ac}'),
        (0x82, '\u{201a}'),
        (0x8a, '\u{160}'),
        (0x99, '\u{2122}'),
        (0x9f, '\u{178}'),
    ];
    for &(n, c) in cases {
        assert_eq!(
            tokenize(&format!("&#{n};")),
            vec![
                Tok::Error(ErrorKind::CharRefInvalidCodepoint),
                text(&c.to_string()),
            ],
            "remap of {n:#x}"
        );
    }
}

#[test]
fn numeric_char_ref_out_of_range() {
    assert_eq!(
        tokenize("&#x110000;"),
        vec![
            Tok::Error(ErrorKind::CharRefInvalidCodepoint),
            text("\u{fffd}"),
        ]
    );
    assert_eq!(
        tokenize("&#0;"),
        vec![
            Tok::Error(ErrorKind::CharRefInvalidCodepoint),
            text("\u{fffd}"),
        ]
    );
    // Surrogate.
    assert_eq!(
        tokenize("&#xD800;"),
        vec![
            Tok::Error(ErrorKind::CharRefInvalidCodepoint),
            text("\u{fffd}"),
        ]
    );
}

#[test]
fn null_in_data_passes_through() {
    assert_eq!(
        tokenize("a\0b"),
        vec![Tok::Error(ErrorKind::UnexpectedNull), text("a\0b")]
    );
}

#[test]
fn crlf_normalization() {
    assert_eq!(tokenize("a\r\nb\rc"), vec![text("a\nb\nc")]);
}

#[test]
fn bom_is_discarded() {
    assert_eq!(tokenize("\u{feff}x"), vec![text("x")]);
}

#[test]
fn rcdata_ignores_markup() {
    let opts = TokenizerOpts {
        initial_state: Some(states::RawData(states::Rcdata)),
        last_start_tag_name: Some("title".to_string()),
        ..Default::default()
    };
    assert_eq!(
        tokenize_with("<b>&amp;</title>", opts),
        vec![text("<b>&"), end("title")]
    );
}

#[test]
fn rawtext_ignores_char_refs() {
    let opts = TokenizerOpts {
        initial_state: Some(states::RawData(states::Rawtext)),
        last_start_tag_name: Some("style".to_string()),
        ..Default::default()
    };
    assert_eq!(
        tokenize_with("a &amp; b</style>", opts),
        vec![text("a &amp; b"), end("style")]
    );
}

#[test]
fn script_data_end_tag_must_be_appropriate() {
    let opts = TokenizerOpts {
        initial_state: Some(states::RawData(states::ScriptData)),
        last_start_tag_name: Some("script".to_string()),
        ..Default::default()
    };
    assert_eq!(
        tokenize_with("x</span>y</script>", opts),
        vec![text("x</span>y"), end("script")]
    );
}

#[test]
fn script_data_escaped() {
    let opts = TokenizerOpts {
        initial_state: Some(states::RawData(states::ScriptData)),
        last_start_tag_name: Some("script".to_string()),
        ..Default::default()
    };
    // Inside <!-- --> an open <script> makes the contents double-escaped,
    // so the inner </script> does not end the element.
    assert_eq!(
        tokenize_with("<!--<script></script>--></script>", opts),
        vec![text("<!--<script></script>-->"), end("script")]
    );
}

#[test]
fn plaintext_never_ends() {
    let opts = TokenizerOpts {
        initial_state: Some(states::Plaintext),
        ..Default::default()
    };
    assert_eq!(
        tokenize_with("a</plaintext>b", opts),
        vec![text("a</plaintext>b")]
    );
}

#[test]
fn error_positions() {
    struct ErrPos(Vec<Position>);
    impl TokenSink for ErrPos {
        type Handle = ();
        fn process_token(&mut self, token: Token, _pos: Position) -> TokenSinkResult<()> {
            if let Token::ParseErrorToken(e) = token {
                self.0.push(e.position);
            }
            TokenSinkResult::Continue
        }
    }

    let mut tok = Tokenizer::new(ErrPos(vec![]), TokenizerOpts::default());
    let mut cursor = Cursor::new(8);
    cursor.push_back(StrTendril::from_slice("ab\n<a id=1 id=2>"));
    let _ = tok.feed(&mut cursor);
    tok.end(&mut cursor);

    let positions = tok.sink.0;
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].line, 2);
}
