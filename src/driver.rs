// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! High-level interface to the parser: owns the input cursor and the
//! tokenizer / tree-builder pair, and runs the tokenize-construct loop.

use crate::errors::ParseError;
use crate::input::Cursor;
use crate::tags::{Namespace, Tag};
use crate::tendril::StrTendril;
use crate::tokenizer::{Tokenizer, TokenizerOpts, TokenizerResult};
use crate::tree::{Document, NodeId, QuirksMode};
use crate::tree_builder::{TreeBuilder, TreeBuilderOpts};

/// Parser configuration.
#[derive(Clone)]
pub struct ParseOpts {
    /// Column width of a tab stop, for source positions. Default: 8
    pub tab_stop_size: u32,

    /// Give up after the first parse error. The partial tree built so far
    /// is still returned. Default: false
    pub stop_at_first_error: bool,

    /// Record (and parse) at most this many errors. Default: unbounded
    pub max_errors: Option<usize>,

    /// Parse as a fragment in the context of an element with this
    /// namespace and tag, as for `innerHTML`. Default: None
    pub fragment_context: Option<(Tag, Namespace)>,

    /// Is scripting enabled? Affects how `<noscript>` is parsed.
    /// Default: true
    pub scripting_enabled: bool,

    /// Is this document the `srcdoc` of an `<iframe>`? Default: false
    pub iframe_srcdoc: bool,

    /// Discard a leading U+FEFF BYTE ORDER MARK. Default: true
    pub discard_bom: bool,

    /// Attach offending names and characters to reported errors.
    /// Default: false
    pub exact_errors: bool,
}

impl Default for ParseOpts {
    fn default() -> ParseOpts {
        ParseOpts {
            tab_stop_size: 8,
            stop_at_first_error: false,
            max_errors: None,
            fragment_context: None,
            scripting_enabled: true,
            iframe_srcdoc: false,
            discard_bom: true,
            exact_errors: false,
        }
    }
}

/// What `Parser::run` stopped on.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ParseStatus {
    /// All input consumed.
    Complete,
    /// A `</script>` was seen. The host may run the script, append input
    /// at the insertion point, and call `run` again.
    Suspended(NodeId),
}

/// The result of a parse: the document tree and the diagnostics.
pub struct ParseOutput {
    pub document: Document,
    pub errors: Vec<ParseError>,
    fragment_root: Option<NodeId>,
}

impl ParseOutput {
    pub fn quirks_mode(&self) -> QuirksMode {
        self.document.quirks_mode()
    }

    /// For a fragment parse, the parsed nodes: the children of the
    /// synthetic root. Empty for a document parse.
    pub fn fragment_children(&self) -> &[NodeId] {
        match self.fragment_root {
            Some(root) => self.document.children(root),
            None => &[],
        }
    }
}

/// An HTML parser, ready to receive input.
pub struct Parser {
    tokenizer: Tokenizer<TreeBuilder>,
    input: Cursor,
}

impl Parser {
    pub fn new(opts: ParseOpts) -> Parser {
        let tb_opts = TreeBuilderOpts {
            exact_errors: opts.exact_errors,
            scripting_enabled: opts.scripting_enabled,
            iframe_srcdoc: opts.iframe_srcdoc,
            quirks_mode: QuirksMode::NoQuirks,
            max_errors: opts.max_errors,
            stop_at_first_error: opts.stop_at_first_error,
        };

        let (tb, tok_opts) = match opts.fragment_context {
            None => (
                TreeBuilder::new(tb_opts),
                TokenizerOpts {
                    exact_errors: opts.exact_errors,
                    discard_bom: opts.discard_bom,
                    ..Default::default()
                },
            ),
            Some((tag, ns)) => {
                let tb = TreeBuilder::new_for_fragment(tb_opts, ns, tag);
                let tok_opts = TokenizerOpts {
                    exact_errors: opts.exact_errors,
                    discard_bom: opts.discard_bom,
                    initial_state: Some(tb.tokenizer_state_for_context_elem()),
                    last_start_tag_name: Some(tag.name().to_string()),
                };
                (tb, tok_opts)
            },
        };

        Parser {
            tokenizer: Tokenizer::new(tb, tok_opts),
            input: Cursor::new(opts.tab_stop_size),
        }
    }

    /// Add input at the end of the stream.
    pub fn feed(&mut self, text: &str) {
        self.input.push_back(StrTendril::from_slice(text));
    }

    /// Add input at the insertion point, in front of anything not yet
    /// consumed. This is where `document.write` output lands while the
    /// parser is suspended on a script.
    pub fn append_at_insertion_point(&mut self, text: &str) {
        self.input.push_front(StrTendril::from_slice(text));
    }

    /// Pump the tokenize-construct loop until the input is exhausted or a
    /// script end tag suspends parsing.
    pub fn run(&mut self) -> ParseStatus {
        match self.tokenizer.feed(&mut self.input) {
            TokenizerResult::Script(node) => ParseStatus::Suspended(node),
            TokenizerResult::Done => ParseStatus::Complete,
        }
    }

    /// Signal end of input and finish the parse.
    pub fn finish(mut self) -> ParseOutput {
        self.tokenizer.end(&mut self.input);
        let tokenizer = self.tokenizer;
        let fragment_root = tokenizer.sink.fragment_root();
        let (document, errors) = tokenizer.sink.into_parts();
        ParseOutput {
            document,
            errors,
            fragment_root,
        }
    }
}

/// Parse a complete document from UTF-8 text.
///
/// Scripts are tokenized but never run; a suspension is simply resumed.
pub fn parse_document(input: &str, opts: ParseOpts) -> ParseOutput {
    let mut parser = Parser::new(ParseOpts {
        fragment_context: None,
        ..opts
    });
    parser.feed(input);
    while let ParseStatus::Suspended(_) = parser.run() {}
    parser.finish()
}

/// Parse a fragment in the context of the given element, as for
/// `innerHTML`. The parsed nodes are `ParseOutput::fragment_children`.
pub fn parse_fragment(
    input: &str,
    context: (Tag, Namespace),
    opts: ParseOpts,
) -> ParseOutput {
    let mut parser = Parser::new(ParseOpts {
        fragment_context: Some(context),
        ..opts
    });
    parser.feed(input);
    while let ParseStatus::Suspended(_) = parser.run() {}
    parser.finish()
}
