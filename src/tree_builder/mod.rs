// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The HTML5 tree builder.
//!
//! Implements the tree-construction stage: the insertion-mode state
//! machine (in `rules`), the stack of open elements with its scope
//! queries, the list of active formatting elements with Noah's Ark and
//! reconstruction, foster parenting, and the adoption agency algorithm.
//! Tree mutations go straight into the [`Document`] arena.

use self::types::*;

use crate::errors::{ErrorKind, ParseError, Position};
use crate::tags::{AttrName, Attribute, Namespace, Tag};
use crate::tendril::StrTendril;
use crate::tokenizer::states as tok_state;
use crate::tokenizer::states::RawKind;
use crate::tokenizer::{self, Doctype, EndTag, StartTag, TagToken, TokenSink, TokenSinkResult};
use crate::tree::{Document, Element, NodeId, QuirksMode};
use crate::util::str::to_escaped_string;

use self::tag_sets::*;

use log::{debug, warn};
use std::collections::VecDeque;
use std::mem;

#[macro_use]
mod tag_sets;

mod data;
mod rules;
mod types;

/// Tree builder options, with an impl for Default.
#[derive(Copy, Clone)]
pub struct TreeBuilderOpts {
    /// Attach offending names to reported errors, at some performance
    /// penalty? Default: false
    pub exact_errors: bool,

    /// Is scripting enabled?
    ///
    /// This affects how `<noscript>` elements are parsed:
    ///   - If scripting **is** enabled then the contents of a `<noscript>` element are parsed as a single text node
    ///   - If scripting is **not** enabled then the contents of a `<noscript>` element are parsed as a normal tree of nodes
    pub scripting_enabled: bool,

    /// Is this document being parsed from the `srcdoc` attribute of an `<iframe>` element?
    ///
    /// This affects heuristics that infer `QuirksMode` from `<!DOCTYPE>`.
    pub iframe_srcdoc: bool,

    /// Initial quirks mode. Default: NoQuirks
    pub quirks_mode: QuirksMode,

    /// Stop recording (and parsing) after this many errors.
    pub max_errors: Option<usize>,

    /// Stop parsing at the first error.
    pub stop_at_first_error: bool,
}

impl Default for TreeBuilderOpts {
    fn default() -> TreeBuilderOpts {
        TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: true,
            iframe_srcdoc: false,
            quirks_mode: QuirksMode::NoQuirks,
            max_errors: None,
            stop_at_first_error: false,
        }
    }
}

pub(crate) enum NodeOrText {
    AppendNode(NodeId),
    AppendText(StrTendril),
}
use self::NodeOrText::{AppendNode, AppendText};

pub(crate) enum PushFlag {
    Push,
    NoPush,
}
use self::PushFlag::*;

enum Bookmark {
    Replace(NodeId),
    InsertAfter(NodeId),
}

/// The HTML tree builder.
pub struct TreeBuilder {
    /// Options controlling the behavior of the tree builder.
    opts: TreeBuilderOpts,

    /// The document arena being built.
    doc: Document,

    /// Insertion mode.
    mode: InsertionMode,

    /// Original insertion mode, used by Text and InTableText modes.
    orig_mode: Option<InsertionMode>,

    /// Stack of template insertion modes.
    template_modes: Vec<InsertionMode>,

    /// Pending table character tokens.
    pending_table_text: Vec<(SplitStatus, StrTendril)>,

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
    current_pos: Position,

    /// Accumulated diagnostics.
    errors: Vec<ParseError>,

    /// Set once the configured error limit has been hit.
    errors_full: bool,
}

impl TreeBuilder {
    /// Create a new tree builder. The tree builder is also a `TokenSink`.
    pub fn new(opts: TreeBuilderOpts) -> TreeBuilder {
        let mut doc = Document::new();
        doc.set_quirks_mode(opts.quirks_mode);
        TreeBuilder {
            opts,
            doc,
            mode: InsertionMode::Initial,
            orig_mode: None,
            template_modes: vec![],
            pending_table_text: vec![],
            open_elems: vec![],
            active_formatting: vec![],
            head_elem: None,
            form_elem: None,
            frameset_ok: true,
            ignore_lf: false,
            foster_parenting: false,
            context_elem: None,
            current_pos: Position::start(),
            errors: vec![],
            errors_full: false,
        }
    }

    /// Create a new tree builder for parsing a fragment in the context of
    /// an element with the given namespace and tag.
    pub fn new_for_fragment(
        opts: TreeBuilderOpts,
        context_ns: Namespace,
        context_tag: Tag,
    ) -> TreeBuilder {
        let mut tb = TreeBuilder::new(opts);

        let context_elem = tb.doc.create_element(Element::new(
            context_ns,
            context_tag,
            StrTendril::from_slice(context_tag.name()),
            vec![],
            Position::start(),
        ));
        tb.context_elem = Some(context_elem);

        if context_ns == Namespace::Html && context_tag == Tag::Template {
            tb.template_modes.push(InsertionMode::InTemplate);
        }

        // https://html.spec.whatwg.org/multipage/#parsing-html-fragments
        // 5. Let root be a new html element with no attributes.
        // 6. Append the element root to the Document node created above.
        // 7. Set up the parser's stack of open elements so that it contains just the single element root.
        tb.create_root(vec![]);
        // 10. Reset the parser's insertion mode appropriately.
        tb.mode = tb.reset_insertion_mode();

        tb
    }

    // https://html.spec.whatwg.org/multipage/#concept-frag-parse-context
    // Step 4. Set the state of the HTML parser's tokenization stage as follows:
    pub fn tokenizer_state_for_context_elem(&self) -> tok_state::State {
        let elem = self.context_elem.expect("no context element");
        let (ns, tag) = self.elem_name(elem);
        if ns != Namespace::Html {
            return tok_state::Data;
        }
        match tag {
            Tag::Title | Tag::Textarea => tok_state::RawData(tok_state::Rcdata),

            Tag::Style | Tag::Xmp | Tag::Iframe | Tag::Noembed | Tag::Noframes => {
                tok_state::RawData(tok_state::Rawtext)
            },

            Tag::Script => tok_state::RawData(tok_state::ScriptData),

            Tag::Noscript => {
                if self.opts.scripting_enabled {
                    tok_state::RawData(tok_state::Rawtext)
                } else {
                    tok_state::Data
                }
            },

            Tag::Plaintext => tok_state::Plaintext,

            _ => tok_state::Data,
        }
    }

    /// Hand back the finished document and the error list.
    pub fn into_parts(self) -> (Document, Vec<ParseError>) {
        (self.doc, self.errors)
    }

    /// The document under construction.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Are we parsing a HTML fragment?
    pub fn is_fragment(&self) -> bool {
        self.context_elem.is_some()
    }

    /// The synthetic root of a fragment parse.
    pub fn fragment_root(&self) -> Option<NodeId> {
        self.context_elem
            .map(|_| self.doc.children(self.doc.root())[0])
    }

    fn debug_step(&self, mode: InsertionMode, token: &Token) {
        debug!(
            "processing {} in insertion mode {mode:?}",
            to_escaped_string(token)
        );
    }

    fn parse_error(&mut self, kind: ErrorKind) {
        let err = ParseError::new(kind, self.current_pos);
        self.record_error(err);
    }

    fn parse_error_detail(&mut self, kind: ErrorKind, detail: &str) {
        let err = if self.opts.exact_errors {
            ParseError::with_detail(kind, self.current_pos, StrTendril::from_slice(detail))
        } else {
            ParseError::new(kind, self.current_pos)
        };
        self.record_error(err);
    }

    fn record_error(&mut self, err: ParseError) {
        if self.errors_full {
            return;
        }
        self.errors.push(err);
        let limit = match (self.opts.stop_at_first_error, self.opts.max_errors) {
            (true, Some(n)) => Some(n.min(1)),
            (true, None) => Some(1),
            (false, n) => n,
        };
        if let Some(limit) = limit {
            if self.errors.len() >= limit {
                self.errors_full = true;
            }
        }
    }

    fn process_to_completion(&mut self, mut token: Token) -> TokenSinkResult<NodeId> {
        // Queue of additional tokens yet to be processed.
        // This stays empty in the common case where we don't split whitespace.
        let mut more_tokens = VecDeque::new();

        loop {
            let should_have_acknowledged_self_closing_flag = matches!(
                token,
                Token::Tag(TagToken {
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
                    if should_have_acknowledged_self_closing_flag {
                        self.parse_error(ErrorKind::SelfClosingNonVoid);
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
                ProcessResult::Script(node) => {
                    assert!(more_tokens.is_empty());
                    return TokenSinkResult::Script(node);
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

    /// <https://html.spec.whatwg.org/multipage/#appropriate-place-for-inserting-a-node>
    fn appropriate_place_for_insertion(&self, override_target: Option<NodeId>) -> InsertionPoint {
        declare_tag_set!(foster_target = Table Tbody Tfoot Thead Tr);
        let target = override_target.unwrap_or_else(|| self.current_node());
        if !(self.foster_parenting && self.elem_in(target, foster_target)) {
            if self.html_elem_named(target, Tag::Template) {
                // No foster parenting (inside template).
                return InsertionPoint::LastChild(self.doc.template_contents(target));
            }
            // No foster parenting (the common case).
            return InsertionPoint::LastChild(target);
        }

        // Foster parenting
        let mut iter = self.open_elems.iter().rev().peekable();
        while let Some(&elem) = iter.next() {
            if self.html_elem_named(elem, Tag::Template) {
                return InsertionPoint::LastChild(self.doc.template_contents(elem));
            } else if self.html_elem_named(elem, Tag::Table) {
                return InsertionPoint::TableFosterParenting {
                    element: elem,
                    prev_element: **iter.peek().unwrap(),
                };
            }
        }
        InsertionPoint::LastChild(self.html_elem())
    }

    fn insert_at(&mut self, insertion_point: InsertionPoint, child: NodeOrText) {
        match insertion_point {
            InsertionPoint::LastChild(parent) => match child {
                AppendNode(node) => self.doc.append(parent, node),
                AppendText(text) => self.doc.append_text(parent, text),
            },
            InsertionPoint::BeforeSibling(sibling) => match child {
                AppendNode(node) => self.doc.insert_before(sibling, node),
                AppendText(text) => self.doc.insert_text_before(sibling, text),
            },
            InsertionPoint::TableFosterParenting {
                element,
                prev_element,
            } => {
                // Insert before the table, or failing that at the end of
                // the element below it.
                if self.doc.parent(element).is_some() {
                    match child {
                        AppendNode(node) => self.doc.insert_before(element, node),
                        AppendText(text) => self.doc.insert_text_before(element, text),
                    }
                } else {
                    match child {
                        AppendNode(node) => self.doc.append(prev_element, node),
                        AppendText(text) => self.doc.append_text(prev_element, text),
                    }
                }
            },
        }
    }
}

impl TokenSink for TreeBuilder {
    type Handle = NodeId;

    fn process_token(&mut self, token: tokenizer::Token, pos: Position) -> TokenSinkResult<NodeId> {
        self.current_pos = pos;
        let ignore_lf = mem::take(&mut self.ignore_lf);

        // Handle `ParseError` and `DoctypeToken`; convert everything else to the local `Token` type.
        let token = match token {
            tokenizer::Token::ParseErrorToken(e) => {
                self.record_error(e);
                return TokenSinkResult::Continue;
            },

            tokenizer::Token::DoctypeToken(dt) => {
                if self.mode == InsertionMode::Initial {
                    let (err, quirk) = data::doctype_error_and_quirks(&dt, self.opts.iframe_srcdoc);
                    if err {
                        let name = dt.name.as_deref().unwrap_or("");
                        self.parse_error_detail(ErrorKind::BadDoctype, name);
                    }
                    let Doctype {
                        name,
                        public_id,
                        system_id,
                        force_quirks: _,
                    } = dt;
                    let doctype = self.doc.create_doctype(
                        name.unwrap_or_default(),
                        public_id.unwrap_or_default(),
                        system_id.unwrap_or_default(),
                    );
                    let root = self.doc.root();
                    self.doc.append(root, doctype);
                    self.set_quirks_mode(quirk);

                    self.mode = InsertionMode::BeforeHtml;
                } else {
                    self.parse_error(ErrorKind::UnexpectedDoctype);
                }
                return TokenSinkResult::Continue;
            },

            tokenizer::Token::TagToken(x) => Token::Tag(x),
            tokenizer::Token::CommentToken(x) => Token::Comment(x),
            tokenizer::Token::NullCharacterToken => Token::NullCharacter,
            tokenizer::Token::EOFToken => Token::Eof,

            tokenizer::Token::CharacterTokens(mut x) => {
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

    fn end(&mut self, pos: Position) {
        self.current_pos = pos;
        for elem in mem::take(&mut self.open_elems).into_iter().rev() {
            if let Some(e) = self.doc.elem_mut(elem) {
                if e.end_pos.is_none() {
                    e.flags.implicit_end = true;
                }
            }
        }
    }

    fn adjusted_current_node_present_but_not_in_html_namespace(&self) -> bool {
        !self.open_elems.is_empty() && self.elem_name(self.adjusted_current_node()).0 != Namespace::Html
    }

    fn errors_exhausted(&self) -> bool {
        self.errors_full
    }
}

#[doc(hidden)]
impl TreeBuilder {
    fn unexpected(&mut self, token: &Token) -> ProcessResult {
        match *token {
            Token::Tag(ref tag) => return self.unexpected_tag(tag),
            Token::Eof => self.parse_error(ErrorKind::UnclosedElementsAtEof),
            _ => self.parse_error(ErrorKind::UnexpectedToken),
        }
        ProcessResult::Done
    }

    fn unexpected_tag(&mut self, tag: &TagToken) -> ProcessResult {
        let kind = match tag.kind {
            StartTag => ErrorKind::UnexpectedStartTag,
            EndTag => ErrorKind::UnexpectedEndTag,
        };
        let name = tag.name.to_string();
        self.parse_error_detail(kind, &name);
        ProcessResult::Done
    }

    fn assert_named(&self, node: NodeId, tag: Tag) {
        assert!(self.html_elem_named(node, tag));
    }

    /// The namespace and tag of an element node.
    fn elem_name(&self, node: NodeId) -> (Namespace, Tag) {
        let e = self.doc.elem(node).expect("not an element");
        (e.ns, e.tag)
    }

    fn position_in_active_formatting(&self, element: NodeId) -> Option<usize> {
        self.active_formatting.iter().position(|n| match *n {
            FormatEntry::Marker => false,
            FormatEntry::Element(node, _) => node == element,
        })
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.doc.set_quirks_mode(mode);
    }

    fn stop_parsing(&mut self) -> ProcessResult {
        ProcessResult::Done
    }

    //§ parsing-elements-that-contain-only-text
    // Switch to `Text` insertion mode, save the old mode, and
    // switch the tokenizer to a raw-data state.
    // The latter only takes effect after the current / next
    // `process_token` of a start tag returns!
    fn to_raw_text_mode(&mut self, k: RawKind) -> ProcessResult {
        self.orig_mode = Some(self.mode);
        self.mode = InsertionMode::Text;
        ProcessResult::ToRawData(k)
    }

    // The generic raw text / RCDATA parsing algorithm.
    fn parse_raw_data(&mut self, tag: TagToken, k: RawKind) -> ProcessResult {
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
        TagSet: Fn((Namespace, Tag)) -> bool,
    {
        set(self.elem_name(self.current_node()))
    }

    // Insert at the "appropriate place for inserting a node".
    fn insert_appropriately(&mut self, child: NodeOrText, override_target: Option<NodeId>) {
        let insertion_point = self.appropriate_place_for_insertion(override_target);
        self.insert_at(insertion_point, child);
    }

    fn adoption_agency(&mut self, subject: Tag) {
        // 1.
        if self.current_node_named(subject)
            && self
                .position_in_active_formatting(self.current_node())
                .is_none()
        {
            self.pop();
            return;
        }

        // 2. 3. 4.
        for _ in 0..8 {
            // 5.
            let maybe_fmt_entry = self
                .active_formatting
                .iter()
                .enumerate()
                .rev()
                .take_while(|&(_, e)| !matches!(*e, FormatEntry::Marker))
                .find(|&(_, e)| match *e {
                    FormatEntry::Element(_, ref t) => t.tag == subject,
                    FormatEntry::Marker => false,
                })
                .map(|(i, e)| match *e {
                    FormatEntry::Element(h, ref t) => (i, h, t.clone()),
                    FormatEntry::Marker => unreachable!(),
                });

            let Some((fmt_elem_index, fmt_elem, fmt_elem_tag)) = maybe_fmt_entry else {
                self.process_end_tag_in_body(TagToken {
                    kind: EndTag,
                    tag: subject,
                    name: StrTendril::from_slice(subject.name()),
                    self_closing: false,
                    attrs: vec![],
                    pos: self.current_pos,
                });
                return;
            };

            // 6.
            let Some(fmt_elem_stack_index) = self
                .open_elems
                .iter()
                .rposition(|&n| n == fmt_elem)
            else {
                self.parse_error(ErrorKind::FormattingElementNotOpen);
                self.active_formatting.remove(fmt_elem_index);
                return;
            };

            // 7.
            if !self.in_scope(default_scope, |n| n == fmt_elem) {
                self.parse_error(ErrorKind::FormattingElementNotInScope);
                return;
            }

            // 8.
            if self.current_node() != fmt_elem {
                self.parse_error(ErrorKind::MisnestedTag);
            }

            // 9.
            let maybe_furthest_block = self
                .open_elems
                .iter()
                .enumerate()
                .skip(fmt_elem_stack_index)
                .find(|&(_, &open_element)| self.elem_in(open_element, special_tag))
                .map(|(i, &h)| (i, h));

            let Some((furthest_block_index, furthest_block)) = maybe_furthest_block else {
                // 10.
                for &popped in &self.open_elems[fmt_elem_stack_index..] {
                    if let Some(e) = self.doc.elem_mut(popped) {
                        e.flags.implicit_end = true;
                    }
                }
                self.open_elems.truncate(fmt_elem_stack_index);
                self.active_formatting.remove(fmt_elem_index);
                return;
            };

            // 11.
            let common_ancestor = self.open_elems[fmt_elem_stack_index - 1];

            // 12.
            let mut bookmark = Bookmark::Replace(fmt_elem);

            // 13.
            let mut node;
            let mut node_index = furthest_block_index;
            let mut last_node = furthest_block;

            // 13.1.
            let mut inner_counter = 0;
            loop {
                // 13.2.
                inner_counter += 1;

                // 13.3.
                node_index -= 1;
                node = self.open_elems[node_index];

                // 13.4.
                if node == fmt_elem {
                    break;
                }

                // 13.5.
                if inner_counter > 3 {
                    if let Some(position) = self.position_in_active_formatting(node) {
                        self.active_formatting.remove(position);
                    }
                    self.open_elems.remove(node_index);
                    continue;
                }

                let Some(node_formatting_index) = self.position_in_active_formatting(node) else {
                    // 13.6.
                    self.open_elems.remove(node_index);
                    continue;
                };

                // 13.7.
                let tag = match self.active_formatting[node_formatting_index] {
                    FormatEntry::Element(h, ref t) => {
                        assert_eq!(h, node);
                        t.clone()
                    },
                    FormatEntry::Marker => panic!("Found marker during adoption agency"),
                };
                let new_element = self.create_element_for_clone(&tag);
                self.open_elems[node_index] = new_element;
                self.active_formatting[node_formatting_index] =
                    FormatEntry::Element(new_element, tag);
                node = new_element;

                // 13.8.
                if last_node == furthest_block {
                    bookmark = Bookmark::InsertAfter(node);
                }

                // 13.9.
                self.doc.detach(last_node);
                self.doc.append(node, last_node);

                // 13.10.
                last_node = node;

                // 13.11.
            }

            // 14.
            self.doc.detach(last_node);
            self.insert_appropriately(AppendNode(last_node), Some(common_ancestor));

            // 15.
            let new_element = self.create_element_for_clone(&fmt_elem_tag);
            let new_entry = FormatEntry::Element(new_element, fmt_elem_tag);

            // 16.
            self.doc.reparent_children(furthest_block, new_element);

            // 17.
            self.doc.append(furthest_block, new_element);

            // 18.
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

            // 19.
            self.remove_from_stack(fmt_elem);
            let new_furthest_block_index = self
                .open_elems
                .iter()
                .position(|&n| n == furthest_block)
                .expect("furthest block missing from open element stack");
            self.open_elems
                .insert(new_furthest_block_index + 1, new_element);

            // 20.
        }
    }

    /// Build a fresh element from a saved formatting-element token, for
    /// reconstruction and the adoption agency. The element is created
    /// detached; callers attach and stack it.
    fn create_element_for_clone(&mut self, tag: &TagToken) -> NodeId {
        let mut elem = Element::new(
            Namespace::Html,
            tag.tag,
            tag.name.clone(),
            tag.attrs.clone(),
            tag.pos,
        );
        elem.flags.reconstructed = true;
        self.doc.create_element(elem)
    }

    fn push(&mut self, elem: NodeId) {
        self.open_elems.push(elem);
    }

    fn pop(&mut self) -> NodeId {
        self.open_elems.pop().expect("no current element")
    }

    /// Pop the current node, closed implicitly rather than by its own end
    /// tag.
    fn pop_implicit(&mut self) -> NodeId {
        let elem = self.pop();
        if let Some(e) = self.doc.elem_mut(elem) {
            e.flags.implicit_end = true;
        }
        elem
    }

    /// Record the position of a matched end tag on the element it closes.
    fn note_end_pos(&mut self, elem: NodeId) {
        let pos = self.current_pos;
        if let Some(e) = self.doc.elem_mut(elem) {
            e.end_pos = Some(pos);
        }
    }

    fn remove_from_stack(&mut self, elem: NodeId) {
        let position = self.open_elems.iter().rposition(|&x| x == elem);
        if let Some(position) = position {
            self.open_elems.remove(position);
        }
    }

    fn is_marker_or_open(&self, entry: &FormatEntry) -> bool {
        match *entry {
            FormatEntry::Marker => true,
            FormatEntry::Element(node, _) => self.open_elems.iter().rev().any(|&n| n == node),
        }
    }

    /// <https://html.spec.whatwg.org/#reconstruct-the-active-formatting-elements>
    fn reconstruct_active_formatting_elements(&mut self) {
        {
            // Step 1. If there are no entries in the list of active formatting elements,
            // then there is nothing to reconstruct; stop this algorithm.
            let Some(last) = self.active_formatting.last() else {
                return;
            };

            // Step 2. If the last (most recently added) entry in the list of active formatting elements is a marker,
            // or if it is an element that is in the stack of open elements, then there is nothing to reconstruct;
            // stop this algorithm.
            if self.is_marker_or_open(last) {
                return;
            }
        }

        // Step 3. Let entry be the last (most recently added) element in the list of active formatting elements.
        // NOTE: We track the index of the element instead
        let mut entry_index = self.active_formatting.len() - 1;
        loop {
            // Step 4. Rewind: If there are no entries before entry in the list of active formatting elements,
            // then jump to the step labeled create.
            if entry_index == 0 {
                break;
            }

            // Step 5. Let entry be the entry one earlier than entry in the list of active formatting elements.
            entry_index -= 1;

            // Step 6. If entry is neither a marker nor an element that is also in the stack of open elements,
            // go to the step labeled rewind.
            // Step 7. Advance: Let entry be the element one later than entry in the list
            // of active formatting elements.
            if self.is_marker_or_open(&self.active_formatting[entry_index]) {
                entry_index += 1;
                break;
            }
        }

        loop {
            // Step 8. Create: Insert an HTML element for the token for which the element entry was created,
            // to obtain new element.
            let tag = match self.active_formatting[entry_index] {
                FormatEntry::Element(_, ref t) => t.clone(),
                FormatEntry::Marker => {
                    panic!("Found marker during formatting element reconstruction")
                },
            };

            let new_element = self.insert_element(Push, Namespace::Html, tag.tag, tag.name.clone(), tag.attrs.clone());
            if let Some(e) = self.doc.elem_mut(new_element) {
                e.flags.reconstructed = true;
            }

            // Step 9. Replace the entry for entry in the list with an entry for new element.
            self.active_formatting[entry_index] = FormatEntry::Element(new_element, tag);

            // Step 10. If the entry for new element in the list of active formatting elements is
            // not the last entry in the list, return to the step labeled advance.
            if entry_index == self.active_formatting.len() - 1 {
                break;
            }
            entry_index += 1;
        }
    }

    /// Get the first element on the stack, which will be the <html> element.
    fn html_elem(&self) -> NodeId {
        self.open_elems[0]
    }

    /// Get the second element on the stack, if it's a HTML body element.
    fn body_elem(&self) -> Option<NodeId> {
        if self.open_elems.len() <= 1 {
            return None;
        }

        let node = self.open_elems[1];
        if self.html_elem_named(node, Tag::Body) {
            Some(node)
        } else {
            None
        }
    }

    /// Signal an error depending on the state of the stack of open elements at
    /// the end of the body.
    fn check_body_end(&mut self) {
        declare_tag_set!(body_end_ok =
            Dd Dt Li Optgroup Option P Rp Rt Tbody Td Tfoot Th
            Thead Tr Body Html);

        for i in 0..self.open_elems.len() {
            let elem = self.open_elems[i];
            let name = self.elem_name(elem);
            if body_end_ok(name) {
                continue;
            }

            let detail = name.1.name().to_string();
            self.parse_error_detail(ErrorKind::UnclosedElementsAtEof, &detail);
            // FIXME: Do we keep checking after finding one bad tag?
            // The standard suggests not.
            return;
        }
    }

    fn in_scope<TagSet, Pred>(&self, scope: TagSet, pred: Pred) -> bool
    where
        TagSet: Fn((Namespace, Tag)) -> bool,
        Pred: Fn(NodeId) -> bool,
    {
        for &node in self.open_elems.iter().rev() {
            if pred(node) {
                return true;
            }
            if scope(self.elem_name(node)) {
                return false;
            }
        }

        // supposed to be impossible, because <html> is always in scope

        false
    }

    fn elem_in<TagSet>(&self, elem: NodeId, set: TagSet) -> bool
    where
        TagSet: Fn((Namespace, Tag)) -> bool,
    {
        set(self.elem_name(elem))
    }

    fn html_elem_named(&self, elem: NodeId, tag: Tag) -> bool {
        self.elem_name(elem) == (Namespace::Html, tag)
    }

    /// Does this element match an end tag token, including by original name
    /// for unknown tags?
    fn elem_matches_tag(&self, elem: NodeId, tag: &TagToken) -> bool {
        let e = match self.doc.elem(elem) {
            Some(e) => e,
            None => return false,
        };
        e.ns == Namespace::Html
            && e.tag == tag.tag
            && (tag.tag != Tag::Unknown || e.name == tag.name)
    }

    fn in_html_elem_named(&self, tag: Tag) -> bool {
        self.open_elems
            .iter()
            .any(|&elem| self.html_elem_named(elem, tag))
    }

    fn current_node_named(&self, tag: Tag) -> bool {
        self.html_elem_named(self.current_node(), tag)
    }

    fn in_scope_named<TagSet>(&self, scope: TagSet, tag: Tag) -> bool
    where
        TagSet: Fn((Namespace, Tag)) -> bool,
    {
        self.in_scope(scope, |elem| self.html_elem_named(elem, tag))
    }

    //§ closing-elements-that-have-implied-end-tags
    fn generate_implied_end_tags<TagSet>(&mut self, set: TagSet)
    where
        TagSet: Fn((Namespace, Tag)) -> bool,
    {
        loop {
            {
                let Some(&elem) = self.open_elems.last() else {
                    return;
                };
                if !set(self.elem_name(elem)) {
                    return;
                }
            }
            self.pop_implicit();
        }
    }

    fn generate_implied_end_except(&mut self, except: Tag) {
        self.generate_implied_end_tags(|p| {
            if p == (Namespace::Html, except) {
                false
            } else {
                cursory_implied_end(p)
            }
        });
    }
    //§ END

    // Pop elements until the current element is in the set.
    fn pop_until_current<TagSet>(&mut self, tag_set: TagSet)
    where
        TagSet: Fn((Namespace, Tag)) -> bool,
    {
        while !self.current_node_in(&tag_set) {
            self.pop_implicit();
        }
    }

    // Pop elements until an element from the set has been popped. Returns the
    // number of elements popped.
    fn pop_until<P>(&mut self, pred: P) -> usize
    where
        P: Fn((Namespace, Tag)) -> bool,
    {
        let mut n = 0;
        loop {
            n += 1;
            match self.open_elems.pop() {
                None => break,
                Some(elem) => {
                    if pred(self.elem_name(elem)) {
                        self.note_end_pos(elem);
                        break;
                    }
                    if let Some(e) = self.doc.elem_mut(elem) {
                        e.flags.implicit_end = true;
                    }
                },
            }
        }
        n
    }

    fn pop_until_named(&mut self, tag: Tag) -> usize {
        self.pop_until(|p| p == (Namespace::Html, tag))
    }

    /// Pop elements until one with the specified tag has been popped.
    /// Signal an error if it was not the first one.
    fn expect_to_close(&mut self, tag: Tag) {
        if self.pop_until_named(tag) != 1 {
            let detail = tag.name().to_string();
            self.parse_error_detail(ErrorKind::MisnestedTag, &detail);
        }
    }

    fn close_p_element(&mut self) {
        declare_tag_set!(implied = [cursory_implied_end] - P);
        self.generate_implied_end_tags(implied);
        self.expect_to_close(Tag::P);
    }

    fn close_p_element_in_button_scope(&mut self) {
        if self.in_scope_named(button_scope, Tag::P) {
            self.close_p_element();
        }
    }

    // Check <input> tags for type=hidden
    fn is_type_hidden(&self, tag: &TagToken) -> bool {
        match tag.get_attribute("type") {
            None => false,
            Some(value) => value.eq_ignore_ascii_case("hidden"),
        }
    }

    fn foster_parent_in_body(&mut self, token: Token) -> ProcessResult {
        warn!("foster parenting not implemented");
        self.foster_parenting = true;
        let res = self.step(InsertionMode::InBody, token);
        // FIXME: what if res is Reprocess?
        self.foster_parenting = false;
        res
    }

    fn process_chars_in_table(&mut self, token: Token) -> ProcessResult {
        declare_tag_set!(table_outer = Table Tbody Tfoot Thead Tr);
        if self.current_node_in(table_outer) {
            assert!(self.pending_table_text.is_empty());
            self.orig_mode = Some(self.mode);
            ProcessResult::Reprocess(InsertionMode::InTableText, token)
        } else {
            self.parse_error(ErrorKind::NonSpaceInTable);
            self.foster_parent_in_body(token)
        }
    }

    // https://html.spec.whatwg.org/multipage/#reset-the-insertion-mode-appropriately
    fn reset_insertion_mode(&self) -> InsertionMode {
        for (i, &mut_node) in self.open_elems.iter().enumerate().rev() {
            let mut node = mut_node;
            let last = i == 0usize;
            if let (true, Some(ctx)) = (last, self.context_elem) {
                node = ctx;
            }
            let (ns, tag) = self.elem_name(node);
            if ns != Namespace::Html {
                continue;
            }
            match tag {
                Tag::Select => {
                    for &ancestor in self.open_elems[0..i].iter().rev() {
                        if self.html_elem_named(ancestor, Tag::Template) {
                            return InsertionMode::InSelect;
                        } else if self.html_elem_named(ancestor, Tag::Table) {
                            return InsertionMode::InSelectInTable;
                        }
                    }
                    return InsertionMode::InSelect;
                },
                Tag::Td | Tag::Th => {
                    if !last {
                        return InsertionMode::InCell;
                    }
                },
                Tag::Tr => return InsertionMode::InRow,
                Tag::Tbody | Tag::Thead | Tag::Tfoot => {
                    return InsertionMode::InTableBody;
                },
                Tag::Caption => return InsertionMode::InCaption,
                Tag::Colgroup => return InsertionMode::InColumnGroup,
                Tag::Table => return InsertionMode::InTable,
                Tag::Template => return *self.template_modes.last().unwrap(),
                Tag::Head => {
                    if !last {
                        return InsertionMode::InHead;
                    }
                },
                Tag::Body => return InsertionMode::InBody,
                Tag::Frameset => return InsertionMode::InFrameset,
                Tag::Html => match self.head_elem {
                    None => return InsertionMode::BeforeHead,
                    Some(_) => return InsertionMode::AfterHead,
                },

                _ => (),
            }
        }
        InsertionMode::InBody
    }

    fn close_the_cell(&mut self) {
        self.generate_implied_end_tags(cursory_implied_end);
        if self.pop_until(td_th) != 1 {
            self.parse_error(ErrorKind::MisnestedTag);
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
        let root = self.doc.root();
        self.doc.append(root, comment);
        ProcessResult::Done
    }

    fn append_comment_to_html(&mut self, text: StrTendril) -> ProcessResult {
        let target = self.html_elem();
        let comment = self.doc.create_comment(text);
        self.doc.append(target, comment);
        ProcessResult::Done
    }

    //§ creating-and-inserting-nodes
    fn create_root(&mut self, attrs: Vec<Attribute>) {
        let mut elem = Element::new(
            Namespace::Html,
            Tag::Html,
            StrTendril::from_slice("html"),
            attrs,
            self.current_pos,
        );
        elem.flags.created_by_parser = true;
        let elem = self.doc.create_element(elem);
        self.push(elem);
        let root = self.doc.root();
        self.doc.append(root, elem);
        // FIXME: application cache selection algorithm
    }

    // https://html.spec.whatwg.org/multipage/#create-an-element-for-the-token
    fn insert_element(
        &mut self,
        push: PushFlag,
        ns: Namespace,
        tag: Tag,
        name: StrTendril,
        attrs: Vec<Attribute>,
    ) -> NodeId {
        declare_tag_set!(form_associatable =
            Button Fieldset Input Object
            Output Select Textarea Img);

        declare_tag_set!(listed = [form_associatable] - Img);

        // Step 7.
        let elem = self
            .doc
            .create_element(Element::new(ns, tag, name, attrs, self.current_pos));

        let insertion_point = self.appropriate_place_for_insertion(None);

        // Step 12.
        if form_associatable((ns, tag))
            && self.form_elem.is_some()
            && !self.in_html_elem_named(Tag::Template)
            && !(listed((ns, tag))
                && self
                    .doc
                    .elem(elem)
                    .unwrap()
                    .attrs
                    .iter()
                    .any(|a| a.name.ns == Namespace::None && &*a.name.local == "form"))
        {
            let form = self.form_elem.unwrap();
            self.doc.elem_mut(elem).unwrap().form_owner = Some(form);
        }

        self.insert_at(insertion_point, AppendNode(elem));

        match push {
            Push => self.push(elem),
            NoPush => (),
        }
        // FIXME: Remove from the stack if we can't append?
        elem
    }

    fn insert_element_for(&mut self, tag: TagToken) -> NodeId {
        let pos = tag.pos;
        let elem = self.insert_element(Push, Namespace::Html, tag.tag, tag.name, tag.attrs);
        if let Some(e) = self.doc.elem_mut(elem) {
            e.start_pos = pos;
        }
        elem
    }

    fn insert_and_pop_element_for(&mut self, tag: TagToken) -> NodeId {
        let pos = tag.pos;
        let elem = self.insert_element(NoPush, Namespace::Html, tag.tag, tag.name, tag.attrs);
        if let Some(e) = self.doc.elem_mut(elem) {
            e.start_pos = pos;
        }
        elem
    }

    fn insert_phantom(&mut self, tag: Tag) -> NodeId {
        let elem = self.insert_element(
            Push,
            Namespace::Html,
            tag,
            StrTendril::from_slice(tag.name()),
            vec![],
        );
        if let Some(e) = self.doc.elem_mut(elem) {
            e.flags.created_by_parser = true;
        }
        elem
    }
    //§ END

    fn create_formatting_element_for(&mut self, tag: TagToken) -> NodeId {
        // FIXME: This really wants unit tests.
        let mut first_match = None;
        let mut matches = 0usize;
        for (i, entry) in self.active_formatting.iter().enumerate().rev() {
            match *entry {
                FormatEntry::Marker => break,
                FormatEntry::Element(_, ref old_tag) => {
                    if tag.equiv_modulo_attr_order(old_tag) {
                        first_match = Some(i);
                        matches += 1;
                    }
                },
            }
        }

        if matches >= 3 {
            self.active_formatting
                .remove(first_match.expect("matches with no index"));
        }

        let elem = self.insert_element(
            Push,
            Namespace::Html,
            tag.tag,
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

    fn process_end_tag_in_body(&mut self, tag: TagToken) {
        // Look back for a matching open element.
        let mut match_idx = None;
        for i in (0..self.open_elems.len()).rev() {
            let elem = self.open_elems[i];
            if self.elem_matches_tag(elem, &tag) {
                match_idx = Some(i);
                break;
            }

            if self.elem_in(elem, special_tag) {
                self.parse_error(ErrorKind::OrphanedEndTag);
                return;
            }
        }

        let Some(match_idx) = match_idx else {
            // I believe this is impossible, because the root
            // <html> element is in special_tag.
            self.unexpected_tag(&tag);
            return;
        };

        self.generate_implied_end_except(tag.tag);

        if match_idx != self.open_elems.len() - 1 {
            // mis-nested tags
            self.unexpected_tag(&tag);
        }
        self.note_end_pos(self.open_elems[match_idx]);
        for &elem in &self.open_elems[match_idx + 1..] {
            if let Some(e) = self.doc.elem_mut(elem) {
                e.flags.implicit_end = true;
            }
        }
        self.open_elems.truncate(match_idx);
    }

    fn handle_misnested_a_tags(&mut self, tag: &TagToken) {
        let Some(node) = self
            .active_formatting
            .iter()
            .rev()
            .take_while(|e| !matches!(**e, FormatEntry::Marker))
            .find_map(|e| match *e {
                FormatEntry::Element(h, _) if self.html_elem_named(h, Tag::A) => Some(h),
                _ => None,
            })
        else {
            return;
        };

        self.unexpected_tag(tag);
        self.adoption_agency(Tag::A);
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
        let name = self.elem_name(current);
        if name.0 == Namespace::Html {
            return false;
        }

        if mathml_text_integration_point(name) {
            match *token {
                Token::Characters(..) | Token::NullCharacter => return false,
                Token::Tag(TagToken {
                    kind: StartTag,
                    tag,
                    ..
                }) if !matches!(tag, Tag::Mglyph | Tag::Malignmark) => {
                    return false;
                },
                _ => (),
            }
        }

        if svg_html_integration_point(name) {
            match *token {
                Token::Characters(..) | Token::NullCharacter => return false,
                Token::Tag(TagToken { kind: StartTag, .. }) => return false,
                _ => (),
            }
        }

        if name == (Namespace::MathMl, Tag::AnnotationXml) {
            match *token {
                Token::Tag(TagToken {
                    kind: StartTag,
                    tag: Tag::Svg,
                    ..
                }) => return false,
                Token::Characters(..)
                | Token::NullCharacter
                | Token::Tag(TagToken { kind: StartTag, .. }) => {
                    return !self
                        .doc
                        .elem(current)
                        .map(|e| e.flags.mathml_annotation_xml_integration_point)
                        .unwrap_or(false);
                },
                _ => {},
            };
        }

        true
    }
    //§ END

    fn enter_foreign(&mut self, mut tag: TagToken, ns: Namespace) -> ProcessResult {
        match ns {
            Namespace::MathMl => self.adjust_mathml_attributes(&mut tag),
            Namespace::Svg => self.adjust_svg_attributes(&mut tag),
            _ => (),
        }
        self.adjust_foreign_attributes(&mut tag);

        if tag.self_closing {
            self.insert_element(NoPush, ns, tag.tag, tag.name, tag.attrs);
            ProcessResult::DoneAckSelfClosing
        } else {
            self.insert_element(Push, ns, tag.tag, tag.name, tag.attrs);
            ProcessResult::Done
        }
    }

    fn adjust_svg_tag_name(&self, tag: &mut TagToken) {
        let replacement = match &*tag.name {
            "altglyph" => "altGlyph",
            "altglyphdef" => "altGlyphDef",
            "altglyphitem" => "altGlyphItem",
            "animatecolor" => "animateColor",
            "animatemotion" => "animateMotion",
            "animatetransform" => "animateTransform",
            "clippath" => "clipPath",
            "feblend" => "feBlend",
            "fecolormatrix" => "feColorMatrix",
            "fecomponenttransfer" => "feComponentTransfer",
            "fecomposite" => "feComposite",
            "feconvolvematrix" => "feConvolveMatrix",
            "fediffuselighting" => "feDiffuseLighting",
            "fedisplacementmap" => "feDisplacementMap",
            "fedistantlight" => "feDistantLight",
            "fedropshadow" => "feDropShadow",
            "feflood" => "feFlood",
            "fefunca" => "feFuncA",
            "fefuncb" => "feFuncB",
            "fefuncg" => "feFuncG",
            "fefuncr" => "feFuncR",
            "fegaussianblur" => "feGaussianBlur",
            "feimage" => "feImage",
            "femerge" => "feMerge",
            "femergenode" => "feMergeNode",
            "femorphology" => "feMorphology",
            "feoffset" => "feOffset",
            "fepointlight" => "fePointLight",
            "fespecularlighting" => "feSpecularLighting",
            "fespotlight" => "feSpotLight",
            "fetile" => "feTile",
            "feturbulence" => "feTurbulence",
            "foreignobject" => "foreignObject",
            "glyphref" => "glyphRef",
            "lineargradient" => "linearGradient",
            "radialgradient" => "radialGradient",
            "textpath" => "textPath",
            _ => return,
        };
        tag.name = StrTendril::from_slice(replacement);
    }

    fn adjust_attributes<F>(&self, tag: &mut TagToken, mut map: F)
    where
        F: FnMut(&str) -> Option<AttrName>,
    {
        for attr in &mut tag.attrs {
            if let Some(replacement) = map(&attr.name.local) {
                attr.name = replacement;
            }
        }
    }

    fn adjust_svg_attributes(&self, tag: &mut TagToken) {
        self.adjust_attributes(tag, |k| {
            let replacement = match k {
                "attributename" => "attributeName",
                "attributetype" => "attributeType",
                "basefrequency" => "baseFrequency",
                "baseprofile" => "baseProfile",
                "calcmode" => "calcMode",
                "clippathunits" => "clipPathUnits",
                "diffuseconstant" => "diffuseConstant",
                "edgemode" => "edgeMode",
                "filterunits" => "filterUnits",
                "glyphref" => "glyphRef",
                "gradienttransform" => "gradientTransform",
                "gradientunits" => "gradientUnits",
                "kernelmatrix" => "kernelMatrix",
                "kernelunitlength" => "kernelUnitLength",
                "keypoints" => "keyPoints",
                "keysplines" => "keySplines",
                "keytimes" => "keyTimes",
                "lengthadjust" => "lengthAdjust",
                "limitingconeangle" => "limitingConeAngle",
                "markerheight" => "markerHeight",
                "markerunits" => "markerUnits",
                "markerwidth" => "markerWidth",
                "maskcontentunits" => "maskContentUnits",
                "maskunits" => "maskUnits",
                "numoctaves" => "numOctaves",
                "pathlength" => "pathLength",
                "patterncontentunits" => "patternContentUnits",
                "patterntransform" => "patternTransform",
                "patternunits" => "patternUnits",
                "pointsatx" => "pointsAtX",
                "pointsaty" => "pointsAtY",
                "pointsatz" => "pointsAtZ",
                "preservealpha" => "preserveAlpha",
                "preserveaspectratio" => "preserveAspectRatio",
                "primitiveunits" => "primitiveUnits",
                "refx" => "refX",
                "refy" => "refY",
                "repeatcount" => "repeatCount",
                "repeatdur" => "repeatDur",
                "requiredextensions" => "requiredExtensions",
                "requiredfeatures" => "requiredFeatures",
                "specularconstant" => "specularConstant",
                "specularexponent" => "specularExponent",
                "spreadmethod" => "spreadMethod",
                "startoffset" => "startOffset",
                "stddeviation" => "stdDeviation",
                "stitchtiles" => "stitchTiles",
                "surfacescale" => "surfaceScale",
                "systemlanguage" => "systemLanguage",
                "tablevalues" => "tableValues",
                "targetx" => "targetX",
                "targety" => "targetY",
                "textlength" => "textLength",
                "viewbox" => "viewBox",
                "viewtarget" => "viewTarget",
                "xchannelselector" => "xChannelSelector",
                "ychannelselector" => "yChannelSelector",
                "zoomandpan" => "zoomAndPan",
                _ => return None,
            };
            Some(AttrName::local(StrTendril::from_slice(replacement)))
        });
    }

    fn adjust_mathml_attributes(&self, tag: &mut TagToken) {
        self.adjust_attributes(tag, |k| match k {
            "definitionurl" => Some(AttrName::local(StrTendril::from_slice("definitionURL"))),
            _ => None,
        });
    }

    fn adjust_foreign_attributes(&self, tag: &mut TagToken) {
        self.adjust_attributes(tag, |k| {
            let (prefix, ns, local) = match k {
                "xlink:actuate" => (Some("xlink"), Namespace::XLink, "actuate"),
                "xlink:arcrole" => (Some("xlink"), Namespace::XLink, "arcrole"),
                "xlink:href" => (Some("xlink"), Namespace::XLink, "href"),
                "xlink:role" => (Some("xlink"), Namespace::XLink, "role"),
                "xlink:show" => (Some("xlink"), Namespace::XLink, "show"),
                "xlink:title" => (Some("xlink"), Namespace::XLink, "title"),
                "xlink:type" => (Some("xlink"), Namespace::XLink, "type"),
                "xml:lang" => (Some("xml"), Namespace::Xml, "lang"),
                "xml:space" => (Some("xml"), Namespace::Xml, "space"),
                "xmlns" => (None, Namespace::XmlNs, "xmlns"),
                "xmlns:xlink" => (Some("xmlns"), Namespace::XmlNs, "xlink"),
                _ => return None,
            };
            Some(AttrName {
                prefix,
                ns,
                local: StrTendril::from_slice(local),
            })
        });
    }

    fn foreign_start_tag(&mut self, mut tag: TagToken) -> ProcessResult {
        let current_ns = self.elem_name(self.adjusted_current_node()).0;
        match current_ns {
            Namespace::MathMl => self.adjust_mathml_attributes(&mut tag),
            Namespace::Svg => {
                self.adjust_svg_tag_name(&mut tag);
                self.adjust_svg_attributes(&mut tag);
            },
            _ => (),
        }
        self.adjust_foreign_attributes(&mut tag);
        if tag.self_closing {
            // FIXME: <script /> in SVG
            self.insert_element(NoPush, current_ns, tag.tag, tag.name, tag.attrs);
            ProcessResult::DoneAckSelfClosing
        } else {
            self.insert_element(Push, current_ns, tag.tag, tag.name, tag.attrs);
            ProcessResult::Done
        }
    }

    fn unexpected_start_tag_in_foreign_content(&mut self, tag: TagToken) -> ProcessResult {
        self.parse_error_detail(ErrorKind::ForeignContentIntegrationMismatch, &tag.name);
        while !self.current_node_in(|n| {
            n.0 == Namespace::Html || mathml_text_integration_point(n) || svg_html_integration_point(n)
        }) {
            self.pop_implicit();
        }
        self.step(self.mode, Token::Tag(tag))
    }

    fn mark_script_already_started(&mut self, node: NodeId) {
        if let Some(e) = self.doc.elem_mut(node) {
            e.flags.script_already_started = true;
        }
    }
}
