// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::errors::{ParseError, Position};
use crate::tags::{Attribute, Tag};
use crate::tendril::StrTendril;
use crate::tokenizer::states;

pub use self::TagKind::{EndTag, StartTag};
pub use self::Token::{CharacterTokens, CommentToken, DoctypeToken};
pub use self::Token::{EOFToken, NullCharacterToken, ParseErrorToken};

/// A `DOCTYPE` token.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Doctype {
    pub name: Option<StrTendril>,
    pub public_id: Option<StrTendril>,
    pub system_id: Option<StrTendril>,
    pub force_quirks: bool,
}

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum TagKind {
    StartTag,
    EndTag,
}

/// A tag token.
///
/// `tag` is the resolved entry in the tag inventory and `name` the
/// lowercased name as written; for `Tag::Unknown` the name is the only
/// identity the tag has.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct TagToken {
    pub kind: TagKind,
    pub tag: Tag,
    pub name: StrTendril,
    pub self_closing: bool,
    pub attrs: Vec<Attribute>,
    /// Position of the tag name in the source.
    pub pos: Position,
}

impl TagToken {
    /// Are the tags equivalent when we don't care about attribute order?
    /// Also ignores the self-closing flag and positions.
    pub fn equiv_modulo_attr_order(&self, other: &TagToken) -> bool {
        if (self.kind != other.kind) || (self.name != other.name) {
            return false;
        }

        let mut self_attrs = self.attrs.clone();
        let mut other_attrs = other.attrs.clone();
        self_attrs.sort();
        other_attrs.sort();

        self_attrs == other_attrs
    }

    pub fn get_attribute(&self, name: &str) -> Option<StrTendril> {
        self.attrs
            .iter()
            .find(|attr| attr.name.ns == crate::tags::Namespace::None && *attr.name.local == *name)
            .map(|attr| attr.value.clone())
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum Token {
    DoctypeToken(Doctype),
    TagToken(TagToken),
    CommentToken(StrTendril),
    CharacterTokens(StrTendril),
    NullCharacterToken,
    EOFToken,
    ParseErrorToken(ParseError),
}

#[derive(Debug, PartialEq)]
#[must_use]
pub enum TokenSinkResult<Handle> {
    Continue,
    Script(Handle),
    Plaintext,
    RawData(states::RawKind),
}

/// Types which can receive tokens from the tokenizer.
pub trait TokenSink {
    type Handle;

    /// Process a token. `pos` is the source position the tokenizer was at
    /// when it finished the token.
    fn process_token(&mut self, token: Token, pos: Position) -> TokenSinkResult<Self::Handle>;

    /// Signal that tokenization reached the end.
    fn end(&mut self, _pos: Position) {}

    /// Used in the markup declaration open state. By default, this always
    /// returns false and thus all CDATA sections are tokenized as bogus
    /// comments.
    /// <https://html.spec.whatwg.org/multipage/#markup-declaration-open-state>
    fn adjusted_current_node_present_but_not_in_html_namespace(&self) -> bool {
        false
    }

    /// True once the sink has hit its configured error limit; the
    /// tokenizer stops pulling input.
    fn errors_exhausted(&self) -> bool {
        false
    }
}
