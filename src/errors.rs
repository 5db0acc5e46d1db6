// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parse diagnostics.
//!
//! Every non-conforming construct produces one [`ParseError`] and parsing
//! continues; errors never change the shape of the output tree beyond the
//! recovery the HTML standard already mandates.

use std::fmt;

use crate::tendril::StrTendril;

/// An absolute location in the source text.
///
/// `line` and `col` are 1-based; `offset` is a byte offset into the UTF-8
/// input. Column advance over `\t` honours the configured tab stop width.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Position {
    pub offset: u64,
    pub line: u64,
    pub col: u64,
}

impl Position {
    pub fn start() -> Position {
        Position {
            offset: 0,
            line: 1,
            col: 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// The closed taxonomy of parse errors.
///
/// Three strata: input decoding (reserved for the transcoding collaborator,
/// which hands this crate already-valid UTF-8), tokenization (including
/// character references), and tree construction.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    // Input decoding. The parser proper never emits these; they are part of
    // the taxonomy so the decoding front end can share the error list.
    InvalidByteSequence,
    OverlongSequence,
    SurrogateInInput,
    TruncatedSequence,

    // Tokenizer.
    ControlCharInInput,
    UnexpectedNull,
    InvalidFirstTagCharacter,
    EofInTag,
    EofInComment,
    EofInDoctype,
    EofInCdata,
    EofInScriptEscape,
    DuplicateAttribute,
    AttributesOnEndTag,
    SelfClosingEndTag,
    UnexpectedCharacterInTagName,
    UnexpectedCharacterInAttributeName,
    UnexpectedCharacterInAttributeValue,
    MissingQuoteBeforeAttributeValue,
    UnexpectedCharacterInDoctype,
    UnexpectedCharacterInComment,
    MissingWhitespaceBeforeDoctypeName,
    AbruptDoctypePublicIdentifier,
    AbruptDoctypeSystemIdentifier,
    AbruptClosingOfEmptyComment,
    NestedComment,
    IncorrectlyOpenedComment,
    CdataInHtmlContent,

    // Character references.
    CharRefNoDigits,
    CharRefWithoutSemicolon,
    CharRefInvalidCodepoint,
    CharRefNamedInvalid,
    CharRefEofInNumeric,

    // Tree construction.
    BadDoctype,
    UnexpectedDoctype,
    UnexpectedStartTag,
    UnexpectedEndTag,
    UnexpectedToken,
    OrphanedEndTag,
    SelfClosingNonVoid,
    NonSpaceInTable,
    FormattingElementNotOpen,
    FormattingElementNotInScope,
    NestedHeadingTags,
    NestedForms,
    NestedButtons,
    NestedNobr,
    MisnestedTag,
    UnclosedElementsAtEof,
    TemplateUnclosed,
    ForeignContentIntegrationMismatch,
}

/// A single diagnostic: what went wrong, and where.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub position: Position,
    /// Offending tag name, attribute name, or code point, when the parser
    /// was configured with `exact_errors` and the kind has one.
    pub detail: Option<StrTendril>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, position: Position) -> ParseError {
        ParseError {
            kind,
            position,
            detail: None,
        }
    }

    pub fn with_detail(kind: ErrorKind, position: Position, detail: StrTendril) -> ParseError {
        ParseError {
            kind,
            position,
            detail: Some(detail),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail {
            Some(ref d) => write!(f, "{}: {:?}: {}", self.position, self.kind, d),
            None => write!(f, "{}: {:?}", self.position, self.kind),
        }
    }
}
