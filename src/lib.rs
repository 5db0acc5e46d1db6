// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A browser-grade HTML5 parser.
//!
//! `canopy` consumes UTF-8 text and produces the document tree a
//! conforming user agent would build, including all of the error-recovery
//! behavior of the HTML standard: implied tags, foster parenting, the
//! adoption agency algorithm, and foreign (SVG/MathML) content.
//! Malformed input never fails; every non-conforming construct is
//! reported as a positioned [`ParseError`] and recovered from exactly as
//! the standard requires.
//!
//! ```ignore
//! use canopy::{parse_document, ParseOpts};
//!
//! let output = parse_document("<p>hi</p>", ParseOpts::default());
//! assert!(output.errors.is_empty());
//! let doc = &output.document;
//! ```

#[macro_use]
mod util;

pub mod driver;
pub mod errors;
pub mod input;
pub mod tags;
pub mod tokenizer;
pub mod tree;
pub mod tree_builder;

/// Re-export the tendril crate.
pub use tendril;

pub use crate::util::smallcharset::SmallCharSet;

pub use crate::driver::{
    parse_document, parse_fragment, ParseOpts, ParseOutput, ParseStatus, Parser,
};
pub use crate::errors::{ErrorKind, ParseError, Position};
pub use crate::tags::{AttrName, Attribute, Namespace, Tag};
pub use crate::tree::{Document, Element, ElementFlags, Node, NodeData, NodeId, QuirksMode};
