// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The document tree.
//!
//! Nodes live in an arena owned by [`Document`] and refer to each other by
//! [`NodeId`]. The open-elements stack and the active formatting list hold
//! plain ids into the same arena, so no reference cycles can form and
//! "the tree owns the element, the stack weakly references it" falls out
//! of the representation.

use crate::errors::Position;
use crate::tags::{Attribute, Namespace, Tag};
use crate::tendril::StrTendril;

/// Index of a node in the document arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

/// <https://dom.spec.whatwg.org/#concept-document-quirks>
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum QuirksMode {
    Quirks,
    LimitedQuirks,
    NoQuirks,
}

/// Parser bookkeeping flags on an element.
#[derive(Copy, Clone, Default, Debug)]
pub struct ElementFlags {
    /// Synthesized with no corresponding start tag (phantom head, body,
    /// tbody, colgroup, ...).
    pub created_by_parser: bool,
    /// Closed by implied-end-tag generation or a forced close, not by its
    /// own end tag.
    pub implicit_end: bool,
    /// Produced by reconstructing the active formatting list, including
    /// adoption-agency clones.
    pub reconstructed: bool,
    /// For `<script>`: the element must not run (fragment context, or
    /// interrupted by EOF).
    pub script_already_started: bool,
    /// `<annotation-xml>` whose `encoding` makes it an HTML integration
    /// point. Computed once at creation.
    pub mathml_annotation_xml_integration_point: bool,
}

/// An element node.
pub struct Element {
    pub ns: Namespace,
    pub tag: Tag,
    /// The name as parsed (post foreign-content adjustment). Always
    /// populated, also for known tags.
    pub name: StrTendril,
    pub attrs: Vec<Attribute>,
    /// Position of the start tag name.
    pub start_pos: Position,
    /// Position of the matching end tag name, when one was seen.
    pub end_pos: Option<Position>,
    pub flags: ElementFlags,
    /// For `<template>`: the separate fragment root holding the template's
    /// contents. Not part of any child list.
    pub template_contents: Option<NodeId>,
    /// The form owner assigned at insertion time, for form-associatable
    /// elements.
    pub form_owner: Option<NodeId>,
}

impl Element {
    pub fn new(
        ns: Namespace,
        tag: Tag,
        name: StrTendril,
        attrs: Vec<Attribute>,
        start_pos: Position,
    ) -> Element {
        let annotation_xml_ip = tag == Tag::AnnotationXml
            && attrs.iter().any(|a| {
                a.name.ns == Namespace::None
                    && &*a.name.local == "encoding"
                    && (a.value.eq_ignore_ascii_case("text/html")
                        || a.value.eq_ignore_ascii_case("application/xhtml+xml"))
            });
        Element {
            ns,
            tag,
            name,
            attrs,
            start_pos,
            end_pos: None,
            flags: ElementFlags {
                mathml_annotation_xml_integration_point: annotation_xml_ip,
                ..ElementFlags::default()
            },
            template_contents: None,
            form_owner: None,
        }
    }
}

/// What a node is.
pub enum NodeData {
    /// The document root, and the fragment roots owned by `<template>`
    /// elements.
    Document,
    Doctype {
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    },
    Element(Element),
    Text {
        contents: StrTendril,
        /// Whitespace-only runs are flagged; the table modes treat them
        /// differently from other character data.
        whitespace: bool,
    },
    Comment {
        contents: StrTendril,
    },
}

pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

/// The arena. Created once per parse; owns every node.
pub struct Document {
    nodes: Vec<Node>,
    quirks_mode: QuirksMode,
}

fn is_all_whitespace(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_whitespace())
}

impl Document {
    pub fn new() -> Document {
        Document {
            nodes: vec![Node {
                parent: None,
                children: vec![],
                data: NodeData::Document,
            }],
            quirks_mode: QuirksMode::NoQuirks,
        }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    pub fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: None,
            children: vec![],
            data,
        });
        id
    }

    pub fn create_element(&mut self, mut elem: Element) -> NodeId {
        if elem.tag == Tag::Template && elem.ns == Namespace::Html {
            elem.template_contents = Some(self.alloc(NodeData::Document));
        }
        self.alloc(NodeData::Element(elem))
    }

    pub fn create_comment(&mut self, contents: StrTendril) -> NodeId {
        self.alloc(NodeData::Comment { contents })
    }

    pub fn create_doctype(
        &mut self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) -> NodeId {
        self.alloc(NodeData::Doctype {
            name,
            public_id,
            system_id,
        })
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.idx()]
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.idx()].data
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.idx()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.idx()].parent
    }

    /// The element payload, if `id` is an element.
    pub fn elem(&self, id: NodeId) -> Option<&Element> {
        match self.nodes[id.idx()].data {
            NodeData::Element(ref e) => Some(e),
            _ => None,
        }
    }

    pub fn elem_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes[id.idx()].data {
            NodeData::Element(ref mut e) => Some(e),
            _ => None,
        }
    }

    /// The fragment root of a template element.
    pub fn template_contents(&self, id: NodeId) -> NodeId {
        self.elem(id)
            .and_then(|e| e.template_contents)
            .expect("not a template element")
    }

    /// Remove `child` from its parent's child list, if it has a parent.
    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes[child.idx()].parent.take() else {
            return;
        };
        let children = &mut self.nodes[parent.idx()].children;
        let pos = children
            .iter()
            .position(|&c| c == child)
            .expect("child not found in parent");
        children.remove(pos);
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.idx()].parent = Some(parent);
        self.nodes[parent.idx()].children.push(child);
    }

    /// Insert `child` immediately before `sibling` under the same parent.
    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) {
        self.detach(child);
        let parent = self.nodes[sibling.idx()]
            .parent
            .expect("sibling has no parent");
        self.nodes[child.idx()].parent = Some(parent);
        let children = &mut self.nodes[parent.idx()].children;
        let pos = children
            .iter()
            .position(|&c| c == sibling)
            .expect("sibling not found in parent");
        children.insert(pos, child);
    }

    /// Move all children of `from` to the end of `to`'s child list,
    /// preserving order.
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.nodes[from.idx()].children);
        for &child in &children {
            self.nodes[child.idx()].parent = Some(to);
        }
        self.nodes[to.idx()].children.extend(children);
    }

    /// Append character data as the last child of `parent`, coalescing with
    /// an existing trailing text node.
    pub fn append_text(&mut self, parent: NodeId, text: StrTendril) {
        let ws = is_all_whitespace(&text);
        if let Some(&last) = self.nodes[parent.idx()].children.last() {
            if let NodeData::Text {
                ref mut contents,
                ref mut whitespace,
            } = self.nodes[last.idx()].data
            {
                contents.push_tendril(&text);
                *whitespace = *whitespace && ws;
                return;
            }
        }
        let node = self.alloc(NodeData::Text {
            contents: text,
            whitespace: ws,
        });
        self.append(parent, node);
    }

    /// Insert character data immediately before `sibling`, coalescing with
    /// a text node that already precedes it.
    pub fn insert_text_before(&mut self, sibling: NodeId, text: StrTendril) {
        let ws = is_all_whitespace(&text);
        let parent = self.nodes[sibling.idx()]
            .parent
            .expect("sibling has no parent");
        let pos = self.nodes[parent.idx()]
            .children
            .iter()
            .position(|&c| c == sibling)
            .expect("sibling not found in parent");
        if pos > 0 {
            let prev = self.nodes[parent.idx()].children[pos - 1];
            if let NodeData::Text {
                ref mut contents,
                ref mut whitespace,
            } = self.nodes[prev.idx()].data
            {
                contents.push_tendril(&text);
                *whitespace = *whitespace && ws;
                return;
            }
        }
        let node = self.alloc(NodeData::Text {
            contents: text,
            whitespace: ws,
        });
        self.insert_before(sibling, node);
    }

    /// Add each attribute to the element, unless an attribute with that
    /// name already exists (`<html>`/`<body>` attribute merging).
    pub fn add_attrs_if_missing(&mut self, target: NodeId, attrs: Vec<Attribute>) {
        let elem = self.elem_mut(target).expect("not an element");
        for attr in attrs {
            if !elem.attrs.iter().any(|a| a.name.local == attr.name.local) {
                elem.attrs.push(attr);
            }
        }
    }

    /// Number of nodes ever allocated, including detached ones.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for Document {
    fn default() -> Document {
        Document::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tendril::SliceExt;

    fn elem(doc: &mut Document, tag: Tag) -> NodeId {
        doc.create_element(Element::new(
            Namespace::Html,
            tag,
            tag.name().to_tendril(),
            vec![],
            Position::start(),
        ))
    }

    #[test]
    fn append_and_detach() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = elem(&mut doc, Tag::Div);
        let b = elem(&mut doc, Tag::P);
        doc.append(root, a);
        doc.append(a, b);
        assert_eq!(doc.parent(b), Some(a));
        assert_eq!(doc.children(a), &[b]);

        // Re-appending moves rather than duplicates.
        doc.append(root, b);
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(root), &[a, b]);
    }

    #[test]
    fn text_coalescing() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.append_text(root, "foo".to_tendril());
        doc.append_text(root, " bar".to_tendril());
        assert_eq!(doc.children(root).len(), 1);
        match doc.data(doc.children(root)[0]) {
            NodeData::Text {
                contents,
                whitespace,
            } => {
                assert_eq!(&**contents, "foo bar");
                assert!(!whitespace);
            },
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn whitespace_flag() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.append_text(root, " \t\n".to_tendril());
        match doc.data(doc.children(root)[0]) {
            NodeData::Text { whitespace, .. } => assert!(whitespace),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn template_gets_fragment_root() {
        let mut doc = Document::new();
        let t = elem(&mut doc, Tag::Template);
        let contents = doc.template_contents(t);
        assert!(matches!(doc.data(contents), NodeData::Document));
        assert_eq!(doc.parent(contents), None);
    }

    #[test]
    fn insert_before_keeps_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let table = elem(&mut doc, Tag::Table);
        doc.append(root, table);
        let a = elem(&mut doc, Tag::A);
        doc.insert_before(table, a);
        assert_eq!(doc.children(root), &[a, table]);
    }
}
