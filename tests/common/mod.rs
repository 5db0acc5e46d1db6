// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Test support: serialize a document arena in the html5lib tree-dump
//! format, so expected trees can be written as plain strings.

use canopy::{Document, Namespace, NodeData, NodeId};

pub fn dump(doc: &Document) -> String {
    let mut out = String::new();
    for &child in doc.children(doc.root()) {
        dump_node(doc, child, 0, &mut out);
    }
    out
}

/// Dump only the fragment nodes of a fragment parse result.
pub fn dump_fragment(doc: &Document, children: &[NodeId]) -> String {
    let mut out = String::new();
    for &child in children {
        dump_node(doc, child, 0, &mut out);
    }
    out
}

fn dump_node(doc: &Document, id: NodeId, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match doc.data(id) {
        NodeData::Document => {
            // Template contents fragment roots are printed by the caller.
        },
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => {
            if public_id.is_empty() && system_id.is_empty() {
                out.push_str(&format!("| {pad}<!DOCTYPE {name}>\n"));
            } else {
                out.push_str(&format!(
                    "| {pad}<!DOCTYPE {name} \"{public_id}\" \"{system_id}\">\n"
                ));
            }
        },
        NodeData::Comment { contents } => {
            out.push_str(&format!("| {pad}<!-- {contents} -->\n"));
        },
        NodeData::Text { contents, .. } => {
            out.push_str(&format!("| {pad}\"{contents}\"\n"));
        },
        NodeData::Element(elem) => {
            let name = match elem.ns {
                Namespace::Svg => format!("svg {}", elem.name),
                Namespace::MathMl => format!("math {}", elem.name),
                _ => elem.name.to_string(),
            };
            out.push_str(&format!("| {pad}<{name}>\n"));

            let mut attrs: Vec<_> = elem.attrs.iter().collect();
            attrs.sort_by(|a, b| a.name.cmp(&b.name));
            for attr in attrs {
                let apad = "  ".repeat(indent + 1);
                match attr.name.prefix {
                    Some(prefix) => out.push_str(&format!(
                        "| {apad}{} {}=\"{}\"\n",
                        prefix, attr.name.local, attr.value
                    )),
                    None => out.push_str(&format!(
                        "| {apad}{}=\"{}\"\n",
                        attr.name.local, attr.value
                    )),
                }
            }

            if let Some(contents) = elem.template_contents {
                let cpad = "  ".repeat(indent + 1);
                out.push_str(&format!("| {cpad}content\n"));
                for &child in doc.children(contents) {
                    dump_node(doc, child, indent + 2, out);
                }
            }

            for &child in doc.children(id) {
                dump_node(doc, child, indent + 1, out);
            }
        },
    }
}
