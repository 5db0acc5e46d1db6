// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use serde::Deserialize;

use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let out_dir = env::var("OUT_DIR").unwrap();

    named_entities_to_phf(
        &Path::new(&manifest_dir).join("data").join("entities.json"),
        &Path::new(&out_dir).join("named_entities.rs"),
    );

    println!("cargo:rerun-if-changed=data/entities.json");
}

fn named_entities_to_phf(from: &Path, to: &Path) {
    // A struct matching the entries in entities.json.
    #[derive(Deserialize, Debug)]
    struct CharRef {
        codepoints: Vec<u32>,
    }

    let entities: HashMap<String, CharRef> =
        serde_json::from_reader(File::open(from).unwrap()).unwrap();
    let mut entities: HashMap<&str, (u32, u32)> = entities
        .iter()
        .map(|(name, char_ref)| {
            assert!(name.starts_with('&'));
            assert!(!char_ref.codepoints.is_empty() && char_ref.codepoints.len() <= 2);
            (
                &name[1..],
                (
                    char_ref.codepoints[0],
                    *char_ref.codepoints.get(1).unwrap_or(&0),
                ),
            )
        })
        .collect();

    // Add every missing prefix of those keys, mapping to NULL characters.
    // One map then answers both "is this still a prefix?" and "is this an
    // accepting state?" for the longest-match walk.
    for key in entities.keys().cloned().collect::<Vec<_>>() {
        for n in 1..key.len() {
            entities.entry(&key[..n]).or_insert((0, 0));
        }
    }
    entities.insert("", (0, 0));

    let mut phf_map = phf_codegen::Map::new();
    for (key, value) in entities {
        phf_map.entry(key, &format!("{:?}", value));
    }

    let mut file = BufWriter::new(File::create(to).unwrap());
    writeln!(
        &mut file,
        r#"
/// A map of entity names to their codepoints. The second codepoint will
/// be 0 if the entity contains a single codepoint. Entities have their
/// preceding '&' removed. Entries mapping to (0, 0) are proper prefixes
/// of longer names, not names themselves.
"#
    )
    .unwrap();
    writeln!(
        &mut file,
        "pub static NAMED_ENTITIES: ::phf::Map<&'static str, (u32, u32)> = {};",
        phf_map.build()
    )
    .unwrap();
}
