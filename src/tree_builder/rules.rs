// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// The tree builder rules, as a single, enormous nested match expression.

use crate::errors::ErrorKind;
use crate::tags::{Namespace, Tag};
use crate::tendril::StrTendril;
use crate::tokenizer::states::{Rawtext, Rcdata, ScriptData};
use crate::tokenizer::{EndTag, StartTag, TagToken};
use crate::tree::{Element, QuirksMode};
use crate::tree_builder::tag_sets::*;
use crate::tree_builder::types::*;
use crate::tree_builder::NodeOrText::AppendNode;
use crate::tree_builder::TreeBuilder;

fn any_not_whitespace(x: &StrTendril) -> bool {
    // FIXME: this might be much faster as a byte scan
    x.chars().any(|c| !c.is_ascii_whitespace())
}

#[doc(hidden)]
impl TreeBuilder {
    pub(crate) fn step(&mut self, mode: InsertionMode, token: Token) -> ProcessResult {
        self.debug_step(mode, &token);

        match mode {
            //§ the-initial-insertion-mode
            InsertionMode::Initial => match token {
                Token::Characters(SplitStatus::NotSplit, text) => {
                    ProcessResult::SplitWhitespace(text)
                },
                Token::Characters(SplitStatus::Whitespace, _) => ProcessResult::Done,
                Token::Comment(text) => self.append_comment_to_doc(text),
                token => {
                    if !self.opts.iframe_srcdoc {
                        self.unexpected(&token);
                        self.set_quirks_mode(QuirksMode::Quirks);
                    }
                    ProcessResult::Reprocess(InsertionMode::BeforeHtml, token)
                },
            },

            //§ the-before-html-insertion-mode
            InsertionMode::BeforeHtml => {
                let token = match token {
                    Token::Characters(SplitStatus::NotSplit, text) => {
                        return ProcessResult::SplitWhitespace(text)
                    },
                    Token::Characters(SplitStatus::Whitespace, _) => return ProcessResult::Done,
                    Token::Comment(text) => return self.append_comment_to_doc(text),

                    Token::Tag(tag) => match (tag.kind, tag.tag) {
                        (StartTag, Tag::Html) => {
                            self.create_root(tag.attrs);
                            self.mode = InsertionMode::BeforeHead;
                            return ProcessResult::Done;
                        },
                        (EndTag, Tag::Head | Tag::Body | Tag::Html | Tag::Br) => Token::Tag(tag),
                        (EndTag, _) => return self.unexpected_tag(&tag),
                        _ => Token::Tag(tag),
                    },

                    token => token,
                };
                self.create_root(vec![]);
                ProcessResult::Reprocess(InsertionMode::BeforeHead, token)
            },

            //§ the-before-head-insertion-mode
            InsertionMode::BeforeHead => {
                let token = match token {
                    Token::Characters(SplitStatus::NotSplit, text) => {
                        return ProcessResult::SplitWhitespace(text)
                    },
                    Token::Characters(SplitStatus::Whitespace, _) => return ProcessResult::Done,
                    Token::Comment(text) => return self.append_comment(text),

                    Token::Tag(tag) => match (tag.kind, tag.tag) {
                        (StartTag, Tag::Html) => {
                            return self.step(InsertionMode::InBody, Token::Tag(tag))
                        },
                        (StartTag, Tag::Head) => {
                            self.head_elem = Some(self.insert_element_for(tag));
                            self.mode = InsertionMode::InHead;
                            return ProcessResult::Done;
                        },
                        (EndTag, Tag::Head | Tag::Body | Tag::Html | Tag::Br) => Token::Tag(tag),
                        (EndTag, _) => return self.unexpected_tag(&tag),
                        _ => Token::Tag(tag),
                    },

                    token => token,
                };
                self.head_elem = Some(self.insert_phantom(Tag::Head));
                ProcessResult::Reprocess(InsertionMode::InHead, token)
            },

            //§ parsing-main-inhead
            InsertionMode::InHead => {
                let token = match token {
                    Token::Characters(SplitStatus::NotSplit, text) => {
                        return ProcessResult::SplitWhitespace(text)
                    },
                    Token::Characters(SplitStatus::Whitespace, text) => {
                        return self.append_text(text)
                    },
                    Token::Comment(text) => return self.append_comment(text),

                    Token::Tag(tag) => match (tag.kind, tag.tag) {
                        (StartTag, Tag::Html) => {
                            return self.step(InsertionMode::InBody, Token::Tag(tag))
                        },

                        (
                            StartTag,
                            Tag::Base | Tag::Basefont | Tag::Bgsound | Tag::Link | Tag::Meta,
                        ) => {
                            // FIXME: handle <meta charset=...> and <meta http-equiv="Content-Type">
                            self.insert_and_pop_element_for(tag);
                            return ProcessResult::DoneAckSelfClosing;
                        },

                        (StartTag, Tag::Title) => return self.parse_raw_data(tag, Rcdata),

                        (StartTag, Tag::Noframes | Tag::Style | Tag::Noscript) => {
                            return if !self.opts.scripting_enabled && tag.tag == Tag::Noscript {
                                self.insert_element_for(tag);
                                self.mode = InsertionMode::InHeadNoscript;
                                ProcessResult::Done
                            } else {
                                self.parse_raw_data(tag, Rawtext)
                            };
                        },

                        (StartTag, Tag::Script) => {
                            let elem = self.doc.create_element(Element::new(
                                Namespace::Html,
                                Tag::Script,
                                tag.name,
                                tag.attrs,
                                tag.pos,
                            ));
                            if self.is_fragment() {
                                self.mark_script_already_started(elem);
                            }
                            self.insert_appropriately(AppendNode(elem), None);
                            self.push(elem);
                            return self.to_raw_text_mode(ScriptData);
                        },

                        (EndTag, Tag::Head) => {
                            let head = self.pop();
                            self.note_end_pos(head);
                            self.mode = InsertionMode::AfterHead;
                            return ProcessResult::Done;
                        },

                        (EndTag, Tag::Body | Tag::Html | Tag::Br) => Token::Tag(tag),

                        (StartTag, Tag::Template) => {
                            self.insert_element_for(tag);
                            self.active_formatting.push(FormatEntry::Marker);
                            self.frameset_ok = false;
                            self.mode = InsertionMode::InTemplate;
                            self.template_modes.push(InsertionMode::InTemplate);
                            return ProcessResult::Done;
                        },

                        (EndTag, Tag::Template) => {
                            if !self.in_html_elem_named(Tag::Template) {
                                self.unexpected_tag(&tag);
                            } else {
                                self.generate_implied_end_tags(thorough_implied_end);
                                self.expect_to_close(Tag::Template);
                                self.clear_active_formatting_to_marker();
                                self.template_modes.pop();
                                self.mode = self.reset_insertion_mode();
                            }
                            return ProcessResult::Done;
                        },

                        (StartTag, Tag::Head) => return self.unexpected_tag(&tag),
                        (EndTag, _) => return self.unexpected_tag(&tag),
                        _ => Token::Tag(tag),
                    },

                    token => token,
                };
                self.pop();
                ProcessResult::Reprocess(InsertionMode::AfterHead, token)
            },

            //§ parsing-main-inheadnoscript
            InsertionMode::InHeadNoscript => {
                let token = match token {
                    Token::Characters(SplitStatus::NotSplit, text) => {
                        return ProcessResult::SplitWhitespace(text)
                    },
                    Token::Characters(SplitStatus::Whitespace, _) => {
                        return self.step(InsertionMode::InHead, token)
                    },
                    Token::Comment(_) => return self.step(InsertionMode::InHead, token),

                    Token::Tag(tag) => match (tag.kind, tag.tag) {
                        (StartTag, Tag::Html) => {
                            return self.step(InsertionMode::InBody, Token::Tag(tag))
                        },

                        (EndTag, Tag::Noscript) => {
                            let node = self.pop();
                            self.note_end_pos(node);
                            self.mode = InsertionMode::InHead;
                            return ProcessResult::Done;
                        },

                        (
                            StartTag,
                            Tag::Basefont
                            | Tag::Bgsound
                            | Tag::Link
                            | Tag::Meta
                            | Tag::Noframes
                            | Tag::Style,
                        ) => return self.step(InsertionMode::InHead, Token::Tag(tag)),

                        (EndTag, Tag::Br) => Token::Tag(tag),

                        (StartTag, Tag::Head | Tag::Noscript) => return self.unexpected_tag(&tag),
                        (EndTag, _) => return self.unexpected_tag(&tag),
                        _ => Token::Tag(tag),
                    },

                    token => token,
                };
                self.unexpected(&token);
                self.pop_implicit();
                ProcessResult::Reprocess(InsertionMode::InHead, token)
            },

            //§ the-after-head-insertion-mode
            InsertionMode::AfterHead => {
                let token = match token {
                    Token::Characters(SplitStatus::NotSplit, text) => {
                        return ProcessResult::SplitWhitespace(text)
                    },
                    Token::Characters(SplitStatus::Whitespace, text) => {
                        return self.append_text(text)
                    },
                    Token::Comment(text) => return self.append_comment(text),

                    Token::Tag(tag) => match (tag.kind, tag.tag) {
                        (StartTag, Tag::Html) => {
                            return self.step(InsertionMode::InBody, Token::Tag(tag))
                        },

                        (StartTag, Tag::Body) => {
                            self.insert_element_for(tag);
                            self.frameset_ok = false;
                            self.mode = InsertionMode::InBody;
                            return ProcessResult::Done;
                        },

                        (StartTag, Tag::Frameset) => {
                            self.insert_element_for(tag);
                            self.mode = InsertionMode::InFrameset;
                            return ProcessResult::Done;
                        },

                        (
                            StartTag,
                            Tag::Base
                            | Tag::Basefont
                            | Tag::Bgsound
                            | Tag::Link
                            | Tag::Meta
                            | Tag::Noframes
                            | Tag::Script
                            | Tag::Style
                            | Tag::Template
                            | Tag::Title,
                        ) => {
                            self.unexpected_tag(&tag);
                            let head = self.head_elem.expect("no head element");
                            self.push(head);
                            let result = self.step(InsertionMode::InHead, Token::Tag(tag));
                            self.remove_from_stack(head);
                            return result;
                        },

                        (EndTag, Tag::Template) => {
                            return self.step(InsertionMode::InHead, Token::Tag(tag))
                        },

                        (EndTag, Tag::Body | Tag::Html | Tag::Br) => Token::Tag(tag),

                        (StartTag, Tag::Head) => return self.unexpected_tag(&tag),
                        (EndTag, _) => return self.unexpected_tag(&tag),
                        _ => Token::Tag(tag),
                    },

                    token => token,
                };
                self.insert_phantom(Tag::Body);
                ProcessResult::Reprocess(InsertionMode::InBody, token)
            },

            //§ parsing-main-inbody
            InsertionMode::InBody => match token {
                Token::NullCharacter => self.unexpected(&token),

                Token::Characters(_, text) => {
                    self.reconstruct_active_formatting_elements();
                    if any_not_whitespace(&text) {
                        self.frameset_ok = false;
                    }
                    self.append_text(text)
                },

                Token::Comment(text) => self.append_comment(text),

                Token::Eof => {
                    if !self.template_modes.is_empty() {
                        self.step(InsertionMode::InTemplate, token)
                    } else {
                        self.check_body_end();
                        self.stop_parsing()
                    }
                },

                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (StartTag, Tag::Html) => {
                        self.unexpected_tag(&tag);
                        if !self.in_html_elem_named(Tag::Template) {
                            let top = self.html_elem();
                            self.doc.add_attrs_if_missing(top, tag.attrs);
                        }
                        ProcessResult::Done
                    },

                    (
                        StartTag,
                        Tag::Base
                        | Tag::Basefont
                        | Tag::Bgsound
                        | Tag::Link
                        | Tag::Meta
                        | Tag::Noframes
                        | Tag::Script
                        | Tag::Style
                        | Tag::Template
                        | Tag::Title,
                    )
                    | (EndTag, Tag::Template) => self.step(InsertionMode::InHead, Token::Tag(tag)),

                    (StartTag, Tag::Body) => {
                        self.unexpected_tag(&tag);
                        match self.body_elem() {
                            Some(node)
                                if self.open_elems.len() != 1
                                    && !self.in_html_elem_named(Tag::Template) =>
                            {
                                self.frameset_ok = false;
                                self.doc.add_attrs_if_missing(node, tag.attrs)
                            },
                            _ => {},
                        }
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Frameset) => {
                        self.unexpected_tag(&tag);
                        if !self.frameset_ok {
                            return ProcessResult::Done;
                        }

                        let Some(body) = self.body_elem() else {
                            return ProcessResult::Done;
                        };
                        self.doc.detach(body);

                        // FIXME: can we get here in the fragment case?
                        // What to do with the first element then?
                        self.open_elems.truncate(1);
                        self.insert_element_for(tag);
                        self.mode = InsertionMode::InFrameset;
                        ProcessResult::Done
                    },

                    (EndTag, Tag::Body) => {
                        if self.in_scope_named(default_scope, Tag::Body) {
                            self.check_body_end();
                            if let Some(body) = self.body_elem() {
                                self.note_end_pos(body);
                            }
                            self.mode = InsertionMode::AfterBody;
                        } else {
                            self.parse_error(ErrorKind::OrphanedEndTag);
                        }
                        ProcessResult::Done
                    },

                    (EndTag, Tag::Html) => {
                        if self.in_scope_named(default_scope, Tag::Body) {
                            self.check_body_end();
                            ProcessResult::Reprocess(InsertionMode::AfterBody, Token::Tag(tag))
                        } else {
                            self.parse_error(ErrorKind::OrphanedEndTag);
                            ProcessResult::Done
                        }
                    },

                    (
                        StartTag,
                        Tag::Address
                        | Tag::Article
                        | Tag::Aside
                        | Tag::Blockquote
                        | Tag::Center
                        | Tag::Details
                        | Tag::Dialog
                        | Tag::Dir
                        | Tag::Div
                        | Tag::Dl
                        | Tag::Fieldset
                        | Tag::Figcaption
                        | Tag::Figure
                        | Tag::Footer
                        | Tag::Header
                        | Tag::Hgroup
                        | Tag::Main
                        | Tag::Menu
                        | Tag::Nav
                        | Tag::Ol
                        | Tag::P
                        | Tag::Search
                        | Tag::Section
                        | Tag::Summary
                        | Tag::Ul,
                    ) => {
                        self.close_p_element_in_button_scope();
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (StartTag, Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6) => {
                        self.close_p_element_in_button_scope();
                        if self.current_node_in(heading_tag) {
                            self.parse_error(ErrorKind::NestedHeadingTags);
                            self.pop_implicit();
                        }
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Pre | Tag::Listing) => {
                        self.close_p_element_in_button_scope();
                        self.insert_element_for(tag);
                        self.ignore_lf = true;
                        self.frameset_ok = false;
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Form) => {
                        if self.form_elem.is_some() && !self.in_html_elem_named(Tag::Template) {
                            self.parse_error(ErrorKind::NestedForms);
                        } else {
                            self.close_p_element_in_button_scope();
                            let elem = self.insert_element_for(tag);
                            if !self.in_html_elem_named(Tag::Template) {
                                self.form_elem = Some(elem);
                            }
                        }
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Li | Tag::Dd | Tag::Dt) => {
                        declare_tag_set!(close_list = Li);
                        declare_tag_set!(close_defn = Dd Dt);
                        declare_tag_set!(extra_special = [special_tag] - Address Div P);
                        let list = match tag.tag {
                            Tag::Li => true,
                            Tag::Dd | Tag::Dt => false,
                            _ => unreachable!(),
                        };

                        self.frameset_ok = false;

                        let mut to_close = None;
                        for &node in self.open_elems.iter().rev() {
                            let name = self.elem_name(node);
                            let can_close = if list {
                                close_list(name)
                            } else {
                                close_defn(name)
                            };
                            if can_close {
                                to_close = Some(name.1);
                                break;
                            }
                            if extra_special(name) {
                                break;
                            }
                        }

                        if let Some(tag) = to_close {
                            self.generate_implied_end_except(tag);
                            self.expect_to_close(tag);
                        }

                        self.close_p_element_in_button_scope();
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Plaintext) => {
                        self.close_p_element_in_button_scope();
                        self.insert_element_for(tag);
                        ProcessResult::ToPlaintext
                    },

                    (StartTag, Tag::Button) => {
                        if self.in_scope_named(default_scope, Tag::Button) {
                            self.parse_error(ErrorKind::NestedButtons);
                            self.generate_implied_end_tags(cursory_implied_end);
                            self.pop_until_named(Tag::Button);
                        }
                        self.reconstruct_active_formatting_elements();
                        self.insert_element_for(tag);
                        self.frameset_ok = false;
                        ProcessResult::Done
                    },

                    (
                        EndTag,
                        Tag::Address
                        | Tag::Article
                        | Tag::Aside
                        | Tag::Blockquote
                        | Tag::Button
                        | Tag::Center
                        | Tag::Details
                        | Tag::Dialog
                        | Tag::Dir
                        | Tag::Div
                        | Tag::Dl
                        | Tag::Fieldset
                        | Tag::Figcaption
                        | Tag::Figure
                        | Tag::Footer
                        | Tag::Header
                        | Tag::Hgroup
                        | Tag::Listing
                        | Tag::Main
                        | Tag::Menu
                        | Tag::Nav
                        | Tag::Ol
                        | Tag::Pre
                        | Tag::Search
                        | Tag::Section
                        | Tag::Summary
                        | Tag::Ul,
                    ) => {
                        if !self.in_scope_named(default_scope, tag.tag) {
                            self.unexpected_tag(&tag);
                        } else {
                            self.generate_implied_end_tags(cursory_implied_end);
                            self.expect_to_close(tag.tag);
                        }
                        ProcessResult::Done
                    },

                    (EndTag, Tag::Form) => {
                        if !self.in_html_elem_named(Tag::Template) {
                            let Some(node) = self.form_elem.take() else {
                                self.parse_error(ErrorKind::OrphanedEndTag);
                                return ProcessResult::Done;
                            };
                            if !self.in_scope(default_scope, |n| n == node) {
                                self.parse_error(ErrorKind::OrphanedEndTag);
                                return ProcessResult::Done;
                            }
                            self.generate_implied_end_tags(cursory_implied_end);
                            let current = self.current_node();
                            self.note_end_pos(node);
                            self.remove_from_stack(node);
                            if current != node {
                                self.parse_error(ErrorKind::MisnestedTag);
                            }
                        } else {
                            if !self.in_scope_named(default_scope, Tag::Form) {
                                self.parse_error(ErrorKind::OrphanedEndTag);
                                return ProcessResult::Done;
                            }
                            self.generate_implied_end_tags(cursory_implied_end);
                            if !self.current_node_named(Tag::Form) {
                                self.parse_error(ErrorKind::MisnestedTag);
                            }
                            self.pop_until_named(Tag::Form);
                        }
                        ProcessResult::Done
                    },

                    (EndTag, Tag::P) => {
                        if !self.in_scope_named(button_scope, Tag::P) {
                            self.parse_error(ErrorKind::OrphanedEndTag);
                            self.insert_phantom(Tag::P);
                        }
                        self.close_p_element();
                        ProcessResult::Done
                    },

                    (EndTag, Tag::Li | Tag::Dd | Tag::Dt) => {
                        let in_scope = if tag.tag == Tag::Li {
                            self.in_scope_named(list_item_scope, tag.tag)
                        } else {
                            self.in_scope_named(default_scope, tag.tag)
                        };
                        if in_scope {
                            self.generate_implied_end_except(tag.tag);
                            self.expect_to_close(tag.tag);
                        } else {
                            self.unexpected_tag(&tag);
                        }
                        ProcessResult::Done
                    },

                    (EndTag, Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6) => {
                        if self.in_scope(default_scope, |n| self.elem_in(n, heading_tag)) {
                            self.generate_implied_end_tags(cursory_implied_end);
                            if !self.current_node_named(tag.tag) {
                                self.parse_error(ErrorKind::MisnestedTag);
                            }
                            self.pop_until(heading_tag);
                        } else {
                            self.unexpected_tag(&tag);
                        }
                        ProcessResult::Done
                    },

                    (StartTag, Tag::A) => {
                        self.handle_misnested_a_tags(&tag);
                        self.reconstruct_active_formatting_elements();
                        self.create_formatting_element_for(tag);
                        ProcessResult::Done
                    },

                    (
                        StartTag,
                        Tag::B
                        | Tag::Big
                        | Tag::Code
                        | Tag::Em
                        | Tag::Font
                        | Tag::I
                        | Tag::S
                        | Tag::Small
                        | Tag::Strike
                        | Tag::Strong
                        | Tag::Tt
                        | Tag::U,
                    ) => {
                        self.reconstruct_active_formatting_elements();
                        self.create_formatting_element_for(tag);
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Nobr) => {
                        self.reconstruct_active_formatting_elements();
                        if self.in_scope_named(default_scope, Tag::Nobr) {
                            self.parse_error(ErrorKind::NestedNobr);
                            self.adoption_agency(Tag::Nobr);
                            self.reconstruct_active_formatting_elements();
                        }
                        self.create_formatting_element_for(tag);
                        ProcessResult::Done
                    },

                    (
                        EndTag,
                        Tag::A
                        | Tag::B
                        | Tag::Big
                        | Tag::Code
                        | Tag::Em
                        | Tag::Font
                        | Tag::I
                        | Tag::Nobr
                        | Tag::S
                        | Tag::Small
                        | Tag::Strike
                        | Tag::Strong
                        | Tag::Tt
                        | Tag::U,
                    ) => {
                        self.adoption_agency(tag.tag);
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Applet | Tag::Marquee | Tag::Object) => {
                        self.reconstruct_active_formatting_elements();
                        self.insert_element_for(tag);
                        self.active_formatting.push(FormatEntry::Marker);
                        self.frameset_ok = false;
                        ProcessResult::Done
                    },

                    (EndTag, Tag::Applet | Tag::Marquee | Tag::Object) => {
                        if !self.in_scope_named(default_scope, tag.tag) {
                            self.unexpected_tag(&tag);
                        } else {
                            self.generate_implied_end_tags(cursory_implied_end);
                            self.expect_to_close(tag.tag);
                            self.clear_active_formatting_to_marker();
                        }
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Table) => {
                        if self.doc.quirks_mode() != QuirksMode::Quirks {
                            self.close_p_element_in_button_scope();
                        }
                        self.insert_element_for(tag);
                        self.frameset_ok = false;
                        self.mode = InsertionMode::InTable;
                        ProcessResult::Done
                    },

                    (EndTag, Tag::Br) => {
                        self.unexpected_tag(&tag);
                        self.step(
                            InsertionMode::InBody,
                            Token::Tag(TagToken {
                                kind: StartTag,
                                attrs: vec![],
                                ..tag
                            }),
                        )
                    },

                    (
                        StartTag,
                        Tag::Area
                        | Tag::Br
                        | Tag::Embed
                        | Tag::Img
                        | Tag::Keygen
                        | Tag::Wbr
                        | Tag::Input,
                    ) => {
                        let keep_frameset_ok = match tag.tag {
                            Tag::Input => self.is_type_hidden(&tag),
                            _ => false,
                        };
                        self.reconstruct_active_formatting_elements();
                        self.insert_and_pop_element_for(tag);
                        if !keep_frameset_ok {
                            self.frameset_ok = false;
                        }
                        ProcessResult::DoneAckSelfClosing
                    },

                    (StartTag, Tag::Param | Tag::Source | Tag::Track) => {
                        self.insert_and_pop_element_for(tag);
                        ProcessResult::DoneAckSelfClosing
                    },

                    (StartTag, Tag::Hr) => {
                        self.close_p_element_in_button_scope();
                        self.insert_and_pop_element_for(tag);
                        self.frameset_ok = false;
                        ProcessResult::DoneAckSelfClosing
                    },

                    (StartTag, Tag::Image) => {
                        self.unexpected_tag(&tag);
                        self.step(
                            InsertionMode::InBody,
                            Token::Tag(TagToken {
                                tag: Tag::Img,
                                name: StrTendril::from_slice("img"),
                                ..tag
                            }),
                        )
                    },

                    (StartTag, Tag::Textarea) => {
                        self.ignore_lf = true;
                        self.frameset_ok = false;
                        self.parse_raw_data(tag, Rcdata)
                    },

                    (StartTag, Tag::Xmp) => {
                        self.close_p_element_in_button_scope();
                        self.reconstruct_active_formatting_elements();
                        self.frameset_ok = false;
                        self.parse_raw_data(tag, Rawtext)
                    },

                    (StartTag, Tag::Iframe) => {
                        self.frameset_ok = false;
                        self.parse_raw_data(tag, Rawtext)
                    },

                    (StartTag, Tag::Noembed) => self.parse_raw_data(tag, Rawtext),

                    // <noscript> handled in wildcard case below

                    (StartTag, Tag::Select) => {
                        self.reconstruct_active_formatting_elements();
                        self.insert_element_for(tag);
                        self.frameset_ok = false;
                        // NB: mode == InBody but possibly self.mode != mode, if
                        // we're processing "as in the rules for InBody".
                        self.mode = match self.mode {
                            InsertionMode::InTable
                            | InsertionMode::InCaption
                            | InsertionMode::InTableBody
                            | InsertionMode::InRow
                            | InsertionMode::InCell => InsertionMode::InSelectInTable,
                            _ => InsertionMode::InSelect,
                        };
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Optgroup | Tag::Option) => {
                        if self.current_node_named(Tag::Option) {
                            self.pop_implicit();
                        }
                        self.reconstruct_active_formatting_elements();
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Rb | Tag::Rtc) => {
                        if self.in_scope_named(default_scope, Tag::Ruby) {
                            self.generate_implied_end_tags(cursory_implied_end);
                        }
                        if !self.current_node_named(Tag::Ruby) {
                            self.unexpected_tag(&tag);
                        }
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Rp | Tag::Rt) => {
                        if self.in_scope_named(default_scope, Tag::Ruby) {
                            self.generate_implied_end_except(Tag::Rtc);
                        }
                        if !self.current_node_named(Tag::Rtc) && !self.current_node_named(Tag::Ruby)
                        {
                            self.unexpected_tag(&tag);
                        }
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Math) => self.enter_foreign(tag, Namespace::MathMl),

                    (StartTag, Tag::Svg) => self.enter_foreign(tag, Namespace::Svg),

                    (
                        StartTag,
                        Tag::Caption
                        | Tag::Col
                        | Tag::Colgroup
                        | Tag::Frame
                        | Tag::Head
                        | Tag::Tbody
                        | Tag::Td
                        | Tag::Tfoot
                        | Tag::Th
                        | Tag::Thead
                        | Tag::Tr,
                    ) => self.unexpected_tag(&tag),

                    (StartTag, _) => {
                        if self.opts.scripting_enabled && tag.tag == Tag::Noscript {
                            self.parse_raw_data(tag, Rawtext)
                        } else {
                            self.reconstruct_active_formatting_elements();
                            self.insert_element_for(tag);
                            ProcessResult::Done
                        }
                    },

                    (EndTag, _) => {
                        self.process_end_tag_in_body(tag);
                        ProcessResult::Done
                    },
                },
            },

            //§ parsing-main-incdata
            InsertionMode::Text => match token {
                Token::Characters(_, text) => self.append_text(text),

                Token::Eof => {
                    self.unexpected(&token);
                    if self.current_node_named(Tag::Script) {
                        let current = self.current_node();
                        self.mark_script_already_started(current);
                    }
                    self.pop_implicit();
                    ProcessResult::Reprocess(self.orig_mode.take().unwrap(), token)
                },

                Token::Tag(tag) => {
                    debug_assert!(tag.kind == EndTag);
                    let node = self.pop();
                    self.note_end_pos(node);
                    self.mode = self.orig_mode.take().unwrap();
                    if tag.tag == Tag::Script {
                        return ProcessResult::Script(node);
                    }
                    ProcessResult::Done
                },

                // The standard doesn't say what to do here.
                // Other tokens are impossible?
                _ => panic!("impossible case in Text mode"),
            },

            //§ parsing-main-intable
            InsertionMode::InTable => match token {
                Token::NullCharacter | Token::Characters(..) => self.process_chars_in_table(token),

                Token::Comment(text) => self.append_comment(text),

                Token::Eof => self.step(InsertionMode::InBody, token),

                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (StartTag, Tag::Caption) => {
                        self.pop_until_current(table_scope);
                        self.active_formatting.push(FormatEntry::Marker);
                        self.insert_element_for(tag);
                        self.mode = InsertionMode::InCaption;
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Colgroup) => {
                        self.pop_until_current(table_scope);
                        self.insert_element_for(tag);
                        self.mode = InsertionMode::InColumnGroup;
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Col) => {
                        self.pop_until_current(table_scope);
                        self.insert_phantom(Tag::Colgroup);
                        ProcessResult::Reprocess(InsertionMode::InColumnGroup, Token::Tag(tag))
                    },

                    (StartTag, Tag::Tbody | Tag::Tfoot | Tag::Thead) => {
                        self.pop_until_current(table_scope);
                        self.insert_element_for(tag);
                        self.mode = InsertionMode::InTableBody;
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Td | Tag::Th | Tag::Tr) => {
                        self.pop_until_current(table_scope);
                        self.insert_phantom(Tag::Tbody);
                        ProcessResult::Reprocess(InsertionMode::InTableBody, Token::Tag(tag))
                    },

                    (StartTag, Tag::Table) => {
                        self.unexpected_tag(&tag);
                        if self.in_scope_named(table_scope, Tag::Table) {
                            self.pop_until_named(Tag::Table);
                            ProcessResult::Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                        } else {
                            ProcessResult::Done
                        }
                    },

                    (EndTag, Tag::Table) => {
                        if self.in_scope_named(table_scope, Tag::Table) {
                            self.pop_until_named(Tag::Table);
                            self.mode = self.reset_insertion_mode();
                        } else {
                            self.unexpected_tag(&tag);
                        }
                        ProcessResult::Done
                    },

                    (
                        EndTag,
                        Tag::Body
                        | Tag::Caption
                        | Tag::Col
                        | Tag::Colgroup
                        | Tag::Html
                        | Tag::Tbody
                        | Tag::Td
                        | Tag::Tfoot
                        | Tag::Th
                        | Tag::Thead
                        | Tag::Tr,
                    ) => self.unexpected_tag(&tag),

                    (StartTag, Tag::Style | Tag::Script | Tag::Template)
                    | (EndTag, Tag::Template) => self.step(InsertionMode::InHead, Token::Tag(tag)),

                    (StartTag, Tag::Input) => {
                        self.unexpected_tag(&tag);
                        if self.is_type_hidden(&tag) {
                            self.insert_and_pop_element_for(tag);
                            ProcessResult::DoneAckSelfClosing
                        } else {
                            self.foster_parent_in_body(Token::Tag(tag))
                        }
                    },

                    (StartTag, Tag::Form) => {
                        self.unexpected_tag(&tag);
                        if !self.in_html_elem_named(Tag::Template) && self.form_elem.is_none() {
                            self.form_elem = Some(self.insert_and_pop_element_for(tag));
                        }
                        ProcessResult::Done
                    },

                    _ => {
                        self.unexpected_tag(&tag);
                        self.foster_parent_in_body(Token::Tag(tag))
                    },
                },
            },

            //§ parsing-main-intabletext
            InsertionMode::InTableText => match token {
                Token::NullCharacter => self.unexpected(&token),

                Token::Characters(split, text) => {
                    self.pending_table_text.push((split, text));
                    ProcessResult::Done
                },

                token => {
                    let pending = std::mem::take(&mut self.pending_table_text);
                    let contains_nonspace = pending.iter().any(|&(split, ref text)| match split {
                        SplitStatus::Whitespace => false,
                        SplitStatus::NotWhitespace => true,
                        SplitStatus::NotSplit => any_not_whitespace(text),
                    });

                    if contains_nonspace {
                        self.parse_error(ErrorKind::NonSpaceInTable);
                        for (split, text) in pending.into_iter() {
                            match self.foster_parent_in_body(Token::Characters(split, text)) {
                                ProcessResult::Done => (),
                                _ => panic!("not prepared to handle this!"),
                            }
                        }
                    } else {
                        for (_, text) in pending.into_iter() {
                            self.append_text(text);
                        }
                    }

                    ProcessResult::Reprocess(self.orig_mode.take().unwrap(), token)
                },
            },

            //§ parsing-main-incaption
            InsertionMode::InCaption => match token {
                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (
                        StartTag,
                        Tag::Caption
                        | Tag::Col
                        | Tag::Colgroup
                        | Tag::Tbody
                        | Tag::Td
                        | Tag::Tfoot
                        | Tag::Th
                        | Tag::Thead
                        | Tag::Tr,
                    )
                    | (EndTag, Tag::Table | Tag::Caption) => {
                        if self.in_scope_named(table_scope, Tag::Caption) {
                            self.generate_implied_end_tags(cursory_implied_end);
                            self.expect_to_close(Tag::Caption);
                            self.clear_active_formatting_to_marker();
                            match (tag.kind, tag.tag) {
                                (EndTag, Tag::Caption) => {
                                    self.mode = InsertionMode::InTable;
                                    ProcessResult::Done
                                },
                                _ => {
                                    ProcessResult::Reprocess(InsertionMode::InTable, Token::Tag(tag))
                                },
                            }
                        } else {
                            self.unexpected_tag(&tag);
                            ProcessResult::Done
                        }
                    },

                    (
                        EndTag,
                        Tag::Body
                        | Tag::Col
                        | Tag::Colgroup
                        | Tag::Html
                        | Tag::Tbody
                        | Tag::Td
                        | Tag::Tfoot
                        | Tag::Th
                        | Tag::Thead
                        | Tag::Tr,
                    ) => self.unexpected_tag(&tag),

                    _ => self.step(InsertionMode::InBody, Token::Tag(tag)),
                },

                token => self.step(InsertionMode::InBody, token),
            },

            //§ parsing-main-incolgroup
            InsertionMode::InColumnGroup => {
                let token = match token {
                    Token::Characters(SplitStatus::NotSplit, text) => {
                        return ProcessResult::SplitWhitespace(text)
                    },
                    Token::Characters(SplitStatus::Whitespace, text) => {
                        return self.append_text(text)
                    },
                    Token::Comment(text) => return self.append_comment(text),

                    Token::Eof => return self.step(InsertionMode::InBody, token),

                    Token::Tag(tag) => match (tag.kind, tag.tag) {
                        (StartTag, Tag::Html) => {
                            return self.step(InsertionMode::InBody, Token::Tag(tag))
                        },

                        (StartTag, Tag::Col) => {
                            self.insert_and_pop_element_for(tag);
                            return ProcessResult::DoneAckSelfClosing;
                        },

                        (EndTag, Tag::Colgroup) => {
                            if self.current_node_named(Tag::Colgroup) {
                                let node = self.pop();
                                self.note_end_pos(node);
                                self.mode = InsertionMode::InTable;
                            } else {
                                self.unexpected_tag(&tag);
                            }
                            return ProcessResult::Done;
                        },

                        (EndTag, Tag::Col) => return self.unexpected_tag(&tag),

                        (StartTag, Tag::Template) | (EndTag, Tag::Template) => {
                            return self.step(InsertionMode::InHead, Token::Tag(tag))
                        },

                        _ => Token::Tag(tag),
                    },

                    token => token,
                };
                if self.current_node_named(Tag::Colgroup) {
                    self.pop_implicit();
                    ProcessResult::Reprocess(InsertionMode::InTable, token)
                } else {
                    self.unexpected(&token)
                }
            },

            //§ parsing-main-intbody
            InsertionMode::InTableBody => match token {
                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (StartTag, Tag::Tr) => {
                        self.pop_until_current(table_body_context);
                        self.insert_element_for(tag);
                        self.mode = InsertionMode::InRow;
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Th | Tag::Td) => {
                        self.unexpected_tag(&tag);
                        self.pop_until_current(table_body_context);
                        self.insert_phantom(Tag::Tr);
                        ProcessResult::Reprocess(InsertionMode::InRow, Token::Tag(tag))
                    },

                    (EndTag, Tag::Tbody | Tag::Tfoot | Tag::Thead) => {
                        if self.in_scope_named(table_scope, tag.tag) {
                            self.pop_until_current(table_body_context);
                            let node = self.pop();
                            self.note_end_pos(node);
                            self.mode = InsertionMode::InTable;
                        } else {
                            self.unexpected_tag(&tag);
                        }
                        ProcessResult::Done
                    },

                    (
                        StartTag,
                        Tag::Caption | Tag::Col | Tag::Colgroup | Tag::Tbody | Tag::Tfoot
                        | Tag::Thead,
                    )
                    | (EndTag, Tag::Table) => {
                        declare_tag_set!(table_outer = Table Tbody Tfoot);
                        if self.in_scope(table_scope, |e| self.elem_in(e, table_outer)) {
                            self.pop_until_current(table_body_context);
                            self.pop_implicit();
                            ProcessResult::Reprocess(InsertionMode::InTable, Token::Tag(tag))
                        } else {
                            self.unexpected_tag(&tag)
                        }
                    },

                    (
                        EndTag,
                        Tag::Body
                        | Tag::Caption
                        | Tag::Col
                        | Tag::Colgroup
                        | Tag::Html
                        | Tag::Td
                        | Tag::Th
                        | Tag::Tr,
                    ) => self.unexpected_tag(&tag),

                    _ => self.step(InsertionMode::InTable, Token::Tag(tag)),
                },

                token => self.step(InsertionMode::InTable, token),
            },

            //§ parsing-main-intr
            InsertionMode::InRow => match token {
                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (StartTag, Tag::Th | Tag::Td) => {
                        self.pop_until_current(table_row_context);
                        self.insert_element_for(tag);
                        self.mode = InsertionMode::InCell;
                        self.active_formatting.push(FormatEntry::Marker);
                        ProcessResult::Done
                    },

                    (EndTag, Tag::Tr) => {
                        if self.in_scope_named(table_scope, Tag::Tr) {
                            self.pop_until_current(table_row_context);
                            let node = self.pop();
                            self.assert_named(node, Tag::Tr);
                            self.note_end_pos(node);
                            self.mode = InsertionMode::InTableBody;
                        } else {
                            self.unexpected_tag(&tag);
                        }
                        ProcessResult::Done
                    },

                    (
                        StartTag,
                        Tag::Caption | Tag::Col | Tag::Colgroup | Tag::Tbody | Tag::Tfoot
                        | Tag::Thead | Tag::Tr,
                    )
                    | (EndTag, Tag::Table) => {
                        if self.in_scope_named(table_scope, Tag::Tr) {
                            self.pop_until_current(table_row_context);
                            let node = self.pop_implicit();
                            self.assert_named(node, Tag::Tr);
                            ProcessResult::Reprocess(InsertionMode::InTableBody, Token::Tag(tag))
                        } else {
                            self.unexpected_tag(&tag)
                        }
                    },

                    (EndTag, Tag::Tbody | Tag::Tfoot | Tag::Thead) => {
                        if self.in_scope_named(table_scope, tag.tag) {
                            if self.in_scope_named(table_scope, Tag::Tr) {
                                self.pop_until_current(table_row_context);
                                let node = self.pop_implicit();
                                self.assert_named(node, Tag::Tr);
                                ProcessResult::Reprocess(InsertionMode::InTableBody, Token::Tag(tag))
                            } else {
                                ProcessResult::Done
                            }
                        } else {
                            self.unexpected_tag(&tag)
                        }
                    },

                    (
                        EndTag,
                        Tag::Body | Tag::Caption | Tag::Col | Tag::Colgroup | Tag::Html | Tag::Td
                        | Tag::Th,
                    ) => self.unexpected_tag(&tag),

                    _ => self.step(InsertionMode::InTable, Token::Tag(tag)),
                },

                token => self.step(InsertionMode::InTable, token),
            },

            //§ parsing-main-intd
            InsertionMode::InCell => match token {
                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (EndTag, Tag::Td | Tag::Th) => {
                        if self.in_scope_named(table_scope, tag.tag) {
                            self.generate_implied_end_tags(cursory_implied_end);
                            self.expect_to_close(tag.tag);
                            self.clear_active_formatting_to_marker();
                            self.mode = InsertionMode::InRow;
                        } else {
                            self.unexpected_tag(&tag);
                        }
                        ProcessResult::Done
                    },

                    (
                        StartTag,
                        Tag::Caption
                        | Tag::Col
                        | Tag::Colgroup
                        | Tag::Tbody
                        | Tag::Td
                        | Tag::Tfoot
                        | Tag::Th
                        | Tag::Thead
                        | Tag::Tr,
                    ) => {
                        if self.in_scope(table_scope, |n| self.elem_in(n, td_th)) {
                            self.close_the_cell();
                            ProcessResult::Reprocess(InsertionMode::InRow, Token::Tag(tag))
                        } else {
                            self.unexpected_tag(&tag)
                        }
                    },

                    (EndTag, Tag::Body | Tag::Caption | Tag::Col | Tag::Colgroup | Tag::Html) => {
                        self.unexpected_tag(&tag)
                    },

                    (EndTag, Tag::Table | Tag::Tbody | Tag::Tfoot | Tag::Thead | Tag::Tr) => {
                        if self.in_scope_named(table_scope, tag.tag) {
                            self.close_the_cell();
                            ProcessResult::Reprocess(InsertionMode::InRow, Token::Tag(tag))
                        } else {
                            self.unexpected_tag(&tag)
                        }
                    },

                    _ => self.step(InsertionMode::InBody, Token::Tag(tag)),
                },

                token => self.step(InsertionMode::InBody, token),
            },

            //§ parsing-main-inselect
            InsertionMode::InSelect => match token {
                Token::NullCharacter => self.unexpected(&token),
                Token::Characters(_, text) => self.append_text(text),
                Token::Comment(text) => self.append_comment(text),

                Token::Eof => self.step(InsertionMode::InBody, token),

                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (StartTag, Tag::Html) => self.step(InsertionMode::InBody, Token::Tag(tag)),

                    (StartTag, Tag::Option) => {
                        if self.current_node_named(Tag::Option) {
                            self.pop_implicit();
                        }
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Optgroup) => {
                        if self.current_node_named(Tag::Option) {
                            self.pop_implicit();
                        }
                        if self.current_node_named(Tag::Optgroup) {
                            self.pop_implicit();
                        }
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Hr) => {
                        if self.current_node_named(Tag::Option) {
                            self.pop_implicit();
                        }
                        if self.current_node_named(Tag::Optgroup) {
                            self.pop_implicit();
                        }
                        self.insert_element_for(tag);
                        self.pop();
                        ProcessResult::DoneAckSelfClosing
                    },

                    (EndTag, Tag::Optgroup) => {
                        if self.open_elems.len() >= 2
                            && self.current_node_named(Tag::Option)
                            && self.html_elem_named(
                                self.open_elems[self.open_elems.len() - 2],
                                Tag::Optgroup,
                            )
                        {
                            self.pop_implicit();
                        }
                        if self.current_node_named(Tag::Optgroup) {
                            let node = self.pop();
                            self.note_end_pos(node);
                        } else {
                            self.unexpected_tag(&tag);
                        }
                        ProcessResult::Done
                    },

                    (EndTag, Tag::Option) => {
                        if self.current_node_named(Tag::Option) {
                            let node = self.pop();
                            self.note_end_pos(node);
                        } else {
                            self.unexpected_tag(&tag);
                        }
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Select) | (EndTag, Tag::Select) => {
                        let in_scope = self.in_scope_named(select_scope, Tag::Select);

                        if !in_scope || tag.kind == StartTag {
                            self.unexpected_tag(&tag);
                        }

                        if in_scope {
                            self.pop_until_named(Tag::Select);
                            self.mode = self.reset_insertion_mode();
                        }
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Input | Tag::Keygen | Tag::Textarea) => {
                        self.unexpected_tag(&tag);
                        if self.in_scope_named(select_scope, Tag::Select) {
                            self.pop_until_named(Tag::Select);
                            ProcessResult::Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                        } else {
                            ProcessResult::Done
                        }
                    },

                    (StartTag, Tag::Script | Tag::Template) | (EndTag, Tag::Template) => {
                        self.step(InsertionMode::InHead, Token::Tag(tag))
                    },

                    _ => self.unexpected_tag(&tag),
                },
            },

            //§ parsing-main-inselectintable
            InsertionMode::InSelectInTable => match token {
                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (
                        StartTag,
                        Tag::Caption
                        | Tag::Table
                        | Tag::Tbody
                        | Tag::Tfoot
                        | Tag::Thead
                        | Tag::Tr
                        | Tag::Td
                        | Tag::Th,
                    ) => {
                        self.unexpected_tag(&tag);
                        self.pop_until_named(Tag::Select);
                        ProcessResult::Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                    },

                    (
                        EndTag,
                        Tag::Caption
                        | Tag::Table
                        | Tag::Tbody
                        | Tag::Tfoot
                        | Tag::Thead
                        | Tag::Tr
                        | Tag::Td
                        | Tag::Th,
                    ) => {
                        self.unexpected_tag(&tag);
                        if self.in_scope_named(table_scope, tag.tag) {
                            self.pop_until_named(Tag::Select);
                            ProcessResult::Reprocess(self.reset_insertion_mode(), Token::Tag(tag))
                        } else {
                            ProcessResult::Done
                        }
                    },

                    _ => self.step(InsertionMode::InSelect, Token::Tag(tag)),
                },

                token => self.step(InsertionMode::InSelect, token),
            },

            //§ parsing-main-intemplate
            InsertionMode::InTemplate => match token {
                Token::Characters(_, _) => self.step(InsertionMode::InBody, token),
                Token::Comment(_) => self.step(InsertionMode::InBody, token),
                Token::NullCharacter => self.step(InsertionMode::InBody, token),

                Token::Eof => {
                    if !self.in_html_elem_named(Tag::Template) {
                        self.stop_parsing()
                    } else {
                        self.parse_error(ErrorKind::TemplateUnclosed);
                        self.pop_until_named(Tag::Template);
                        self.clear_active_formatting_to_marker();
                        self.template_modes.pop();
                        self.mode = self.reset_insertion_mode();
                        ProcessResult::Reprocess(self.reset_insertion_mode(), token)
                    }
                },

                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (
                        StartTag,
                        Tag::Base
                        | Tag::Basefont
                        | Tag::Bgsound
                        | Tag::Link
                        | Tag::Meta
                        | Tag::Noframes
                        | Tag::Script
                        | Tag::Style
                        | Tag::Template
                        | Tag::Title,
                    )
                    | (EndTag, Tag::Template) => self.step(InsertionMode::InHead, Token::Tag(tag)),

                    (StartTag, Tag::Caption | Tag::Colgroup | Tag::Tbody | Tag::Tfoot | Tag::Thead) => {
                        self.template_modes.pop();
                        self.template_modes.push(InsertionMode::InTable);
                        ProcessResult::Reprocess(InsertionMode::InTable, Token::Tag(tag))
                    },

                    (StartTag, Tag::Col) => {
                        self.template_modes.pop();
                        self.template_modes.push(InsertionMode::InColumnGroup);
                        ProcessResult::Reprocess(InsertionMode::InColumnGroup, Token::Tag(tag))
                    },

                    (StartTag, Tag::Tr) => {
                        self.template_modes.pop();
                        self.template_modes.push(InsertionMode::InTableBody);
                        ProcessResult::Reprocess(InsertionMode::InTableBody, Token::Tag(tag))
                    },

                    (StartTag, Tag::Td | Tag::Th) => {
                        self.template_modes.pop();
                        self.template_modes.push(InsertionMode::InRow);
                        ProcessResult::Reprocess(InsertionMode::InRow, Token::Tag(tag))
                    },

                    (StartTag, _) => {
                        self.template_modes.pop();
                        self.template_modes.push(InsertionMode::InBody);
                        ProcessResult::Reprocess(InsertionMode::InBody, Token::Tag(tag))
                    },

                    (EndTag, _) => self.unexpected_tag(&tag),
                },
            },

            //§ parsing-main-afterbody
            InsertionMode::AfterBody => {
                let token = match token {
                    Token::Characters(SplitStatus::NotSplit, text) => {
                        return ProcessResult::SplitWhitespace(text)
                    },
                    Token::Characters(SplitStatus::Whitespace, _) => {
                        return self.step(InsertionMode::InBody, token)
                    },
                    Token::Comment(text) => return self.append_comment_to_html(text),

                    Token::Eof => return self.stop_parsing(),

                    Token::Tag(tag) => match (tag.kind, tag.tag) {
                        (StartTag, Tag::Html) => {
                            return self.step(InsertionMode::InBody, Token::Tag(tag))
                        },

                        (EndTag, Tag::Html) => {
                            if self.is_fragment() {
                                self.unexpected_tag(&tag);
                            } else {
                                self.mode = InsertionMode::AfterAfterBody;
                            }
                            return ProcessResult::Done;
                        },

                        _ => Token::Tag(tag),
                    },

                    token => token,
                };
                self.unexpected(&token);
                ProcessResult::Reprocess(InsertionMode::InBody, token)
            },

            //§ parsing-main-inframeset
            InsertionMode::InFrameset => match token {
                Token::Characters(SplitStatus::NotSplit, text) => {
                    ProcessResult::SplitWhitespace(text)
                },
                Token::Characters(SplitStatus::Whitespace, text) => self.append_text(text),
                Token::Comment(text) => self.append_comment(text),

                Token::Eof => {
                    if self.open_elems.len() != 1 {
                        self.unexpected(&token);
                    }
                    self.stop_parsing()
                },

                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (StartTag, Tag::Html) => self.step(InsertionMode::InBody, Token::Tag(tag)),

                    (StartTag, Tag::Frameset) => {
                        self.insert_element_for(tag);
                        ProcessResult::Done
                    },

                    (EndTag, Tag::Frameset) => {
                        if self.open_elems.len() == 1 {
                            self.unexpected_tag(&tag);
                        } else {
                            let node = self.pop();
                            self.note_end_pos(node);
                            if !self.is_fragment() && !self.current_node_named(Tag::Frameset) {
                                self.mode = InsertionMode::AfterFrameset;
                            }
                        }
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Frame) => {
                        self.insert_and_pop_element_for(tag);
                        ProcessResult::DoneAckSelfClosing
                    },

                    (StartTag, Tag::Noframes) => self.step(InsertionMode::InHead, Token::Tag(tag)),

                    _ => self.unexpected_tag(&tag),
                },

                token => self.unexpected(&token),
            },

            //§ parsing-main-afterframeset
            InsertionMode::AfterFrameset => match token {
                Token::Characters(SplitStatus::NotSplit, text) => {
                    ProcessResult::SplitWhitespace(text)
                },
                Token::Characters(SplitStatus::Whitespace, text) => self.append_text(text),
                Token::Comment(text) => self.append_comment(text),

                Token::Eof => self.stop_parsing(),

                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (StartTag, Tag::Html) => self.step(InsertionMode::InBody, Token::Tag(tag)),

                    (EndTag, Tag::Html) => {
                        self.mode = InsertionMode::AfterAfterFrameset;
                        ProcessResult::Done
                    },

                    (StartTag, Tag::Noframes) => self.step(InsertionMode::InHead, Token::Tag(tag)),

                    _ => self.unexpected_tag(&tag),
                },

                token => self.unexpected(&token),
            },

            //§ the-after-after-body-insertion-mode
            InsertionMode::AfterAfterBody => {
                let token = match token {
                    Token::Characters(SplitStatus::NotSplit, text) => {
                        return ProcessResult::SplitWhitespace(text)
                    },
                    Token::Characters(SplitStatus::Whitespace, _) => {
                        return self.step(InsertionMode::InBody, token)
                    },
                    Token::Comment(text) => return self.append_comment_to_doc(text),

                    Token::Eof => return self.stop_parsing(),

                    Token::Tag(tag) => match (tag.kind, tag.tag) {
                        (StartTag, Tag::Html) => {
                            return self.step(InsertionMode::InBody, Token::Tag(tag))
                        },
                        _ => Token::Tag(tag),
                    },

                    token => token,
                };
                self.unexpected(&token);
                ProcessResult::Reprocess(InsertionMode::InBody, token)
            },

            //§ the-after-after-frameset-insertion-mode
            InsertionMode::AfterAfterFrameset => match token {
                Token::Characters(SplitStatus::NotSplit, text) => {
                    ProcessResult::SplitWhitespace(text)
                },
                Token::Characters(SplitStatus::Whitespace, _) => {
                    self.step(InsertionMode::InBody, token)
                },
                Token::Comment(text) => self.append_comment_to_doc(text),

                Token::Eof => self.stop_parsing(),

                Token::Tag(tag) => match (tag.kind, tag.tag) {
                    (StartTag, Tag::Html) => self.step(InsertionMode::InBody, Token::Tag(tag)),
                    (StartTag, Tag::Noframes) => self.step(InsertionMode::InHead, Token::Tag(tag)),
                    _ => self.unexpected_tag(&tag),
                },

                token => self.unexpected(&token),
            },
            //§ END
        }
    }

    pub(crate) fn step_foreign(&mut self, token: Token) -> ProcessResult {
        match token {
            Token::NullCharacter => {
                self.parse_error(ErrorKind::UnexpectedNull);
                self.append_text(StrTendril::from_slice("\u{fffd}"))
            },

            Token::Characters(_, text) => {
                if any_not_whitespace(&text) {
                    self.frameset_ok = false;
                }
                self.append_text(text)
            },

            Token::Comment(text) => self.append_comment(text),

            Token::Eof => panic!("impossible case in foreign content"),

            Token::Tag(tag) => match (tag.kind, tag.tag) {
                (
                    StartTag,
                    Tag::B
                    | Tag::Big
                    | Tag::Blockquote
                    | Tag::Body
                    | Tag::Br
                    | Tag::Center
                    | Tag::Code
                    | Tag::Dd
                    | Tag::Div
                    | Tag::Dl
                    | Tag::Dt
                    | Tag::Em
                    | Tag::Embed
                    | Tag::H1
                    | Tag::H2
                    | Tag::H3
                    | Tag::H4
                    | Tag::H5
                    | Tag::H6
                    | Tag::Head
                    | Tag::Hr
                    | Tag::I
                    | Tag::Img
                    | Tag::Li
                    | Tag::Listing
                    | Tag::Menu
                    | Tag::Meta
                    | Tag::Nobr
                    | Tag::Ol
                    | Tag::P
                    | Tag::Pre
                    | Tag::Ruby
                    | Tag::S
                    | Tag::Small
                    | Tag::Span
                    | Tag::Strong
                    | Tag::Strike
                    | Tag::Sub
                    | Tag::Sup
                    | Tag::Table
                    | Tag::Tt
                    | Tag::U
                    | Tag::Ul
                    | Tag::Var,
                )
                | (EndTag, Tag::Br | Tag::P) => self.unexpected_start_tag_in_foreign_content(tag),

                (StartTag, Tag::Font) => {
                    let unexpected = tag.attrs.iter().any(|attr| {
                        attr.name.ns == Namespace::None
                            && matches!(&*attr.name.local, "color" | "face" | "size")
                    });
                    if unexpected {
                        self.unexpected_start_tag_in_foreign_content(tag)
                    } else {
                        self.foreign_start_tag(tag)
                    }
                },

                (StartTag, _) => self.foreign_start_tag(tag),

                // FIXME: </script> in SVG

                (EndTag, _) => {
                    let mut first = true;
                    let mut stack_idx = self.open_elems.len() - 1;
                    loop {
                        if stack_idx == 0 {
                            return ProcessResult::Done;
                        }

                        let node = self.open_elems[stack_idx];
                        let html = self.elem_name(node).0 == Namespace::Html;
                        let eq = self
                            .doc
                            .elem(node)
                            .map(|e| e.name.eq_ignore_ascii_case(&tag.name))
                            .unwrap_or(false);

                        if !first && html {
                            let mode = self.mode;
                            return self.step(mode, Token::Tag(tag));
                        }

                        if eq {
                            self.note_end_pos(node);
                            for &elem in &self.open_elems[stack_idx + 1..] {
                                if let Some(e) = self.doc.elem_mut(elem) {
                                    e.flags.implicit_end = true;
                                }
                            }
                            self.open_elems.truncate(stack_idx);
                            return ProcessResult::Done;
                        }

                        if first {
                            self.unexpected_tag(&tag);
                            first = false;
                        }
                        stack_idx -= 1;
                    }
                },
            },
        }
    }
}
