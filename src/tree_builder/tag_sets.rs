// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Various sets of elements, used as predicates over `(Namespace, Tag)`.
//!
//! These are the category queries of the element model: scope boundary
//! sets, the special set, implied-end-tag sets, and the foreign
//! integration points.

use crate::tags::{Namespace, Tag};

macro_rules! declare_tag_set_impl ( ($param:ident, $b:ident, $supr:ident, $($tag:ident)+) => (
    match $param {
        $( (crate::tags::Namespace::Html, crate::tags::Tag::$tag) => $b, )+
        p => $supr(p),
    }
));

macro_rules! declare_tag_set_body (
    ($param:ident = [$supr:ident] + $($tag:ident)+)
        => ( declare_tag_set_impl!($param, true, $supr, $($tag)+) );

    ($param:ident = [$supr:ident] - $($tag:ident)+)
        => ( declare_tag_set_impl!($param, false, $supr, $($tag)+) );

    ($param:ident = $($tag:ident)+)
        => ( matches!($param, $( (crate::tags::Namespace::Html, crate::tags::Tag::$tag) )|+ ) );
);

macro_rules! declare_tag_set (
    (pub $name:ident = $($toks:tt)+) => (
        pub(crate) fn $name(p: (crate::tags::Namespace, crate::tags::Tag)) -> bool {
            declare_tag_set_body!(p = $($toks)+)
        }
    );

    ($name:ident = $($toks:tt)+) => (
        fn $name(p: (crate::tags::Namespace, crate::tags::Tag)) -> bool {
            declare_tag_set_body!(p = $($toks)+)
        }
    );
);

//§ has-an-element-in-scope
declare_tag_set!(pub html_default_scope =
    Applet Caption Html Table Td Th Marquee Object Template);

#[inline(always)]
pub(crate) fn default_scope(p: (Namespace, Tag)) -> bool {
    html_default_scope(p) || mathml_text_integration_point(p) || svg_html_integration_point(p)
}

declare_tag_set!(pub list_item_scope = [default_scope] + Ol Ul);
declare_tag_set!(pub button_scope = [default_scope] + Button);
declare_tag_set!(pub table_scope = Html Table Template);

pub(crate) fn select_scope(p: (Namespace, Tag)) -> bool {
    !matches!(
        p,
        (Namespace::Html, Tag::Optgroup) | (Namespace::Html, Tag::Option)
    )
}

declare_tag_set!(pub table_body_context = Tbody Tfoot Thead Template Html);
declare_tag_set!(pub table_row_context = Tr Template Html);
declare_tag_set!(pub td_th = Td Th);

//§ generate-implied-end-tags
declare_tag_set!(pub cursory_implied_end =
    Dd Dt Li Option Optgroup P Rb Rp Rt Rtc);

declare_tag_set!(pub thorough_implied_end = [cursory_implied_end]
    + Caption Colgroup Tbody Td Tfoot Th Thead Tr);

//§ the-stack-of-open-elements
declare_tag_set!(html_special_tag =
    Address Applet Area Article Aside Base Basefont Bgsound Blockquote Body Br Button Caption
    Center Col Colgroup Dd Details Dir Div Dl Dt Embed Fieldset Figcaption Figure Footer Form
    Frame Frameset H1 H2 H3 H4 H5 H6 Head Header Hgroup Hr Html Iframe Img Input Isindex Li
    Link Listing Main Marquee Menu Meta Nav Noembed Noframes Noscript Object Ol P Param
    Plaintext Pre Script Search Section Select Source Style Summary Table Tbody Td Template
    Textarea Tfoot Th Thead Title Tr Track Ul Wbr Xmp);

pub(crate) fn special_tag(p: (Namespace, Tag)) -> bool {
    html_special_tag(p) || mathml_text_integration_point(p) || svg_html_integration_point(p)
}

declare_tag_set!(pub heading_tag = H1 H2 H3 H4 H5 H6);

//§ mathml-text-integration-point
pub(crate) fn mathml_text_integration_point(p: (Namespace, Tag)) -> bool {
    matches!(
        p,
        (
            Namespace::MathMl,
            Tag::Mi | Tag::Mo | Tag::Mn | Tag::Ms | Tag::Mtext
        )
    )
}

//§ html-integration-point
/// The SVG side; `<annotation-xml>` is decided per element from its
/// `encoding` attribute.
pub(crate) fn svg_html_integration_point(p: (Namespace, Tag)) -> bool {
    matches!(
        p,
        (Namespace::Svg, Tag::ForeignObject | Tag::Desc | Tag::Title)
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scopes_nest() {
        let p = (Namespace::Html, Tag::Table);
        assert!(default_scope(p));
        assert!(list_item_scope(p));
        assert!(button_scope(p));
        assert!(table_scope(p));

        let ol = (Namespace::Html, Tag::Ol);
        assert!(!default_scope(ol));
        assert!(list_item_scope(ol));
        assert!(!button_scope(ol));
    }

    #[test]
    fn select_scope_is_inverted() {
        assert!(!select_scope((Namespace::Html, Tag::Option)));
        assert!(!select_scope((Namespace::Html, Tag::Optgroup)));
        assert!(select_scope((Namespace::Html, Tag::Div)));
    }

    #[test]
    fn integration_points_are_scope_boundaries() {
        assert!(default_scope((Namespace::MathMl, Tag::Mi)));
        assert!(default_scope((Namespace::Svg, Tag::ForeignObject)));
        assert!(!default_scope((Namespace::Svg, Tag::Unknown)));
    }
}
