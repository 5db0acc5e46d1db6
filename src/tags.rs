// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The element model: tag names, namespaces, and attributes.
//!
//! Tags the parser dispatches on are a central [`Tag`] enum, resolved from
//! lowercased names through a static map. Anything else is `Tag::Unknown`;
//! elements keep the original name as a string either way.

use phf::phf_map;

use crate::tendril::StrTendril;

/// Element and attribute namespaces.
///
/// Elements use `Html`, `MathMl`, or `Svg`. Attribute names are in no
/// namespace unless foreign-content adjustment assigns `XLink`, `Xml`, or
/// `XmlNs`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Namespace {
    None,
    Html,
    MathMl,
    Svg,
    XLink,
    Xml,
    XmlNs,
}

impl Namespace {
    pub fn url(self) -> &'static str {
        match self {
            Namespace::None => "",
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::XLink => "http://www.w3.org/1999/xlink",
            Namespace::Xml => "http://www.w3.org/XML/1998/namespace",
            Namespace::XmlNs => "http://www.w3.org/2000/xmlns/",
        }
    }

    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Namespace::XLink => Some("xlink"),
            Namespace::Xml => Some("xml"),
            Namespace::XmlNs => Some("xmlns"),
            _ => None,
        }
    }
}

/// The known tags: the HTML tag inventory plus the MathML and SVG tags
/// with parsing significance. Unknown tags carry their name on the element
/// instead.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Tag {
    A,
    Abbr,
    Acronym,
    Address,
    Applet,
    Area,
    Article,
    Aside,
    Audio,
    B,
    Base,
    Basefont,
    Bdi,
    Bdo,
    Bgsound,
    Big,
    Blink,
    Blockquote,
    Body,
    Br,
    Button,
    Canvas,
    Caption,
    Center,
    Cite,
    Code,
    Col,
    Colgroup,
    Data,
    Datalist,
    Dd,
    Del,
    Details,
    Dfn,
    Dialog,
    Dir,
    Div,
    Dl,
    Dt,
    Em,
    Embed,
    Fieldset,
    Figcaption,
    Figure,
    Font,
    Footer,
    Form,
    Frame,
    Frameset,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Head,
    Header,
    Hgroup,
    Hr,
    Html,
    I,
    Iframe,
    Image,
    Img,
    Input,
    Ins,
    Isindex,
    Kbd,
    Keygen,
    Label,
    Legend,
    Li,
    Link,
    Listing,
    Main,
    Map,
    Mark,
    Marquee,
    Menu,
    Menuitem,
    Meta,
    Meter,
    Multicol,
    Nav,
    Nextid,
    Nobr,
    Noembed,
    Noframes,
    Noscript,
    Object,
    Ol,
    Optgroup,
    Option,
    Output,
    P,
    Param,
    Picture,
    Plaintext,
    Pre,
    Progress,
    Q,
    Rb,
    Rp,
    Rt,
    Rtc,
    Ruby,
    S,
    Samp,
    Script,
    Search,
    Section,
    Select,
    Slot,
    Small,
    Source,
    Spacer,
    Span,
    Strike,
    Strong,
    Style,
    Sub,
    Summary,
    Sup,
    Table,
    Tbody,
    Td,
    Template,
    Textarea,
    Tfoot,
    Th,
    Thead,
    Time,
    Title,
    Tr,
    Track,
    Tt,
    U,
    Ul,
    Var,
    Video,
    Wbr,
    Xmp,

    // MathML
    Math,
    Mi,
    Mo,
    Mn,
    Ms,
    Mtext,
    Mglyph,
    Malignmark,
    AnnotationXml,

    // SVG (title and script are shared with the HTML inventory above)
    Svg,
    ForeignObject,
    Desc,

    Unknown,
}

static TAG_BY_NAME: phf::Map<&'static str, Tag> = phf_map! {
    "a" => Tag::A,
    "abbr" => Tag::Abbr,
    "acronym" => Tag::Acronym,
    "address" => Tag::Address,
    "applet" => Tag::Applet,
    "area" => Tag::Area,
    "article" => Tag::Article,
    "aside" => Tag::Aside,
    "audio" => Tag::Audio,
    "b" => Tag::B,
    "base" => Tag::Base,
    "basefont" => Tag::Basefont,
    "bdi" => Tag::Bdi,
    "bdo" => Tag::Bdo,
    "bgsound" => Tag::Bgsound,
    "big" => Tag::Big,
    "blink" => Tag::Blink,
    "blockquote" => Tag::Blockquote,
    "body" => Tag::Body,
    "br" => Tag::Br,
    "button" => Tag::Button,
    "canvas" => Tag::Canvas,
    "caption" => Tag::Caption,
    "center" => Tag::Center,
    "cite" => Tag::Cite,
    "code" => Tag::Code,
    "col" => Tag::Col,
    "colgroup" => Tag::Colgroup,
    "data" => Tag::Data,
    "datalist" => Tag::Datalist,
    "dd" => Tag::Dd,
    "del" => Tag::Del,
    "details" => Tag::Details,
    "dfn" => Tag::Dfn,
    "dialog" => Tag::Dialog,
    "dir" => Tag::Dir,
    "div" => Tag::Div,
    "dl" => Tag::Dl,
    "dt" => Tag::Dt,
    "em" => Tag::Em,
    "embed" => Tag::Embed,
    "fieldset" => Tag::Fieldset,
    "figcaption" => Tag::Figcaption,
    "figure" => Tag::Figure,
    "font" => Tag::Font,
    "footer" => Tag::Footer,
    "form" => Tag::Form,
    "frame" => Tag::Frame,
    "frameset" => Tag::Frameset,
    "h1" => Tag::H1,
    "h2" => Tag::H2,
    "h3" => Tag::H3,
    "h4" => Tag::H4,
    "h5" => Tag::H5,
    "h6" => Tag::H6,
    "head" => Tag::Head,
    "header" => Tag::Header,
    "hgroup" => Tag::Hgroup,
    "hr" => Tag::Hr,
    "html" => Tag::Html,
    "i" => Tag::I,
    "iframe" => Tag::Iframe,
    "image" => Tag::Image,
    "img" => Tag::Img,
    "input" => Tag::Input,
    "ins" => Tag::Ins,
    "isindex" => Tag::Isindex,
    "kbd" => Tag::Kbd,
    "keygen" => Tag::Keygen,
    "label" => Tag::Label,
    "legend" => Tag::Legend,
    "li" => Tag::Li,
    "link" => Tag::Link,
    "listing" => Tag::Listing,
    "main" => Tag::Main,
    "map" => Tag::Map,
    "mark" => Tag::Mark,
    "marquee" => Tag::Marquee,
    "menu" => Tag::Menu,
    "menuitem" => Tag::Menuitem,
    "meta" => Tag::Meta,
    "meter" => Tag::Meter,
    "multicol" => Tag::Multicol,
    "nav" => Tag::Nav,
    "nextid" => Tag::Nextid,
    "nobr" => Tag::Nobr,
    "noembed" => Tag::Noembed,
    "noframes" => Tag::Noframes,
    "noscript" => Tag::Noscript,
    "object" => Tag::Object,
    "ol" => Tag::Ol,
    "optgroup" => Tag::Optgroup,
    "option" => Tag::Option,
    "output" => Tag::Output,
    "p" => Tag::P,
    "param" => Tag::Param,
    "picture" => Tag::Picture,
    "plaintext" => Tag::Plaintext,
    "pre" => Tag::Pre,
    "progress" => Tag::Progress,
    "q" => Tag::Q,
    "rb" => Tag::Rb,
    "rp" => Tag::Rp,
    "rt" => Tag::Rt,
    "rtc" => Tag::Rtc,
    "ruby" => Tag::Ruby,
    "s" => Tag::S,
    "samp" => Tag::Samp,
    "script" => Tag::Script,
    "search" => Tag::Search,
    "section" => Tag::Section,
    "select" => Tag::Select,
    "slot" => Tag::Slot,
    "small" => Tag::Small,
    "source" => Tag::Source,
    "spacer" => Tag::Spacer,
    "span" => Tag::Span,
    "strike" => Tag::Strike,
    "strong" => Tag::Strong,
    "style" => Tag::Style,
    "sub" => Tag::Sub,
    "summary" => Tag::Summary,
    "sup" => Tag::Sup,
    "table" => Tag::Table,
    "tbody" => Tag::Tbody,
    "td" => Tag::Td,
    "template" => Tag::Template,
    "textarea" => Tag::Textarea,
    "tfoot" => Tag::Tfoot,
    "th" => Tag::Th,
    "thead" => Tag::Thead,
    "time" => Tag::Time,
    "title" => Tag::Title,
    "tr" => Tag::Tr,
    "track" => Tag::Track,
    "tt" => Tag::Tt,
    "u" => Tag::U,
    "ul" => Tag::Ul,
    "var" => Tag::Var,
    "video" => Tag::Video,
    "wbr" => Tag::Wbr,
    "xmp" => Tag::Xmp,
    "math" => Tag::Math,
    "mi" => Tag::Mi,
    "mo" => Tag::Mo,
    "mn" => Tag::Mn,
    "ms" => Tag::Ms,
    "mtext" => Tag::Mtext,
    "mglyph" => Tag::Mglyph,
    "malignmark" => Tag::Malignmark,
    "annotation-xml" => Tag::AnnotationXml,
    "svg" => Tag::Svg,
    "foreignobject" => Tag::ForeignObject,
    "desc" => Tag::Desc,
};

impl Tag {
    /// Resolve a lowercased tag name.
    pub fn from_name(name: &str) -> Tag {
        TAG_BY_NAME.get(name).copied().unwrap_or(Tag::Unknown)
    }

    /// The canonical name of a known tag. `Unknown` has no name of its own;
    /// elements carry the original.
    pub fn name(self) -> &'static str {
        match self {
            Tag::A => "a",
            Tag::Abbr => "abbr",
            Tag::Acronym => "acronym",
            Tag::Address => "address",
            Tag::Applet => "applet",
            Tag::Area => "area",
            Tag::Article => "article",
            Tag::Aside => "aside",
            Tag::Audio => "audio",
            Tag::B => "b",
            Tag::Base => "base",
            Tag::Basefont => "basefont",
            Tag::Bdi => "bdi",
            Tag::Bdo => "bdo",
            Tag::Bgsound => "bgsound",
            Tag::Big => "big",
            Tag::Blink => "blink",
            Tag::Blockquote => "blockquote",
            Tag::Body => "body",
            Tag::Br => "br",
            Tag::Button => "button",
            Tag::Canvas => "canvas",
            Tag::Caption => "caption",
            Tag::Center => "center",
            Tag::Cite => "cite",
            Tag::Code => "code",
            Tag::Col => "col",
            Tag::Colgroup => "colgroup",
            Tag::Data => "data",
            Tag::Datalist => "datalist",
            Tag::Dd => "dd",
            Tag::Del => "del",
            Tag::Details => "details",
            Tag::Dfn => "dfn",
            Tag::Dialog => "dialog",
            Tag::Dir => "dir",
            Tag::Div => "div",
            Tag::Dl => "dl",
            Tag::Dt => "dt",
            Tag::Em => "em",
            Tag::Embed => "embed",
            Tag::Fieldset => "fieldset",
            Tag::Figcaption => "figcaption",
            Tag::Figure => "figure",
            Tag::Font => "font",
            Tag::Footer => "footer",
            Tag::Form => "form",
            Tag::Frame => "frame",
            Tag::Frameset => "frameset",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::H5 => "h5",
            Tag::H6 => "h6",
            Tag::Head => "head",
            Tag::Header => "header",
            Tag::Hgroup => "hgroup",
            Tag::Hr => "hr",
            Tag::Html => "html",
            Tag::I => "i",
            Tag::Iframe => "iframe",
            Tag::Image => "image",
            Tag::Img => "img",
            Tag::Input => "input",
            Tag::Ins => "ins",
            Tag::Isindex => "isindex",
            Tag::Kbd => "kbd",
            Tag::Keygen => "keygen",
            Tag::Label => "label",
            Tag::Legend => "legend",
            Tag::Li => "li",
            Tag::Link => "link",
            Tag::Listing => "listing",
            Tag::Main => "main",
            Tag::Map => "map",
            Tag::Mark => "mark",
            Tag::Marquee => "marquee",
            Tag::Menu => "menu",
            Tag::Menuitem => "menuitem",
            Tag::Meta => "meta",
            Tag::Meter => "meter",
            Tag::Multicol => "multicol",
            Tag::Nav => "nav",
            Tag::Nextid => "nextid",
            Tag::Nobr => "nobr",
            Tag::Noembed => "noembed",
            Tag::Noframes => "noframes",
            Tag::Noscript => "noscript",
            Tag::Object => "object",
            Tag::Ol => "ol",
            Tag::Optgroup => "optgroup",
            Tag::Option => "option",
            Tag::Output => "output",
            Tag::P => "p",
            Tag::Param => "param",
            Tag::Picture => "picture",
            Tag::Plaintext => "plaintext",
            Tag::Pre => "pre",
            Tag::Progress => "progress",
            Tag::Q => "q",
            Tag::Rb => "rb",
            Tag::Rp => "rp",
            Tag::Rt => "rt",
            Tag::Rtc => "rtc",
            Tag::Ruby => "ruby",
            Tag::S => "s",
            Tag::Samp => "samp",
            Tag::Script => "script",
            Tag::Search => "search",
            Tag::Section => "section",
            Tag::Select => "select",
            Tag::Slot => "slot",
            Tag::Small => "small",
            Tag::Source => "source",
            Tag::Spacer => "spacer",
            Tag::Span => "span",
            Tag::Strike => "strike",
            Tag::Strong => "strong",
            Tag::Style => "style",
            Tag::Sub => "sub",
            Tag::Summary => "summary",
            Tag::Sup => "sup",
            Tag::Table => "table",
            Tag::Tbody => "tbody",
            Tag::Td => "td",
            Tag::Template => "template",
            Tag::Textarea => "textarea",
            Tag::Tfoot => "tfoot",
            Tag::Th => "th",
            Tag::Thead => "thead",
            Tag::Time => "time",
            Tag::Title => "title",
            Tag::Tr => "tr",
            Tag::Track => "track",
            Tag::Tt => "tt",
            Tag::U => "u",
            Tag::Ul => "ul",
            Tag::Var => "var",
            Tag::Video => "video",
            Tag::Wbr => "wbr",
            Tag::Xmp => "xmp",
            Tag::Math => "math",
            Tag::Mi => "mi",
            Tag::Mo => "mo",
            Tag::Mn => "mn",
            Tag::Ms => "ms",
            Tag::Mtext => "mtext",
            Tag::Mglyph => "mglyph",
            Tag::Malignmark => "malignmark",
            Tag::AnnotationXml => "annotation-xml",
            Tag::Svg => "svg",
            Tag::ForeignObject => "foreignObject",
            Tag::Desc => "desc",
            Tag::Unknown => "",
        }
    }
}

/// An attribute name.
///
/// The namespace is `Namespace::None` except for the foreign-content
/// `xlink:`/`xml:`/`xmlns` adjustments made by the tree builder.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct AttrName {
    pub prefix: Option<&'static str>,
    pub ns: Namespace,
    pub local: StrTendril,
}

impl AttrName {
    pub fn local(local: StrTendril) -> AttrName {
        AttrName {
            prefix: None,
            ns: Namespace::None,
            local,
        }
    }
}

/// A tag attribute. Values keep character references already resolved.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Attribute {
    pub name: AttrName,
    pub value: StrTendril,
}

#[cfg(test)]
mod test {
    use super::Tag;

    #[test]
    fn known_tags_round_trip() {
        for name in ["a", "table", "annotation-xml", "h4", "xmp"] {
            let tag = Tag::from_name(name);
            assert_ne!(tag, Tag::Unknown);
            assert_eq!(tag.name(), name);
        }
    }

    #[test]
    fn svg_canonical_name() {
        assert_eq!(Tag::from_name("foreignobject"), Tag::ForeignObject);
        assert_eq!(Tag::ForeignObject.name(), "foreignObject");
    }

    #[test]
    fn unknown_tags() {
        assert_eq!(Tag::from_name("frobnicator"), Tag::Unknown);
        assert_eq!(Tag::from_name("FOO"), Tag::Unknown);
    }
}
