//! Streaming XML pull parser producing borrowed events.
//!
//! This is the flat event layer underneath [`crate::source::XmlSource`].
//! Events borrow from the parser and are only valid until the next call to
//! [`Parser::read_event`].

mod internal;
pub mod parser;

pub(crate) use internal::{is_name, is_nc_name, is_xml_char_t};
pub use parser::{error::Error, Parser, SaxResult};

use crate::sax::parser::convert_attribute_range;
// Pull API

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attributes<'a> {
    index: usize,
    range_list: &'a [internal::AttributeRange],
    strbuffer: &'a str,
    namespace_strbuffer: &'a str,
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Attribute<'a>;
    fn next(&mut self) -> Option<Attribute<'a>> {
        let range = self.range_list.get(self.index)?;
        self.index += 1;
        Some(convert_attribute_range(
            self.strbuffer,
            self.namespace_strbuffer,
            range,
        ))
    }
}

/// An attribute with its value already decoded and normalized.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute<'a> {
    pub value: &'a str,
    pub name: &'a str,
    // namespace aware
    pub local_name: &'a str,
    pub prefix: &'a str,
    pub namespace: &'a str,
}

impl<'a> Attribute<'a> {
    /// `xmlns` or `xmlns:*`, a namespace declaration rather than data.
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.prefix == "xmlns"
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StartElement<'a> {
    pub name: &'a str,
    pub is_empty: bool,
    // namespace aware
    pub local_name: &'a str,
    pub prefix: &'a str,
    pub namespace: &'a str,

    range_list: &'a [internal::AttributeRange],
    strbuffer: &'a str,
    namespace_strbuffer: &'a str,
}

impl<'a> StartElement<'a> {
    pub fn attributes(&self) -> Attributes<'a> {
        Attributes {
            index: 0,
            range_list: self.range_list,
            strbuffer: self.strbuffer,
            namespace_strbuffer: self.namespace_strbuffer,
        }
    }
}

/// Also produced right after an empty element tag such as `<a/>`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EndElement<'a> {
    pub name: &'a str,
    // namespace aware
    pub local_name: &'a str,
    pub prefix: &'a str,
    pub namespace: &'a str,
}

/// `resolved` is `None` for entities other than the five predefined ones.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reference<'a> {
    pub raw: &'a str,
    pub resolved: Option<&'a str>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event<'a> {
    StartDocument,
    EndDocument,

    StartElement(StartElement<'a>),
    EndElement(EndElement<'a>),
    Characters(&'a str),
    Reference(Reference<'a>),
    Comment(&'a str),
    Cdata(&'a str),

    DocumentTypeDeclaration(&'a str),
    ProcessingInstruction(&'a str),
    XmlDeclaration(&'a str),
    Whitespace(&'a str),
}
