use std::{
    io::{BufRead, BufReader, Read},
    ops::Range,
};

use nom::Offset;

use crate::sax::{
    self as xml_sax,
    internal::{
        content_relaxed, is_xml_char_t, misc, misc_before_doctype, misc_before_xmldecl,
        split_qname, AttributeRange, ContentRelaxed, Misc, StartTag,
    },
};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

enum InternalSuccess<'a> {
    StartDocument,
    EndDocument,

    ContentRelaxed(ContentRelaxed<'a>),
    Misc(Misc<'a>),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ParserState {
    Initial,
    DocStartBeforeXmlDecl, // anything parsed here (including whitespace) moves to DocStartBeforeDocType
    DocStartBeforeDocType, // when doctype parsed move to DocStart
    DocStart,

    Content,

    DocEnd, //misc
    Finished,
}

struct Namespace {
    level: usize,
    prefix: Range<usize>,
    value: Range<usize>,
}

// ranges of name parts are in element_strbuffer, namespace in namespace_strbuffer
struct ElementRange {
    name: Range<usize>,
    prefix: Range<usize>,
    local_name: Range<usize>,
    namespace: Range<usize>,
}

struct Context {
    strbuffer: String,

    element_strbuffer: String,
    element_list: Vec<ElementRange>,

    is_namespace_aware: bool,
    namespace_strbuffer: String,
    namespace_list: Vec<Namespace>,

    attribute_list: Vec<AttributeRange>,

    // `<a/>` still owes its EndElement event
    pending_end: bool,
    // the last EndElement is still borrowed by the caller, pop it lazily
    pending_pop: bool,
}

pub struct Parser<R: Read> {
    state: ParserState,
    bufreader: BufReader<R>,
    buffer: Vec<u8>,
    offset: usize,
    eof: bool,

    context: Context,
}

pub(crate) fn convert_attribute_range<'a>(
    strbuffer: &'a str,
    namespace_strbuffer: &'a str,
    range: &AttributeRange,
) -> xml_sax::Attribute<'a> {
    xml_sax::Attribute {
        value: &strbuffer[range.value.clone()],
        name: &strbuffer[range.name.clone()],
        local_name: &strbuffer[range.local_name.clone()],
        prefix: &strbuffer[range.prefix.clone()],
        namespace: &namespace_strbuffer[range.namespace.clone()],
    }
}

fn push_str_get_range(strbuffer: &mut String, addition: &str) -> Range<usize> {
    let start = strbuffer.len();
    strbuffer.push_str(addition);
    start..strbuffer.len()
}

// [2.11] End-of-Line Handling: "\r\n" and a lone "\r" both become "\n"
fn push_text_get_range(strbuffer: &mut String, text: &str) -> Range<usize> {
    let start = strbuffer.len();
    let mut rest = text;
    while let Some(pos) = rest.find('\r') {
        strbuffer.push_str(&rest[..pos]);
        strbuffer.push('\n');
        rest = &rest[pos + 1..];
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }
    strbuffer.push_str(rest);
    start..strbuffer.len()
}

fn push_ns_values_get_ns(
    namespace_strbuffer: &mut String,
    prefix: &str,
    value: &str,
    element_level: usize,
) -> Namespace {
    let prefix = push_str_get_range(namespace_strbuffer, prefix);
    let value = push_str_get_range(namespace_strbuffer, value);
    Namespace {
        level: element_level,
        prefix,
        value,
    }
}

fn lookup_namespace(
    namespace_list: &[Namespace],
    namespace_strbuffer: &str,
    prefix: &str,
) -> Option<Range<usize>> {
    namespace_list
        .iter()
        .rfind(|ns| &namespace_strbuffer[ns.prefix.clone()] == prefix)
        .map(|ns| ns.value.clone())
}

fn to_str(bytes: &[u8]) -> SaxResult<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| error::Error::Parsing(format!("Invalid UTF-8 sequence: {}", e)))
}

/// Resolves a predefined entity or a character reference.
/// `Ok(None)` for any other entity, which this parser does not expand.
fn resolve_reference(raw: &str) -> SaxResult<Option<char>> {
    let resolved = match raw {
        "&lt;" => '<',
        "&gt;" => '>',
        "&amp;" => '&',
        "&apos;" => '\'',
        "&quot;" => '"',
        _ => {
            let code = if let Some(hex) = raw.strip_prefix("&#x") {
                u32::from_str_radix(hex.trim_end_matches(';'), 16)
            } else if let Some(dec) = raw.strip_prefix("&#") {
                dec.trim_end_matches(';').parse::<u32>()
            } else {
                return Ok(None);
            };
            return match code.ok().and_then(char::from_u32) {
                Some(c) if is_xml_char_t(c) => Ok(Some(c)),
                _ => Err(error::Error::Parsing(format!(
                    "Character reference does not refer to a legal character: {}",
                    raw
                ))),
            };
        }
    };
    Ok(Some(resolved))
}

// [3.3.3] Attribute-Value Normalization, for CDATA typed attributes
fn decode_attribute_value(raw: &str, out: &mut String) -> SaxResult<()> {
    let mut rest = raw;
    while let Some(pos) = rest.find(['&', '\t', '\n', '\r']) {
        out.push_str(&rest[..pos]);
        match rest.as_bytes()[pos] {
            b'&' => {
                let end = rest[pos..].find(';').map(|i| pos + i).ok_or_else(|| {
                    error::Error::Parsing(format!("Unterminated reference in attribute: {}", raw))
                })?;
                let reference = &rest[pos..=end];
                match resolve_reference(reference)? {
                    Some(c) => out.push(c),
                    None => {
                        return Err(error::Error::Parsing(format!(
                            "Undeclared entity in attribute value: {}",
                            reference
                        )))
                    }
                }
                rest = &rest[end + 1..];
            }
            b'\r' if rest[pos + 1..].starts_with('\n') => {
                out.push(' ');
                rest = &rest[pos + 2..];
            }
            _ => {
                out.push(' ');
                rest = &rest[pos + 1..];
            }
        }
    }
    out.push_str(rest);
    Ok(())
}

impl Context {
    fn pop_closed(&mut self) {
        if !self.pending_pop {
            return;
        }
        self.pending_pop = false;
        let level = self.element_list.len();
        if let Some(element) = self.element_list.pop() {
            self.element_strbuffer.truncate(element.name.start);
        }
        while let Some(ns) = self.namespace_list.last() {
            if ns.level < level || level == 0 {
                break;
            }
            self.namespace_strbuffer.truncate(ns.prefix.start);
            self.namespace_list.pop();
        }
    }

    fn start_element(&mut self, tag: &StartTag<'_>) -> SaxResult<()> {
        let level = self.element_list.len() + 1;
        let name = to_str(tag.name)?;
        self.attribute_list.clear();

        for (raw_name, raw_value) in tag.attributes.iter() {
            let attr_name = to_str(raw_name)?;
            if self
                .attribute_list
                .iter()
                .any(|attr| &self.strbuffer[attr.name.clone()] == attr_name)
            {
                return Err(error::Error::Parsing(format!(
                    "Duplicate attribute {} on element {}",
                    attr_name, name
                )));
            }
            let name_range = push_str_get_range(&mut self.strbuffer, attr_name);
            let value_start = self.strbuffer.len();
            decode_attribute_value(to_str(raw_value)?, &mut self.strbuffer)?;

            self.attribute_list.push(AttributeRange {
                value: value_start..self.strbuffer.len(),
                local_name: name_range.clone(),
                prefix: name_range.start..name_range.start,
                namespace: 0..0,
                name: name_range,
            });
        }

        let name_range = push_str_get_range(&mut self.element_strbuffer, name);
        let mut element = ElementRange {
            prefix: name_range.start..name_range.start,
            local_name: name_range.clone(),
            namespace: 0..0,
            name: name_range,
        };

        if self.is_namespace_aware {
            //first process namespace definitions & parse prefix:local_name
            for attr in self.attribute_list.iter_mut() {
                let attr_name = &self.strbuffer[attr.name.clone()];
                let (prefix, local_name) = split_qname(attr_name).ok_or_else(|| {
                    error::Error::Parsing(format!(
                        "Attribute does not conform to QName spec: {}",
                        attr_name
                    ))
                })?;
                attr.prefix = attr.name.start..attr.name.start + prefix.len();
                attr.local_name = attr.name.end - local_name.len()..attr.name.end;

                let value = &self.strbuffer[attr.value.clone()];
                if prefix.is_empty() && local_name == "xmlns" {
                    //set default namespace
                    let ns = push_ns_values_get_ns(&mut self.namespace_strbuffer, "", value, level);
                    self.namespace_list.push(ns);
                } else if prefix == "xmlns" {
                    if value.is_empty() {
                        return Err(error::Error::Parsing(format!(
                            "Prefix cannot be undeclared: {}",
                            local_name
                        )));
                    }
                    let ns = push_ns_values_get_ns(
                        &mut self.namespace_strbuffer,
                        local_name,
                        value,
                        level,
                    );
                    self.namespace_list.push(ns);
                }
            }

            //resolve namespaces for element and attributes.
            for attr in self.attribute_list.iter_mut() {
                let prefix = &self.strbuffer[attr.prefix.clone()];
                //Default namespace doesn't apply to attributes
                if prefix.is_empty() || prefix == "xmlns" {
                    continue;
                }
                attr.namespace =
                    lookup_namespace(&self.namespace_list, &self.namespace_strbuffer, prefix)
                        .ok_or_else(|| {
                            error::Error::Parsing(format!(
                                "Namespace not found for prefix: {} , attribute: {} , element: {}",
                                prefix,
                                &self.strbuffer[attr.name.clone()],
                                name
                            ))
                        })?;
            }

            let (prefix, local_name) = split_qname(name).ok_or_else(|| {
                error::Error::Parsing(format!(
                    "Element name does not conform to QName spec: {}",
                    name
                ))
            })?;
            let start = element.name.start;
            element.prefix = start..start + prefix.len();
            element.local_name = element.name.end - local_name.len()..element.name.end;
            match lookup_namespace(&self.namespace_list, &self.namespace_strbuffer, prefix) {
                Some(namespace) => element.namespace = namespace,
                None if prefix.is_empty() => {}
                None => {
                    return Err(error::Error::Parsing(format!(
                        "Namespace prefix not found for element: {}",
                        name
                    )))
                }
            }
        }

        self.element_list.push(element);
        Ok(())
    }

    fn end_element(&mut self, name: &[u8]) -> SaxResult<()> {
        let name = to_str(name)?;
        let open = self.element_list.last().ok_or_else(|| {
            error::Error::Parsing(format!("End tag without start tag: {}", name))
        })?;
        let open_name = &self.element_strbuffer[open.name.clone()];
        if open_name != name {
            return Err(error::Error::Parsing(format!(
                "End tag </{}> does not match start tag <{}>",
                name, open_name
            )));
        }
        self.pending_pop = true;
        Ok(())
    }

    fn start_event(&self, is_empty: bool) -> xml_sax::Event<'_> {
        match self.element_list.last() {
            Some(element) => xml_sax::Event::StartElement(xml_sax::StartElement {
                name: &self.element_strbuffer[element.name.clone()],
                is_empty,
                local_name: &self.element_strbuffer[element.local_name.clone()],
                prefix: &self.element_strbuffer[element.prefix.clone()],
                namespace: &self.namespace_strbuffer[element.namespace.clone()],
                range_list: &self.attribute_list,
                strbuffer: &self.strbuffer,
                namespace_strbuffer: &self.namespace_strbuffer,
            }),
            None => xml_sax::Event::EndDocument,
        }
    }

    fn end_event(&self) -> xml_sax::Event<'_> {
        match self.element_list.last() {
            Some(element) => xml_sax::Event::EndElement(xml_sax::EndElement {
                name: &self.element_strbuffer[element.name.clone()],
                local_name: &self.element_strbuffer[element.local_name.clone()],
                prefix: &self.element_strbuffer[element.prefix.clone()],
                namespace: &self.namespace_strbuffer[element.namespace.clone()],
            }),
            None => xml_sax::Event::EndDocument,
        }
    }
}

pub type SaxResult<T> = Result<T, error::Error>;

pub mod error {
    use thiserror::Error;
    #[derive(Debug, Error)]
    pub enum Error {
        #[error(transparent)]
        Io(#[from] std::io::Error),

        // Generic
        #[error("SAX Parsing Err: {0}")]
        Parsing(String),

        #[error("SAX Parsing Err: Unexpected EOF")]
        UnexpectedEof,
    }
}

fn convert_nom_error(err: nom::Err<nom::error::Error<&[u8]>>) -> error::Error {
    match err {
        nom::Err::Incomplete(_) => error::Error::UnexpectedEof,
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let near = &e.input[..e.input.len().min(20)];
            error::Error::Parsing(format!(
                "Unexpected input near {:?}",
                String::from_utf8_lossy(near)
            ))
        }
    }
}

fn root_element(input: &[u8]) -> SaxResult<(&[u8], InternalSuccess<'_>)> {
    match content_relaxed(input) {
        Ok((rest, start @ ContentRelaxed::StartElement(_))) => {
            Ok((rest, InternalSuccess::ContentRelaxed(start)))
        }
        Ok(_) => Err(error::Error::Parsing(
            "Content is not allowed before the root element".to_owned(),
        )),
        Err(err) => Err(convert_nom_error(err)),
    }
}

// https://doc.rust-lang.org/nomicon/borrow-splitting.html
fn read_event_splitted(
    state: ParserState,
    input: &[u8],
    eof: bool,
) -> SaxResult<(InternalSuccess<'_>, ParserState, usize)> {
    let (rest, event, next_state) = match state {
        ParserState::Initial => {
            return Ok((
                InternalSuccess::StartDocument,
                ParserState::DocStartBeforeXmlDecl,
                0,
            ))
        }
        ParserState::Finished => return Ok((InternalSuccess::EndDocument, state, 0)),
        ParserState::DocEnd if eof && input.is_empty() => {
            return Ok((InternalSuccess::EndDocument, ParserState::Finished, 0))
        }
        ParserState::DocStartBeforeXmlDecl
        | ParserState::DocStartBeforeDocType
        | ParserState::DocStart => {
            let res = match state {
                ParserState::DocStartBeforeXmlDecl => misc_before_xmldecl(input),
                ParserState::DocStartBeforeDocType => misc_before_doctype(input),
                _ => misc(input),
            };
            match res {
                Ok((rest, misc)) => {
                    let next_state = match misc {
                        Misc::DocType(_) => ParserState::DocStart,
                        _ if state == ParserState::DocStartBeforeXmlDecl => {
                            ParserState::DocStartBeforeDocType
                        }
                        _ => state,
                    };
                    (rest, InternalSuccess::Misc(misc), next_state)
                }
                Err(nom::Err::Error(_)) => {
                    let (rest, event) = root_element(input)?;
                    (rest, event, ParserState::Content)
                }
                Err(err) => return Err(convert_nom_error(err)),
            }
        }
        ParserState::Content => match content_relaxed(input) {
            Ok((rest, content)) => (rest, InternalSuccess::ContentRelaxed(content), state),
            Err(err) => return Err(convert_nom_error(err)),
        },
        ParserState::DocEnd => match misc(input) {
            Ok((rest, misc)) => (rest, InternalSuccess::Misc(misc), state),
            Err(nom::Err::Error(_)) => {
                return Err(error::Error::Parsing(
                    "Only comments, processing instructions and whitespace are allowed after the root element"
                        .to_owned(),
                ))
            }
            Err(err) => return Err(convert_nom_error(err)),
        },
    };

    Ok((event, next_state, input.offset(rest)))
}

//converted events borrow from the context only, never from the input buffer
fn event_converter<'a>(
    mut state: ParserState,
    internal_event: InternalSuccess<'_>,
    context: &'a mut Context,
) -> SaxResult<(xml_sax::Event<'a>, ParserState)> {
    let strbuffer = &mut context.strbuffer;
    let event = match internal_event {
        InternalSuccess::StartDocument => xml_sax::Event::StartDocument,
        InternalSuccess::EndDocument => xml_sax::Event::EndDocument,
        InternalSuccess::Misc(misc) => {
            let bytes = match misc {
                Misc::XmlDecl(s)
                | Misc::DocType(s)
                | Misc::Comment(s)
                | Misc::PI(s)
                | Misc::Whitespace(s) => s,
            };
            let range = push_str_get_range(strbuffer, to_str(bytes)?);
            let text = &context.strbuffer[range];
            match misc {
                Misc::XmlDecl(_) => xml_sax::Event::XmlDeclaration(text),
                Misc::DocType(_) => xml_sax::Event::DocumentTypeDeclaration(text),
                Misc::Comment(_) => xml_sax::Event::Comment(text),
                Misc::PI(_) => xml_sax::Event::ProcessingInstruction(text),
                Misc::Whitespace(_) => xml_sax::Event::Whitespace(text),
            }
        }
        InternalSuccess::ContentRelaxed(content) => match content {
            ContentRelaxed::CharData(s) => {
                let range = push_text_get_range(strbuffer, to_str(s)?);
                xml_sax::Event::Characters(&context.strbuffer[range])
            }
            ContentRelaxed::Cdata(s) => {
                let range = push_text_get_range(strbuffer, to_str(s)?);
                xml_sax::Event::Cdata(&context.strbuffer[range])
            }
            ContentRelaxed::Comment(s) => {
                let range = push_str_get_range(strbuffer, to_str(s)?);
                xml_sax::Event::Comment(&context.strbuffer[range])
            }
            ContentRelaxed::PI(s) => {
                let range = push_str_get_range(strbuffer, to_str(s)?);
                xml_sax::Event::ProcessingInstruction(&context.strbuffer[range])
            }
            ContentRelaxed::Reference(s) => {
                let raw = to_str(s)?;
                let resolved = resolve_reference(raw)?;
                let raw = push_str_get_range(strbuffer, raw);
                let resolved = resolved.map(|c| {
                    let start = strbuffer.len();
                    strbuffer.push(c);
                    start..strbuffer.len()
                });
                let strbuffer = &context.strbuffer;
                xml_sax::Event::Reference(xml_sax::Reference {
                    raw: &strbuffer[raw],
                    resolved: resolved.map(|range| &strbuffer[range]),
                })
            }
            ContentRelaxed::StartElement(tag) => {
                context.start_element(&tag)?;
                context.pending_end = tag.is_empty;
                state = ParserState::Content;
                context.start_event(tag.is_empty)
            }
            ContentRelaxed::EndElement(name) => {
                context.end_element(name)?;
                if context.element_list.len() == 1 {
                    state = ParserState::DocEnd;
                }
                context.end_event()
            }
        },
    };
    Ok((event, state))
}

impl<R: Read> Parser<R> {
    pub fn from_reader(reader: R) -> Parser<R> {
        let mut namespace_strbuffer = String::new();
        // the xml prefix is bound by definition
        let xml_ns = push_ns_values_get_ns(&mut namespace_strbuffer, "xml", XML_NAMESPACE, 0);

        Parser {
            state: ParserState::Initial,
            bufreader: BufReader::with_capacity(8 * 1024, reader),
            buffer: Vec::with_capacity(16 * 1024),
            offset: 0,
            eof: false,

            context: Context {
                strbuffer: String::new(),
                element_strbuffer: String::new(),
                element_list: Vec::with_capacity(10),
                is_namespace_aware: true,
                namespace_strbuffer,
                namespace_list: vec![xml_ns],
                attribute_list: Vec::with_capacity(5),
                pending_end: false,
                pending_pop: false,
            },
        }
    }

    /// With namespace awareness off, names are not split and prefixes are not resolved.
    pub fn with_namespace_awareness(mut self, is_namespace_aware: bool) -> Parser<R> {
        self.context.is_namespace_aware = is_namespace_aware;
        self
    }

    fn read_data(&mut self) -> Result<usize, std::io::Error> {
        if self.offset > 0 {
            self.buffer.drain(..self.offset);
            self.offset = 0;
        }

        let amt = {
            let data = self.bufreader.fill_buf()?;
            self.buffer.extend_from_slice(data);
            data.len()
        };
        self.bufreader.consume(amt);
        if amt == 0 {
            self.eof = true;
        }
        tracing::trace!(bytes = amt, buffered = self.buffer.len(), "read xml input");
        Ok(amt)
    }

    pub fn read_event(&mut self) -> SaxResult<xml_sax::Event<'_>> {
        self.context.strbuffer.clear();
        self.context.pop_closed();

        if self.context.pending_end {
            self.context.pending_end = false;
            self.context.pending_pop = true;
            if self.context.element_list.len() == 1 {
                self.state = ParserState::DocEnd;
            }
            return Ok(self.context.end_event());
        }

        loop {
            let res = read_event_splitted(self.state, &self.buffer[self.offset..], self.eof);
            match res {
                Ok((internal_event, state, consumed)) => {
                    self.offset += consumed;
                    let (event, state) = event_converter(state, internal_event, &mut self.context)?;
                    self.state = state;
                    return Ok(event);
                }
                Err(error::Error::UnexpectedEof) if !self.eof => {
                    //try reading again
                    self.read_data()?;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect(data: &[u8]) -> SaxResult<Vec<String>> {
        let mut p = Parser::from_reader(data);
        let mut events = vec![];
        loop {
            let line = match p.read_event()? {
                xml_sax::Event::StartDocument => "start-document".to_owned(),
                xml_sax::Event::EndDocument => break,
                xml_sax::Event::StartElement(el) => {
                    let attrs: Vec<String> = el
                        .attributes()
                        .map(|a| format!(" {{{}}}{}={}", a.namespace, a.local_name, a.value))
                        .collect();
                    format!("<{{{}}}{}{}>", el.namespace, el.local_name, attrs.join(""))
                }
                xml_sax::Event::EndElement(el) => format!("</{}>", el.name),
                xml_sax::Event::Characters(c) => format!("text {}", c),
                xml_sax::Event::Reference(r) => format!("ref {:?}", r.resolved),
                xml_sax::Event::Comment(c) => format!("comment {}", c),
                xml_sax::Event::Cdata(c) => format!("cdata {}", c),
                xml_sax::Event::Whitespace(_) => continue,
                other => format!("{:?}", other),
            };
            events.push(line);
        }
        Ok(events)
    }

    #[test]
    fn test_parser1() {
        let data = r#"<root><A a='x'>
    <B b="val" xmlns:a='urn:a' a:b12='v&amp;2' ><C/></B> </A> </root>"#
            .as_bytes();

        let events = collect(data).unwrap();
        assert_eq!(
            events,
            vec![
                "start-document",
                "<{}root>",
                "<{}A {}a=x>",
                "text \n    ",
                "<{}B {}b=val {}a=urn:a {urn:a}b12=v&2>",
                "<{}C>",
                "</C>",
                "</B>",
                "text  ",
                "</A>",
                "text  ",
                "</root>",
            ]
        );
    }

    #[test]
    fn test_namespaces_are_scoped() {
        let data = br#"<?xml version="1.0"?>
<!-- head -->
<r xmlns="urn:d"><p:x xmlns:p="urn:p" xml:lang="en"/><y/></r>"#;
        let events = collect(data).unwrap();
        assert_eq!(
            events,
            vec![
                "start-document",
                "XmlDeclaration(\"<?xml version=\\\"1.0\\\"?>\")",
                "comment  head ",
                "<{urn:d}r {}xmlns=urn:d>",
                "<{urn:p}x {}p=urn:p {http://www.w3.org/XML/1998/namespace}lang=en>",
                "</p:x>",
                "<{urn:d}y>",
                "</y>",
                "</r>",
            ]
        );
    }

    #[test]
    fn test_references_and_cdata() {
        let events = collect(b"<a>x&lt;&#65;&foo;<![CDATA[<b>]]></a>").unwrap();
        assert_eq!(
            events,
            vec![
                "start-document",
                "<{}a>",
                "text x",
                "ref Some(\"<\")",
                "ref Some(\"A\")",
                "ref None",
                "cdata <b>",
                "</a>",
            ]
        );
    }

    #[test]
    fn test_small_reads_give_same_events() {
        struct Trickle<'a>(&'a [u8]);
        impl Read for Trickle<'_> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                let n = buf.len().min(3).min(self.0.len());
                buf[..n].copy_from_slice(&self.0[..n]);
                self.0 = &self.0[n..];
                Ok(n)
            }
        }

        let data = "<doc k='värde'><kīwi>text ]] here</kīwi><!-- c --></doc>".as_bytes();
        let mut p = Parser::from_reader(Trickle(data));
        let mut text = String::new();
        let mut names = vec![];
        loop {
            match p.read_event().unwrap() {
                xml_sax::Event::EndDocument => break,
                xml_sax::Event::StartElement(el) => names.push(el.name.to_owned()),
                xml_sax::Event::Characters(c) => text.push_str(c),
                _ => {}
            }
        }
        assert_eq!(names, vec!["doc", "kīwi"]);
        assert_eq!(text, "text ]] here");
    }

    #[test]
    fn test_line_endings_are_normalized() {
        let events = collect(b"<a>x\r\ny\rz<![CDATA[p\r\nq]]></a>").unwrap();
        assert_eq!(events[2], "text x\ny\nz");
        assert_eq!(events[3], "cdata p\nq");

        // a "\r\n" pair split between two reads is still one line break
        struct Split<'a>(Vec<&'a [u8]>);
        impl Read for Split<'_> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.0.is_empty() {
                    return Ok(0);
                }
                let part = self.0.remove(0);
                buf[..part.len()].copy_from_slice(part);
                Ok(part.len())
            }
        }
        let mut p = Parser::from_reader(Split(vec![&b"<a>one\r"[..], &b"\ntwo</a>"[..]]));
        let mut text = String::new();
        loop {
            match p.read_event().unwrap() {
                xml_sax::Event::EndDocument => break,
                xml_sax::Event::Characters(c) => text.push_str(c),
                _ => {}
            }
        }
        assert_eq!(text, "one\ntwo");
    }

    #[test]
    fn test_attribute_normalization() {
        let events = collect(b"<a v='1\n2&#10;3&#x9;'/>").unwrap();
        assert_eq!(events[1], "<{}a {}v=1 2\n3\t>");
    }

    #[test]
    fn test_well_formedness_errors() {
        for data in [
            &b"<a></b>"[..],
            b"<a>",
            b"",
            b"<a/><b/>",
            b"text<a/>",
            b"<a x='1' x='2'/>",
            b"<p:a/>",
            b"<a v='&foo;'/>",
            b"<a>&#0;</a>",
        ] {
            assert!(collect(data).is_err(), "{:?}", String::from_utf8_lossy(data));
        }
    }

    #[test]
    fn test_namespace_awareness_off() {
        let mut p = Parser::from_reader(&b"<p:a/>"[..]).with_namespace_awareness(false);
        assert!(matches!(p.read_event(), Ok(xml_sax::Event::StartDocument)));
        match p.read_event().unwrap() {
            xml_sax::Event::StartElement(el) => {
                assert_eq!(el.name, "p:a");
                assert_eq!(el.local_name, "p:a");
                assert_eq!(el.namespace, "");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
