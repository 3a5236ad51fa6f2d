//! [`PullSource`] over XML text, backed by the streaming [`sax`](crate::sax) parser.

use std::io::Read;
use std::rc::Rc;

use tracing::debug;

use crate::error::StreamFault;
use crate::sax::{self, Event, Parser};
use crate::stream::{NamespaceBinding, PullSource, RawAttribute, RawName, StartTag, Token};

/// Turns parser events into owned tokens.
///
/// Adjacent character data and resolved references are merged into a single
/// `Characters` token. The prolog and anything after the root element are
/// skipped. `xmlns` attributes become [`NamespaceBinding`]s.
pub struct XmlSource<R: Read> {
    parser: Parser<R>,
    lookahead: Option<Token>,
    depth: usize,
    finished: bool,
    fault: Option<StreamFault>,
}

impl<R: Read> XmlSource<R> {
    pub fn from_reader(reader: R) -> XmlSource<R> {
        XmlSource {
            parser: Parser::from_reader(reader),
            lookahead: None,
            depth: 0,
            finished: false,
            fault: None,
        }
    }

    fn pull(&mut self) -> Result<Token, StreamFault> {
        if let Some(token) = self.lookahead.take() {
            return Ok(token);
        }

        let mut text: Option<String> = None;
        loop {
            let event = self
                .parser
                .read_event()
                .map_err(|e| StreamFault::with_cause("malformed XML input", e))?;
            let token = match event {
                Event::Characters(chars) => {
                    text.get_or_insert_with(String::new).push_str(chars);
                    continue;
                }
                Event::Reference(reference) => match reference.resolved {
                    Some(resolved) => {
                        text.get_or_insert_with(String::new).push_str(resolved);
                        continue;
                    }
                    None => {
                        return Err(StreamFault::new(format!(
                            "undeclared entity {}",
                            reference.raw
                        )))
                    }
                },
                Event::StartElement(element) => {
                    self.depth += 1;
                    Token::StartElement(Rc::new(start_tag(&element)))
                }
                Event::EndElement(_) => {
                    self.depth -= 1;
                    Token::EndElement
                }
                Event::Cdata(data) => Token::CData(data.to_owned()),
                Event::Comment(comment) if self.depth > 0 => Token::Comment(comment.to_owned()),
                Event::ProcessingInstruction(pi) if self.depth > 0 => {
                    Token::ProcessingInstruction(pi.to_owned())
                }
                Event::EndDocument => Token::EndDocument,
                Event::StartDocument
                | Event::XmlDeclaration(_)
                | Event::DocumentTypeDeclaration(_)
                | Event::Whitespace(_)
                | Event::Comment(_)
                | Event::ProcessingInstruction(_) => continue,
            };

            return Ok(match text {
                Some(text) => {
                    self.lookahead = Some(token);
                    Token::Characters(text)
                }
                None => token,
            });
        }
    }
}

impl<'a> XmlSource<&'a [u8]> {
    pub fn from_text(text: &'a str) -> XmlSource<&'a [u8]> {
        XmlSource::from_reader(text.as_bytes())
    }
}

impl<R: Read> PullSource for XmlSource<R> {
    fn next_token(&mut self) -> Result<Token, StreamFault> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        if self.finished {
            return Ok(Token::EndDocument);
        }

        match self.pull() {
            Ok(token) => {
                self.finished = token == Token::EndDocument;
                Ok(token)
            }
            Err(fault) => {
                debug!(error = %fault, "xml source failed");
                self.fault = Some(fault.clone());
                Err(fault)
            }
        }
    }
}

fn raw_name(namespace: &str, prefix: &str, local: &str) -> RawName {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_owned());
    RawName {
        namespace: non_empty(namespace),
        prefix: non_empty(prefix),
        local: local.to_owned(),
    }
}

fn start_tag(element: &sax::StartElement<'_>) -> StartTag {
    let mut tag = StartTag {
        name: raw_name(element.namespace, element.prefix, element.local_name),
        ..StartTag::default()
    };
    for attr in element.attributes() {
        if attr.is_namespace_declaration() {
            tag.namespaces.push(NamespaceBinding {
                prefix: (attr.prefix == "xmlns").then(|| attr.local_name.to_owned()),
                uri: attr.value.to_owned(),
            });
        } else {
            tag.attributes.push(RawAttribute {
                name: raw_name(attr.namespace, attr.prefix, attr.local_name),
                value: attr.value.to_owned(),
            });
        }
    }
    tag
}
