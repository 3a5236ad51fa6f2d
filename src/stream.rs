//! The flat token layer the cursors are built on.
//!
//! A [`PullSource`] hands out owned [`Token`]s one at a time; a [`PushSink`]
//! receives write calls in document order. Neither knows about trees.

use std::rc::Rc;

use crate::error::StreamFault;
use crate::name::NameParts;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawName {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub local: String,
}

impl RawName {
    pub fn local(local: &str) -> RawName {
        RawName {
            local: local.to_owned(),
            ..RawName::default()
        }
    }

    pub fn parts(&self) -> NameParts<'_> {
        NameParts {
            namespace: self.namespace.as_deref(),
            prefix: self.prefix.as_deref(),
            local: &self.local,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawAttribute {
    pub name: RawName,
    pub value: String,
}

/// A namespace declaration made on a start tag. `prefix` is `None` for the
/// default namespace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NamespaceBinding {
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StartTag {
    pub name: RawName,
    pub attributes: Vec<RawAttribute>,
    pub namespaces: Vec<NamespaceBinding>,
}

/// Start tags are reference counted: every navigator positioned on an
/// element shares the buffered tag instead of copying its attributes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    StartElement(Rc<StartTag>),
    EndElement,
    Characters(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    EndDocument,
}

impl Token {
    /// Text carried by the token that counts as element content.
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Characters(text) | Token::CData(text) => Some(text),
            _ => None,
        }
    }
}

pub trait PullSource {
    /// After `EndDocument` or an error, further calls keep returning the same.
    fn next_token(&mut self) -> Result<Token, StreamFault>;
}

impl<S: PullSource + ?Sized> PullSource for Box<S> {
    fn next_token(&mut self) -> Result<Token, StreamFault> {
        (**self).next_token()
    }
}

/// Replays a prepared token list, then `EndDocument` forever.
impl PullSource for std::vec::IntoIter<Token> {
    fn next_token(&mut self) -> Result<Token, StreamFault> {
        Ok(self.next().unwrap_or(Token::EndDocument))
    }
}

pub trait PushSink {
    fn start_document(
        &mut self,
        encoding: Option<&str>,
        version: Option<&str>,
    ) -> Result<(), StreamFault>;

    fn start_element(&mut self, name: NameParts<'_>) -> Result<(), StreamFault>;

    fn attribute(&mut self, name: NameParts<'_>, value: &str) -> Result<(), StreamFault>;

    /// `prefix` is `None` for the default namespace.
    fn namespace(&mut self, prefix: Option<&str>, uri: &str) -> Result<(), StreamFault>;

    fn characters(&mut self, text: &str) -> Result<(), StreamFault>;

    fn cdata(&mut self, text: &str) -> Result<(), StreamFault>;

    fn comment(&mut self, text: &str) -> Result<(), StreamFault>;

    fn end_element(&mut self) -> Result<(), StreamFault>;

    fn flush(&mut self) -> Result<(), StreamFault>;

    /// Releases the sink. Writes after `close` fail.
    fn close(&mut self) -> Result<(), StreamFault>;
}

impl<S: PushSink + ?Sized> PushSink for &mut S {
    fn start_document(
        &mut self,
        encoding: Option<&str>,
        version: Option<&str>,
    ) -> Result<(), StreamFault> {
        (**self).start_document(encoding, version)
    }

    fn start_element(&mut self, name: NameParts<'_>) -> Result<(), StreamFault> {
        (**self).start_element(name)
    }

    fn attribute(&mut self, name: NameParts<'_>, value: &str) -> Result<(), StreamFault> {
        (**self).attribute(name, value)
    }

    fn namespace(&mut self, prefix: Option<&str>, uri: &str) -> Result<(), StreamFault> {
        (**self).namespace(prefix, uri)
    }

    fn characters(&mut self, text: &str) -> Result<(), StreamFault> {
        (**self).characters(text)
    }

    fn cdata(&mut self, text: &str) -> Result<(), StreamFault> {
        (**self).cdata(text)
    }

    fn comment(&mut self, text: &str) -> Result<(), StreamFault> {
        (**self).comment(text)
    }

    fn end_element(&mut self) -> Result<(), StreamFault> {
        (**self).end_element()
    }

    fn flush(&mut self) -> Result<(), StreamFault> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), StreamFault> {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_text() {
        assert_eq!(Token::Characters("a".to_owned()).text(), Some("a"));
        assert_eq!(Token::CData("b".to_owned()).text(), Some("b"));
        assert_eq!(Token::Comment("c".to_owned()).text(), None);
        assert_eq!(Token::EndElement.text(), None);
    }
}
