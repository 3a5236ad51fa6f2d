//! [`PushSink`] that serializes to XML text.
//!
//! The emitter keeps the current start tag open until the next event so that
//! it can add the namespace declarations qualified names need but nobody
//! wrote (namespace repair), and so that empty elements can be written as
//! `<a/>`.

use std::borrow::Cow;
use std::io::Write;

use crate::error::StreamFault;
use crate::name::NameParts;
use crate::sax::is_xml_char_t;
use crate::stream::PushSink;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EmitterConfig {
    /// Indentation width. Elements holding text stay on one line.
    pub indent: Option<usize>,
    /// Write elements closed right after their start tag as `<a/>`.
    pub self_close_empty: bool,
}

impl EmitterConfig {
    pub fn pretty(indent: usize) -> EmitterConfig {
        EmitterConfig {
            indent: Some(indent),
            self_close_empty: true,
        }
    }
}

#[derive(Debug)]
struct OwnedName {
    namespace: Option<String>,
    prefix: Option<String>,
    local: String,
}

impl From<NameParts<'_>> for OwnedName {
    fn from(parts: NameParts<'_>) -> OwnedName {
        OwnedName {
            namespace: parts.namespace.filter(|ns| !ns.is_empty()).map(str::to_owned),
            prefix: parts.prefix.filter(|p| !p.is_empty()).map(str::to_owned),
            local: parts.local.to_owned(),
        }
    }
}

type Binding = (Option<String>, String);

#[derive(Debug)]
struct PendingTag {
    name: OwnedName,
    attributes: Vec<(OwnedName, String)>,
    namespaces: Vec<Binding>,
}

#[derive(Debug)]
struct Scope {
    qname: String,
    namespaces: Vec<Binding>,
    has_text: bool,
    has_children: bool,
}

pub struct Emitter<W: Write> {
    out: W,
    config: EmitterConfig,
    pending: Option<PendingTag>,
    scopes: Vec<Scope>,
    generated: usize,
    written: bool,
    closed: bool,
}

fn lookup<'a>(
    scopes: &'a [Scope],
    declared: &'a [Binding],
    prefix: Option<&str>,
) -> Option<&'a str> {
    if prefix == Some("xml") {
        return Some(XML_NAMESPACE);
    }
    declared
        .iter()
        .rev()
        .chain(scopes.iter().rev().flat_map(|scope| scope.namespaces.iter().rev()))
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.as_str())
}

fn is_bound(scopes: &[Scope], declared: &[Binding], prefix: Option<&str>, uri: &str) -> bool {
    lookup(scopes, declared, prefix) == Some(uri)
}

fn declares(declared: &[Binding], prefix: Option<&str>) -> bool {
    declared.iter().any(|(p, _)| p.as_deref() == prefix)
}

fn qualify(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_owned(),
    }
}

// escaping cannot help with characters outside the XML Char production
fn check_chars(text: &str, what: &str) -> Result<(), StreamFault> {
    match text.chars().find(|c| !is_xml_char_t(*c)) {
        Some(c) => Err(StreamFault::new(format!(
            "{} contains U+{:04X}, which is not allowed in XML",
            what, c as u32
        ))),
        None => Ok(()),
    }
}

pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
    escape(text, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    })
}

pub(crate) fn escape_attribute(text: &str) -> Cow<'_, str> {
    escape(text, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\n' => Some("&#10;"),
        '\r' => Some("&#13;"),
        '\t' => Some("&#9;"),
        _ => None,
    })
}

fn escape(text: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    if !text.chars().any(|c| replacement(c).is_some()) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match replacement(c) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W) -> Emitter<W> {
        Emitter::with_config(out, EmitterConfig::default())
    }

    pub fn with_config(out: W, config: EmitterConfig) -> Emitter<W> {
        Emitter {
            out,
            config,
            pending: None,
            scopes: Vec::new(),
            generated: 0,
            written: false,
            closed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn ensure_open(&self) -> Result<(), StreamFault> {
        if self.closed {
            return Err(StreamFault::new("emitter is closed"));
        }
        Ok(())
    }

    fn generate_prefix(&mut self, declared: &[Binding]) -> String {
        loop {
            let prefix = format!("ns{}", self.generated);
            self.generated += 1;
            if lookup(&self.scopes, declared, Some(&prefix)).is_none() {
                return prefix;
            }
        }
    }

    /// Prefix to write for the element, declaring what it needs.
    fn resolve_element(
        &mut self,
        name: &OwnedName,
        declared: &mut Vec<Binding>,
    ) -> Option<String> {
        match (&name.namespace, &name.prefix) {
            (None, _) => {
                let default = lookup(&self.scopes, declared, None);
                if default.is_some_and(|uri| !uri.is_empty()) && !declares(declared, None) {
                    declared.push((None, String::new()));
                }
                None
            }
            (Some(uri), Some(prefix)) => {
                if is_bound(&self.scopes, declared, Some(prefix.as_str()), uri) {
                    Some(prefix.clone())
                } else if declares(declared, Some(prefix.as_str())) {
                    let generated = self.generate_prefix(declared);
                    declared.push((Some(generated.clone()), uri.clone()));
                    Some(generated)
                } else {
                    declared.push((Some(prefix.clone()), uri.clone()));
                    Some(prefix.clone())
                }
            }
            (Some(uri), None) => {
                if is_bound(&self.scopes, declared, None, uri) {
                    None
                } else if declares(declared, None) {
                    let generated = self.generate_prefix(declared);
                    declared.push((Some(generated.clone()), uri.clone()));
                    Some(generated)
                } else {
                    declared.push((None, uri.clone()));
                    None
                }
            }
        }
    }

    /// Prefix to write for a namespaced attribute. Attributes never use the
    /// default namespace.
    fn resolve_attribute(
        &mut self,
        uri: &str,
        prefix: Option<&str>,
        declared: &mut Vec<Binding>,
    ) -> String {
        if uri == XML_NAMESPACE {
            return "xml".to_owned();
        }
        if let Some(prefix) = prefix {
            if is_bound(&self.scopes, declared, Some(prefix), uri) {
                return prefix.to_owned();
            }
            if !declares(declared, Some(prefix)) {
                declared.push((Some(prefix.to_owned()), uri.to_owned()));
                return prefix.to_owned();
            }
        }
        let existing = declared
            .iter()
            .rev()
            .chain(self.scopes.iter().rev().flat_map(|scope| scope.namespaces.iter().rev()))
            .filter_map(|(p, u)| p.as_deref().filter(|_| u == uri))
            .find(|p| is_bound(&self.scopes, declared, Some(*p), uri))
            .map(str::to_owned);
        match existing {
            Some(prefix) => prefix,
            None => {
                let generated = self.generate_prefix(declared);
                declared.push((Some(generated.clone()), uri.to_owned()));
                generated
            }
        }
    }

    fn write_break(&mut self, depth: usize) -> Result<(), StreamFault> {
        if let Some(width) = self.config.indent {
            if self.written {
                write!(self.out, "\n{:1$}", "", width * depth)?;
            }
        }
        Ok(())
    }

    // break before a child node unless the parent holds text
    fn child_break(&mut self) -> Result<(), StreamFault> {
        let depth = self.scopes.len();
        let inline = match self.scopes.last_mut() {
            Some(parent) => {
                parent.has_children = true;
                parent.has_text
            }
            None => false,
        };
        if !inline {
            self.write_break(depth)?;
        }
        Ok(())
    }

    /// Writes the pending start tag, if any, as `<a ...>` or `<a .../>`.
    fn write_start_tag(&mut self, empty: bool) -> Result<bool, StreamFault> {
        let Some(tag) = self.pending.take() else {
            return Ok(false);
        };
        let mut declared = tag.namespaces;
        let prefix = self.resolve_element(&tag.name, &mut declared);
        let qname = qualify(prefix.as_deref(), &tag.name.local);

        let mut attributes = Vec::with_capacity(tag.attributes.len());
        for (name, value) in &tag.attributes {
            let attr_qname = match &name.namespace {
                Some(uri) => {
                    let prefix = self.resolve_attribute(uri, name.prefix.as_deref(), &mut declared);
                    qualify(Some(&prefix), &name.local)
                }
                None => name.local.clone(),
            };
            attributes.push((attr_qname, value));
        }

        write!(self.out, "<{}", qname)?;
        for (prefix, uri) in &declared {
            match prefix {
                Some(prefix) => write!(self.out, " xmlns:{}=\"{}\"", prefix, escape_attribute(uri))?,
                None => write!(self.out, " xmlns=\"{}\"", escape_attribute(uri))?,
            }
        }
        for (attr_qname, value) in attributes {
            write!(self.out, " {}=\"{}\"", attr_qname, escape_attribute(value))?;
        }
        if empty {
            self.out.write_all(b"/>")?;
        } else {
            self.out.write_all(b">")?;
            self.scopes.push(Scope {
                qname,
                namespaces: declared,
                has_text: false,
                has_children: false,
            });
        }
        self.written = true;
        Ok(true)
    }

    fn pending_tag(&mut self, what: &str) -> Result<&mut PendingTag, StreamFault> {
        self.pending
            .as_mut()
            .ok_or_else(|| StreamFault::new(format!("{} outside of a start tag", what)))
    }
}

impl<W: Write> PushSink for Emitter<W> {
    fn start_document(
        &mut self,
        encoding: Option<&str>,
        version: Option<&str>,
    ) -> Result<(), StreamFault> {
        self.ensure_open()?;
        if self.written {
            return Err(StreamFault::new("header after document content"));
        }
        write!(self.out, "<?xml version=\"{}\"", version.unwrap_or("1.0"))?;
        if let Some(encoding) = encoding {
            write!(self.out, " encoding=\"{}\"", encoding)?;
        }
        self.out.write_all(b"?>")?;
        self.written = true;
        Ok(())
    }

    fn start_element(&mut self, name: NameParts<'_>) -> Result<(), StreamFault> {
        self.ensure_open()?;
        self.write_start_tag(false)?;
        self.child_break()?;
        self.pending = Some(PendingTag {
            name: name.into(),
            attributes: Vec::new(),
            namespaces: Vec::new(),
        });
        Ok(())
    }

    fn attribute(&mut self, name: NameParts<'_>, value: &str) -> Result<(), StreamFault> {
        self.ensure_open()?;
        check_chars(value, "attribute value")?;
        let tag = self.pending_tag("attribute")?;
        tag.attributes.push((name.into(), value.to_owned()));
        Ok(())
    }

    fn namespace(&mut self, prefix: Option<&str>, uri: &str) -> Result<(), StreamFault> {
        self.ensure_open()?;
        check_chars(uri, "namespace name")?;
        let tag = self.pending_tag("namespace declaration")?;
        let prefix = prefix.filter(|p| !p.is_empty()).map(str::to_owned);
        tag.namespaces.retain(|(p, _)| *p != prefix);
        tag.namespaces.push((prefix, uri.to_owned()));
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<(), StreamFault> {
        self.ensure_open()?;
        check_chars(text, "text")?;
        self.write_start_tag(false)?;
        if let Some(scope) = self.scopes.last_mut() {
            scope.has_text = true;
        }
        self.out.write_all(escape_text(text).as_bytes())?;
        self.written = true;
        Ok(())
    }

    fn cdata(&mut self, text: &str) -> Result<(), StreamFault> {
        self.ensure_open()?;
        check_chars(text, "CDATA section")?;
        if self.pending.is_none() && self.scopes.is_empty() {
            return Err(StreamFault::new("CDATA section outside of the root element"));
        }
        self.write_start_tag(false)?;
        if let Some(scope) = self.scopes.last_mut() {
            scope.has_text = true;
        }
        // a terminator inside the text splits it into two sections
        write!(
            self.out,
            "<![CDATA[{}]]>",
            text.replace("]]>", "]]]]><![CDATA[>")
        )?;
        self.written = true;
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<(), StreamFault> {
        self.ensure_open()?;
        if text.contains("--") || text.ends_with('-') {
            return Err(StreamFault::new(format!(
                "comment cannot contain \"--\" or end with \"-\": {:?}",
                text
            )));
        }
        check_chars(text, "comment")?;
        self.write_start_tag(false)?;
        self.child_break()?;
        write!(self.out, "<!--{}-->", text)?;
        self.written = true;
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), StreamFault> {
        self.ensure_open()?;
        if self.pending.is_some() && self.config.self_close_empty {
            self.write_start_tag(true)?;
            return Ok(());
        }
        let was_pending = self.write_start_tag(false)?;

        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| StreamFault::new("end of element without an open element"))?;
        if !was_pending && scope.has_children && !scope.has_text {
            self.write_break(self.scopes.len())?;
        }
        write!(self.out, "</{}>", scope.qname)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamFault> {
        self.ensure_open()?;
        self.write_start_tag(false)?;
        self.out.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamFault> {
        self.ensure_open()?;
        self.write_start_tag(false)?;
        if self.config.indent.is_some() && self.written {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parts<'a>(
        namespace: Option<&'a str>,
        prefix: Option<&'a str>,
        local: &'a str,
    ) -> NameParts<'a> {
        NameParts {
            namespace,
            prefix,
            local,
        }
    }

    fn output(emitter: Emitter<Vec<u8>>) -> String {
        String::from_utf8(emitter.into_inner()).unwrap()
    }

    #[test]
    fn escapes_text_and_attributes() {
        let mut emitter = Emitter::new(Vec::new());
        emitter.start_element(NameParts::local("a")).unwrap();
        emitter
            .attribute(NameParts::local("q"), "say \"hi\" & <go>\n")
            .unwrap();
        emitter.characters("1 < 2 && 3 > 2").unwrap();
        emitter.end_element().unwrap();
        assert_eq!(
            output(emitter),
            "<a q=\"say &quot;hi&quot; &amp; &lt;go&gt;&#10;\">1 &lt; 2 &amp;&amp; 3 &gt; 2</a>"
        );
    }

    #[test]
    fn repairs_missing_namespace_declarations() {
        let mut emitter = Emitter::new(Vec::new());
        emitter.start_element(parts(Some("urn:u"), Some("p"), "root")).unwrap();
        emitter
            .attribute(parts(Some("urn:u"), None, "id"), "1")
            .unwrap();
        emitter
            .attribute(parts(Some("urn:other"), None, "x"), "2")
            .unwrap();
        emitter.start_element(parts(Some("urn:d"), None, "child")).unwrap();
        emitter.start_element(parts(None, None, "plain")).unwrap();
        emitter.end_element().unwrap();
        emitter.end_element().unwrap();
        emitter.end_element().unwrap();
        assert_eq!(
            output(emitter),
            concat!(
                "<p:root xmlns:p=\"urn:u\" xmlns:ns0=\"urn:other\" p:id=\"1\" ns0:x=\"2\">",
                "<child xmlns=\"urn:d\"><plain xmlns=\"\"></plain></child>",
                "</p:root>"
            )
        );
    }

    #[test]
    fn explicit_declarations_are_not_repeated() {
        let mut emitter = Emitter::new(Vec::new());
        emitter.start_element(parts(Some("urn:d"), None, "r")).unwrap();
        emitter.namespace(None, "urn:d").unwrap();
        emitter.namespace(Some("x"), "urn:x").unwrap();
        emitter.start_element(parts(Some("urn:x"), Some("x"), "c")).unwrap();
        emitter
            .attribute(parts(Some(XML_NAMESPACE), Some("xml"), "lang"), "en")
            .unwrap();
        emitter.end_element().unwrap();
        emitter.end_element().unwrap();
        assert_eq!(
            output(emitter),
            "<r xmlns=\"urn:d\" xmlns:x=\"urn:x\"><x:c xml:lang=\"en\"></x:c></r>"
        );
    }

    #[test]
    fn pretty_output() {
        let mut emitter = Emitter::with_config(Vec::new(), EmitterConfig::pretty(2));
        emitter.start_document(Some("UTF-8"), None).unwrap();
        emitter.start_element(NameParts::local("a")).unwrap();
        emitter.start_element(NameParts::local("b")).unwrap();
        emitter.characters("text").unwrap();
        emitter.end_element().unwrap();
        emitter.comment(" note ").unwrap();
        emitter.start_element(NameParts::local("c")).unwrap();
        emitter.end_element().unwrap();
        emitter.end_element().unwrap();
        emitter.close().unwrap();
        assert_eq!(
            output(emitter),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a>\n  <b>text</b>\n  <!-- note -->\n  <c/>\n</a>\n"
        );
    }

    #[test]
    fn cdata_terminator_is_split() {
        let mut emitter = Emitter::new(Vec::new());
        emitter.start_element(NameParts::local("a")).unwrap();
        emitter.cdata("x]]>y").unwrap();
        emitter.end_element().unwrap();
        assert_eq!(
            output(emitter),
            "<a><![CDATA[x]]]]><![CDATA[>y]]></a>"
        );
    }

    #[test]
    fn rejects_bad_comments_and_writes_after_close() {
        let mut emitter = Emitter::new(Vec::new());
        assert!(emitter.comment("a -- b").is_err());
        emitter.start_element(NameParts::local("a")).unwrap();
        emitter.end_element().unwrap();
        emitter.close().unwrap();
        assert_eq!(
            emitter.characters("late").unwrap_err().context(),
            "emitter is closed"
        );
    }

    #[test]
    fn rejects_characters_outside_xml_char() {
        let mut emitter = Emitter::new(Vec::new());
        emitter.start_element(NameParts::local("a")).unwrap();
        assert!(emitter.attribute(NameParts::local("v"), "x\u{1}").is_err());
        emitter.attribute(NameParts::local("w"), "ok").unwrap();
        assert_eq!(
            emitter.characters("bell\u{7}").unwrap_err().context(),
            "text contains U+0007, which is not allowed in XML"
        );
        assert!(emitter.cdata("\u{FFFE}").is_err());
        assert!(emitter.comment("nul \u{0}").is_err());
        emitter.characters("tab\tand\nnewline").unwrap();
        emitter.end_element().unwrap();
        assert_eq!(output(emitter), "<a w=\"ok\">tab\tand\nnewline</a>");
    }

    #[test]
    fn rejects_cdata_outside_the_root() {
        let mut emitter = Emitter::new(Vec::new());
        assert!(emitter.cdata("before").is_err());
        emitter.start_element(NameParts::local("a")).unwrap();
        emitter.cdata("inside").unwrap();
        emitter.end_element().unwrap();
        assert!(emitter.cdata("after").is_err());
        assert_eq!(output(emitter), "<a><![CDATA[inside]]></a>");
    }
}
