//! Write-side tree cursor.
//!
//! A [`Writer`] drives a [`PushSink`] and refuses any call sequence that
//! would produce a malformed document: attributes only before content,
//! end tags only for open elements, nothing at all after
//! [`finish`](Writer::finish). The document header is written lazily by the
//! first call, and `finish` closes whatever is still open.

use std::io::Write;

use tracing::{debug, warn};

use crate::emitter::Emitter;
use crate::error::{Error, Result, StreamFault};
use crate::name::{AttrName, Naming, Qualified};
use crate::stream::PushSink;
use crate::value::ValueType;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    AttributesAllowed,
    ContentStarted,
}

#[derive(Debug)]
struct OpenElement<Name> {
    name: Name,
    phase: Phase,
    // (namespace, local) of the attributes written so far
    attributes: Vec<(Option<String>, String)>,
}

#[derive(Debug)]
struct Output<S> {
    sink: S,
    fault: Option<StreamFault>,
}

impl<S: PushSink> Output<S> {
    // a sink fault is terminal, later calls get the same fault
    fn emit(
        &mut self,
        op: impl FnOnce(&mut S) -> std::result::Result<(), StreamFault>,
    ) -> Result<()> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone().into());
        }
        op(&mut self.sink).map_err(|fault| {
            self.fault = Some(fault.clone());
            Error::Stream(fault)
        })
    }
}

#[derive(Debug, Default)]
struct Lifecycle {
    header_emitted: bool,
    finished: bool,
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        if self.header_emitted && !self.finished {
            warn!("xml writer dropped without finish, the document is incomplete");
        }
    }
}

#[derive(Debug)]
pub struct Writer<N: Naming, S: PushSink> {
    naming: N,
    output: Output<S>,
    stack: Vec<OpenElement<N::Name>>,
    encoding: Option<String>,
    version: Option<String>,
    root_closed: bool,
    lifecycle: Lifecycle,
}

impl<N: Naming, S: PushSink> Writer<N, S> {
    pub fn new(naming: N, sink: S) -> Writer<N, S> {
        Writer::with_declaration(naming, sink, None, None)
    }

    /// Encoding and version for the header. The sink picks its defaults
    /// for whatever is `None`.
    pub fn with_declaration(
        naming: N,
        sink: S,
        encoding: Option<&str>,
        version: Option<&str>,
    ) -> Writer<N, S> {
        Writer {
            naming,
            output: Output { sink, fault: None },
            stack: Vec::new(),
            encoding: encoding.map(str::to_owned),
            version: version.map(str::to_owned),
            root_closed: false,
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn builder() -> Builder<N, S> {
        Builder::default()
    }

    /// Number of open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_finished(&self) -> bool {
        self.lifecycle.finished
    }

    pub fn sink(&self) -> &S {
        &self.output.sink
    }

    /// Gives the sink back, e.g. to get at the bytes of an `Emitter<Vec<u8>>`.
    pub fn into_sink(self) -> S {
        self.output.sink
    }

    fn check_usable(&self) -> Result<()> {
        if self.lifecycle.finished {
            return Err(Error::InvalidState("writer is already finished".into()));
        }
        match &self.output.fault {
            Some(fault) => Err(fault.clone().into()),
            None => Ok(()),
        }
    }

    fn ensure_header(&mut self) -> Result<()> {
        if self.lifecycle.header_emitted {
            return Ok(());
        }
        let encoding = self.encoding.as_deref();
        let version = self.version.as_deref();
        self.output
            .emit(|sink| sink.start_document(encoding, version))?;
        self.lifecycle.header_emitted = true;
        debug!(?encoding, ?version, "xml header written");
        Ok(())
    }

    fn attribute_window(&self, what: &str) -> Result<()> {
        match self.stack.last() {
            Some(open) if open.phase == Phase::AttributesAllowed => Ok(()),
            Some(open) => Err(Error::InvalidState(format!(
                "cannot write {} on {:?} after its content started",
                what, open.name
            ))),
            None => Err(Error::InvalidState(format!(
                "cannot write {} outside of an element",
                what
            ))),
        }
    }

    fn start_content(&mut self) {
        if let Some(open) = self.stack.last_mut() {
            open.phase = Phase::ContentStarted;
        }
    }

    pub fn write_start_element(&mut self, name: &N::Name) -> Result<&mut Self> {
        self.check_usable()?;
        self.naming.validate(name)?;
        if self.root_closed {
            return Err(Error::InvalidState(format!(
                "cannot start {:?}, the root element is already closed",
                name
            )));
        }
        self.ensure_header()?;

        let parts = self.naming.parts(name);
        self.output.emit(|sink| sink.start_element(parts))?;
        self.start_content();
        self.stack.push(OpenElement {
            name: name.clone(),
            phase: Phase::AttributesAllowed,
            attributes: Vec::new(),
        });
        Ok(self)
    }

    pub fn write_attribute<'k>(
        &mut self,
        name: impl Into<AttrName<'k>>,
        value: &str,
    ) -> Result<&mut Self> {
        self.check_usable()?;
        let name = name.into();
        name.validate()?;
        self.attribute_window("an attribute")?;

        let parts = name.parts();
        if let Some(open) = self.stack.last_mut() {
            let duplicate = open
                .attributes
                .iter()
                .any(|(ns, local)| ns.as_deref() == parts.namespace && local == parts.local);
            if duplicate {
                return Err(Error::InvalidState(format!(
                    "attribute {:?} is already written on {:?}",
                    parts.local, open.name
                )));
            }
        }
        self.output
            .emit(|sink| sink.attribute(parts, value))?;
        if let Some(open) = self.stack.last_mut() {
            open.attributes
                .push((parts.namespace.map(str::to_owned), parts.local.to_owned()));
        }
        Ok(self)
    }

    pub fn write_attribute_as<'k, V: ValueType>(
        &mut self,
        name: impl Into<AttrName<'k>>,
        value_type: &V,
        value: &V::Value,
    ) -> Result<&mut Self> {
        let text = value_type.print(value)?;
        self.write_attribute(name, &text)
    }

    /// Binds `prefix` on the innermost element. An empty or missing prefix,
    /// or `xmlns` itself, binds the default namespace instead.
    pub fn write_namespace(&mut self, prefix: Option<&str>, uri: &str) -> Result<&mut Self> {
        let prefix = match prefix {
            None | Some("") | Some("xmlns") => return self.write_default_namespace(uri),
            Some(prefix) => prefix,
        };
        self.check_usable()?;
        Qualified.make_name(None, None, prefix)?;
        self.attribute_window("a namespace")?;

        self.output
            .emit(|sink| sink.namespace(Some(prefix), uri))?;
        Ok(self)
    }

    pub fn write_default_namespace(&mut self, uri: &str) -> Result<&mut Self> {
        self.check_usable()?;
        self.attribute_window("a namespace")?;

        self.output.emit(|sink| sink.namespace(None, uri))?;
        Ok(self)
    }

    pub fn write_content(&mut self, text: &str) -> Result<&mut Self> {
        self.check_usable()?;
        if self.stack.is_empty() {
            return Err(Error::InvalidState(
                "cannot write content outside of an element".into(),
            ));
        }

        self.output.emit(|sink| sink.characters(text))?;
        self.start_content();
        Ok(self)
    }

    /// Prints `value` first; a print failure leaves the writer untouched.
    pub fn write_content_as<V: ValueType>(
        &mut self,
        value_type: &V,
        value: &V::Value,
    ) -> Result<&mut Self> {
        let text = value_type.print(value)?;
        self.write_content(&text)
    }

    /// Also allowed before the root element.
    pub fn write_comment(&mut self, text: &str) -> Result<&mut Self> {
        self.check_usable()?;
        self.ensure_header()?;

        self.output.emit(|sink| sink.comment(text))?;
        self.start_content();
        Ok(self)
    }

    /// Also accepted before the root here, but a text [`Emitter`] rejects
    /// CDATA outside the root element with a stream fault.
    pub fn write_cdata(&mut self, text: &str) -> Result<&mut Self> {
        self.check_usable()?;
        self.ensure_header()?;

        self.output.emit(|sink| sink.cdata(text))?;
        self.start_content();
        Ok(self)
    }

    pub fn write_end_element(&mut self) -> Result<&mut Self> {
        self.check_usable()?;
        if self.stack.is_empty() {
            return Err(Error::InvalidState("no open element to end".into()));
        }

        self.output.emit(|sink| sink.end_element())?;
        self.stack.pop();
        self.root_closed = self.stack.is_empty();
        Ok(self)
    }

    /// Start tag, text and end tag in one call.
    pub fn write_element(&mut self, name: &N::Name, text: &str) -> Result<&mut Self> {
        self.write_start_element(name)?
            .write_content(text)?
            .write_end_element()
    }

    pub fn write_element_as<V: ValueType>(
        &mut self,
        name: &N::Name,
        value_type: &V,
        value: &V::Value,
    ) -> Result<&mut Self> {
        let text = value_type.print(value)?;
        self.write_element(name, &text)
    }

    /// Closes every open element, innermost first, then flushes and closes
    /// the sink. The writer accepts no further calls afterwards.
    pub fn finish(&mut self) -> Result<()> {
        self.check_usable()?;
        self.ensure_header()?;
        self.lifecycle.finished = true;

        let auto_closed = self.stack.len();
        while self.stack.pop().is_some() {
            self.output.emit(|sink| sink.end_element())?;
        }
        self.output.emit(|sink| sink.flush())?;
        self.output.emit(|sink| sink.close())?;
        debug!(auto_closed, "xml writer finished");
        Ok(())
    }
}

impl<N: Naming, W: Write> Writer<N, Emitter<W>> {
    /// A writer serializing to `out` with the default emitter settings.
    pub fn from_writer(naming: N, out: W) -> Writer<N, Emitter<W>> {
        Writer::new(naming, Emitter::new(out))
    }
}

/// Builds a [`Writer`] from parts that may be missing.
pub struct Builder<N, S> {
    naming: Option<N>,
    sink: Option<S>,
    encoding: Option<String>,
    version: Option<String>,
}

impl<N, S> Default for Builder<N, S> {
    fn default() -> Builder<N, S> {
        Builder {
            naming: None,
            sink: None,
            encoding: None,
            version: None,
        }
    }
}

impl<N: Naming, S: PushSink> Builder<N, S> {
    pub fn naming(mut self, naming: N) -> Builder<N, S> {
        self.naming = Some(naming);
        self
    }

    pub fn sink(mut self, sink: S) -> Builder<N, S> {
        self.sink = Some(sink);
        self
    }

    pub fn encoding(mut self, encoding: &str) -> Builder<N, S> {
        self.encoding = Some(encoding.to_owned());
        self
    }

    pub fn version(mut self, version: &str) -> Builder<N, S> {
        self.version = Some(version.to_owned());
        self
    }

    pub fn build(self) -> Result<Writer<N, S>> {
        let naming = self
            .naming
            .ok_or_else(|| Error::InvalidArgument("writer needs a naming strategy".into()))?;
        let sink = self
            .sink
            .ok_or_else(|| Error::InvalidArgument("writer needs a sink".into()))?;
        Ok(Writer::with_declaration(
            naming,
            sink,
            self.encoding.as_deref(),
            self.version.as_deref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Local;

    #[derive(Debug, Default)]
    struct Count {
        starts: usize,
        ends: usize,
        fail_on_end: bool,
    }

    impl PushSink for Count {
        fn start_document(
            &mut self,
            _: Option<&str>,
            _: Option<&str>,
        ) -> std::result::Result<(), StreamFault> {
            Ok(())
        }
        fn start_element(
            &mut self,
            _: crate::name::NameParts<'_>,
        ) -> std::result::Result<(), StreamFault> {
            self.starts += 1;
            Ok(())
        }
        fn attribute(
            &mut self,
            _: crate::name::NameParts<'_>,
            _: &str,
        ) -> std::result::Result<(), StreamFault> {
            Ok(())
        }
        fn namespace(&mut self, _: Option<&str>, _: &str) -> std::result::Result<(), StreamFault> {
            Ok(())
        }
        fn characters(&mut self, _: &str) -> std::result::Result<(), StreamFault> {
            Ok(())
        }
        fn cdata(&mut self, _: &str) -> std::result::Result<(), StreamFault> {
            Ok(())
        }
        fn comment(&mut self, _: &str) -> std::result::Result<(), StreamFault> {
            Ok(())
        }
        fn end_element(&mut self) -> std::result::Result<(), StreamFault> {
            if self.fail_on_end {
                return Err(StreamFault::new("disk full"));
            }
            self.ends += 1;
            Ok(())
        }
        fn flush(&mut self) -> std::result::Result<(), StreamFault> {
            Ok(())
        }
        fn close(&mut self) -> std::result::Result<(), StreamFault> {
            Ok(())
        }
    }

    #[test]
    fn second_root_is_rejected() {
        let mut writer = Writer::new(Local, Count::default());
        writer
            .write_element(&"a".to_owned(), "x")
            .unwrap();
        assert!(matches!(
            writer.write_start_element(&"b".to_owned()),
            Err(Error::InvalidState(_))
        ));
        writer.write_comment("trailing comments are fine").unwrap();
        writer.finish().unwrap();
        let sink = writer.into_sink();
        assert_eq!((sink.starts, sink.ends), (1, 1));
    }

    #[test]
    fn sink_fault_is_terminal() {
        let mut writer = Writer::new(
            Local,
            Count {
                fail_on_end: true,
                ..Count::default()
            },
        );
        writer.write_start_element(&"a".to_owned()).unwrap();
        let first = writer.write_end_element().unwrap_err();
        assert!(matches!(first, Error::Stream(_)));
        assert_eq!(writer.depth(), 1);
        assert!(matches!(
            writer.write_content("late"),
            Err(Error::Stream(_))
        ));
    }

    #[test]
    fn invalid_names_are_rejected_before_output() {
        let mut writer = Writer::new(Local, Count::default());
        assert!(matches!(
            writer.write_start_element(&"1st".to_owned()),
            Err(Error::InvalidName { .. })
        ));
        writer.write_start_element(&"ok".to_owned()).unwrap();
        assert!(matches!(
            writer.write_namespace(Some("a b"), "urn:x"),
            Err(Error::InvalidName { .. })
        ));
        assert_eq!(writer.into_sink().starts, 1);
    }
}
