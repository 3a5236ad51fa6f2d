//! Read-side tree cursor.
//!
//! A [`Navigator`] presents the flat token stream of a [`PullSource`] as a
//! tree it can walk with [`child`](Navigator::child),
//! [`sibling`](Navigator::sibling) and [`parent`](Navigator::parent), without
//! building the tree. The source is forward-only: moving down or sideways
//! consumes tokens, moving up only pops the recorded ancestor chain.
//!
//! ```
//! use xml_nav::{Local, Navigator};
//!
//! let mut nav = Navigator::from_text(Local, "<order id='7'><item>tea</item><item>milk</item></order>")?;
//! assert_eq!(nav.attribute("id"), Some("7"));
//!
//! let mut items = vec![];
//! if nav.child(Some(&"item".to_owned()))? {
//!     items.push(nav.content()?.to_owned());
//!     while nav.sibling(Some(&"item".to_owned()))? {
//!         items.push(nav.content()?.to_owned());
//!     }
//! }
//! assert_eq!(items, ["tea", "milk"]);
//! # Ok::<(), xml_nav::Error>(())
//! ```

use std::io::Read;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::cursor::Cursor;
use crate::error::{Error, Result, StreamFault};
use crate::name::{AttrName, NameParts, Naming};
use crate::source::XmlSource;
use crate::stream::{PullSource, StartTag, Token};
use crate::value::ValueType;

#[derive(Clone, Debug)]
struct Frame<Name> {
    name: Name,
    tag: Rc<StartTag>,
    // text before the first child; None until scanned, which only happens
    // while the cursor still sits right behind this element's start tag
    content: Option<String>,
}

pub struct Navigator<N: Naming, S: PullSource> {
    naming: N,
    cursor: Cursor<S>,
    frame: Frame<N::Name>,
    ancestors: Vec<Frame<N::Name>>,
    // elements open at the cursor position
    open: usize,
}

/// Moves `index` to just behind the next start tag that opens a child of the
/// element whose children sit at nesting level `target`. Subtrees below that
/// level are skipped. `None` when the element ends first; `index` then points
/// at its end token.
fn next_start<S: PullSource>(
    cursor: &Cursor<S>,
    index: &mut usize,
    open: &mut usize,
    target: usize,
) -> Result<Option<Rc<StartTag>>> {
    loop {
        let token = cursor.token(*index)?;
        match &*token {
            Token::StartElement(tag) => {
                *index += 1;
                *open += 1;
                if *open == target + 1 {
                    return Ok(Some(Rc::clone(tag)));
                }
            }
            Token::EndElement if *open == target => return Ok(None),
            Token::EndElement => {
                *index += 1;
                *open -= 1;
            }
            Token::EndDocument => return Ok(None),
            _ => *index += 1,
        }
    }
}

enum Step {
    Start(Rc<StartTag>),
    End,
    Other,
}

impl<N: Naming, S: PullSource> Navigator<N, S> {
    /// Reads up to the first start tag and positions the navigator there.
    pub fn new(naming: N, source: S) -> Result<Navigator<N, S>> {
        let mut cursor = Cursor::new(source);
        let mut index = 0;
        let tag = loop {
            let token = cursor.token(index)?;
            match &*token {
                Token::StartElement(tag) => break Rc::clone(tag),
                Token::EndDocument => {
                    return Err(StreamFault::new("document has no root element").into())
                }
                _ => index += 1,
            }
        };
        cursor.advance_to(index + 1);

        let name = make_name(&naming, &tag)?;
        debug!(root = ?name, "navigator positioned at root");
        Ok(Navigator {
            naming,
            cursor,
            frame: Frame {
                name,
                tag,
                content: None,
            },
            ancestors: Vec::new(),
            open: 1,
        })
    }

    pub fn builder() -> Builder<N, S> {
        Builder::default()
    }

    pub fn name(&self) -> &N::Name {
        &self.frame.name
    }

    /// Nesting depth of the current element, 0 at the root.
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    pub fn naming(&self) -> &N {
        &self.naming
    }

    /// Raw value of an attribute of the current element.
    ///
    /// A plain key matches on the local part alone, a [`QName`](crate::QName)
    /// key on namespace and local part.
    pub fn attribute<'k>(&self, key: impl Into<AttrName<'k>>) -> Option<&str> {
        let key = key.into();
        self.frame
            .tag
            .attributes
            .iter()
            .find(|attr| key.matches(attr.name.parts()))
            .map(|attr| attr.value.as_str())
    }

    /// `Ok(None)` when the attribute is missing, an error when it is present
    /// but does not parse.
    pub fn attribute_as<'k, V: ValueType>(
        &self,
        key: impl Into<AttrName<'k>>,
        value_type: &V,
    ) -> Result<Option<V::Value>> {
        self.attribute(key)
            .map(|raw| value_type.parse(raw))
            .transpose()
    }

    /// Attributes of the current element in document order, without the
    /// namespace declarations.
    pub fn attributes(&self) -> impl Iterator<Item = (NameParts<'_>, &str)> {
        self.frame
            .tag
            .attributes
            .iter()
            .map(|attr| (attr.name.parts(), attr.value.as_str()))
    }

    /// Namespace bindings declared on the current element, `None` prefix for
    /// the default namespace.
    pub fn namespaces(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.frame
            .tag
            .namespaces
            .iter()
            .map(|ns| (ns.prefix.as_deref(), ns.uri.as_str()))
    }

    /// Character data of the current element up to its first child element.
    /// CDATA sections count as text, comments and processing instructions
    /// are skipped.
    pub fn content(&mut self) -> Result<&str> {
        self.scan_content()?;
        Ok(self.frame.content.as_deref().unwrap_or(""))
    }

    pub fn content_as<V: ValueType>(&mut self, value_type: &V) -> Result<V::Value> {
        let raw = self.content()?;
        value_type.parse(raw)
    }

    fn scan_content(&mut self) -> Result<()> {
        if self.frame.content.is_some() {
            return Ok(());
        }
        let mut text = String::new();
        let mut index = self.cursor.position();
        loop {
            let token = self.cursor.token(index)?;
            if let Some(chars) = token.text() {
                text.push_str(chars);
            } else if !matches!(&*token, Token::Comment(_) | Token::ProcessingInstruction(_)) {
                break;
            }
            index += 1;
        }
        self.frame.content = Some(text);
        Ok(())
    }

    /// Finds the next child (or sibling, for a lower `target`) matching
    /// `name` without moving the cursor.
    fn seek(
        &self,
        target: usize,
        name: Option<&N::Name>,
    ) -> Result<Option<(usize, usize, Frame<N::Name>)>> {
        let mut index = self.cursor.position();
        let mut open = self.open;
        while let Some(tag) = next_start(&self.cursor, &mut index, &mut open, target)? {
            let found = make_name(&self.naming, &tag)?;
            if name.map_or(true, |wanted| self.naming.matches(wanted, &found)) {
                let frame = Frame {
                    name: found,
                    tag,
                    content: None,
                };
                return Ok(Some((index, open, frame)));
            }
        }
        Ok(None)
    }

    /// Moves to the first child element matching `name`, or to the first
    /// child at all when `name` is `None`.
    ///
    /// Returns `Ok(false)` and stays put if there is none. After
    /// [`parent`](Navigator::parent) the search resumes behind the child
    /// visited last.
    pub fn child(&mut self, name: Option<&N::Name>) -> Result<bool> {
        self.scan_content()?;
        let Some((index, open, frame)) = self.seek(self.depth() + 1, name)? else {
            trace!(depth = self.depth(), "no matching child");
            return Ok(false);
        };

        self.cursor.advance_to(index);
        self.open = open;
        let parent = std::mem::replace(&mut self.frame, frame);
        self.ancestors.push(parent);
        trace!(depth = self.depth(), name = ?self.frame.name, "moved to child");
        Ok(true)
    }

    /// Moves to the next sibling matching `name` (any sibling for `None`).
    ///
    /// Returns `Ok(false)` and stays put if the parent ends first. The root
    /// has no siblings.
    pub fn sibling(&mut self, name: Option<&N::Name>) -> Result<bool> {
        if self.ancestors.is_empty() {
            return Ok(false);
        }
        let Some((index, open, frame)) = self.seek(self.depth(), name)? else {
            trace!(depth = self.depth(), "no matching sibling");
            return Ok(false);
        };

        self.cursor.advance_to(index);
        self.open = open;
        self.frame = frame;
        trace!(depth = self.depth(), name = ?self.frame.name, "moved to sibling");
        Ok(true)
    }

    /// Moves back to the parent element. `false` at the root.
    pub fn parent(&mut self) -> bool {
        match self.ancestors.pop() {
            Some(parent) => {
                self.frame = parent;
                trace!(depth = self.depth(), "moved to parent");
                true
            }
            None => false,
        }
    }

    /// Depth-first search for the next element named `name` below the
    /// current one. On success every element on the way down is recorded as
    /// an ancestor; otherwise the navigator stays put.
    pub fn descendant(&mut self, name: &N::Name) -> Result<bool> {
        self.scan_content()?;
        // nesting level of the current element's children
        let floor = self.depth() + 1;
        let mut index = self.cursor.position();
        let mut open = self.open;
        let mut path: Vec<(Frame<N::Name>, bool)> = Vec::new();

        loop {
            let step = {
                let token = self.cursor.token(index)?;
                match &*token {
                    Token::StartElement(tag) => Step::Start(Rc::clone(tag)),
                    Token::EndElement => Step::End,
                    Token::EndDocument => return Ok(false),
                    Token::Characters(chars) | Token::CData(chars) => {
                        if let Some((frame, false)) = path.last_mut() {
                            frame.content.get_or_insert_with(String::new).push_str(chars);
                        }
                        Step::Other
                    }
                    _ => Step::Other,
                }
            };

            match step {
                Step::Start(tag) => {
                    index += 1;
                    open += 1;
                    // still inside a child that was visited before
                    if path.is_empty() && open > floor + 1 {
                        continue;
                    }
                    if let Some((_, sealed)) = path.last_mut() {
                        *sealed = true;
                    }
                    let found = make_name(&self.naming, &tag)?;
                    let hit = self.naming.matches(name, &found);
                    let frame = Frame {
                        name: found,
                        tag,
                        content: Some(String::new()),
                    };
                    path.push((frame, false));
                    if hit {
                        break;
                    }
                }
                Step::End if open == floor => {
                    trace!(depth = self.depth(), "no matching descendant");
                    return Ok(false);
                }
                Step::End => {
                    index += 1;
                    open -= 1;
                    path.pop();
                }
                Step::Other => index += 1,
            }
        }

        let Some((mut landing, _)) = path.pop() else {
            return Ok(false);
        };
        landing.content = None;
        self.cursor.advance_to(index);
        self.open = open;
        let current = std::mem::replace(&mut self.frame, landing);
        self.ancestors.push(current);
        self.ancestors.extend(path.into_iter().map(|(frame, _)| frame));
        trace!(depth = self.depth(), name = ?self.frame.name, "moved to descendant");
        Ok(true)
    }

    /// An independent navigator at the same position.
    ///
    /// The fork shares the token buffer, so either one can run ahead while
    /// the other still sees every token it has not passed yet.
    pub fn fork(&self) -> Navigator<N, S>
    where
        N: Clone,
    {
        Navigator {
            naming: self.naming.clone(),
            cursor: self.cursor.clone(),
            frame: self.frame.clone(),
            ancestors: self.ancestors.clone(),
            open: self.open,
        }
    }
}

fn make_name<N: Naming>(naming: &N, tag: &StartTag) -> Result<N::Name> {
    let name = &tag.name;
    naming.make_name(name.namespace.as_deref(), name.prefix.as_deref(), &name.local)
}

impl<N: Naming, R: Read> Navigator<N, XmlSource<R>> {
    pub fn from_reader(naming: N, reader: R) -> Result<Navigator<N, XmlSource<R>>> {
        Navigator::new(naming, XmlSource::from_reader(reader))
    }
}

impl<'a, N: Naming> Navigator<N, XmlSource<&'a [u8]>> {
    pub fn from_text(naming: N, text: &'a str) -> Result<Navigator<N, XmlSource<&'a [u8]>>> {
        Navigator::new(naming, XmlSource::from_text(text))
    }
}

/// Builds a [`Navigator`] from parts that may be missing.
pub struct Builder<N, S> {
    naming: Option<N>,
    source: Option<S>,
}

impl<N, S> Default for Builder<N, S> {
    fn default() -> Builder<N, S> {
        Builder {
            naming: None,
            source: None,
        }
    }
}

impl<N: Naming, S: PullSource> Builder<N, S> {
    pub fn naming(mut self, naming: N) -> Builder<N, S> {
        self.naming = Some(naming);
        self
    }

    pub fn source(mut self, source: S) -> Builder<N, S> {
        self.source = Some(source);
        self
    }

    pub fn build(self) -> Result<Navigator<N, S>> {
        let naming = self
            .naming
            .ok_or_else(|| Error::InvalidArgument("navigator needs a naming strategy".into()))?;
        let source = self
            .source
            .ok_or_else(|| Error::InvalidArgument("navigator needs a token source".into()))?;
        Navigator::new(naming, source)
    }
}
