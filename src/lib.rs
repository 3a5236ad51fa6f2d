//! Tree-shaped cursors over streaming XML.
//!
//! [`Navigator`] walks a document read from a [`PullSource`] as a tree
//! (child, sibling, parent, descendant) without ever building the tree.
//! [`Writer`] is its write-side mirror: it drives a [`PushSink`] and refuses
//! call sequences that would produce malformed output.
//!
//! Element names are pluggable through [`Naming`]: [`Local`] for plain
//! strings, [`Qualified`] for namespace-aware [`QName`]s. Typed attribute
//! and content access goes through [`ValueType`] converters.
//!
//! The [`sax`] module holds the underlying nom based pull parser,
//! [`XmlSource`] adapts it to a [`PullSource`] and [`Emitter`] serializes a
//! [`PushSink`] call sequence to text.

pub mod emitter;
pub mod error;
pub mod name;
pub mod navigator;
pub mod sax;
pub mod source;
pub mod stream;
pub mod value;
pub mod writer;

mod cursor;

pub use emitter::{Emitter, EmitterConfig};
pub use error::{Error, Result, StreamFault};
pub use name::{AttrName, Local, NameParts, Naming, QName, Qualified};
pub use navigator::Navigator;
pub use source::XmlSource;
pub use stream::{PullSource, PushSink, Token};
pub use value::{Boolean, Date, DateTime, Enumerated, Integer, Text, TrimmedText, ValueType};
pub use writer::Writer;
