use std::sync::Arc;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required construction input was not supplied.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The operation is not allowed in the current writer phase.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Typed parse or print failure. Local to the call that raised it.
    #[error("cannot convert {raw:?} as {type_name}")]
    ValueFormat {
        type_name: &'static str,
        raw: String,
        #[source]
        cause: BoxError,
    },

    /// The underlying source or sink failed. Terminal for the owning cursor.
    #[error(transparent)]
    Stream(#[from] StreamFault),
}

impl Error {
    pub(crate) fn value_format(
        type_name: &'static str,
        raw: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Error {
        Error::ValueFormat {
            type_name,
            raw: raw.into(),
            cause: cause.into(),
        }
    }

    pub(crate) fn invalid_name(name: impl Into<String>, reason: &'static str) -> Error {
        Error::InvalidName {
            name: name.into(),
            reason,
        }
    }
}

/// Fault raised by a flat token source or sink.
///
/// Cloneable so a cursor that hit a fault can keep reporting the same one.
#[derive(Clone, Debug, Error)]
#[error("stream fault: {context}")]
pub struct StreamFault {
    context: String,
    #[source]
    cause: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl StreamFault {
    pub fn new(context: impl Into<String>) -> StreamFault {
        StreamFault {
            context: context.into(),
            cause: None,
        }
    }

    pub fn with_cause<E>(context: impl Into<String>, cause: E) -> StreamFault
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StreamFault {
            context: context.into(),
            cause: Some(Arc::new(cause)),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

impl From<std::io::Error> for StreamFault {
    fn from(err: std::io::Error) -> StreamFault {
        StreamFault::with_cause("I/O failure", err)
    }
}

#[test]
fn test_stream_fault_keeps_cause() {
    use std::error::Error as _;

    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
    let err: Error = StreamFault::from(io).into();

    assert_eq!(err.to_string(), "stream fault: I/O failure");
    let source = err.source().map(|e| e.to_string());
    assert_eq!(source.as_deref(), Some("pipe closed"));
}
