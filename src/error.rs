//! Error types.

use std::fmt::{self, Formatter, Display};


pub type Result<I> = std::result::Result<I, Error>;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    error: Box<dyn std::error::Error + Send + Sync>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ErrorKind {
    /// Underlying IO error on the byte sink or source.
    ///
    /// Fatal: the reader/writer instance is no longer usable for this
    /// stream.
    Io,

    /// (Only when reading) a read operation found an entry of a different
    /// kind than it can consume. The entry has been skipped and the stream
    /// is positioned at the next entry; the value is lost, the stream is
    /// not.
    UnexpectedEntry,

    /// (Only when reading) a numeric value did not fit the requested type.
    /// The entry has been fully consumed. Callers are expected to
    /// substitute the type's default value and continue.
    Overflow,

    /// (Only when reading) an entry's payload is corrupt, or the buffered
    /// data ran out in the middle of a fixed-width value. The cursor has
    /// been forced forward so further reads see the next entry or the end
    /// of the stream.
    MalformedData,

    /// (Only when reading) the stream violates the entry protocol itself,
    /// e.g. a type entry surfacing at a peekable position, or unreadable
    /// garbage where an entry name was required.
    ///
    /// Fatal: nothing meaningful can be recovered past this point.
    StreamCorruption,

    /// The user of this library performed a sequence of API calls that
    /// would never be valid, e.g. a single buffered write larger than the
    /// whole staging buffer.
    ///
    /// Fatal.
    ApiUsage,

    /// A logged warning or error was promoted to a failure of the whole
    /// operation by the configured [`ErrorPolicy`](crate::ErrorPolicy).
    ///
    /// Fatal: every layer must let this propagate rather than recover.
    Escalated,
}

impl ErrorKind {
    /// Whether errors of this kind must abort the whole (de)serialization
    /// operation. Non-fatal kinds mean "this value was lost, the stream is
    /// still positioned correctly, keep going".
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::Io
            | ErrorKind::StreamCorruption
            | ErrorKind::ApiUsage
            | ErrorKind::Escalated,
        )
    }
}

impl Error {
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error {
            kind,
            error: error.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// See [`ErrorKind::is_fatal`].
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.error
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.error
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, error)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            ErrorKind::Io => "IO error",
            ErrorKind::UnexpectedEntry => "unexpected entry",
            ErrorKind::Overflow => "numeric overflow",
            ErrorKind::MalformedData => "malformed data",
            ErrorKind::StreamCorruption => "stream corruption",
            ErrorKind::ApiUsage => "API usage error",
            ErrorKind::Escalated => "escalated by error policy",
        })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.kind, f)?;
        f.write_str(", ")?;
        Display::fmt(&self.error, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner())
    }
}


macro_rules! error {
    ($k:ident, $($e:tt)*)=>{
        $crate::error::Error::new(
            $crate::error::ErrorKind::$k,
            format!($($e)*),
        )
    };
}

macro_rules! bail {
    ($($e:tt)*)=>{ return Err($crate::error::error!($($e)*)) };
}

macro_rules! ensure {
    ($c:expr, $($e:tt)*)=>{
        if !$c {
            $crate::error::bail!($($e)*);
        }
    };
}

pub(crate) use error;
pub(crate) use bail;
pub(crate) use ensure;
