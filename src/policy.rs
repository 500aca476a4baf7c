//! The error-handling policy collaborator.
//!
//! Every recoverable anomaly the codec hits reports through one of the
//! verbs here. The codec never decides whether a report is fatal; the
//! policy does, by either returning `Ok` after logging (resilient) or
//! promoting the report to an [`ErrorKind::Escalated`] failure that every
//! layer must propagate.

use crate::error::{Result, Error, ErrorKind};
use std::fmt;


/// What happens when the codec logs a warning or an error.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub enum ErrorPolicy {
    /// Log and keep going. Damaged streams degrade to default-valued
    /// fields rather than failing the whole operation.
    #[default]
    Resilient,
    /// Errors abort the whole operation; warnings only log.
    ThrowOnErrors,
    /// The first warning or error aborts the whole operation.
    ThrowOnWarningsAndErrors,
}

impl ErrorPolicy {
    /// Report a recoverable anomaly where a value may have been lost.
    pub fn warning(self, args: fmt::Arguments<'_>) -> Result<()> {
        tracing::warn!("{}", args);
        if self == ErrorPolicy::ThrowOnWarningsAndErrors {
            Err(Error::new(ErrorKind::Escalated, format!("warning: {}", args)))
        } else {
            Ok(())
        }
    }

    /// Report a more serious anomaly, still resilient by default.
    pub fn error(self, args: fmt::Arguments<'_>) -> Result<()> {
        tracing::error!("{}", args);
        if self == ErrorPolicy::Resilient {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::Escalated, format!("error: {}", args)))
        }
    }

    /// Report a wrapped underlying error.
    pub fn exception(self, err: &(dyn std::error::Error + 'static)) -> Result<()> {
        tracing::error!(%err, "exception in codec collaborator");
        if self == ErrorPolicy::Resilient {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::Escalated, format!("exception: {}", err)))
        }
    }
}
