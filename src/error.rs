use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlrpError>;

/// Errors surfaced by the codec and the client session.
///
/// A decoded `LLRPStatus` with a non-zero code is *not* an error here:
/// it is a successful decode whose payload reports a reader-side failure,
/// and callers inspect the status themselves.
#[derive(Debug, Error)]
pub enum LlrpError {

  /// A fixed-width read ran past the end of the buffer.
  #[error("input truncated, {0} more bytes required")]
  Truncated(usize),

  /// The frame header advertises a length below the 10-byte minimum.
  #[error("frame length below the 10-byte header minimum")]
  ShortFrame,

  /// The buffer holds an incomplete frame; the payload is the total
  /// frame length a streaming caller has to accumulate before retrying.
  #[error("incomplete frame, {0} bytes required")]
  NeedMoreData(usize),

  #[error("unknown message type {0}")]
  UnknownMessageType(u16),

  #[error("unknown parameter type {0}")]
  UnknownParameterType(u16),

  #[error("malformed {parameter}: {reason}")]
  Malformed { parameter: &'static str, reason: String },

  #[error("missing required parameter: {0}")]
  MissingRequired(&'static str),

  #[error("{0} trailing bytes after last recognized parameter")]
  TrailingBytes(usize),

  #[error("unsupported: {0}")]
  Unsupported(String),

  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// Transport-layer failure from the client session; never produced by
  /// the codec itself.
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl LlrpError {

  pub(crate) fn malformed(parameter: &'static str, reason: impl Into<String>) -> Self {
    LlrpError::Malformed { parameter, reason: reason.into() }
  }
}
