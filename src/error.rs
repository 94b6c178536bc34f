use std::error::Error as StdError;

use crate::wire::WireError;

/// Error type for onnx-adapter
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input is not recognisable as an ONNX model, or a top-level structural
    /// check failed
    #[error("invalid format: {message}")]
    InvalidFormat {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Decoding succeeded but the decoded content could not be used
    #[error("corrupted data: {message}")]
    CorruptedData {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// The byte stream violates the protobuf wire encoding
    #[error("malformed wire data: {0}")]
    MalformedWireData(#[from] WireError),

    /// A declared version is outside the accepted range
    #[error("unsupported version: {version} (supported: {})", .supported.join(", "))]
    UnsupportedVersion {
        version: String,
        supported: Vec<String>,
    },

    /// A field the model cannot do without is absent
    #[error("missing required field: {field} in {context}")]
    MissingRequiredField { field: &'static str, context: String },

    /// A value could not be coerced to the expected primitive type
    #[error("cannot convert from {from} to {to}: {value}")]
    TypeConversion {
        from: &'static str,
        to: &'static str,
        value: String,
    },

    /// Reserved for operator registry validation; the adapter itself keeps
    /// unknown operators as they are
    #[error("unknown operator: {op_type}{}", .domain.as_deref().map(|d| format!(" (domain {d})")).unwrap_or_default())]
    UnknownOperator {
        op_type: String,
        domain: Option<String>,
    },

    /// Graph-level invariant violation, or any unexpected failure raised
    /// while adapting
    #[error("invalid graph structure: {message}")]
    InvalidGraphStructure {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },
}

/// Flat discriminant of [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidFormat,
    CorruptedData,
    MalformedWireData,
    UnsupportedVersion,
    MissingRequiredField,
    TypeConversion,
    UnknownOperator,
    InvalidGraphStructure,
}

impl ErrorKind {
    /// Stable identifier for this kind
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidFormat => "INVALID_FORMAT",
            ErrorKind::CorruptedData => "CORRUPTED_DATA",
            ErrorKind::MalformedWireData => "MALFORMED_WIRE_DATA",
            ErrorKind::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorKind::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorKind::TypeConversion => "TYPE_CONVERSION_ERROR",
            ErrorKind::UnknownOperator => "UNKNOWN_OPERATOR",
            ErrorKind::InvalidGraphStructure => "INVALID_GRAPH_STRUCTURE",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Which branch of the taxonomy this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Error::CorruptedData { .. } => ErrorKind::CorruptedData,
            Error::MalformedWireData(_) => ErrorKind::MalformedWireData,
            Error::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Error::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            Error::TypeConversion { .. } => ErrorKind::TypeConversion,
            Error::UnknownOperator { .. } => ErrorKind::UnknownOperator,
            Error::InvalidGraphStructure { .. } => ErrorKind::InvalidGraphStructure,
        }
    }

    /// Message prefixed with the kind identifier, followed by the chain of
    /// causes
    pub fn detailed_message(&self) -> String {
        let mut message = format!("[{}] {}", self.kind(), self);
        let mut cause = StdError::source(self);
        while let Some(err) = cause {
            message.push_str(&format!(" (caused by: {})", err));
            cause = err.source();
        }
        message
    }

    pub(crate) fn invalid_format(message: impl Into<String>, source: Option<Error>) -> Self {
        Error::InvalidFormat {
            message: message.into(),
            source: source.map(Box::new),
        }
    }

    pub(crate) fn corrupted_data(message: impl Into<String>, source: Option<Error>) -> Self {
        Error::CorruptedData {
            message: message.into(),
            source: source.map(Box::new),
        }
    }

    pub(crate) fn invalid_graph(message: impl Into<String>, source: Option<Error>) -> Self {
        Error::InvalidGraphStructure {
            message: message.into(),
            source: source.map(Box::new),
        }
    }

    pub(crate) fn missing_field(field: &'static str, context: impl Into<String>) -> Self {
        Error::MissingRequiredField {
            field,
            context: context.into(),
        }
    }

    pub(crate) fn unsupported_version(version: impl ToString, supported: Vec<String>) -> Self {
        Error::UnsupportedVersion {
            version: version.to_string(),
            supported,
        }
    }

    pub(crate) fn type_conversion(
        from: &'static str,
        to: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Error::TypeConversion {
            from,
            to,
            value: value.into(),
        }
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::type_conversion("bytes", "utf-8 string", err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::type_conversion("bytes", "utf-8 string", err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
