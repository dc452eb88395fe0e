use thiserror::Error;

/// Main error type for UIC barcode operations
///
/// Variants fall into five groups: structural problems with a frame,
/// bit-stream exhaustion, values violating a schema constraint,
/// cryptographic failures and compression failures. `Field` wraps any of
/// them with the dotted path of the ASN.1 field being processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UicError {
    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Buffer underflow: need {needed} bits, have {available}")]
    BufferUnderflow { needed: usize, available: usize },

    #[error("Buffer overflow: cannot write {needed} bits, {available} left")]
    BufferOverflow { needed: usize, available: usize },

    #[error("Value {value} not in range {min}..={max}")]
    ValueOutOfRange { value: i64, min: i64, max: i64 },

    #[error("Invalid choice index: {index} (max {max})")]
    InvalidChoiceIndex { index: usize, max: usize },

    #[error("Invalid enumerated index: {index} (max {max})")]
    InvalidEnumerated { index: usize, max: usize },

    #[error("Invalid string: {0}")]
    InvalidString(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Malformed key: {0}")]
    MalformedKey(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("{path}: {source}")]
    Field {
        path: String,
        #[source]
        source: Box<UicError>,
    },
}

impl UicError {
    /// Innermost error, with all field context stripped
    pub fn root_cause(&self) -> &UicError {
        match self {
            UicError::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Dotted field path leading to the error, if any was recorded
    pub fn field_path(&self) -> Option<&str> {
        match self {
            UicError::Field { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Wrap this error with the name of the enclosing field
    ///
    /// Nested calls build a dotted path from the outermost structure inwards.
    pub fn in_field(self, name: &str) -> Self {
        match self {
            UicError::Field { path, source } => UicError::Field {
                path: format!("{}.{}", name, path),
                source,
            },
            other => UicError::Field {
                path: name.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// Result type alias for UIC barcode operations
pub type UicResult<T> = Result<T, UicError>;

/// Attach field context to a failing result
pub trait ResultExt<T> {
    fn field(self, name: &str) -> UicResult<T>;
}

impl<T> ResultExt<T> for UicResult<T> {
    fn field(self, name: &str) -> UicResult<T> {
        self.map_err(|e| e.in_field(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_field_path() {
        let inner: UicResult<()> = Err(UicError::ValueOutOfRange {
            value: 0,
            min: 1,
            max: 366,
        });
        let err = inner.field("day").field("timeStamp").unwrap_err();

        assert_eq!(err.field_path(), Some("timeStamp.day"));
        assert_eq!(
            err.root_cause(),
            &UicError::ValueOutOfRange {
                value: 0,
                min: 1,
                max: 366
            }
        );
        assert_eq!(
            err.to_string(),
            "timeStamp.day: Value 0 not in range 1..=366"
        );
    }

    #[test]
    fn test_root_cause_without_context() {
        let err = UicError::Compression("bad stream".to_string());
        assert_eq!(err.root_cause(), &err);
        assert_eq!(err.field_path(), None);
    }
}
