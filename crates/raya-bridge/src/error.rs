//! Error types for bridge operations

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Bridge error types
///
/// Every failure is attributable either to the injected coercion capability
/// or to the wrapped collection. A missing key is not an error: lookups
/// report absence through `Option`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// Index past the end of a sequence
    #[error("Index {index} out of bounds for length {len}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Length of the sequence at the time of the access
        len: usize,
    },

    /// A value could not be converted to the requested type
    #[error("Cannot convert {value} to {target}")]
    Coercion {
        /// Script rendering of the source value
        value: String,
        /// Name of the target type
        target: String,
    },

    /// A write would append more placeholder slots than the configured limit
    #[error("Writing index {index} would grow the sequence from {len} past the limit of {limit} slots")]
    GrowthLimit {
        /// Requested index
        index: usize,
        /// Length of the sequence at the time of the write
        len: usize,
        /// Configured growth limit
        limit: usize,
    },

    /// Property cannot be written
    #[error("Property '{0}' is read-only")]
    ReadOnly(String),

    /// Malformed bridge configuration
    #[error("Invalid bridge configuration: {0}")]
    Config(String),

    /// Error raised by a host capability
    #[error("{0}")]
    Host(String),
}

impl BridgeError {
    /// Build a coercion error from anything printable
    pub fn coercion(value: impl std::fmt::Display, target: impl std::fmt::Display) -> Self {
        BridgeError::Coercion {
            value: value.to_string(),
            target: target.to_string(),
        }
    }
}

impl From<String> for BridgeError {
    fn from(s: String) -> Self {
        BridgeError::Host(s)
    }
}

impl From<&str> for BridgeError {
    fn from(s: &str) -> Self {
        BridgeError::Host(s.to_string())
    }
}
