//! Parser configuration.
//!
//! ```
//! use onnx_adapter::ParserConfig;
//!
//! let config = ParserConfig::default()
//!     .with_recursion_limit(32)
//!     .with_ir_version_range(3, 9);
//! assert_eq!(config.recursion_limit, 32);
//! ```

use std::ops::RangeInclusive;

/// Maximum nesting depth of submessages accepted by default
pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// Oldest IR version accepted by default
pub const DEFAULT_MIN_IR_VERSION: i64 = 3;

/// Newest IR version accepted by default
pub const DEFAULT_MAX_IR_VERSION: i64 = 10;

/// Settings shared by the decoder and the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Deepest submessage nesting the decoder follows before giving up.
    pub recursion_limit: u32,
    /// Lowest accepted `ir_version`, inclusive.
    pub min_ir_version: i64,
    /// Highest accepted `ir_version`, inclusive.
    pub max_ir_version: i64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            min_ir_version: DEFAULT_MIN_IR_VERSION,
            max_ir_version: DEFAULT_MAX_IR_VERSION,
        }
    }
}

impl ParserConfig {
    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn with_ir_version_range(mut self, min: i64, max: i64) -> Self {
        self.min_ir_version = min;
        self.max_ir_version = max;
        self
    }

    /// Accepted IR versions
    pub fn ir_version_range(&self) -> RangeInclusive<i64> {
        self.min_ir_version..=self.max_ir_version
    }
}
