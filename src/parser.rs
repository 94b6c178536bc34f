//! Byte-level entry point: decode, check, adapt.

use crate::config::ParserConfig;
use crate::decode::WireMessage;
use crate::proto::ModelProto;
use crate::proto_adapter::{ModelAdapter, OnnxAdapter};
use crate::{Error, NetworkModel, Result};

/// First bytes a serialized `ModelProto` normally starts with: the tags of
/// `ir_version`, `producer_name`, `producer_version`, `domain`, `doc_string`
/// and `opset_import`
const LIKELY_FIRST_BYTES: [u8; 6] = [0x08, 0x12, 0x1A, 0x22, 0x3A, 0x42];

/// Contract for turning a serialized model into a [`NetworkModel`]
pub trait ModelParser: Send + Sync {
    fn parse(&self, data: &[u8]) -> Result<NetworkModel>;

    /// Whether `data` decodes and passes structural checks. Never fails.
    fn is_valid_format(&self, data: &[u8]) -> bool;

    /// File extensions this parser handles, with the leading dot
    fn supported_extensions(&self) -> &[&str];

    fn name(&self) -> &str;

    fn version(&self) -> &str;
}

/// Parser for ONNX protobuf files
#[derive(Debug, Clone, Default)]
pub struct OnnxModelParser {
    config: ParserConfig,
    adapter: OnnxAdapter,
}

impl OnnxModelParser {
    pub fn new() -> Self {
        OnnxModelParser::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        OnnxModelParser {
            adapter: OnnxAdapter::with_config(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn adapter(&self) -> &OnnxAdapter {
        &self.adapter
    }

    /// Decode without adapting
    pub fn decode(&self, data: &[u8]) -> Result<ModelProto> {
        ModelProto::decode_with_limit(data, self.config.recursion_limit)
    }
}

impl ModelParser for OnnxModelParser {
    fn parse(&self, data: &[u8]) -> Result<NetworkModel> {
        tracing::debug!(bytes = data.len(), "parsing ONNX model");

        let proto = self.decode(data)?;
        self.adapter
            .check(&proto)
            .map_err(|err| Error::invalid_format("invalid ONNX model structure", Some(err)))?;

        self.adapter.adapt(&proto)
    }

    fn is_valid_format(&self, data: &[u8]) -> bool {
        match self.decode(data) {
            Ok(proto) => self.adapter.validate(&proto),
            Err(err) => {
                tracing::debug!(error = %err, "not a decodable ONNX model");
                false
            }
        }
    }

    fn supported_extensions(&self) -> &[&str] {
        &[".onnx"]
    }

    fn name(&self) -> &str {
        "ONNX Model Parser"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }
}

/// Cheap sniff of the first byte; not a validity check.
///
/// Empty input is rejected. Shorter-than-usual buffers are still sniffed,
/// since a model holding only a graph can legitimately be tiny.
pub fn is_likely_format(data: &[u8]) -> bool {
    data.first()
        .is_some_and(|first| LIKELY_FIRST_BYTES.contains(first))
}
