//! # onnx-adapter
//!
//! A dependency-light ONNX model reader: a hand-written protobuf wire decoder
//! plus an adapter into format-agnostic model types.
//!
//! Parsing a model gives you:
//! - Metadata (producer, IR version, opset imports, properties)
//! - The computation graph (nodes, typed inputs and outputs, value infos)
//! - Weights (initializer tensors with their payload bytes)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use onnx_adapter::{ModelParser, OnnxModelParser};
//!
//! let bytes = std::fs::read("model.onnx")?;
//! let model = OnnxModelParser::new().parse(&bytes)?;
//! print!("{}", model.summary());
//!
//! for node in model.graph().topological_order()? {
//!     println!("{} <- {:?}", node.op_type(), node.inputs());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod external_data;
pub mod graph;
pub mod model;
pub mod operation;
pub mod parser;
pub mod proto;
pub mod proto_adapter;
pub mod tensor;
pub mod types;
pub mod value_info;
pub mod wire;

pub use config::ParserConfig;
pub use decode::{WireMessage, decode_model};
pub use error::{Error, ErrorKind, Result};
pub use external_data::ExternalDataRef;
pub use graph::ComputationGraph;
pub use model::{ModelMetadata, NetworkModel, OpsetImport, WeightCollection};
pub use operation::OperatorNode;
pub use parser::{ModelParser, OnnxModelParser, is_likely_format};
pub use proto_adapter::{ModelAdapter, OnnxAdapter};
pub use tensor::{Element, Tensor};
pub use types::{AttributeMap, AttributeValue, DataType};
pub use value_info::{TypeInfo, ValueInfo};
pub use wire::{WireError, WireReader};
