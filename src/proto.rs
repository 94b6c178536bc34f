//! Wire-level mirrors of the ONNX protobuf messages.
//!
//! Every singular field is an `Option` so that "omitted" stays distinct from
//! "present with its default value"; repeated fields keep wire order. These
//! structs are filled by [`crate::decode`] and consumed by
//! [`crate::proto_adapter`]; they carry no invariants of their own.

use prost::bytes::Bytes;

/// Top-level ONNX model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelProto {
    pub ir_version: Option<i64>,
    pub opset_import: Vec<OperatorSetIdProto>,
    pub producer_name: Option<String>,
    pub producer_version: Option<String>,
    pub domain: Option<String>,
    pub model_version: Option<i64>,
    pub doc_string: Option<String>,
    pub graph: Option<GraphProto>,
    pub metadata_props: Vec<StringStringEntryProto>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorSetIdProto {
    pub domain: Option<String>,
    pub version: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringStringEntryProto {
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphProto {
    pub node: Vec<NodeProto>,
    pub name: Option<String>,
    pub initializer: Vec<TensorProto>,
    pub doc_string: Option<String>,
    pub input: Vec<ValueInfoProto>,
    pub output: Vec<ValueInfoProto>,
    pub value_info: Vec<ValueInfoProto>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeProto {
    pub input: Vec<String>,
    pub output: Vec<String>,
    pub name: Option<String>,
    pub op_type: Option<String>,
    pub domain: Option<String>,
    pub attribute: Vec<AttributeProto>,
    pub doc_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorProto {
    pub dims: Vec<i64>,
    pub data_type: Option<i32>,
    pub float_data: Vec<f32>,
    pub int32_data: Vec<i32>,
    pub string_data: Vec<Bytes>,
    pub int64_data: Vec<i64>,
    pub name: Option<String>,
    pub doc_string: Option<String>,
    pub raw_data: Option<Bytes>,
    pub external_data: Vec<StringStringEntryProto>,
    pub data_location: Option<i32>,
    pub double_data: Vec<f64>,
    pub uint64_data: Vec<u64>,
}

pub mod tensor_proto {
    /// Where a tensor's payload lives
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum DataLocation {
        Default = 0,
        External = 1,
    }

    impl DataLocation {
        pub fn from_i32(value: i32) -> Option<Self> {
            match value {
                0 => Some(DataLocation::Default),
                1 => Some(DataLocation::External),
                _ => None,
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueInfoProto {
    pub name: Option<String>,
    pub r#type: Option<TypeProto>,
    pub doc_string: Option<String>,
}

/// Type of a graph value
///
/// The schema declares the variants as a oneof; they are kept as separate
/// optional fields here and resolved into a single variant by the adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeProto {
    pub tensor_type: Option<type_proto::Tensor>,
    pub sequence_type: Option<Box<type_proto::Sequence>>,
    pub map_type: Option<Box<type_proto::Map>>,
    pub opaque_type: Option<type_proto::Opaque>,
    pub sparse_tensor_type: Option<type_proto::SparseTensor>,
    pub denotation: Option<String>,
}

pub mod type_proto {
    use super::{TensorShapeProto, TypeProto};

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Tensor {
        pub elem_type: Option<i32>,
        pub shape: Option<TensorShapeProto>,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Sequence {
        pub elem_type: Option<Box<TypeProto>>,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Map {
        pub key_type: Option<i32>,
        pub value_type: Option<Box<TypeProto>>,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Opaque {
        pub domain: Option<String>,
        pub name: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct SparseTensor {
        pub elem_type: Option<i32>,
        pub shape: Option<TensorShapeProto>,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorShapeProto {
    pub dim: Vec<tensor_shape_proto::Dimension>,
}

pub mod tensor_shape_proto {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Dimension {
        pub dim_value: Option<i64>,
        pub dim_param: Option<String>,
        pub denotation: Option<String>,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeProto {
    pub name: Option<String>,
    pub ref_attr_name: Option<String>,
    pub doc_string: Option<String>,
    pub r#type: Option<i32>,
    pub f: Option<f32>,
    pub i: Option<i64>,
    pub s: Option<Bytes>,
    pub t: Option<Box<TensorProto>>,
    pub floats: Vec<f32>,
    pub ints: Vec<i64>,
    pub strings: Vec<Bytes>,
    pub tensors: Vec<TensorProto>,
}

pub mod attribute_proto {
    /// Declared payload kind of an attribute
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum AttributeType {
        Undefined = 0,
        Float = 1,
        Int = 2,
        String = 3,
        Tensor = 4,
        Graph = 5,
        Floats = 6,
        Ints = 7,
        Strings = 8,
        Tensors = 9,
        Graphs = 10,
        SparseTensor = 11,
        SparseTensors = 12,
        TypeProto = 13,
        TypeProtos = 14,
    }

    impl AttributeType {
        pub fn from_i32(value: i32) -> Option<Self> {
            Some(match value {
                0 => AttributeType::Undefined,
                1 => AttributeType::Float,
                2 => AttributeType::Int,
                3 => AttributeType::String,
                4 => AttributeType::Tensor,
                5 => AttributeType::Graph,
                6 => AttributeType::Floats,
                7 => AttributeType::Ints,
                8 => AttributeType::Strings,
                9 => AttributeType::Tensors,
                10 => AttributeType::Graphs,
                11 => AttributeType::SparseTensor,
                12 => AttributeType::SparseTensors,
                13 => AttributeType::TypeProto,
                14 => AttributeType::TypeProtos,
                _ => return None,
            })
        }
    }
}
