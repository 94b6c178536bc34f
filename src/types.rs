use std::collections::HashMap;

use crate::tensor::Tensor;

/// Tensor element types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    #[default]
    Undefined = 0,
    Float = 1,
    Uint8 = 2,
    Int8 = 3,
    Uint16 = 4,
    Int16 = 5,
    Int32 = 6,
    Int64 = 7,
    String = 8,
    Bool = 9,
    Float16 = 10,
    Double = 11,
    Uint32 = 12,
    Uint64 = 13,
    Complex64 = 14,
    Complex128 = 15,
    Bfloat16 = 16,
}

impl DataType {
    /// Map an ONNX `TensorProto.DataType` value; anything unknown becomes
    /// [`DataType::Undefined`]
    pub fn from_onnx_type(data_type: i32) -> Self {
        match data_type {
            1 => DataType::Float,
            2 => DataType::Uint8,
            3 => DataType::Int8,
            4 => DataType::Uint16,
            5 => DataType::Int16,
            6 => DataType::Int32,
            7 => DataType::Int64,
            8 => DataType::String,
            9 => DataType::Bool,
            10 => DataType::Float16,
            11 => DataType::Double,
            12 => DataType::Uint32,
            13 => DataType::Uint64,
            14 => DataType::Complex64,
            15 => DataType::Complex128,
            16 => DataType::Bfloat16,
            _ => DataType::Undefined,
        }
    }

    /// Size in bytes of one element, `None` for variable-length or undefined
    /// types
    pub fn size_in_bytes(&self) -> Option<usize> {
        match self {
            DataType::Float | DataType::Int32 | DataType::Uint32 => Some(4),
            DataType::Double | DataType::Int64 | DataType::Uint64 => Some(8),
            DataType::Float16 | DataType::Bfloat16 | DataType::Int16 | DataType::Uint16 => Some(2),
            DataType::Int8 | DataType::Uint8 | DataType::Bool => Some(1),
            DataType::Complex64 => Some(8),
            DataType::Complex128 => Some(16),
            DataType::String | DataType::Undefined => None,
        }
    }

    /// ONNX spelling of the type name
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Undefined => "UNDEFINED",
            DataType::Float => "FLOAT",
            DataType::Uint8 => "UINT8",
            DataType::Int8 => "INT8",
            DataType::Uint16 => "UINT16",
            DataType::Int16 => "INT16",
            DataType::Int32 => "INT32",
            DataType::Int64 => "INT64",
            DataType::String => "STRING",
            DataType::Bool => "BOOL",
            DataType::Float16 => "FLOAT16",
            DataType::Double => "DOUBLE",
            DataType::Uint32 => "UINT32",
            DataType::Uint64 => "UINT64",
            DataType::Complex64 => "COMPLEX64",
            DataType::Complex128 => "COMPLEX128",
            DataType::Bfloat16 => "BFLOAT16",
        }
    }

    /// Check if this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            DataType::Float16 | DataType::Float | DataType::Double | DataType::Bfloat16
        )
    }

    /// Check if this is an integer type
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::Uint8
                | DataType::Uint16
                | DataType::Uint32
                | DataType::Uint64
        )
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Attribute values, one variant per payload kind
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Float(f32),
    Int(i64),
    String(String),
    Bool(bool),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
    Strings(Vec<String>),
    Bools(Vec<bool>),
    Tensor(Tensor),
    Tensors(Vec<Tensor>),
}

/// Attributes of a node, keyed by attribute name
pub type AttributeMap = HashMap<String, AttributeValue>;

impl AttributeValue {
    /// Try to get integer value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get float value
    pub fn as_float(&self) -> Option<f32> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get string value
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get tensor value
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            AttributeValue::Tensor(t) => Some(t),
            _ => None,
        }
    }

    /// Try to get integer array value
    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            AttributeValue::Ints(ints) => Some(ints),
            _ => None,
        }
    }

    /// Try to get float array value
    pub fn as_floats(&self) -> Option<&[f32]> {
        match self {
            AttributeValue::Floats(floats) => Some(floats),
            _ => None,
        }
    }

    /// Try to get string array value
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            AttributeValue::Strings(strings) => Some(strings),
            _ => None,
        }
    }

    pub fn as_bools(&self) -> Option<&[bool]> {
        match self {
            AttributeValue::Bools(bools) => Some(bools),
            _ => None,
        }
    }

    pub fn as_tensors(&self) -> Option<&[Tensor]> {
        match self {
            AttributeValue::Tensors(tensors) => Some(tensors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_onnx_code_maps_back_to_itself() {
        for code in 0..=16 {
            assert_eq!(DataType::from_onnx_type(code) as i32, code);
        }
        assert_eq!(DataType::from_onnx_type(17), DataType::Undefined);
        assert_eq!(DataType::from_onnx_type(-1), DataType::Undefined);
    }

    #[test]
    fn element_sizes() {
        assert_eq!(DataType::Float.size_in_bytes(), Some(4));
        assert_eq!(DataType::Bfloat16.size_in_bytes(), Some(2));
        assert_eq!(DataType::Complex128.size_in_bytes(), Some(16));
        assert_eq!(DataType::String.size_in_bytes(), None);
        assert_eq!(DataType::Undefined.size_in_bytes(), None);
    }

    #[test]
    fn accessors_only_match_their_variant() {
        let value = AttributeValue::Ints(vec![1, 2]);
        assert_eq!(value.as_ints(), Some(&[1, 2][..]));
        assert_eq!(value.as_int(), None);
        assert_eq!(value.as_floats(), None);
        assert_eq!(AttributeValue::Bool(true).as_bool(), Some(true));
    }
}
