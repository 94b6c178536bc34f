use crate::DataType;

/// Type of a graph value; exactly one kind per instance
#[derive(Debug, Clone, PartialEq)]
pub enum TypeInfo {
    /// Dense tensor. `shape` is absent when the source declared none; a
    /// `-1` entry is a dynamic dimension.
    Tensor {
        elem_type: DataType,
        shape: Option<Vec<i64>>,
    },
    Sequence {
        elem_type: Box<TypeInfo>,
    },
    Map {
        key_type: DataType,
        value_type: Box<TypeInfo>,
    },
    /// Type known only by name
    Opaque { domain: String, name: String },
}

impl TypeInfo {
    /// Tensor of unknown element type and shape
    pub fn undefined() -> Self {
        TypeInfo::Tensor {
            elem_type: DataType::Undefined,
            shape: None,
        }
    }

    /// Kind tag as written in ONNX type strings
    pub fn kind(&self) -> &'static str {
        match self {
            TypeInfo::Tensor { .. } => "tensor",
            TypeInfo::Sequence { .. } => "sequence",
            TypeInfo::Map { .. } => "map",
            TypeInfo::Opaque { .. } => "opaque",
        }
    }

    /// Element type and shape when this is a tensor type
    pub fn as_tensor(&self) -> Option<(DataType, Option<&[i64]>)> {
        match self {
            TypeInfo::Tensor { elem_type, shape } => Some((*elem_type, shape.as_deref())),
            _ => None,
        }
    }
}

impl Default for TypeInfo {
    fn default() -> Self {
        TypeInfo::undefined()
    }
}

impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeInfo::Tensor { elem_type, shape } => {
                write!(f, "tensor({elem_type})")?;
                if let Some(shape) = shape {
                    write!(f, "{shape:?}")?;
                }
                Ok(())
            }
            TypeInfo::Sequence { elem_type } => write!(f, "seq({elem_type})"),
            TypeInfo::Map {
                key_type,
                value_type,
            } => write!(f, "map({key_type}, {value_type})"),
            TypeInfo::Opaque { domain, name } if domain.is_empty() => write!(f, "opaque({name})"),
            TypeInfo::Opaque { domain, name } => write!(f, "opaque({domain}.{name})"),
        }
    }
}

/// Name and type of a graph input, output or intermediate value
#[derive(Debug, Clone, PartialEq)]
pub struct ValueInfo {
    pub name: String,
    pub type_info: TypeInfo,
    pub doc_string: Option<String>,
}

impl ValueInfo {
    /// Shape of a tensor-typed value
    pub fn shape(&self) -> Option<&[i64]> {
        self.type_info.as_tensor().and_then(|(_, shape)| shape)
    }

    /// Element type of a tensor-typed value
    pub fn elem_type(&self) -> Option<DataType> {
        self.type_info.as_tensor().map(|(elem_type, _)| elem_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_types() {
        let ty = TypeInfo::Map {
            key_type: DataType::Int64,
            value_type: Box::new(TypeInfo::Sequence {
                elem_type: Box::new(TypeInfo::Tensor {
                    elem_type: DataType::Float,
                    shape: Some(vec![-1, 3]),
                }),
            }),
        };
        assert_eq!(ty.to_string(), "map(INT64, seq(tensor(FLOAT)[-1, 3]))");
        assert_eq!(ty.kind(), "map");
    }

    #[test]
    fn default_is_undefined_tensor() {
        assert_eq!(
            TypeInfo::default().as_tensor(),
            Some((DataType::Undefined, None))
        );
    }
}
