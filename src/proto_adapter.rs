//! Translation from wire-level ONNX messages into crate-native types.
//!
//! Keep all direct proto-field usage here so changes to the decoded schema
//! only need to touch this file and [`crate::decode`].

use std::ops::RangeInclusive;

use prost::bytes::Bytes;

use crate::config::ParserConfig;
use crate::external_data::ExternalDataRef;
use crate::proto::{
    AttributeProto, GraphProto, ModelProto, NodeProto, TensorProto, TensorShapeProto, TypeProto,
    ValueInfoProto, attribute_proto::AttributeType, tensor_proto::DataLocation,
};
use crate::{
    AttributeMap, AttributeValue, ComputationGraph, DataType, Error, ErrorKind, ModelMetadata,
    NetworkModel, OperatorNode, OpsetImport, Result, Tensor, TypeInfo, ValueInfo,
    WeightCollection,
};

/// Model name used when neither the model nor its graph provides one
pub const UNNAMED_MODEL: &str = "unnamed_model";

/// Contract every source-format adapter satisfies
pub trait ModelAdapter {
    type Source;
    type Target;

    /// Convert `source`, explaining any failure
    fn adapt(&self, source: &Self::Source) -> Result<Self::Target>;

    /// Whether `source` passes the structural checks `adapt` starts with
    fn validate(&self, source: &Self::Source) -> bool;

    fn name(&self) -> &str;

    /// Source format versions this adapter accepts
    fn supported_version_range(&self) -> RangeInclusive<i64>;
}

/// Adapter from decoded ONNX messages to [`NetworkModel`]
#[derive(Debug, Clone, Default)]
pub struct OnnxAdapter {
    config: ParserConfig,
}

impl OnnxAdapter {
    pub fn new() -> Self {
        OnnxAdapter::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        OnnxAdapter { config }
    }

    /// Accepted IR versions rendered for display
    pub fn supported_version(&self) -> String {
        format!(
            "ONNX IR {} - {}",
            self.config.min_ir_version, self.config.max_ir_version
        )
    }

    /// Structural checks: graph present and IR version, if declared, in range
    pub fn check(&self, model: &ModelProto) -> Result<()> {
        if model.graph.is_none() {
            return Err(Error::missing_field("graph", "ModelProto"));
        }

        if let Some(ir_version) = model
            .ir_version
            .filter(|v| !self.config.ir_version_range().contains(v))
        {
            return Err(Error::unsupported_version(
                format!("IR version {ir_version}"),
                self.supported_versions(),
            ));
        }

        Ok(())
    }

    fn supported_versions(&self) -> Vec<String> {
        let range = self.config.ir_version_range();
        if range.end().saturating_sub(*range.start()) < 64 {
            range.map(|v| v.to_string()).collect()
        } else {
            vec![format!("{}-{}", range.start(), range.end())]
        }
    }

    fn convert(&self, model: &ModelProto) -> Result<NetworkModel> {
        let graph_proto = model
            .graph
            .as_ref()
            .ok_or_else(|| Error::missing_field("graph", "ModelProto"))?;

        let metadata = metadata_from_proto(model);
        let graph = graph_from_proto(graph_proto)?;
        let weights = WeightCollection::from_initializers(graph.initializers());

        tracing::debug!(
            model = %metadata.name,
            nodes = graph.nodes().len(),
            inputs = graph.inputs().len(),
            outputs = graph.outputs().len(),
            initializers = graph.initializers().len(),
            weights = weights.len(),
            "adapted ONNX model"
        );

        Ok(NetworkModel::new(metadata, graph, weights))
    }
}

impl ModelAdapter for OnnxAdapter {
    type Source = ModelProto;
    type Target = NetworkModel;

    fn adapt(&self, source: &ModelProto) -> Result<NetworkModel> {
        self.check(source)?;
        self.convert(source).map_err(|err| match err.kind() {
            ErrorKind::MissingRequiredField
            | ErrorKind::CorruptedData
            | ErrorKind::TypeConversion
            | ErrorKind::UnsupportedVersion
            | ErrorKind::InvalidGraphStructure => err,
            _ => Error::invalid_graph("failed to adapt ONNX model", Some(err)),
        })
    }

    fn validate(&self, source: &ModelProto) -> bool {
        self.check(source).is_ok()
    }

    fn name(&self) -> &str {
        "OnnxAdapter"
    }

    fn supported_version_range(&self) -> RangeInclusive<i64> {
        self.config.ir_version_range()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

fn utf8(bytes: &Bytes) -> Result<String> {
    Ok(std::str::from_utf8(bytes)?.to_owned())
}

fn metadata_from_proto(model: &ModelProto) -> ModelMetadata {
    let mut opset_imports: Vec<OpsetImport> = model
        .opset_import
        .iter()
        .map(|opset| OpsetImport {
            domain: opset.domain.clone().unwrap_or_default(),
            version: opset.version.unwrap_or(1),
        })
        .collect();

    if opset_imports.is_empty() {
        opset_imports.push(OpsetImport::default());
    }

    let properties: Vec<(String, String)> = model
        .metadata_props
        .iter()
        .filter_map(|entry| {
            let key = non_empty(&entry.key)?;
            Some((key, entry.value.clone().unwrap_or_default()))
        })
        .collect();

    let author = properties
        .iter()
        .find(|(key, value)| key == "author" && !value.is_empty())
        .map(|(_, value)| value.clone());

    let name = model
        .graph
        .as_ref()
        .and_then(|g| non_empty(&g.name))
        .unwrap_or_else(|| UNNAMED_MODEL.to_string());

    ModelMetadata {
        name,
        version: model
            .model_version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "1.0".to_string()),
        description: non_empty(&model.doc_string),
        author,
        domain: non_empty(&model.domain),
        doc_string: non_empty(&model.doc_string),
        producer_name: non_empty(&model.producer_name),
        producer_version: non_empty(&model.producer_version),
        ir_version: model.ir_version,
        opset_imports,
        properties,
    }
}

fn graph_from_proto(graph: &GraphProto) -> Result<ComputationGraph> {
    let nodes = graph
        .node
        .iter()
        .enumerate()
        .map(|(index, node)| node_from_proto(node, index))
        .collect::<Result<Vec<_>>>()?;
    let inputs = value_infos_from_proto(&graph.input)?;
    let outputs = value_infos_from_proto(&graph.output)?;
    let initializers = graph
        .initializer
        .iter()
        .map(tensor_from_proto)
        .collect::<Result<Vec<_>>>()?;
    let value_infos = value_infos_from_proto(&graph.value_info)?;

    Ok(
        ComputationGraph::new(nodes, inputs, outputs, initializers, value_infos)
            .with_name(non_empty(&graph.name), non_empty(&graph.doc_string)),
    )
}

/// Create OperatorNode from ONNX NodeProto
pub(crate) fn node_from_proto(node: &NodeProto, index: usize) -> Result<OperatorNode> {
    let op_type = non_empty(&node.op_type)
        .ok_or_else(|| Error::missing_field("op_type", format!("NodeProto[{index}]")))?;

    let attributes = attributes_from_proto(&node.attribute)?;
    let name = non_empty(&node.name);
    let id = name.clone().unwrap_or_else(|| format!("node_{index}"));

    Ok(OperatorNode::new(
        id,
        op_type,
        name,
        node.input.clone(),
        node.output.clone(),
        attributes,
        non_empty(&node.domain),
        non_empty(&node.doc_string),
    ))
}

fn attributes_from_proto(attributes: &[AttributeProto]) -> Result<AttributeMap> {
    let mut result = AttributeMap::with_capacity(attributes.len());
    for attr in attributes {
        let Some(name) = non_empty(&attr.name) else {
            continue;
        };
        if let Some(value) = attribute_value_from_proto(attr)? {
            result.insert(name, value);
        }
    }
    Ok(result)
}

/// Resolve an attribute by its declared type only; payload fields that do
/// not belong to that type are ignored
pub(crate) fn attribute_value_from_proto(attr: &AttributeProto) -> Result<Option<AttributeValue>> {
    let attr_type = attr.r#type.unwrap_or(0);
    let Some(kind) = AttributeType::from_i32(attr_type) else {
        tracing::debug!(
            attribute = attr.name.as_deref().unwrap_or(""),
            attr_type,
            "dropping attribute of unknown type"
        );
        return Ok(None);
    };

    let value = match kind {
        AttributeType::Float => AttributeValue::Float(attr.f.unwrap_or(0.0)),
        AttributeType::Int => AttributeValue::Int(attr.i.unwrap_or(0)),
        AttributeType::String => match &attr.s {
            Some(s) => AttributeValue::String(utf8(s)?),
            None => AttributeValue::String(String::new()),
        },
        AttributeType::Tensor => match attr.t.as_deref() {
            Some(t) => AttributeValue::Tensor(tensor_from_proto(t)?),
            None => return Ok(None),
        },
        AttributeType::Floats => AttributeValue::Floats(attr.floats.clone()),
        AttributeType::Ints => AttributeValue::Ints(attr.ints.clone()),
        AttributeType::Strings => AttributeValue::Strings(
            attr.strings.iter().map(utf8).collect::<Result<Vec<_>>>()?,
        ),
        AttributeType::Tensors => AttributeValue::Tensors(
            attr.tensors
                .iter()
                .map(tensor_from_proto)
                .collect::<Result<Vec<_>>>()?,
        ),
        AttributeType::Undefined
        | AttributeType::Graph
        | AttributeType::Graphs
        | AttributeType::SparseTensor
        | AttributeType::SparseTensors
        | AttributeType::TypeProto
        | AttributeType::TypeProtos => {
            tracing::debug!(
                attribute = attr.name.as_deref().unwrap_or(""),
                kind = ?kind,
                "dropping attribute of unsupported type"
            );
            return Ok(None);
        }
    };
    Ok(Some(value))
}

fn value_infos_from_proto(value_infos: &[ValueInfoProto]) -> Result<Vec<ValueInfo>> {
    value_infos.iter().map(value_info_from_proto).collect()
}

pub(crate) fn value_info_from_proto(value_info: &ValueInfoProto) -> Result<ValueInfo> {
    let name =
        non_empty(&value_info.name).ok_or_else(|| Error::missing_field("name", "ValueInfoProto"))?;

    Ok(ValueInfo {
        name,
        type_info: type_info_from_proto(value_info.r#type.as_ref()),
        doc_string: non_empty(&value_info.doc_string),
    })
}

/// Resolve the populated type variant, checking tensor, sequence, map and
/// opaque in that order
pub(crate) fn type_info_from_proto(type_proto: Option<&TypeProto>) -> TypeInfo {
    let Some(type_proto) = type_proto else {
        return TypeInfo::undefined();
    };

    if let Some(tensor) = &type_proto.tensor_type {
        return TypeInfo::Tensor {
            elem_type: DataType::from_onnx_type(tensor.elem_type.unwrap_or(0)),
            shape: tensor.shape.as_ref().map(shape_from_proto),
        };
    }

    if let Some(sequence) = &type_proto.sequence_type {
        return TypeInfo::Sequence {
            elem_type: Box::new(type_info_from_proto(sequence.elem_type.as_deref())),
        };
    }

    if let Some(map) = &type_proto.map_type {
        return TypeInfo::Map {
            key_type: DataType::from_onnx_type(map.key_type.unwrap_or(0)),
            value_type: Box::new(type_info_from_proto(map.value_type.as_deref())),
        };
    }

    if let Some(opaque) = &type_proto.opaque_type {
        return TypeInfo::Opaque {
            domain: opaque.domain.clone().unwrap_or_default(),
            name: opaque.name.clone().unwrap_or_default(),
        };
    }

    TypeInfo::undefined()
}

/// Concrete dimensions are kept; symbolic or unset ones become `-1`
fn shape_from_proto(shape: &TensorShapeProto) -> Vec<i64> {
    shape
        .dim
        .iter()
        .map(|d| match d.dim_value {
            Some(v) if v >= 0 => v,
            _ => -1,
        })
        .collect()
}

/// Create Tensor from ONNX TensorProto
pub(crate) fn tensor_from_proto(tensor: &TensorProto) -> Result<Tensor> {
    let name = non_empty(&tensor.name).ok_or_else(|| Error::missing_field("name", "TensorProto"))?;
    if let Some(&dim) = tensor.dims.iter().find(|&&d| d < -1) {
        return Err(Error::corrupted_data(
            format!("tensor '{name}' has invalid dimension {dim} in {:?}", tensor.dims),
            None,
        ));
    }
    let data_type = DataType::from_onnx_type(tensor.data_type.unwrap_or(0));
    let data = tensor_payload(tensor, data_type)?;

    let external_data = match tensor.data_location.and_then(DataLocation::from_i32) {
        Some(DataLocation::External) => {
            Some(ExternalDataRef::from_key_value_pairs(&tensor.external_data)?)
        }
        _ => None,
    };

    Ok(Tensor::new(name, data_type, tensor.dims.clone(), data)
        .with_raw_data(tensor.raw_data.clone())
        .with_doc_string(non_empty(&tensor.doc_string))
        .with_external_data(external_data))
}

/// Payload bytes: non-empty `raw_data` verbatim, otherwise the typed field
/// matching `data_type` laid out little-endian at the element width,
/// otherwise empty
fn tensor_payload(tensor: &TensorProto, data_type: DataType) -> Result<Bytes> {
    if let Some(raw) = tensor.raw_data.as_ref().filter(|raw| !raw.is_empty()) {
        return Ok(raw.clone());
    }

    macro_rules! numeric {
        ($field:expr, $ty:ty) => {
            Bytes::from(
                $field
                    .iter()
                    .flat_map(|&x| (x as $ty).to_le_bytes())
                    .collect::<Vec<u8>>(),
            )
        };
    }

    let data = match data_type {
        DataType::Float | DataType::Complex64 => numeric!(tensor.float_data, f32),
        DataType::Double | DataType::Complex128 => numeric!(tensor.double_data, f64),
        DataType::Int32 => numeric!(tensor.int32_data, i32),
        DataType::Int16 => numeric!(tensor.int32_data, i16),
        DataType::Int8 => numeric!(tensor.int32_data, i8),
        DataType::Uint16 | DataType::Float16 | DataType::Bfloat16 => {
            numeric!(tensor.int32_data, u16)
        }
        DataType::Uint8 | DataType::Bool => numeric!(tensor.int32_data, u8),
        DataType::Int64 => numeric!(tensor.int64_data, i64),
        DataType::Uint64 => numeric!(tensor.uint64_data, u64),
        DataType::Uint32 => numeric!(tensor.uint64_data, u32),
        DataType::String => {
            let strings = tensor
                .string_data
                .iter()
                .map(utf8)
                .collect::<Result<Vec<_>>>()?;
            Bytes::from(strings.join("\0").into_bytes())
        }
        DataType::Undefined => Bytes::new(),
    };
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{tensor_shape_proto::Dimension, type_proto};

    fn named_tensor(name: &str, data_type: DataType) -> TensorProto {
        TensorProto {
            name: Some(name.to_string()),
            data_type: Some(data_type as i32),
            ..Default::default()
        }
    }

    #[test]
    fn int64_payload_keeps_full_precision() {
        let big = (1i64 << 60) + 1;
        let tensor = TensorProto {
            dims: vec![2],
            int64_data: vec![big, -big],
            ..named_tensor("t", DataType::Int64)
        };
        let converted = tensor_from_proto(&tensor).unwrap();
        assert_eq!(converted.data().len(), 16);
        assert_eq!(converted.to_vec::<i64>().unwrap(), vec![big, -big]);
    }

    #[test]
    fn uint64_payload_above_i64_max() {
        let tensor = TensorProto {
            dims: vec![1],
            uint64_data: vec![u64::MAX - 1],
            ..named_tensor("u", DataType::Uint64)
        };
        let converted = tensor_from_proto(&tensor).unwrap();
        assert_eq!(converted.to_vec::<u64>().unwrap(), vec![u64::MAX - 1]);
    }

    #[test]
    fn narrow_types_are_packed_at_element_width() {
        let tensor = TensorProto {
            dims: vec![3],
            int32_data: vec![1, 0, 1],
            ..named_tensor("mask", DataType::Bool)
        };
        let converted = tensor_from_proto(&tensor).unwrap();
        assert_eq!(converted.data().as_ref(), &[1, 0, 1]);
        assert_eq!(converted.expected_byte_len(), Some(3));

        let tensor = TensorProto {
            dims: vec![2],
            int32_data: vec![-2, 7],
            ..named_tensor("small", DataType::Int8)
        };
        let converted = tensor_from_proto(&tensor).unwrap();
        assert_eq!(converted.to_vec::<i8>().unwrap(), vec![-2, 7]);
    }

    #[test]
    fn raw_data_wins_over_typed_fields() {
        let tensor = TensorProto {
            dims: vec![1],
            float_data: vec![9.0],
            raw_data: Some(Bytes::from_static(&[0, 0, 128, 63])),
            ..named_tensor("r", DataType::Float)
        };
        let converted = tensor_from_proto(&tensor).unwrap();
        assert_eq!(converted.to_vec::<f32>().unwrap(), vec![1.0]);
        assert_eq!(converted.raw_data().map(|b| b.len()), Some(4));
    }

    #[test]
    fn empty_raw_data_falls_back_to_typed_field() {
        let tensor = TensorProto {
            dims: vec![1],
            float_data: vec![2.5],
            raw_data: Some(Bytes::new()),
            ..named_tensor("r", DataType::Float)
        };
        let converted = tensor_from_proto(&tensor).unwrap();
        assert_eq!(converted.to_vec::<f32>().unwrap(), vec![2.5]);
        assert_eq!(converted.raw_data(), Some(&Bytes::new()));
    }

    #[test]
    fn declared_but_unpopulated_tensor_is_empty() {
        let tensor = TensorProto {
            dims: vec![4],
            ..named_tensor("empty", DataType::Float)
        };
        let converted = tensor_from_proto(&tensor).unwrap();
        assert!(converted.data().is_empty());
        assert!(!converted.has_data());
    }

    #[test]
    fn string_tensor_joins_with_nul() {
        let tensor = TensorProto {
            dims: vec![2],
            string_data: vec![Bytes::from_static(b"cat"), Bytes::from_static(b"dog")],
            ..named_tensor("labels", DataType::String)
        };
        let converted = tensor_from_proto(&tensor).unwrap();
        assert_eq!(converted.data().as_ref(), b"cat\0dog");
        assert_eq!(converted.strings().unwrap(), vec!["cat", "dog"]);
    }

    #[test]
    fn dims_below_dynamic_sentinel_are_rejected() {
        let tensor = TensorProto {
            dims: vec![-2, 3],
            ..named_tensor("bad", DataType::Float)
        };
        let err = tensor_from_proto(&tensor).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptedData);

        let dynamic = TensorProto {
            dims: vec![-1, 3],
            ..named_tensor("dyn", DataType::Float)
        };
        assert_eq!(tensor_from_proto(&dynamic).unwrap().shape(), &[-1, 3]);
    }

    #[test]
    fn unnamed_tensor_is_missing_field() {
        let err = tensor_from_proto(&TensorProto::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingRequiredField { field: "name", .. }
        ));
    }

    #[test]
    fn external_location_is_parsed() {
        let tensor = TensorProto {
            dims: vec![4],
            data_location: Some(DataLocation::External as i32),
            external_data: vec![crate::proto::StringStringEntryProto {
                key: Some("location".into()),
                value: Some("weights.bin".into()),
            }],
            ..named_tensor("ext", DataType::Float)
        };
        let converted = tensor_from_proto(&tensor).unwrap();
        assert_eq!(
            converted.external_data().map(|e| e.location.as_str()),
            Some("weights.bin")
        );
        assert!(converted.has_data());
    }

    #[test]
    fn attribute_type_tag_decides_payload() {
        let attr = AttributeProto {
            name: Some("mode".into()),
            r#type: Some(AttributeType::String as i32),
            s: Some(Bytes::from_static(b"constant")),
            floats: vec![1.0, 2.0],
            ..Default::default()
        };
        assert_eq!(
            attribute_value_from_proto(&attr).unwrap(),
            Some(AttributeValue::String("constant".into()))
        );
    }

    #[test]
    fn float_attribute_ignores_incidental_int() {
        let attr = AttributeProto {
            name: Some("alpha".into()),
            r#type: Some(AttributeType::Float as i32),
            f: Some(0.5),
            i: Some(3),
            ..Default::default()
        };
        assert_eq!(
            attribute_value_from_proto(&attr).unwrap(),
            Some(AttributeValue::Float(0.5))
        );
    }

    #[test]
    fn unrecognised_attribute_types_are_dropped() {
        for attr_type in [AttributeType::Graph as i32, 99, 0] {
            let attr = AttributeProto {
                name: Some("body".into()),
                r#type: Some(attr_type),
                ..Default::default()
            };
            assert_eq!(attribute_value_from_proto(&attr).unwrap(), None);
        }
    }

    #[test]
    fn type_variants_resolve_in_priority_order() {
        let both = TypeProto {
            tensor_type: Some(type_proto::Tensor {
                elem_type: Some(DataType::Float as i32),
                shape: None,
            }),
            opaque_type: Some(type_proto::Opaque {
                domain: Some("d".into()),
                name: Some("n".into()),
            }),
            ..Default::default()
        };
        assert_eq!(type_info_from_proto(Some(&both)).kind(), "tensor");

        let opaque_only = TypeProto {
            opaque_type: both.opaque_type.clone(),
            ..Default::default()
        };
        assert_eq!(
            type_info_from_proto(Some(&opaque_only)),
            TypeInfo::Opaque {
                domain: "d".into(),
                name: "n".into()
            }
        );

        assert_eq!(
            type_info_from_proto(Some(&TypeProto::default())),
            TypeInfo::undefined()
        );
        assert_eq!(type_info_from_proto(None), TypeInfo::undefined());
    }

    #[test]
    fn symbolic_and_missing_dims_become_dynamic() {
        let shape = TensorShapeProto {
            dim: vec![
                Dimension {
                    dim_param: Some("batch".into()),
                    ..Default::default()
                },
                Dimension {
                    dim_value: Some(3),
                    ..Default::default()
                },
                Dimension::default(),
                Dimension {
                    dim_value: Some(0),
                    ..Default::default()
                },
            ],
        };
        assert_eq!(shape_from_proto(&shape), vec![-1, 3, -1, 0]);
    }

    #[test]
    fn unnamed_node_gets_positional_id() {
        let node = NodeProto {
            op_type: Some("Relu".into()),
            ..Default::default()
        };
        let converted = node_from_proto(&node, 4).unwrap();
        assert_eq!(converted.id(), "node_4");
        assert_eq!(converted.name(), None);
        assert_eq!(converted.domain(), None);
    }

    #[test]
    fn node_without_op_type_names_its_index() {
        let err = node_from_proto(&NodeProto::default(), 2).unwrap_err();
        match err {
            Error::MissingRequiredField { field, context } => {
                assert_eq!(field, "op_type");
                assert_eq!(context, "NodeProto[2]");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
