//! Per-message decode routines built on [`WireReader`].
//!
//! Each message type implements [`WireMessage::merge_field`], dispatching on
//! the field number. Unrecognised field numbers are skipped by wire type so
//! newer schema revisions still decode. Nested messages read their own length
//! prefix and are bounded to exactly that byte range.

use prost::bytes::Bytes;

use crate::config::DEFAULT_RECURSION_LIMIT;
use crate::proto::{
    AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto,
    StringStringEntryProto, TensorProto, TensorShapeProto, TypeProto, ValueInfoProto,
    tensor_shape_proto::Dimension, type_proto,
};
use crate::wire::{Tag, WireError, WireReader, WireType};
use crate::{Error, Result};

/// Nesting-depth bookkeeping for one decode call
#[derive(Debug, Clone)]
pub struct DecodeContext {
    depth: u32,
    limit: u32,
}

impl DecodeContext {
    pub fn new(recursion_limit: u32) -> Self {
        DecodeContext {
            depth: 0,
            limit: recursion_limit,
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.limit {
            return Err(WireError::RecursionLimitExceeded { limit: self.limit }.into());
        }
        self.depth += 1;
        Ok(())
    }

    fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl Default for DecodeContext {
    fn default() -> Self {
        DecodeContext::new(DEFAULT_RECURSION_LIMIT)
    }
}

/// A message that can be decoded from the protobuf wire format
pub trait WireMessage: Default {
    /// Schema name, used in error context
    const NAME: &'static str;

    /// Consume the payload of one field identified by `tag`
    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()>;

    /// Decode a standalone buffer with no outer length prefix
    fn decode(buf: &[u8]) -> Result<Self> {
        Self::decode_with_limit(buf, DEFAULT_RECURSION_LIMIT)
    }

    fn decode_with_limit(buf: &[u8], recursion_limit: u32) -> Result<Self> {
        let mut reader = WireReader::new(buf);
        let mut ctx = DecodeContext::new(recursion_limit);
        let mut msg = Self::default();
        merge_until(&mut msg, &mut reader, buf.len(), &mut ctx)?;
        Ok(msg)
    }
}

/// Decode a complete model from a standalone buffer
pub fn decode_model(buf: &[u8]) -> Result<ModelProto> {
    ModelProto::decode(buf)
}

fn merge_until<M: WireMessage>(
    msg: &mut M,
    reader: &mut WireReader<'_>,
    end: usize,
    ctx: &mut DecodeContext,
) -> Result<()> {
    while reader.pos() < end {
        let tag = reader.read_tag()?;
        msg.merge_field(tag, reader, ctx)?;
    }
    if reader.pos() != end {
        return Err(WireError::LengthOverrun {
            offset: reader.pos(),
            end,
        }
        .into());
    }
    Ok(())
}

/// Merge a length-prefixed submessage into `msg`
fn merge_nested<M: WireMessage>(
    msg: &mut M,
    parent: &'static str,
    tag: Tag,
    reader: &mut WireReader<'_>,
    ctx: &mut DecodeContext,
) -> Result<()> {
    expect_wire_type(tag, WireType::LengthDelimited, parent)?;
    let len = reader.read_length()?;
    let end = reader.pos() + len;
    ctx.enter()?;
    merge_until(msg, reader, end, ctx)?;
    ctx.exit();
    Ok(())
}

fn push_nested<M: WireMessage>(
    items: &mut Vec<M>,
    parent: &'static str,
    tag: Tag,
    reader: &mut WireReader<'_>,
    ctx: &mut DecodeContext,
) -> Result<()> {
    let mut item = M::default();
    merge_nested(&mut item, parent, tag, reader, ctx)?;
    items.push(item);
    Ok(())
}

fn expect_wire_type(tag: Tag, expected: WireType, message: &'static str) -> Result<()> {
    if tag.wire_type != expected {
        return Err(WireError::UnexpectedWireType {
            message,
            field_number: tag.field_number,
            wire_type: tag.wire_type,
        }
        .into());
    }
    Ok(())
}

fn skip_unknown<M: WireMessage>(tag: Tag, reader: &mut WireReader<'_>) -> Result<()> {
    tracing::trace!(
        msg = M::NAME,
        field = tag.field_number,
        wire_type = ?tag.wire_type,
        "skipping unknown field"
    );
    reader.skip(tag.wire_type)?;
    Ok(())
}

fn read_string<M: WireMessage>(tag: Tag, reader: &mut WireReader<'_>) -> Result<String> {
    expect_wire_type(tag, WireType::LengthDelimited, M::NAME)?;
    let bytes = reader.read_length_delimited()?;
    Ok(std::str::from_utf8(bytes).map_err(Error::from)?.to_owned())
}

fn read_bytes<M: WireMessage>(tag: Tag, reader: &mut WireReader<'_>) -> Result<Bytes> {
    expect_wire_type(tag, WireType::LengthDelimited, M::NAME)?;
    Ok(Bytes::copy_from_slice(reader.read_length_delimited()?))
}

fn read_int64<M: WireMessage>(tag: Tag, reader: &mut WireReader<'_>) -> Result<i64> {
    expect_wire_type(tag, WireType::Varint, M::NAME)?;
    Ok(reader.read_int64()?)
}

fn read_int32<M: WireMessage>(tag: Tag, reader: &mut WireReader<'_>) -> Result<i32> {
    expect_wire_type(tag, WireType::Varint, M::NAME)?;
    Ok(reader.read_int32()?)
}

fn read_float<M: WireMessage>(tag: Tag, reader: &mut WireReader<'_>) -> Result<f32> {
    expect_wire_type(tag, WireType::Fixed32, M::NAME)?;
    Ok(reader.read_float()?)
}

/// Repeated scalar field in either unpacked (one value per tag) or packed
/// (one length-delimited run) form
fn merge_repeated<M, T>(
    values: &mut Vec<T>,
    tag: Tag,
    reader: &mut WireReader<'_>,
    element: WireType,
    read: impl Fn(&mut WireReader<'_>) -> std::result::Result<T, WireError>,
) -> Result<()>
where
    M: WireMessage,
{
    if tag.wire_type == element {
        values.push(read(reader)?);
        return Ok(());
    }
    expect_wire_type(tag, WireType::LengthDelimited, M::NAME)?;
    let mut packed = WireReader::new(reader.read_length_delimited()?);
    while !packed.is_at_end() {
        values.push(read(&mut packed)?);
    }
    Ok(())
}

impl WireMessage for ModelProto {
    const NAME: &'static str = "ModelProto";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => self.ir_version = Some(read_int64::<Self>(tag, reader)?),
            2 => self.producer_name = Some(read_string::<Self>(tag, reader)?),
            3 => self.producer_version = Some(read_string::<Self>(tag, reader)?),
            4 => self.domain = Some(read_string::<Self>(tag, reader)?),
            5 => self.model_version = Some(read_int64::<Self>(tag, reader)?),
            6 => self.doc_string = Some(read_string::<Self>(tag, reader)?),
            7 => {
                let graph = self.graph.get_or_insert_with(GraphProto::default);
                merge_nested(graph, Self::NAME, tag, reader, ctx)?
            }
            8 => push_nested(&mut self.opset_import, Self::NAME, tag, reader, ctx)?,
            14 => push_nested(&mut self.metadata_props, Self::NAME, tag, reader, ctx)?,
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for OperatorSetIdProto {
    const NAME: &'static str = "OperatorSetIdProto";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        _ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => self.domain = Some(read_string::<Self>(tag, reader)?),
            2 => self.version = Some(read_int64::<Self>(tag, reader)?),
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for StringStringEntryProto {
    const NAME: &'static str = "StringStringEntryProto";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        _ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => self.key = Some(read_string::<Self>(tag, reader)?),
            2 => self.value = Some(read_string::<Self>(tag, reader)?),
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for GraphProto {
    const NAME: &'static str = "GraphProto";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => push_nested(&mut self.node, Self::NAME, tag, reader, ctx)?,
            2 => self.name = Some(read_string::<Self>(tag, reader)?),
            5 => push_nested(&mut self.initializer, Self::NAME, tag, reader, ctx)?,
            10 => self.doc_string = Some(read_string::<Self>(tag, reader)?),
            11 => push_nested(&mut self.input, Self::NAME, tag, reader, ctx)?,
            12 => push_nested(&mut self.output, Self::NAME, tag, reader, ctx)?,
            13 => push_nested(&mut self.value_info, Self::NAME, tag, reader, ctx)?,
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for NodeProto {
    const NAME: &'static str = "NodeProto";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => self.input.push(read_string::<Self>(tag, reader)?),
            2 => self.output.push(read_string::<Self>(tag, reader)?),
            3 => self.name = Some(read_string::<Self>(tag, reader)?),
            4 => self.op_type = Some(read_string::<Self>(tag, reader)?),
            5 => push_nested(&mut self.attribute, Self::NAME, tag, reader, ctx)?,
            6 => self.doc_string = Some(read_string::<Self>(tag, reader)?),
            7 => self.domain = Some(read_string::<Self>(tag, reader)?),
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for TensorProto {
    const NAME: &'static str = "TensorProto";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => merge_repeated::<Self, _>(
                &mut self.dims,
                tag,
                reader,
                WireType::Varint,
                |r| r.read_int64(),
            )?,
            2 => self.data_type = Some(read_int32::<Self>(tag, reader)?),
            4 => merge_repeated::<Self, _>(
                &mut self.float_data,
                tag,
                reader,
                WireType::Fixed32,
                |r| r.read_float(),
            )?,
            5 => merge_repeated::<Self, _>(
                &mut self.int32_data,
                tag,
                reader,
                WireType::Varint,
                |r| r.read_int32(),
            )?,
            6 => self.string_data.push(read_bytes::<Self>(tag, reader)?),
            7 => merge_repeated::<Self, _>(
                &mut self.int64_data,
                tag,
                reader,
                WireType::Varint,
                |r| r.read_int64(),
            )?,
            8 => self.name = Some(read_string::<Self>(tag, reader)?),
            9 => self.raw_data = Some(read_bytes::<Self>(tag, reader)?),
            10 => merge_repeated::<Self, _>(
                &mut self.double_data,
                tag,
                reader,
                WireType::Fixed64,
                |r| r.read_double(),
            )?,
            11 => merge_repeated::<Self, _>(
                &mut self.uint64_data,
                tag,
                reader,
                WireType::Varint,
                |r| r.read_uint64(),
            )?,
            12 => self.doc_string = Some(read_string::<Self>(tag, reader)?),
            13 => push_nested(&mut self.external_data, Self::NAME, tag, reader, ctx)?,
            14 => self.data_location = Some(read_int32::<Self>(tag, reader)?),
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for ValueInfoProto {
    const NAME: &'static str = "ValueInfoProto";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => self.name = Some(read_string::<Self>(tag, reader)?),
            2 => {
                let ty = self.r#type.get_or_insert_with(TypeProto::default);
                merge_nested(ty, Self::NAME, tag, reader, ctx)?
            }
            3 => self.doc_string = Some(read_string::<Self>(tag, reader)?),
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for TypeProto {
    const NAME: &'static str = "TypeProto";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => {
                let tensor = self.tensor_type.get_or_insert_with(Default::default);
                merge_nested(tensor, Self::NAME, tag, reader, ctx)?
            }
            4 => {
                let sequence = self.sequence_type.get_or_insert_with(Default::default);
                merge_nested(&mut **sequence, Self::NAME, tag, reader, ctx)?
            }
            5 => {
                let map = self.map_type.get_or_insert_with(Default::default);
                merge_nested(&mut **map, Self::NAME, tag, reader, ctx)?
            }
            6 => self.denotation = Some(read_string::<Self>(tag, reader)?),
            7 => {
                let opaque = self.opaque_type.get_or_insert_with(Default::default);
                merge_nested(opaque, Self::NAME, tag, reader, ctx)?
            }
            8 => {
                let sparse = self.sparse_tensor_type.get_or_insert_with(Default::default);
                merge_nested(sparse, Self::NAME, tag, reader, ctx)?
            }
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for type_proto::Tensor {
    const NAME: &'static str = "TypeProto.Tensor";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => self.elem_type = Some(read_int32::<Self>(tag, reader)?),
            2 => {
                let shape = self.shape.get_or_insert_with(TensorShapeProto::default);
                merge_nested(shape, Self::NAME, tag, reader, ctx)?
            }
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for type_proto::SparseTensor {
    const NAME: &'static str = "TypeProto.SparseTensor";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => self.elem_type = Some(read_int32::<Self>(tag, reader)?),
            2 => {
                let shape = self.shape.get_or_insert_with(TensorShapeProto::default);
                merge_nested(shape, Self::NAME, tag, reader, ctx)?
            }
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for type_proto::Sequence {
    const NAME: &'static str = "TypeProto.Sequence";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => {
                let elem = self.elem_type.get_or_insert_with(Default::default);
                merge_nested(&mut **elem, Self::NAME, tag, reader, ctx)?
            }
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for type_proto::Map {
    const NAME: &'static str = "TypeProto.Map";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => self.key_type = Some(read_int32::<Self>(tag, reader)?),
            2 => {
                let value = self.value_type.get_or_insert_with(Default::default);
                merge_nested(&mut **value, Self::NAME, tag, reader, ctx)?
            }
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for type_proto::Opaque {
    const NAME: &'static str = "TypeProto.Opaque";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        _ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => self.domain = Some(read_string::<Self>(tag, reader)?),
            2 => self.name = Some(read_string::<Self>(tag, reader)?),
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for TensorShapeProto {
    const NAME: &'static str = "TensorShapeProto";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => push_nested(&mut self.dim, Self::NAME, tag, reader, ctx)?,
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for Dimension {
    const NAME: &'static str = "TensorShapeProto.Dimension";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        _ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            // dim_value and dim_param share a oneof; the later one wins
            1 => {
                self.dim_value = Some(read_int64::<Self>(tag, reader)?);
                self.dim_param = None;
            }
            2 => {
                self.dim_param = Some(read_string::<Self>(tag, reader)?);
                self.dim_value = None;
            }
            3 => self.denotation = Some(read_string::<Self>(tag, reader)?),
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}

impl WireMessage for AttributeProto {
    const NAME: &'static str = "AttributeProto";

    fn merge_field(
        &mut self,
        tag: Tag,
        reader: &mut WireReader<'_>,
        ctx: &mut DecodeContext,
    ) -> Result<()> {
        match tag.field_number {
            1 => self.name = Some(read_string::<Self>(tag, reader)?),
            2 => self.f = Some(read_float::<Self>(tag, reader)?),
            3 => self.i = Some(read_int64::<Self>(tag, reader)?),
            4 => self.s = Some(read_bytes::<Self>(tag, reader)?),
            5 => {
                let tensor = self.t.get_or_insert_with(Default::default);
                merge_nested(&mut **tensor, Self::NAME, tag, reader, ctx)?
            }
            7 => merge_repeated::<Self, _>(
                &mut self.floats,
                tag,
                reader,
                WireType::Fixed32,
                |r| r.read_float(),
            )?,
            8 => merge_repeated::<Self, _>(
                &mut self.ints,
                tag,
                reader,
                WireType::Varint,
                |r| r.read_int64(),
            )?,
            9 => self.strings.push(read_bytes::<Self>(tag, reader)?),
            10 => push_nested(&mut self.tensors, Self::NAME, tag, reader, ctx)?,
            13 => self.doc_string = Some(read_string::<Self>(tag, reader)?),
            20 => self.r#type = Some(read_int32::<Self>(tag, reader)?),
            21 => self.ref_attr_name = Some(read_string::<Self>(tag, reader)?),
            _ => skip_unknown::<Self>(tag, reader)?,
        }
        Ok(())
    }
}
