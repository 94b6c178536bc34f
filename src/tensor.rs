use prost::bytes::Bytes;

use crate::external_data::ExternalDataRef;
use crate::{DataType, Error, Result};

/// A named tensor with its payload laid out as little-endian bytes
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    name: String,
    data_type: DataType,
    shape: Vec<i64>,
    data: Bytes,
    raw_data: Option<Bytes>,
    doc_string: Option<String>,
    external_data: Option<ExternalDataRef>,
}

impl Tensor {
    pub(crate) fn new(name: String, data_type: DataType, shape: Vec<i64>, data: Bytes) -> Self {
        Tensor {
            name,
            data_type,
            shape,
            data,
            raw_data: None,
            doc_string: None,
            external_data: None,
        }
    }

    pub(crate) fn with_raw_data(mut self, raw_data: Option<Bytes>) -> Self {
        self.raw_data = raw_data;
        self
    }

    pub(crate) fn with_doc_string(mut self, doc_string: Option<String>) -> Self {
        self.doc_string = doc_string;
        self
    }

    pub(crate) fn with_external_data(mut self, external_data: Option<ExternalDataRef>) -> Self {
        self.external_data = external_data;
        self
    }

    /// Tensor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tensor data type
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Tensor shape dimensions
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// Element bytes. STRING tensors hold their entries joined by `\0`.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// The `raw_data` field exactly as it appeared on the wire, if it did
    pub fn raw_data(&self) -> Option<&Bytes> {
        self.raw_data.as_ref()
    }

    pub fn doc_string(&self) -> Option<&str> {
        self.doc_string.as_deref()
    }

    /// Location of the payload when it is stored outside the model
    pub fn external_data(&self) -> Option<&ExternalDataRef> {
        self.external_data.as_ref()
    }

    /// True when the tensor carries a payload inline or points at one
    pub fn has_data(&self) -> bool {
        !self.data.is_empty() || self.external_data.is_some()
    }

    /// Product of the shape, `None` when a dimension is dynamic
    ///
    /// A scalar (empty shape) has one element.
    pub fn element_count(&self) -> Option<usize> {
        self.shape.iter().try_fold(1usize, |acc, &dim| {
            let dim = usize::try_from(dim).ok()?;
            acc.checked_mul(dim)
        })
    }

    /// Byte length implied by data type and shape, `None` for STRING,
    /// UNDEFINED or dynamic shapes
    pub fn expected_byte_len(&self) -> Option<usize> {
        self.data_type
            .size_in_bytes()?
            .checked_mul(self.element_count()?)
    }

    /// Decode the payload into a vector of `T`
    ///
    /// `T` must be a storage type of the tensor's data type (for example
    /// `u16` for FLOAT16, `u8` for BOOL) and the payload length must be a
    /// multiple of its size.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if !T::DATA_TYPES.contains(&self.data_type) {
            return Err(Error::type_conversion(
                self.data_type.name(),
                std::any::type_name::<T>(),
                format!("tensor '{}'", self.name),
            ));
        }
        if self.data.len() % T::SIZE != 0 {
            return Err(Error::type_conversion(
                "bytes",
                std::any::type_name::<T>(),
                format!(
                    "data size {} of tensor '{}' not aligned to {}",
                    self.data.len(),
                    self.name,
                    T::SIZE
                ),
            ));
        }
        Ok(self.data.chunks_exact(T::SIZE).map(T::from_le_slice).collect())
    }

    /// Entries of a STRING tensor
    ///
    /// An empty payload is one empty entry when the shape holds exactly one
    /// element, and no entries otherwise.
    pub fn strings(&self) -> Result<Vec<String>> {
        if self.data_type != DataType::String {
            return Err(Error::type_conversion(
                self.data_type.name(),
                "STRING",
                format!("tensor '{}'", self.name),
            ));
        }
        if self.data.is_empty() {
            return Ok(match self.element_count() {
                Some(1) => vec![String::new()],
                _ => Vec::new(),
            });
        }
        Ok(std::str::from_utf8(&self.data)?
            .split('\0')
            .map(str::to_owned)
            .collect())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width element types a tensor payload can be decoded into
pub trait Element: sealed::Sealed + Copy {
    const SIZE: usize;
    /// Tensor data types whose payload is stored as this type
    const DATA_TYPES: &'static [DataType];

    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! element {
    ($ty:ty, [$($dt:ident),+]) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();
            const DATA_TYPES: &'static [DataType] = &[$(DataType::$dt),+];

            #[inline]
            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut le = [0u8; std::mem::size_of::<$ty>()];
                le.copy_from_slice(bytes);
                <$ty>::from_le_bytes(le)
            }
        }
    };
}

element!(f32, [Float, Complex64]);
element!(f64, [Double, Complex128]);
element!(i8, [Int8]);
element!(u8, [Uint8, Bool]);
element!(i16, [Int16]);
element!(u16, [Uint16, Float16, Bfloat16]);
element!(i32, [Int32]);
element!(u32, [Uint32]);
element!(i64, [Int64]);
element!(u64, [Uint64]);
