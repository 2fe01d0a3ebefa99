//! Channel type table: wire type names, element descriptors and typed values.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::error::{ChannelError, EncodeError};

/// Broad class of an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementClass {
    Signed,
    Unsigned,
    Float,
    /// Opaque bytes (text channels).
    Bytes,
}

/// Primitive element type of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    /// UTF-8 text carried as a byte array.
    String,
}

impl ElementKind {
    /// Size of one element in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 | Self::String => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    pub const fn class(self) -> ElementClass {
        match self {
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 => ElementClass::Signed,
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64 => ElementClass::Unsigned,
            Self::Float32 | Self::Float64 => ElementClass::Float,
            Self::String => ElementClass::Bytes,
        }
    }

    /// Canonical type name written into data headers.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
        }
    }

    /// Look up a type name (case-insensitive, legacy aliases included).
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.trim().to_ascii_lowercase().as_str() {
            "int8" => Self::Int8,
            "uint8" => Self::UInt8,
            "int16" | "short" => Self::Int16,
            "uint16" | "ushort" => Self::UInt16,
            "int32" | "integer" | "long" | "ulong" => Self::Int32,
            "uint32" => Self::UInt32,
            "int64" => Self::Int64,
            "uint64" => Self::UInt64,
            "float32" | "float" => Self::Float32,
            "float64" | "double" => Self::Float64,
            "string" => Self::String,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte order of a channel's value and timestamp frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Interpret a data header `encoding` field. Anything but `big` is little-endian.
    pub fn from_encoding(encoding: Option<&str>) -> Self {
        match encoding {
            Some(value) if value.trim().eq_ignore_ascii_case("big") => Self::Big,
            _ => Self::Little,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
        }
    }

    /// Byte order of the host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }
}

/// Element type plus byte order: everything needed to (re)interpret raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor {
    pub kind: ElementKind,
    pub order: ByteOrder,
}

impl Descriptor {
    pub const fn new(kind: ElementKind, order: ByteOrder) -> Self {
        Self { kind, order }
    }

    pub const fn width(&self) -> usize {
        self.kind.width()
    }
}

/// Rust primitives that can be stored in an [`Array`].
pub trait Element: Copy + Send + 'static {
    const KIND: ElementKind;

    fn into_array_data(values: Vec<Self>) -> ArrayData;

    fn into_scalar(self) -> Scalar;
}

macro_rules! numeric_types {
    ($( $variant:ident($ty:ty) => $get_be:ident, $get_le:ident, $put_be:ident, $put_le:ident; )*) => {
        /// A single typed numeric element.
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum Scalar {
            $( $variant($ty), )*
        }

        /// Dense row-major element storage of an [`Array`].
        #[derive(Debug, Clone, PartialEq)]
        pub enum ArrayData {
            $( $variant(Vec<$ty>), )*
        }

        impl Scalar {
            pub fn kind(&self) -> ElementKind {
                match self {
                    $( Scalar::$variant(_) => ElementKind::$variant, )*
                }
            }

            /// Lossy conversion for display and quick inspection.
            pub fn as_f64(&self) -> f64 {
                match self {
                    $( Scalar::$variant(v) => *v as f64, )*
                }
            }

            fn write(&self, order: ByteOrder, dst: &mut BytesMut) {
                match self {
                    $( Scalar::$variant(v) => match order {
                        ByteOrder::Big => dst.$put_be(*v),
                        ByteOrder::Little => dst.$put_le(*v),
                    }, )*
                }
            }
        }

        impl fmt::Display for Scalar {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( Scalar::$variant(v) => write!(f, "{v}"), )*
                }
            }
        }

        impl ArrayData {
            pub fn kind(&self) -> ElementKind {
                match self {
                    $( ArrayData::$variant(_) => ElementKind::$variant, )*
                }
            }

            pub fn len(&self) -> usize {
                match self {
                    $( ArrayData::$variant(values) => values.len(), )*
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Element at a flat row-major index.
            pub fn get(&self, index: usize) -> Option<Scalar> {
                match self {
                    $( ArrayData::$variant(values) => values.get(index).copied().map(Scalar::$variant), )*
                }
            }

            fn write(&self, order: ByteOrder, dst: &mut BytesMut) {
                match self {
                    $( ArrayData::$variant(values) => {
                        dst.reserve(values.len() * ElementKind::$variant.width());
                        for v in values {
                            match order {
                                ByteOrder::Big => dst.$put_be(*v),
                                ByteOrder::Little => dst.$put_le(*v),
                            }
                        }
                    } )*
                }
            }

            /// Read whole elements from `raw`. Returns `None` for non-numeric kinds.
            fn read(kind: ElementKind, mut raw: &[u8], order: ByteOrder) -> Option<Self> {
                let count = raw.len() / kind.width();
                match kind {
                    $( ElementKind::$variant => {
                        let mut values: Vec<$ty> = Vec::with_capacity(count);
                        for _ in 0..count {
                            values.push(match order {
                                ByteOrder::Big => raw.$get_be(),
                                ByteOrder::Little => raw.$get_le(),
                            });
                        }
                        Some(ArrayData::$variant(values))
                    } )*
                    ElementKind::String => None,
                }
            }
        }

        $(
            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$variant;

                fn into_array_data(values: Vec<Self>) -> ArrayData {
                    ArrayData::$variant(values)
                }

                fn into_scalar(self) -> Scalar {
                    Scalar::$variant(self)
                }
            }
        )*
    };
}

numeric_types! {
    Int8(i8) => get_i8, get_i8, put_i8, put_i8;
    UInt8(u8) => get_u8, get_u8, put_u8, put_u8;
    Int16(i16) => get_i16, get_i16_le, put_i16, put_i16_le;
    UInt16(u16) => get_u16, get_u16_le, put_u16, put_u16_le;
    Int32(i32) => get_i32, get_i32_le, put_i32, put_i32_le;
    UInt32(u32) => get_u32, get_u32_le, put_u32, put_u32_le;
    Int64(i64) => get_i64, get_i64_le, put_i64, put_i64_le;
    UInt64(u64) => get_u64, get_u64_le, put_u64, put_u64_le;
    Float32(f32) => get_f32, get_f32_le, put_f32, put_f32_le;
    Float64(f64) => get_f64, get_f64_le, put_f64, put_f64_le;
}

/// Homogeneous n-dimensional array.
///
/// `shape` is slowest-dimension-first (row-major); the data header records
/// it reversed, fastest-dimension-first.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    shape: Vec<usize>,
    data: ArrayData,
}

impl Array {
    /// Build an array, checking that `shape` covers exactly the stored elements.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self, EncodeError> {
        let expected = element_count(&shape);
        if expected != data.len() {
            return Err(EncodeError::ShapeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// One-dimensional array.
    pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
        Self {
            shape: vec![values.len()],
            data: T::into_array_data(values),
        }
    }

    /// Two-dimensional array from equally long rows.
    pub fn from_rows<T: Element>(rows: Vec<Vec<T>>) -> Result<Self, EncodeError> {
        let row_count = rows.len();
        let columns = rows.first().map_or(0, Vec::len);
        let mut flat = Vec::with_capacity(row_count * columns);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != columns {
                return Err(EncodeError::RaggedArray {
                    row,
                    expected: columns,
                    actual: values.len(),
                });
            }
            flat.extend(values);
        }
        Ok(Self {
            shape: vec![row_count, columns],
            data: T::into_array_data(flat),
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_parts(self) -> (Vec<usize>, ArrayData) {
        (self.shape, self.data)
    }
}

/// A present channel value.
///
/// Absence ("no value this pulse") is expressed as `Option<Data>::None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Scalar(Scalar),
    Array(Array),
    Text(String),
}

impl Data {
    pub fn kind(&self) -> ElementKind {
        match self {
            Data::Scalar(scalar) => scalar.kind(),
            Data::Array(array) => array.kind(),
            Data::Text(_) => ElementKind::String,
        }
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Data::Scalar(scalar) => Some(*scalar),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Data::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Data::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<i64> for Data {
    fn from(value: i64) -> Self {
        Data::Scalar(Scalar::Int64(value))
    }
}

impl From<f64> for Data {
    fn from(value: f64) -> Self {
        Data::Scalar(Scalar::Float64(value))
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::Text(value.to_string())
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::Text(value)
    }
}

impl From<Scalar> for Data {
    fn from(value: Scalar) -> Self {
        Data::Scalar(value)
    }
}

impl From<Array> for Data {
    fn from(value: Array) -> Self {
        Data::Array(value)
    }
}

impl<T: Element> From<Vec<T>> for Data {
    fn from(values: Vec<T>) -> Self {
        Data::Array(Array::from_vec(values))
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Scalar(scalar) => write!(f, "{scalar}"),
            Data::Text(text) => f.write_str(text),
            Data::Array(array) => {
                write!(f, "{}{:?} [", array.kind(), array.shape())?;
                let shown = array.len().min(4);
                for index in 0..shown {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(value) = array.data().get(index) {
                        write!(f, "{value}")?;
                    }
                }
                if array.len() > shown {
                    f.write_str(", ...")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// How a value is declared in the data header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeTarget {
    pub kind: ElementKind,
    pub type_name: &'static str,
    /// Fastest-dimension-first.
    pub shape: Vec<usize>,
}

/// Resolve a data header type name.
///
/// A missing name means `float64`. An unknown name yields `None`: such a
/// channel is still consumed from the wire but always decodes to an absent value.
pub fn resolve_for_decode(type_name: Option<&str>) -> Option<ElementKind> {
    match type_name {
        None => {
            warn!("channel type missing, decoding as float64");
            Some(ElementKind::Float64)
        }
        Some(name) => {
            let kind = ElementKind::from_name(name);
            if kind.is_none() {
                warn!(type_name = name, "unsupported channel type, values will be absent");
            }
            kind
        }
    }
}

/// Infer the declared type and shape of a value.
///
/// Scalars and text are declared with shape `[1]`; arrays record their shape
/// reversed. Zero-length arrays resolve normally.
pub fn resolve_for_encode(data: &Data) -> EncodeTarget {
    let kind = data.kind();
    let shape = match data {
        Data::Scalar(_) | Data::Text(_) => vec![1],
        Data::Array(array) => array.shape().iter().rev().copied().collect(),
    };
    EncodeTarget {
        kind,
        type_name: kind.name(),
        shape,
    }
}

/// True when a declared shape denotes a single value.
pub fn is_scalar_shape(shape: Option<&[usize]>) -> bool {
    matches!(shape, None | Some([]) | Some([1]))
}

/// Serialize a value's elements in the requested byte order.
pub(crate) fn to_element_bytes(data: &Data, order: ByteOrder) -> Bytes {
    match data {
        Data::Scalar(scalar) => {
            let mut dst = BytesMut::with_capacity(scalar.kind().width());
            scalar.write(order, &mut dst);
            dst.freeze()
        }
        Data::Array(array) => {
            let mut dst = BytesMut::new();
            array.data().write(order, &mut dst);
            dst.freeze()
        }
        Data::Text(text) => Bytes::copy_from_slice(text.as_bytes()),
    }
}

/// Elements covered by `shape`, saturating at `usize::MAX` so a hostile
/// declared shape can never match a real payload.
fn element_count(shape: &[usize]) -> usize {
    shape.iter().fold(1usize, |acc, &dim| acc.saturating_mul(dim))
}

/// Reinterpret raw element bytes according to a descriptor and declared shape.
///
/// Returns `Ok(None)` for an empty buffer with scalar intent.
pub(crate) fn from_element_bytes(
    raw: &[u8],
    descriptor: Descriptor,
    shape: Option<&[usize]>,
) -> Result<Option<Data>, ChannelError> {
    let width = descriptor.width();
    if raw.len() % width != 0 {
        return Err(ChannelError::Length {
            len: raw.len(),
            width,
        });
    }

    let count = raw.len() / width;
    let scalar = is_scalar_shape(shape);
    if count == 0 && scalar {
        return Ok(None);
    }

    let Some(values) = ArrayData::read(descriptor.kind, raw, descriptor.order) else {
        return Ok(Some(Data::Text(String::from_utf8(raw.to_vec())?)));
    };

    if scalar {
        if count == 1 {
            return Ok(values.get(0).map(Data::Scalar));
        }
        return Ok(Some(Data::Array(Array {
            shape: vec![count],
            data: values,
        })));
    }

    let declared = shape.unwrap_or_default();
    let dims: Vec<usize> = declared.iter().rev().copied().collect();
    let expected = element_count(&dims);
    if expected != count {
        return Err(ChannelError::Shape {
            shape: declared.to_vec(),
            expected,
            actual: count,
        });
    }

    Ok(Some(Data::Array(Array {
        shape: dims,
        data: values,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_resolve_case_insensitively() {
        assert_eq!(ElementKind::from_name("UInt16"), Some(ElementKind::UInt16));
        assert_eq!(ElementKind::from_name("FLOAT64"), Some(ElementKind::Float64));
        assert_eq!(ElementKind::from_name("double"), Some(ElementKind::Float64));
        assert_eq!(ElementKind::from_name("integer"), Some(ElementKind::Int32));
        assert_eq!(ElementKind::from_name("long"), Some(ElementKind::Int32));
        assert_eq!(ElementKind::from_name("ulong"), Some(ElementKind::Int32));
        assert_eq!(ElementKind::from_name("complex128"), None);
    }

    #[test]
    fn only_missing_types_default_to_float64() {
        assert_eq!(resolve_for_decode(None), Some(ElementKind::Float64));
        assert_eq!(resolve_for_decode(Some("complex64")), None);
        assert_eq!(resolve_for_decode(Some("uint8")), Some(ElementKind::UInt8));
    }

    #[test]
    fn widths_and_classes() {
        assert_eq!(ElementKind::Int8.width(), 1);
        assert_eq!(ElementKind::UInt16.width(), 2);
        assert_eq!(ElementKind::Float32.width(), 4);
        assert_eq!(ElementKind::UInt64.width(), 8);
        assert_eq!(ElementKind::String.class(), ElementClass::Bytes);
        assert_eq!(ElementKind::Float32.class(), ElementClass::Float);
        assert_eq!(ElementKind::UInt32.class(), ElementClass::Unsigned);
    }

    #[test]
    fn untyped_scalars_promote_to_eight_bytes() {
        let target = resolve_for_encode(&Data::from(7i64));
        assert_eq!(target.kind, ElementKind::Int64);
        assert_eq!(target.shape, vec![1]);

        let target = resolve_for_encode(&Data::from(1.5f64));
        assert_eq!(target.type_name, "float64");
    }

    #[test]
    fn text_resolves_to_byte_channel() {
        let target = resolve_for_encode(&Data::from("hello"));
        assert_eq!(target.kind, ElementKind::String);
        assert_eq!(target.type_name, "string");
        assert_eq!(target.shape, vec![1]);
    }

    #[test]
    fn array_shape_is_recorded_fastest_first() {
        let array = Array::from_rows(vec![vec![1i32, 2, 3], vec![4, 5, 6]]).unwrap();
        assert_eq!(array.shape(), &[2, 3]);
        let target = resolve_for_encode(&Data::Array(array));
        assert_eq!(target.shape, vec![3, 2]);
        assert_eq!(target.kind, ElementKind::Int32);
    }

    #[test]
    fn zero_length_array_resolves() {
        let target = resolve_for_encode(&Data::from(Vec::<u16>::new()));
        assert_eq!(target.kind, ElementKind::UInt16);
        assert_eq!(target.shape, vec![0]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Array::from_rows(vec![vec![1u8, 2], vec![3]]).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::RaggedArray {
                row: 1,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn array_new_checks_element_count() {
        let err = Array::new(vec![2, 2], ArrayData::Int8(vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, EncodeError::ShapeMismatch { expected: 4, .. }));
    }

    #[test]
    fn big_endian_bytes_decode_on_any_host() {
        let raw = [0x00, 0x00, 0x01, 0x02];
        let descriptor = Descriptor::new(ElementKind::UInt32, ByteOrder::Big);
        let value = from_element_bytes(&raw, descriptor, None).unwrap();
        assert_eq!(value, Some(Data::Scalar(Scalar::UInt32(0x0102))));

        let descriptor = Descriptor::new(ElementKind::UInt32, ByteOrder::Little);
        let value = from_element_bytes(&raw, descriptor, None).unwrap();
        assert_eq!(value, Some(Data::Scalar(Scalar::UInt32(0x0201_0000))));
    }

    #[test]
    fn element_bytes_follow_byte_order() {
        let data = Data::Scalar(Scalar::Int16(0x0102));
        assert_eq!(to_element_bytes(&data, ByteOrder::Big).as_ref(), &[0x01, 0x02]);
        assert_eq!(to_element_bytes(&data, ByteOrder::Little).as_ref(), &[0x02, 0x01]);
    }

    #[test]
    fn declared_shape_is_reversed_on_decode() {
        let array = Array::from_rows(vec![vec![1.0f32, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let data = Data::Array(array.clone());
        let raw = to_element_bytes(&data, ByteOrder::Little);
        let descriptor = Descriptor::new(ElementKind::Float32, ByteOrder::Little);
        let decoded = from_element_bytes(&raw, descriptor, Some(&[3, 2])).unwrap();
        assert_eq!(decoded, Some(Data::Array(array)));
    }

    #[test]
    fn length_not_multiple_of_width_fails() {
        let descriptor = Descriptor::new(ElementKind::Int32, ByteOrder::Little);
        let err = from_element_bytes(&[1, 2, 3], descriptor, None).unwrap_err();
        assert!(matches!(err, ChannelError::Length { len: 3, width: 4 }));
    }

    #[test]
    fn shape_mismatch_fails() {
        let descriptor = Descriptor::new(ElementKind::UInt8, ByteOrder::Little);
        let err = from_element_bytes(&[1, 2, 3, 4, 5], descriptor, Some(&[2, 2])).unwrap_err();
        assert!(matches!(err, ChannelError::Shape { expected: 4, actual: 5, .. }));
    }

    #[test]
    fn oversized_declared_shape_is_a_mismatch() {
        let huge = usize::MAX / 2 + 1;
        let descriptor = Descriptor::new(ElementKind::UInt8, ByteOrder::Little);
        let err = from_element_bytes(&[0; 8], descriptor, Some(&[huge, huge, 2])).unwrap_err();
        assert!(matches!(err, ChannelError::Shape { expected: usize::MAX, actual: 8, .. }));
        assert!(Array::new(vec![huge, 4], ArrayData::UInt8(vec![0; 4])).is_err());
        assert!(Array::new(vec![huge, huge, 0], ArrayData::UInt8(vec![])).is_ok());
    }

    #[test]
    fn empty_buffer_with_scalar_intent_is_absent() {
        let descriptor = Descriptor::new(ElementKind::Float64, ByteOrder::Little);
        assert_eq!(from_element_bytes(&[], descriptor, Some(&[1])).unwrap(), None);
        assert_eq!(from_element_bytes(&[], descriptor, None).unwrap(), None);

        let empty = from_element_bytes(&[], descriptor, Some(&[0])).unwrap();
        assert_eq!(
            empty,
            Some(Data::Array(Array::new(vec![0], ArrayData::Float64(vec![])).unwrap()))
        );
    }

    #[test]
    fn multiple_elements_without_shape_become_vector() {
        let descriptor = Descriptor::new(ElementKind::UInt8, ByteOrder::Little);
        let decoded = from_element_bytes(&[1, 2, 3], descriptor, None).unwrap();
        assert_eq!(decoded, Some(Data::from(vec![1u8, 2, 3])));
    }

    #[test]
    fn invalid_utf8_text_fails() {
        let descriptor = Descriptor::new(ElementKind::String, ByteOrder::Little);
        let err = from_element_bytes(&[0xff, 0xfe], descriptor, Some(&[1])).unwrap_err();
        assert!(matches!(err, ChannelError::InvalidUtf8(_)));
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(Data::from(3i64).to_string(), "3");
        assert_eq!(Data::from("abc").to_string(), "abc");
        assert_eq!(
            Data::from(vec![1u8, 2, 3, 4, 5]).to_string(),
            "uint8[5] [1, 2, 3, 4, ...]"
        );
    }

    #[test]
    fn encoding_field_parses_leniently() {
        assert_eq!(ByteOrder::from_encoding(Some("big")), ByteOrder::Big);
        assert_eq!(ByteOrder::from_encoding(Some("BIG")), ByteOrder::Big);
        assert_eq!(ByteOrder::from_encoding(Some("little")), ByteOrder::Little);
        assert_eq!(ByteOrder::from_encoding(None), ByteOrder::Little);
    }
}
