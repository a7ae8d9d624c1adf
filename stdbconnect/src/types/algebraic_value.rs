use crate::types::AlgebraicType;
use crate::{StdbError, StdbResult};

macro_rules! as_primitive {
    ($fn_name:ident, $variant:ident, $target:ty) => {
        /// Returns the contained primitive, if the carrier matches.
        pub fn $fn_name(&self) -> Option<$target> {
            match self {
                Self::$variant(v) => Some(*v),
                _ => None,
            }
        }
    };
}

/// The runtime counterpart of an [`AlgebraicType`].
///
/// A value's active case matches its type's active case exactly, at every
/// level. 256-bit integers are carried as 32 raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum AlgebraicValue {
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    U128(u128),
    I128(i128),
    U256([u8; 32]),
    I256([u8; 32]),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<AlgebraicValue>),
    Option(Option<Box<AlgebraicValue>>),
    Product(Vec<Field>),
    Sum {
        tag: u8,
        value: Box<AlgebraicValue>,
    },
}

impl AlgebraicValue {
    /// A short static name for diagnostics, matching
    /// [`AlgebraicType::kind_name`].
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::I8(_) => "i8",
            Self::U16(_) => "u16",
            Self::I16(_) => "i16",
            Self::U32(_) => "u32",
            Self::I32(_) => "i32",
            Self::U64(_) => "u64",
            Self::I64(_) => "i64",
            Self::U128(_) => "u128",
            Self::I128(_) => "i128",
            Self::U256(_) => "u256",
            Self::I256(_) => "i256",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
            Self::Option(_) => "option",
            Self::Product(_) => "product",
            Self::Sum { .. } => "sum",
        }
    }

    fn mismatch(&self, expected: &AlgebraicType) -> StdbError {
        StdbError::TypeMismatch {
            expected: expected.kind_name(),
            found: self.kind_name(),
        }
    }

    /// Checks that the value's carrier matches `ty` at this level.
    pub(crate) fn check_against(&self, ty: &AlgebraicType) -> StdbResult<()> {
        let matches = matches!(
            (self, ty),
            (Self::Bool(_), AlgebraicType::Bool)
                | (Self::U8(_), AlgebraicType::U8)
                | (Self::I8(_), AlgebraicType::I8)
                | (Self::U16(_), AlgebraicType::U16)
                | (Self::I16(_), AlgebraicType::I16)
                | (Self::U32(_), AlgebraicType::U32)
                | (Self::I32(_), AlgebraicType::I32)
                | (Self::U64(_), AlgebraicType::U64)
                | (Self::I64(_), AlgebraicType::I64)
                | (Self::U128(_), AlgebraicType::U128)
                | (Self::I128(_), AlgebraicType::I128)
                | (Self::U256(_), AlgebraicType::U256)
                | (Self::I256(_), AlgebraicType::I256)
                | (Self::F32(_), AlgebraicType::F32)
                | (Self::F64(_), AlgebraicType::F64)
                | (Self::String(_), AlgebraicType::String)
                | (Self::Bytes(_), AlgebraicType::Bytes)
                | (Self::Array(_), AlgebraicType::Array(_))
                | (Self::Option(_), AlgebraicType::Option(_))
                | (Self::Product(_), AlgebraicType::Product(_))
                | (Self::Sum { .. }, AlgebraicType::Sum(_))
        );
        if matches {
            Ok(())
        } else {
            Err(self.mismatch(ty))
        }
    }

    /// Returns the contained string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the contained bytes, if this is a bytes value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the contained elements, if this is an array value.
    pub fn as_array(&self) -> Option<&[AlgebraicValue]> {
        match self {
            Self::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// Returns the inner value or `None`-of-`None`, if this is an option.
    #[allow(clippy::option_option)]
    pub fn as_option(&self) -> Option<Option<&AlgebraicValue>> {
        match self {
            Self::Option(inner) => Some(inner.as_deref()),
            _ => None,
        }
    }

    /// Returns the contained product fields, if this is a product value.
    pub fn as_product(&self) -> Option<&[Field]> {
        match self {
            Self::Product(fields) => Some(fields),
            _ => None,
        }
    }

    as_primitive!(as_bool, Bool, bool);
    as_primitive!(as_u8, U8, u8);
    as_primitive!(as_i8, I8, i8);
    as_primitive!(as_u16, U16, u16);
    as_primitive!(as_i16, I16, i16);
    as_primitive!(as_u32, U32, u32);
    as_primitive!(as_i32, I32, i32);
    as_primitive!(as_u64, U64, u64);
    as_primitive!(as_i64, I64, i64);
    as_primitive!(as_u128, U128, u128);
    as_primitive!(as_i128, I128, i128);
    as_primitive!(as_f32, F32, f32);
    as_primitive!(as_f64, F64, f64);
    as_primitive!(as_u256, U256, [u8; 32]);
    as_primitive!(as_i256, I256, [u8; 32]);
}

impl std::fmt::Display for AlgebraicValue {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(fmt, "{v}"),
            Self::U8(v) => write!(fmt, "{v}"),
            Self::I8(v) => write!(fmt, "{v}"),
            Self::U16(v) => write!(fmt, "{v}"),
            Self::I16(v) => write!(fmt, "{v}"),
            Self::U32(v) => write!(fmt, "{v}"),
            Self::I32(v) => write!(fmt, "{v}"),
            Self::U64(v) => write!(fmt, "{v}"),
            Self::I64(v) => write!(fmt, "{v}"),
            Self::U128(v) => write!(fmt, "{v}"),
            Self::I128(v) => write!(fmt, "{v}"),
            Self::U256(v) | Self::I256(v) => write!(fmt, "0x{}", hex::encode(v)),
            Self::F32(v) => write!(fmt, "{v}"),
            Self::F64(v) => write!(fmt, "{v}"),
            Self::String(v) => write!(fmt, "{v:?}"),
            Self::Bytes(v) => write!(fmt, "<{} bytes>", v.len()),
            Self::Array(elements) => {
                write!(fmt, "[")?;
                for element in elements {
                    write!(fmt, "{element}, ")?;
                }
                write!(fmt, "]")
            }
            Self::Option(None) => write!(fmt, "none"),
            Self::Option(Some(inner)) => write!(fmt, "some({inner})"),
            Self::Product(fields) => {
                write!(fmt, "(")?;
                for field in fields {
                    write!(fmt, "{field}, ")?;
                }
                write!(fmt, ")")
            }
            Self::Sum { tag, value } => write!(fmt, "{tag}:{value}"),
        }
    }
}

/// One named value, as used in products and rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name; informational, taken from the type's column list.
    pub name: Option<String>,
    pub value: AlgebraicValue,
}

impl Field {
    pub fn new<S: Into<String>>(name: S, value: AlgebraicValue) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }

    pub fn unnamed(value: AlgebraicValue) -> Self {
        Self { name: None, value }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(fmt, "{name}: {}", self.value),
            None => write!(fmt, "{}", self.value),
        }
    }
}
