use crate::error::{LayoutError, Result};
use crate::memory::{MemoryView, MemoryViewMut};
use crate::native_type::{NativeType, Signedness};
use crate::value::Value;
use std::mem::size_of;
use std::sync::Arc;

/// Fixed-width leaf types with natural alignment, stored in native byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Bool,
    Pointer,
}

impl Primitive {
    pub const ALL: [Primitive; 12] = [
        Primitive::I8,
        Primitive::U8,
        Primitive::I16,
        Primitive::U16,
        Primitive::I32,
        Primitive::U32,
        Primitive::I64,
        Primitive::U64,
        Primitive::F32,
        Primitive::F64,
        Primitive::Bool,
        Primitive::Pointer,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            Primitive::I8 => "i8",
            Primitive::U8 => "u8",
            Primitive::I16 => "i16",
            Primitive::U16 => "u16",
            Primitive::I32 => "i32",
            Primitive::U32 => "u32",
            Primitive::I64 => "i64",
            Primitive::U64 => "u64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Bool => "bool",
            Primitive::Pointer => "pointer",
        }
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        Primitive::ALL.iter().copied().find(|p| p.type_name() == name)
    }

    pub fn arc(self) -> Arc<dyn NativeType> {
        Arc::new(self)
    }

    fn byte_size(self) -> usize {
        match self {
            Primitive::I8 | Primitive::U8 | Primitive::Bool => 1,
            Primitive::I16 | Primitive::U16 => 2,
            Primitive::I32 | Primitive::U32 | Primitive::F32 => 4,
            Primitive::I64 | Primitive::U64 | Primitive::F64 => 8,
            Primitive::Pointer => size_of::<usize>(),
        }
    }

    fn out_of_range(self) -> LayoutError {
        LayoutError::ValueOutOfRange(self.type_name().to_string())
    }

    fn integer_arg(self, value: &Value<'_>) -> Result<i128> {
        value.as_integer().ok_or(LayoutError::ValueMismatch {
            expected: "integer",
            found: value.kind_name(),
        })
    }

    fn encode<T: TryFrom<i128>>(self, n: i128) -> Result<T> {
        T::try_from(n).map_err(|_| self.out_of_range())
    }
}

impl NativeType for Primitive {
    fn name(&self) -> &str {
        self.type_name()
    }

    fn size(&self) -> usize {
        self.byte_size()
    }

    fn alignment(&self) -> usize {
        self.byte_size()
    }

    fn read<'a>(&'a self, view: MemoryView<'a>, offset: usize) -> Result<Value<'a>> {
        let value = match self {
            Primitive::I8 => Value::Int(i8::from_ne_bytes(view.read_array(offset)?).into()),
            Primitive::U8 => Value::UInt(u8::from_ne_bytes(view.read_array(offset)?).into()),
            Primitive::I16 => Value::Int(i16::from_ne_bytes(view.read_array(offset)?).into()),
            Primitive::U16 => Value::UInt(u16::from_ne_bytes(view.read_array(offset)?).into()),
            Primitive::I32 => Value::Int(i32::from_ne_bytes(view.read_array(offset)?).into()),
            Primitive::U32 => Value::UInt(u32::from_ne_bytes(view.read_array(offset)?).into()),
            Primitive::I64 => Value::Int(i64::from_ne_bytes(view.read_array(offset)?)),
            Primitive::U64 => Value::UInt(u64::from_ne_bytes(view.read_array(offset)?)),
            Primitive::F32 => Value::Float(f32::from_ne_bytes(view.read_array(offset)?).into()),
            Primitive::F64 => Value::Float(f64::from_ne_bytes(view.read_array(offset)?)),
            Primitive::Bool => Value::Bool(view.read_array::<1>(offset)?[0] != 0),
            Primitive::Pointer => {
                Value::UInt(usize::from_ne_bytes(view.read_array(offset)?) as u64)
            }
        };

        Ok(value)
    }

    fn write(&self, view: &mut MemoryViewMut<'_>, offset: usize, value: &Value<'_>) -> Result<()> {
        match self {
            Primitive::F32 | Primitive::F64 => {
                let f = value.as_float().ok_or(LayoutError::ValueMismatch {
                    expected: "number",
                    found: value.kind_name(),
                })?;

                if *self == Primitive::F32 {
                    view.write_bytes(offset, &(f as f32).to_ne_bytes())
                } else {
                    view.write_bytes(offset, &f.to_ne_bytes())
                }
            }
            Primitive::Bool => {
                let b = match value {
                    Value::Bool(b) => *b,
                    _ => self.integer_arg(value)? != 0,
                };
                view.write_bytes(offset, &[b as u8])
            }
            _ => {
                let n = self.integer_arg(value)?;

                match self {
                    Primitive::I8 => view.write_bytes(offset, &self.encode::<i8>(n)?.to_ne_bytes()),
                    Primitive::U8 => view.write_bytes(offset, &self.encode::<u8>(n)?.to_ne_bytes()),
                    Primitive::I16 => {
                        view.write_bytes(offset, &self.encode::<i16>(n)?.to_ne_bytes())
                    }
                    Primitive::U16 => {
                        view.write_bytes(offset, &self.encode::<u16>(n)?.to_ne_bytes())
                    }
                    Primitive::I32 => {
                        view.write_bytes(offset, &self.encode::<i32>(n)?.to_ne_bytes())
                    }
                    Primitive::U32 => {
                        view.write_bytes(offset, &self.encode::<u32>(n)?.to_ne_bytes())
                    }
                    Primitive::I64 => {
                        view.write_bytes(offset, &self.encode::<i64>(n)?.to_ne_bytes())
                    }
                    Primitive::U64 => {
                        view.write_bytes(offset, &self.encode::<u64>(n)?.to_ne_bytes())
                    }
                    _ => view.write_bytes(offset, &self.encode::<usize>(n)?.to_ne_bytes()),
                }
            }
        }
    }

    fn bit_field_signedness(&self) -> Option<Signedness> {
        match self {
            Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64 => {
                Some(Signedness::Signed)
            }
            Primitive::U8 | Primitive::U16 | Primitive::U32 | Primitive::U64 => {
                Some(Signedness::Unsigned)
            }
            _ => None,
        }
    }
}
