use crate::error::{LayoutError, Result};
use crate::memory::{MemoryView, MemoryViewMut};
use crate::native_type::{NativeType, Signedness};
use crate::value::Value;
use std::sync::Arc;

/// A field as declared, before layout.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: String,
    pub ty: Arc<dyn NativeType>,
    pub bit_width: Option<u32>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: Arc<dyn NativeType>) -> Self {
        FieldSpec {
            name: name.into(),
            ty,
            bit_width: None,
        }
    }

    pub fn bits(name: impl Into<String>, ty: Arc<dyn NativeType>, width: u32) -> Self {
        FieldSpec {
            name: name.into(),
            ty,
            bit_width: Some(width),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitRange {
    pub offset: u32,
    pub width: u32,
}

/// A field after layout. Immutable once created.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    name: String,
    ty: Arc<dyn NativeType>,
    index: usize,
    offset: usize,
    bits: Option<BitRange>,
}

fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn sign_extend(raw: u64, width: u32) -> i64 {
    let shift = 64 - width;
    ((raw << shift) as i64) >> shift
}

impl FieldDescriptor {
    pub(crate) fn new(
        name: String,
        ty: Arc<dyn NativeType>,
        index: usize,
        offset: usize,
        bits: Option<BitRange>,
    ) -> Self {
        FieldDescriptor {
            name,
            ty,
            index,
            offset,
            bits,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Arc<dyn NativeType> {
        &self.ty
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn bit_width(&self) -> Option<u32> {
        self.bits.map(|b| b.width)
    }

    pub fn bit_offset(&self) -> Option<u32> {
        self.bits.map(|b| b.offset)
    }

    /// Reads the field of a struct that starts at `base` within `view`.
    pub fn read<'a>(&'a self, view: MemoryView<'a>, base: usize) -> Result<Value<'a>> {
        let Some(bits) = self.bits else {
            return self.ty.read(view, base + self.offset);
        };

        let container = self.read_container(view, base)?;
        let raw = (container >> bits.offset) & mask(bits.width);

        Ok(match self.signedness() {
            Signedness::Signed => Value::Int(sign_extend(raw, bits.width)),
            Signedness::Unsigned => Value::UInt(raw),
        })
    }

    /// Writes the field of a struct that starts at `base` within `view`.
    ///
    /// Bit-fields read the shared container, replace their own bits and write it back, leaving
    /// the sibling fields untouched.
    pub fn write(&self, view: &mut MemoryViewMut<'_>, base: usize, value: &Value<'_>) -> Result<()> {
        let Some(bits) = self.bits else {
            return self.ty.write(view, base + self.offset, value);
        };

        let n = value.as_integer().ok_or(LayoutError::ValueMismatch {
            expected: "integer",
            found: value.kind_name(),
        })?;

        let signedness = self.signedness();
        let (min, max) = match signedness {
            Signedness::Signed => (-(1i128 << (bits.width - 1)), (1i128 << (bits.width - 1)) - 1),
            Signedness::Unsigned => (0, (1i128 << bits.width) - 1),
        };
        if n < min || n > max {
            return Err(LayoutError::ValueOutOfRange(self.name.clone()));
        }

        let container = self.read_container(view.as_view(), base)?;
        let field_mask = mask(bits.width) << bits.offset;
        let updated = (container & !field_mask) | (((n as u64) << bits.offset) & field_mask);

        let container_width = (self.ty.size() * 8) as u32;
        let new_value = match signedness {
            Signedness::Signed => Value::Int(sign_extend(updated, container_width)),
            Signedness::Unsigned => Value::UInt(updated & mask(container_width)),
        };

        self.ty.write(view, base + self.offset, &new_value)
    }

    fn signedness(&self) -> Signedness {
        // Layout only admits bit-fields on types that report a signedness.
        self.ty
            .bit_field_signedness()
            .unwrap_or(Signedness::Unsigned)
    }

    fn read_container(&self, view: MemoryView<'_>, base: usize) -> Result<u64> {
        let container = self.ty.read(view, base + self.offset)?;
        match container {
            Value::Int(n) => Ok(n as u64 & mask((self.ty.size() * 8) as u32)),
            Value::UInt(n) => Ok(n),
            other => Err(LayoutError::ValueMismatch {
                expected: "integer",
                found: other.kind_name(),
            }),
        }
    }
}
