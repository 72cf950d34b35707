//! Moves values between their structured representation and struct memory.

use crate::descriptor::StructDescriptor;
use crate::error::{LayoutError, Result};
use crate::field::FieldDescriptor;
use crate::memory::{MemoryView, MemoryViewMut};
use crate::native_type::NativeType;
use crate::value::Value;

/// Writes `initializer` into the struct that starts at `offset` within `view`.
///
/// A list initializes the first fields in declaration order and leaves the rest untouched. A
/// struct value of the same size is copied byte for byte.
pub fn write_struct(
    descriptor: &StructDescriptor,
    view: &mut MemoryViewMut<'_>,
    offset: usize,
    initializer: &Value<'_>,
) -> Result<()> {
    let layout = descriptor.layout();

    match initializer {
        Value::List(values) => {
            if values.len() > layout.fields.len() {
                return Err(LayoutError::TooManyInitializers {
                    name: descriptor.name().to_string(),
                    fields: layout.fields.len(),
                    given: values.len(),
                });
            }

            let mut target = view.sub_view_mut(offset, layout.size)?;
            for (field, value) in layout.fields.iter().zip(values) {
                field.write(&mut target, 0, value)?;
            }

            Ok(())
        }
        Value::Struct(source) if source.descriptor().size() == layout.size => {
            view.write_bytes(offset, source.memory().as_bytes())
        }
        _ => Err(LayoutError::UnsupportedInitializer(
            descriptor.name().to_string(),
        )),
    }
}

/// Binds a struct view to `[offset, offset + size)` of `view`. Nothing is read yet.
pub fn read_struct<'a>(
    descriptor: &'a StructDescriptor,
    view: MemoryView<'a>,
    offset: usize,
) -> Result<StructView<'a>> {
    let memory = view.sub_view(offset, descriptor.size())?;
    Ok(StructView { descriptor, memory })
}

fn field_at(descriptor: &StructDescriptor, index: usize) -> Result<&FieldDescriptor> {
    descriptor
        .fields()
        .get(index)
        .ok_or_else(|| LayoutError::UnknownField {
            name: descriptor.name().to_string(),
            field: format!("#{}", index),
        })
}

fn field_named<'d>(descriptor: &'d StructDescriptor, name: &str) -> Result<&'d FieldDescriptor> {
    descriptor
        .field(name)
        .ok_or_else(|| LayoutError::UnknownField {
            name: descriptor.name().to_string(),
            field: name.to_string(),
        })
}

/// A struct instance living in borrowed memory. Each field is decoded when it is asked for.
#[derive(Clone, Copy, Debug)]
pub struct StructView<'a> {
    descriptor: &'a StructDescriptor,
    memory: MemoryView<'a>,
}

impl<'a> StructView<'a> {
    pub(crate) fn from_bytes(descriptor: &'a StructDescriptor, bytes: &'a [u8]) -> Self {
        StructView {
            descriptor,
            memory: MemoryView::new(bytes),
        }
    }

    pub fn descriptor(&self) -> &'a StructDescriptor {
        self.descriptor
    }

    pub fn memory(&self) -> MemoryView<'a> {
        self.memory
    }

    pub fn get(&self, name: &str) -> Result<Value<'a>> {
        field_named(self.descriptor, name)?.read(self.memory, 0)
    }

    pub fn get_at(&self, index: usize) -> Result<Value<'a>> {
        field_at(self.descriptor, index)?.read(self.memory, 0)
    }

    /// Reads every field, inherited ones first.
    pub fn values(&self) -> Result<Vec<Value<'a>>> {
        self.descriptor
            .fields()
            .iter()
            .map(|field| field.read(self.memory, 0))
            .collect()
    }
}

/// Mutable counterpart of [`StructView`].
#[derive(Debug)]
pub struct StructViewMut<'a> {
    descriptor: &'a StructDescriptor,
    memory: MemoryViewMut<'a>,
}

impl<'a> StructViewMut<'a> {
    pub fn new(
        descriptor: &'a StructDescriptor,
        view: &'a mut MemoryViewMut<'_>,
        offset: usize,
    ) -> Result<StructViewMut<'a>> {
        let memory = view.sub_view_mut(offset, descriptor.size())?;
        Ok(StructViewMut { descriptor, memory })
    }

    pub(crate) fn from_bytes(descriptor: &'a StructDescriptor, bytes: &'a mut [u8]) -> Self {
        StructViewMut {
            descriptor,
            memory: MemoryViewMut::new(bytes),
        }
    }

    pub fn descriptor(&self) -> &'a StructDescriptor {
        self.descriptor
    }

    pub fn as_view(&self) -> StructView<'_> {
        StructView {
            descriptor: self.descriptor,
            memory: self.memory.as_view(),
        }
    }

    pub fn get(&self, name: &str) -> Result<Value<'_>> {
        field_named(self.descriptor, name)?.read(self.memory.as_view(), 0)
    }

    pub fn set(&mut self, name: &str, value: &Value<'_>) -> Result<()> {
        field_named(self.descriptor, name)?.write(&mut self.memory, 0, value)
    }

    pub fn set_at(&mut self, index: usize, value: &Value<'_>) -> Result<()> {
        field_at(self.descriptor, index)?.write(&mut self.memory, 0, value)
    }

    /// Same as [`write_struct`] on this instance.
    pub fn assign(&mut self, initializer: &Value<'_>) -> Result<()> {
        write_struct(self.descriptor, &mut self.memory, 0, initializer)
    }
}
