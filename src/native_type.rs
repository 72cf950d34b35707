use crate::descriptor::StructDescriptor;
use crate::error::Result;
use crate::memory::{MemoryView, MemoryViewMut};
use crate::value::Value;
use std::fmt::Debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// Anything that can be stored in native memory: primitives, and structures themselves so that
/// they nest inside other structures.
pub trait NativeType: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn size(&self) -> usize;

    fn alignment(&self) -> usize;

    fn read<'a>(&'a self, view: MemoryView<'a>, offset: usize) -> Result<Value<'a>>;

    fn write(&self, view: &mut MemoryViewMut<'_>, offset: usize, value: &Value<'_>) -> Result<()>;

    /// `Some` for integer types that may back a bit-field container.
    fn bit_field_signedness(&self) -> Option<Signedness> {
        None
    }

    fn as_struct(&self) -> Option<&StructDescriptor> {
        None
    }
}
