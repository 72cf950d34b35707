use crate::descriptor::StructDescriptor;
use crate::error::Result;
use crate::marshal::{StructView, StructViewMut};
use crate::native_type::NativeType;
use crate::value::Value;
use std::sync::Arc;

/// Zero-initialized storage for one struct instance, owned by the caller rather than the engine.
#[derive(Clone, Debug)]
pub struct StructBuffer {
    descriptor: Arc<StructDescriptor>,
    bytes: Vec<u8>,
}

impl StructBuffer {
    pub fn new(descriptor: &Arc<StructDescriptor>) -> Self {
        StructBuffer {
            descriptor: descriptor.clone(),
            bytes: vec![0; descriptor.size()],
        }
    }

    pub fn with_initializer(
        descriptor: &Arc<StructDescriptor>,
        initializer: &Value<'_>,
    ) -> Result<Self> {
        let mut buffer = StructBuffer::new(descriptor);
        buffer.view_mut().assign(initializer)?;
        Ok(buffer)
    }

    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn view(&self) -> StructView<'_> {
        StructView::from_bytes(&self.descriptor, &self.bytes)
    }

    pub fn view_mut(&mut self) -> StructViewMut<'_> {
        StructViewMut::from_bytes(&self.descriptor, &mut self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;
    use crate::primitives::Primitive;

    fn header() -> Arc<StructDescriptor> {
        StructDescriptor::builder("Header")
            .fields(&[
                FieldSpec::new("kind", Primitive::U8.arc()),
                FieldSpec::bits("version", Primitive::U8.arc(), 4),
                FieldSpec::bits("flags", Primitive::U8.arc(), 4),
                FieldSpec::new("length", Primitive::U32.arc()),
            ])
            .unwrap()
    }

    #[test]
    fn new_buffers_are_zeroed() {
        let header = header();
        let buffer = StructBuffer::new(&header);

        assert_eq!(buffer.as_bytes(), &[0; 8]);
        assert!(buffer
            .view()
            .values()
            .unwrap()
            .iter()
            .all(|v| v.as_integer() == Some(0)));
    }

    #[test]
    fn initializer_fills_bit_fields() {
        let header = header();
        let buffer =
            StructBuffer::with_initializer(&header, &Value::from(vec![1u64, 2, 15, 1024]))
                .unwrap();
        let view = buffer.view();

        assert_eq!(view.get("kind").unwrap(), Value::UInt(1));
        assert_eq!(view.get("version").unwrap(), Value::UInt(2));
        assert_eq!(view.get("flags").unwrap(), Value::UInt(15));
        assert_eq!(view.get("length").unwrap(), Value::UInt(1024));
        assert_eq!(buffer.as_bytes()[1], 0xf2);
    }

    #[test]
    fn copies_from_another_instance() {
        let header = header();
        let original =
            StructBuffer::with_initializer(&header, &Value::from(vec![9u64, 1])).unwrap();

        let copy =
            StructBuffer::with_initializer(&header, &Value::Struct(original.view())).unwrap();

        assert_eq!(copy.as_bytes(), original.as_bytes());
        assert!(header.check_instance(&Value::Struct(copy.view())).is_ok());
    }
}
