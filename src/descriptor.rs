use crate::error::{LayoutError, Result};
use crate::field::{FieldDescriptor, FieldSpec};
use crate::layout::{Layout, LayoutBuilder};
use crate::marshal::{self, StructView};
use crate::memory::{MemoryView, MemoryViewMut};
use crate::native_type::NativeType;
use crate::value::Value;
use log::{debug, trace};
use nohash_hasher::IntSet;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A structure type.
///
/// A descriptor starts out unsealed with no fields. It gets sealed exactly once: either through an
/// explicit [`StructDescriptor::assign_fields`], or with an empty field list the first time its
/// layout is needed before that happened. After sealing, fields, size and alignment never change.
pub struct StructDescriptor {
    name: String,
    base: Option<Arc<StructDescriptor>>,
    pack: Option<usize>,
    layout: OnceCell<Layout>,
    sealing: Mutex<()>,
}

pub struct StructBuilder {
    name: String,
    base: Option<Arc<StructDescriptor>>,
    pack: Option<i64>,
}

impl StructBuilder {
    pub fn base(mut self, base: &Arc<StructDescriptor>) -> Self {
        self.base = Some(base.clone());
        self
    }

    pub fn pack(mut self, pack: i64) -> Self {
        self.pack = Some(pack);
        self
    }

    pub fn build(self) -> Result<Arc<StructDescriptor>> {
        let pack = match self.pack {
            Some(pack) if pack < 0 => return Err(LayoutError::InvalidPack(pack)),
            Some(pack) => Some(usize::try_from(pack).map_err(|_| LayoutError::InvalidPack(pack))?),
            None => None,
        };

        Ok(Arc::new(StructDescriptor {
            name: self.name,
            base: self.base,
            pack,
            layout: OnceCell::new(),
            sealing: Mutex::new(()),
        }))
    }

    pub fn fields(self, specs: &[FieldSpec]) -> Result<Arc<StructDescriptor>> {
        let descriptor = self.build()?;
        descriptor.assign_fields(specs)?;
        Ok(descriptor)
    }
}

impl StructDescriptor {
    pub fn builder(name: impl Into<String>) -> StructBuilder {
        StructBuilder {
            name: name.into(),
            base: None,
            pack: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&Arc<StructDescriptor>> {
        self.base.as_ref()
    }

    pub fn pack(&self) -> Option<usize> {
        self.pack
    }

    pub fn is_sealed(&self) -> bool {
        self.layout.get().is_some()
    }

    /// Lays out `specs` after the inherited fields and seals the descriptor.
    ///
    /// Fails without touching the descriptor if any field is invalid.
    pub fn assign_fields(&self, specs: &[FieldSpec]) -> Result<()> {
        if self.is_sealed() {
            return Err(LayoutError::FieldsFinalized(self.name.clone()));
        }

        self.check_containment(specs)?;

        // Everything this layout depends on gets sealed before taking our own lock, so no other
        // descriptor's lock is ever acquired while holding it.
        if let Some(base) = &self.base {
            base.finalize_if_needed();
        }
        for spec in specs {
            if let Some(nested) = spec.ty.as_struct() {
                nested.finalize_if_needed();
            }
        }

        let _guard = self.sealing.lock();
        if self.is_sealed() {
            return Err(LayoutError::FieldsFinalized(self.name.clone()));
        }

        let mut builder = self.inherited_layout();
        for spec in specs {
            builder.push(spec)?;
        }

        self.seal(builder.finish());
        Ok(())
    }

    /// Seals the descriptor with no fields of its own unless that already happened.
    pub fn finalize_if_needed(&self) -> &Layout {
        if let Some(layout) = self.layout.get() {
            return layout;
        }

        if let Some(base) = &self.base {
            base.finalize_if_needed();
        }

        let _guard = self.sealing.lock();
        if let Some(layout) = self.layout.get() {
            return layout;
        }

        trace!("`{}` used before its fields were assigned", self.name);
        self.seal(self.inherited_layout().finish())
    }

    pub fn layout(&self) -> &Layout {
        self.finalize_if_needed()
    }

    /// All fields, inherited ones first, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.layout().fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().iter().find(|f| f.name() == name)
    }

    /// Accepts only views of this exact structure type.
    pub fn check_instance<'v, 'a>(&self, value: &'v Value<'a>) -> Result<&'v StructView<'a>> {
        match value {
            Value::Struct(view) if std::ptr::eq(view.descriptor(), self) => Ok(view),
            _ => Err(LayoutError::UnsupportedInitializer(self.name.clone())),
        }
    }

    fn inherited_layout(&self) -> LayoutBuilder {
        let mut builder = LayoutBuilder::new(self.pack);
        if let Some(base) = &self.base {
            builder.inherit(&base.layout().fields);
        }
        builder
    }

    fn seal(&self, layout: Layout) -> &Layout {
        debug!(
            "sealed `{}`: {} field(s), size {}, align {}",
            self.name,
            layout.fields.len(),
            layout.size,
            layout.align
        );
        self.layout.get_or_init(|| layout)
    }

    /// Walks everything the new fields would embed, directly or through bases and nested
    /// structures, looking for `self`.
    fn check_containment(&self, specs: &[FieldSpec]) -> Result<()> {
        let mut visited: IntSet<usize> = IntSet::default();
        let mut pending: Vec<&StructDescriptor> =
            specs.iter().filter_map(|spec| spec.ty.as_struct()).collect();
        pending.extend(self.base.as_deref());

        while let Some(current) = pending.pop() {
            if std::ptr::eq(current, self) {
                return Err(LayoutError::SelfContainment(self.name.clone()));
            }

            if !visited.insert(current as *const StructDescriptor as usize) {
                continue;
            }

            pending.extend(current.base.as_deref());
            if let Some(layout) = current.layout.get() {
                pending.extend(layout.fields.iter().filter_map(|f| f.ty().as_struct()));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for StructDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("StructDescriptor");
        s.field("name", &self.name);
        if let Some(base) = &self.base {
            s.field("base", &base.name);
        }
        s.field("pack", &self.pack);
        match self.layout.get() {
            Some(layout) => s
                .field("size", &layout.size)
                .field("align", &layout.align)
                .field("fields", &layout.fields.len()),
            None => s.field("sealed", &false),
        };
        s.finish()
    }
}

impl NativeType for StructDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.layout().size
    }

    fn alignment(&self) -> usize {
        self.layout().align
    }

    fn read<'a>(&'a self, view: MemoryView<'a>, offset: usize) -> Result<Value<'a>> {
        Ok(Value::Struct(marshal::read_struct(self, view, offset)?))
    }

    fn write(&self, view: &mut MemoryViewMut<'_>, offset: usize, value: &Value<'_>) -> Result<()> {
        marshal::write_struct(self, view, offset, value)
    }

    fn as_struct(&self) -> Option<&StructDescriptor> {
        Some(self)
    }
}
