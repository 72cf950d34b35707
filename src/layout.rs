//! Computes field offsets, size and alignment of a structure following C ABI rules.
//!
//! Fields are placed one after the other, each aligned to its type's alignment (or to the pack
//! value, if one is given). Consecutive bit-fields whose backing types have the same width share
//! one storage unit for as long as their bits fit in it.

use crate::error::{LayoutError, Result};
use crate::field::{BitRange, FieldDescriptor, FieldSpec};
use log::trace;
use std::cmp::max;
use std::collections::HashSet;

pub fn round_up(n: usize, align: usize) -> usize {
    if align <= 1 {
        n
    } else {
        (n + align - 1) / align * align
    }
}

#[derive(Clone, Debug)]
pub struct Layout {
    pub fields: Vec<FieldDescriptor>,
    pub size: usize,
    pub align: usize,
}

/// The bit-field storage unit currently being filled.
#[derive(Clone, Copy, Debug)]
struct Container {
    offset: usize,
    byte_size: usize,
    used_bits: u32,
}

#[derive(Debug)]
pub struct LayoutBuilder {
    pack: Option<usize>,
    fields: Vec<FieldDescriptor>,
    names: HashSet<String>,
    size: usize,
    align: usize,
    container: Option<Container>,
}

impl LayoutBuilder {
    /// A pack of zero behaves like a pack of one.
    pub fn new(pack: Option<usize>) -> Self {
        let pack = pack.map(|p| max(p, 1));
        LayoutBuilder {
            pack,
            fields: Vec::new(),
            names: HashSet::new(),
            size: 0,
            align: pack.unwrap_or(1),
            container: None,
        }
    }

    /// Seeds the builder with fields inherited from a base structure. They keep the offsets the
    /// base gave them; only the alignment follows this builder's pack. A bit-field container the
    /// base left open stays open for the fields pushed next.
    pub fn inherit(&mut self, fields: &[FieldDescriptor]) {
        for field in fields {
            let (size, align) = (field.ty().size(), field.ty().alignment());
            self.align = match self.pack {
                Some(pack) => pack,
                None => max(self.align, align),
            };

            match field.bit_offset().zip(field.bit_width()) {
                Some((bit_offset, width)) => match &mut self.container {
                    Some(container) if container.offset == field.offset() => {
                        container.used_bits = max(container.used_bits, bit_offset + width);
                    }
                    _ => {
                        self.close_container();
                        self.size = max(self.size, field.offset());
                        self.container = Some(Container {
                            offset: field.offset(),
                            byte_size: size,
                            used_bits: bit_offset + width,
                        });
                    }
                },
                None => {
                    self.close_container();
                    self.size = max(self.size, field.offset() + size);
                }
            }

            self.names.insert(field.name().to_string());
            self.fields.push(field.clone());
        }
    }

    pub fn push(&mut self, spec: &FieldSpec) -> Result<()> {
        let (size, align) = (spec.ty.size(), spec.ty.alignment());

        if align == 0 {
            return Err(LayoutError::FieldTypeIncapable {
                field: spec.name.clone(),
                ty: spec.ty.name().to_string(),
            });
        }

        if self.names.contains(&spec.name) {
            return Err(LayoutError::DuplicateField(spec.name.clone()));
        }

        let (offset, bits) = match spec.bit_width {
            Some(width) => {
                self.check_bit_field(spec, width)?;
                let (offset, bit_offset) = self.place_bits(size, align, width);
                (
                    offset,
                    Some(BitRange {
                        offset: bit_offset,
                        width,
                    }),
                )
            }
            None => (self.place(size, align), None),
        };

        trace!(
            "field `{}`: {} at offset {} ({:?})",
            spec.name,
            spec.ty.name(),
            offset,
            bits
        );

        let index = self.fields.len();
        self.names.insert(spec.name.clone());
        self.fields.push(FieldDescriptor::new(
            spec.name.clone(),
            spec.ty.clone(),
            index,
            offset,
            bits,
        ));

        Ok(())
    }

    pub fn finish(mut self) -> Layout {
        self.close_container();

        Layout {
            fields: self.fields,
            size: round_up(self.size, self.align),
            align: self.align,
        }
    }

    fn check_bit_field(&self, spec: &FieldSpec, width: u32) -> Result<()> {
        let reason = if spec.ty.bit_field_signedness().is_none() {
            "type cannot hold bit fields"
        } else if width == 0 {
            "width must be at least one bit"
        } else if width as usize > spec.ty.size() * 8 {
            "width exceeds the size of the type"
        } else {
            return Ok(());
        };

        Err(LayoutError::InvalidBitField {
            field: spec.name.clone(),
            reason,
        })
    }

    fn close_container(&mut self) {
        if let Some(container) = self.container.take() {
            self.size = max(self.size, container.offset + container.byte_size);
        }
    }

    fn place(&mut self, size: usize, align: usize) -> usize {
        self.close_container();

        let align = match self.pack {
            Some(pack) => {
                self.align = pack;
                pack
            }
            None => {
                self.align = max(self.align, align);
                align
            }
        };

        self.size = round_up(self.size, align);
        let offset = self.size;
        self.size += size;
        offset
    }

    /// Returns the byte offset of the container and the bit offset within it.
    fn place_bits(&mut self, size: usize, align: usize, width: u32) -> (usize, u32) {
        if let Some(container) = &mut self.container {
            if container.byte_size == size
                && (container.used_bits + width + 7) as usize / 8 <= size
            {
                let bit_offset = container.used_bits;
                container.used_bits += width;
                return (container.offset, bit_offset);
            }
        }

        self.close_container();

        self.align = match self.pack {
            Some(pack) => pack,
            None => max(self.align, align),
        };
        self.size = round_up(self.size, align);
        self.container = Some(Container {
            offset: self.size,
            byte_size: size,
            used_bits: width,
        });

        (self.size, 0)
    }
}
