use crate::descriptor::StructDescriptor;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldRow {
    pub index: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub offset: usize,
    pub size: usize,
    pub bits: Option<(u32, u32)>,
}

/// Printable summary of a structure's layout. Building one seals the structure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LayoutReport {
    pub name: String,
    pub base: Option<String>,
    pub size: usize,
    pub align: usize,
    pub pack: Option<usize>,
    pub fields: Vec<FieldRow>,
}

impl LayoutReport {
    pub fn from_descriptor(descriptor: &StructDescriptor) -> LayoutReport {
        let layout = descriptor.layout();

        let fields = layout
            .fields
            .iter()
            .map(|f| FieldRow {
                index: f.index(),
                name: f.name().to_string(),
                ty: f.ty().name().to_string(),
                offset: f.offset(),
                size: f.ty().size(),
                bits: f.bit_offset().zip(f.bit_width()),
            })
            .collect();

        LayoutReport {
            name: descriptor.name().to_string(),
            base: descriptor.base().map(|b| b.name().to_string()),
            size: layout.size,
            align: layout.align,
            pack: descriptor.pack(),
            fields,
        }
    }
}

impl fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "struct {}", self.name)?;
        if let Some(base) = &self.base {
            write!(f, " : {}", base)?;
        }
        write!(f, " (size {}, align {}", self.size, self.align)?;
        if let Some(pack) = self.pack {
            write!(f, ", pack {}", pack)?;
        }
        writeln!(f, ")")?;

        for field in &self.fields {
            write!(
                f,
                "  {:>3}  {:>4}  {}: {}",
                field.index, field.offset, field.name, field.ty
            )?;
            if let Some((offset, width)) = field.bits {
                write!(f, " [bits {}..{}]", offset, offset + width)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
