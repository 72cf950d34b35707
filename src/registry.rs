use crate::descriptor::StructDescriptor;
use crate::error::{LayoutError, Result};
use crate::field::FieldSpec;
use crate::native_type::NativeType;
use crate::primitives::Primitive;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub bits: Option<u32>,
}

/// A structure declaration. `fields: None` leaves the structure unsealed until something uses it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StructDecl {
    pub name: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub pack: Option<i64>,
    #[serde(default)]
    pub fields: Option<Vec<FieldDecl>>,
}

/// Maps type names to native types.
pub struct TypeRegistry {
    types: HashMap<String, Arc<dyn NativeType>>,
    structs: HashMap<String, Arc<StructDescriptor>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_primitives()
    }
}

impl TypeRegistry {
    pub fn empty() -> TypeRegistry {
        TypeRegistry {
            types: HashMap::new(),
            structs: HashMap::new(),
        }
    }

    pub fn with_primitives() -> TypeRegistry {
        let mut registry = TypeRegistry::empty();
        for p in Primitive::ALL {
            registry.types.insert(p.type_name().to_string(), p.arc());
        }
        registry
    }

    pub fn register(&mut self, name: &str, ty: Arc<dyn NativeType>) -> Result<()> {
        if self.types.contains_key(name) {
            return Err(LayoutError::DuplicateType(name.to_string()));
        }
        self.types.insert(name.to_string(), ty);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn NativeType>> {
        self.types.get(name)
    }

    pub fn get_struct(&self, name: &str) -> Option<&Arc<StructDescriptor>> {
        self.structs.get(name)
    }

    /// Declares structures in two passes: first every name is created (bases must be declared
    /// earlier in the list), then fields are assigned in order.
    ///
    /// A structure used as a field before its own declaration gets sealed empty at that point,
    /// and its declaration then fails with [`LayoutError::FieldsFinalized`].
    ///
    /// Nothing is registered unless the whole list succeeds.
    pub fn declare(&mut self, decls: &[StructDecl]) -> Result<Vec<Arc<StructDescriptor>>> {
        let mut pending: HashMap<&str, Arc<StructDescriptor>> = HashMap::new();
        let mut declared = Vec::with_capacity(decls.len());

        for decl in decls {
            let name = decl.name.as_str();
            if self.types.contains_key(name) || pending.contains_key(name) {
                return Err(LayoutError::DuplicateType(decl.name.clone()));
            }

            let mut builder = StructDescriptor::builder(name);
            if let Some(base) = &decl.base {
                let base = pending
                    .get(base.as_str())
                    .or_else(|| self.structs.get(base))
                    .ok_or_else(|| LayoutError::UnknownType(base.clone()))?;
                builder = builder.base(base);
            }
            if let Some(pack) = decl.pack {
                builder = builder.pack(pack);
            }

            let descriptor = builder.build()?;
            pending.insert(name, descriptor.clone());
            declared.push(descriptor);
        }

        for (decl, descriptor) in decls.iter().zip(&declared) {
            let Some(fields) = &decl.fields else {
                continue;
            };

            let specs = fields
                .iter()
                .map(|field| -> Result<FieldSpec> {
                    let ty: Arc<dyn NativeType> = match pending.get(field.ty.as_str()) {
                        Some(descriptor) => descriptor.clone(),
                        None => self
                            .types
                            .get(&field.ty)
                            .cloned()
                            .ok_or_else(|| LayoutError::UnknownType(field.ty.clone()))?,
                    };

                    Ok(FieldSpec {
                        name: field.name.clone(),
                        ty,
                        bit_width: field.bits,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            descriptor.assign_fields(&specs)?;
        }

        for descriptor in &declared {
            self.types
                .insert(descriptor.name().to_string(), descriptor.clone());
            self.structs
                .insert(descriptor.name().to_string(), descriptor.clone());
        }

        debug!("declared {} structure(s)", declared.len());

        Ok(declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, ty: &str) -> FieldDecl {
        FieldDecl {
            name: name.to_string(),
            ty: ty.to_string(),
            bits: None,
        }
    }

    fn decl(name: &str, fields: Option<Vec<FieldDecl>>) -> StructDecl {
        StructDecl {
            name: name.to_string(),
            base: None,
            pack: None,
            fields,
        }
    }

    #[test]
    fn declarations_resolve_primitives_and_structs() {
        let mut registry = TypeRegistry::with_primitives();

        let declared = registry
            .declare(&[
                decl("Vec2", Some(vec![field("x", "f32"), field("y", "f32")])),
                decl(
                    "Sprite",
                    Some(vec![field("id", "u16"), field("position", "Vec2")]),
                ),
            ])
            .unwrap();

        assert_eq!(declared.len(), 2);
        let sprite = registry.get_struct("Sprite").unwrap();
        assert_eq!(sprite.field("position").map(|f| f.offset()), Some(4));
        assert_eq!(sprite.size(), 12);
    }

    #[test]
    fn unknown_types_are_reported() {
        let mut registry = TypeRegistry::with_primitives();

        assert_eq!(
            registry
                .declare(&[decl("S", Some(vec![field("c", "char")]))])
                .unwrap_err(),
            LayoutError::UnknownType("char".to_string())
        );

        let mut derived = decl("D", None);
        derived.base = Some("Missing".to_string());
        assert_eq!(
            registry.declare(&[derived]).unwrap_err(),
            LayoutError::UnknownType("Missing".to_string())
        );
    }

    #[test]
    fn names_cannot_be_declared_twice() {
        let mut registry = TypeRegistry::with_primitives();

        assert_eq!(
            registry.declare(&[decl("u8", None)]).unwrap_err(),
            LayoutError::DuplicateType("u8".to_string())
        );
    }

    #[test]
    fn forward_use_seals_the_later_declaration() {
        let mut registry = TypeRegistry::with_primitives();

        let result = registry.declare(&[
            decl("Outer", Some(vec![field("inner", "Inner")])),
            decl("Inner", Some(vec![field("v", "u32")])),
        ]);

        assert_eq!(
            result.unwrap_err(),
            LayoutError::FieldsFinalized("Inner".to_string())
        );
        assert!(registry.get_struct("Outer").is_none());
        assert!(registry.get_struct("Inner").is_none());
    }

    #[test]
    fn failed_declarations_leave_the_registry_untouched() {
        let mut registry = TypeRegistry::with_primitives();

        assert_eq!(
            registry
                .declare(&[
                    decl("A", Some(vec![field("x", "u8")])),
                    decl("B", Some(vec![field("y", "char")])),
                ])
                .unwrap_err(),
            LayoutError::UnknownType("char".to_string())
        );
        assert!(registry.get_struct("A").is_none());
        assert!(registry.get("B").is_none());

        let declared = registry
            .declare(&[
                decl("A", Some(vec![field("x", "u8")])),
                decl("B", Some(vec![field("y", "u16"), field("a", "A")])),
            ])
            .unwrap();

        assert_eq!(declared.len(), 2);
        assert_eq!(registry.get_struct("B").unwrap().size(), 4);
        assert!(registry.get("A").is_some());
    }

    #[test]
    fn registered_types_are_usable_in_declarations() {
        let mut registry = TypeRegistry::with_primitives();
        registry.register("byte", Primitive::U8.arc()).unwrap();

        assert_eq!(
            registry.register("byte", Primitive::I8.arc()),
            Err(LayoutError::DuplicateType("byte".to_string()))
        );

        registry
            .declare(&[decl("Pair", Some(vec![field("lo", "byte"), field("hi", "byte")]))])
            .unwrap();
        assert_eq!(registry.get_struct("Pair").unwrap().size(), 2);
    }

    #[test]
    fn names_cannot_repeat_within_one_list() {
        let mut registry = TypeRegistry::with_primitives();

        assert_eq!(
            registry
                .declare(&[decl("S", None), decl("S", None)])
                .unwrap_err(),
            LayoutError::DuplicateType("S".to_string())
        );
        assert!(registry.get_struct("S").is_none());
    }

    #[test]
    fn declarations_parse_from_ron() {
        let source = r#"[
            (name: "Flags", pack: Some(1), fields: Some([
                (name: "a", type: "u8", bits: Some(3)),
                (name: "b", type: "u32"),
            ])),
            (name: "Opaque"),
        ]"#;

        let decls: Vec<StructDecl> = ron::from_str(source).unwrap();

        assert_eq!(decls[0].pack, Some(1));
        assert_eq!(decls[0].fields.as_ref().map(Vec::len), Some(2));
        assert_eq!(decls[1].fields, None);
    }
}
