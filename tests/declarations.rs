use cstruct::error::LayoutError;
use cstruct::instance::StructBuffer;
use cstruct::native_type::NativeType;
use cstruct::registry::{StructDecl, TypeRegistry};
use cstruct::report::LayoutReport;
use cstruct::value::Value;
use insta::assert_snapshot;
use std::fs;

fn load(path: &str) -> Vec<StructDecl> {
    let contents = fs::read_to_string(path).unwrap();
    ron::from_str(&contents).unwrap()
}

fn render(registry: &TypeRegistry, name: &str) -> String {
    let descriptor = registry.get_struct(name).unwrap();
    LayoutReport::from_descriptor(descriptor)
        .to_string()
        .trim_end()
        .to_string()
}

#[test]
fn packets() {
    let decls = load("tests/layouts/packets.ron");

    let mut registry = TypeRegistry::with_primitives();
    let declared = registry.declare(&decls).unwrap();
    assert_eq!(declared.len(), 3);

    assert_snapshot!(render(&registry, "Header"), @r###"
    struct Header (size 8, align 4)
        0     0  kind: u8
        1     1  version: u8 [bits 0..4]
        2     1  flags: u8 [bits 4..8]
        3     4  length: u32
    "###);

    assert_snapshot!(render(&registry, "Ping"), @r###"
    struct Ping : Header (size 16, align 8)
        0     0  kind: u8
        1     1  version: u8 [bits 0..4]
        2     1  flags: u8 [bits 4..8]
        3     4  length: u32
        4     8  nonce: u64
    "###);

    assert_snapshot!(render(&registry, "Wire"), @r###"
    struct Wire (size 11, align 1, pack 1)
        0     0  header: Header
        1     8  checksum: u16
        2    10  ok: bool
    "###);
}

#[test]
fn packets_marshal_through_the_registry() {
    let mut registry = TypeRegistry::with_primitives();
    registry
        .declare(&load("tests/layouts/packets.ron"))
        .unwrap();

    let wire = registry.get_struct("Wire").unwrap();
    let buffer = StructBuffer::with_initializer(
        wire,
        &Value::List(vec![
            Value::from(vec![2u64, 1, 3, 512]),
            Value::UInt(0xbeef),
            Value::Bool(true),
        ]),
    )
    .unwrap();

    assert_eq!(buffer.as_bytes().len(), wire.size());
    assert_eq!(buffer.as_bytes()[1], 0x31);
    assert_eq!(buffer.as_bytes()[10], 1);

    let header = buffer.view().get("header").unwrap();
    let header = header.as_struct().unwrap();
    assert_eq!(header.get("flags").unwrap(), Value::UInt(3));
    assert_eq!(header.get("length").unwrap(), Value::UInt(512));
    assert_eq!(buffer.view().get("checksum").unwrap(), Value::UInt(0xbeef));
}

#[test]
fn forward_reference_fails_the_whole_list() {
    let mut registry = TypeRegistry::with_primitives();
    let mut decls = load("tests/layouts/forward_reference.ron");

    let result = registry.declare(&decls);

    assert_eq!(
        result.unwrap_err(),
        LayoutError::FieldsFinalized("Meta".to_string())
    );
    assert!(registry.get_struct("Node").is_none());
    assert!(registry.get_struct("Meta").is_none());

    decls.reverse();
    registry.declare(&decls).unwrap();

    assert_snapshot!(render(&registry, "Node"), @r###"
    struct Node (size 8, align 4)
        0     0  value: i32
        1     4  meta: Meta
    "###);
}

#[test]
fn report_serializes_to_ron() {
    let mut registry = TypeRegistry::with_primitives();
    registry
        .declare(&load("tests/layouts/packets.ron"))
        .unwrap();

    let report = LayoutReport::from_descriptor(registry.get_struct("Header").unwrap());
    let text = ron::to_string(&report).unwrap();

    assert!(text.contains("name:\"Header\""));
    assert!(text.contains("name:\"version\""));
    assert!(text.contains("bits:Some((4,4))"));
}
