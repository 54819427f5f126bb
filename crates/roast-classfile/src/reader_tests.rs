use indoc::indoc;

use super::constants::attr;
use super::dump::dump;
use super::ids::CpIndex;
use super::reader::{ClassFile, CodeAttribute, Constant, ReadError};

/// Hand-assembled class file bytes.
#[derive(Default)]
struct Bytes(Vec<u8>);

impl Bytes {
    fn u1(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    fn u2(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u4(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn utf8(self, s: &str) -> Self {
        let mut this = self.u1(1).u2(s.len() as u16);
        this.0.extend_from_slice(s.as_bytes());
        this
    }

    fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }
}

/// `public class Foo { static final int X = 5; public void m() { return; } }`
/// with a long constant thrown in to exercise the two-slot rule.
fn sample() -> Vec<u8> {
    Bytes::default()
        .u4(0xCAFE_BABE)
        .u2(0)
        .u2(52)
        // constant pool
        .u2(16)
        .utf8("Foo") // 1
        .u1(7)
        .u2(1) // 2
        .utf8("java/lang/Object") // 3
        .u1(7)
        .u2(3) // 4
        .utf8("X") // 5
        .utf8("I") // 6
        .utf8("ConstantValue") // 7
        .u1(3)
        .u4(5) // 8
        .u1(5)
        .u4(0)
        .u4(7) // 9, 10
        .utf8("m") // 11
        .utf8("()V") // 12
        .utf8("Code") // 13
        .utf8("SourceFile") // 14
        .utf8("Foo.java") // 15
        // header
        .u2(0x0021)
        .u2(2)
        .u2(4)
        .u2(0)
        // fields
        .u2(1)
        .u2(0x0018)
        .u2(5)
        .u2(6)
        .u2(1)
        .u2(7)
        .u4(2)
        .u2(8)
        // methods
        .u2(1)
        .u2(0x0001)
        .u2(11)
        .u2(12)
        .u2(1)
        .u2(13)
        .u4(13)
        .u2(0)
        .u2(1)
        .u4(1)
        .u1(0xB1)
        .u2(0)
        .u2(0)
        // class attributes
        .u2(1)
        .u2(14)
        .u4(2)
        .u2(15)
        .0
}

#[test]
fn parses_header_and_pool() {
    let class = ClassFile::parse(&sample()).unwrap();

    assert_eq!(class.major_version, 52);
    assert_eq!(class.minor_version, 0);
    assert_eq!(class.pool.count(), 16);
    assert_eq!(class.this_name().unwrap(), "Foo");
    assert_eq!(class.super_name().unwrap(), Some("java/lang/Object"));
    assert_eq!(class.pool.get(CpIndex(9)), Some(&Constant::Long(7)));
    assert_eq!(class.pool.get(CpIndex(10)), None);
    assert_eq!(class.pool.iter().count(), 14);
}

#[test]
fn parses_members_and_code() {
    let class = ClassFile::parse(&sample()).unwrap();

    let x = class.field("X").unwrap();
    let value = x.attribute(attr::CONSTANT_VALUE).unwrap().u2().unwrap();
    assert_eq!(class.pool.get(CpIndex(value)), Some(&Constant::Integer(5)));

    let m = class.method("m").unwrap();
    let code = m.code(&class.pool).unwrap().unwrap();
    assert_eq!(code.max_stack, 0);
    assert_eq!(code.max_locals, 1);
    assert_eq!(code.code, vec![0xB1]);
    assert!(code.exception_table.is_empty());
    assert_eq!(code.line_numbers(), None);
}

#[test]
fn rejects_bad_magic() {
    let mut bytes = sample();
    bytes[0] = 0;
    assert_eq!(
        ClassFile::parse(&bytes).unwrap_err(),
        ReadError::InvalidMagic(0x00FE_BABE)
    );
}

#[test]
fn rejects_truncated_and_trailing_input() {
    let bytes = sample();
    assert!(matches!(
        ClassFile::parse(&bytes[..bytes.len() - 1]),
        Err(ReadError::UnexpectedEof(_))
    ));

    let mut longer = bytes;
    longer.push(0);
    assert_eq!(
        ClassFile::parse(&longer).unwrap_err(),
        ReadError::TrailingBytes(1)
    );
}

#[test]
fn rejects_unknown_constant_tag() {
    let bytes = Bytes::default()
        .u4(0xCAFE_BABE)
        .u2(0)
        .u2(52)
        .u2(2)
        .u1(2)
        .0;
    assert_eq!(
        ClassFile::parse(&bytes).unwrap_err(),
        ReadError::UnknownConstantTag { tag: 2, index: 1 }
    );
}

#[test]
fn code_attribute_tables() {
    let class = ClassFile::parse(&sample()).unwrap();
    let pool = &class.pool;

    // iconst_0; ireturn with one catch-all handler and no nested attributes
    let info = Bytes::default()
        .u2(1)
        .u2(2)
        .u4(2)
        .raw(&[0x03, 0xAC])
        .u2(1)
        .u2(0)
        .u2(1)
        .u2(1)
        .u2(0)
        .u2(0)
        .0;
    let code = CodeAttribute::parse(&info, pool).unwrap();
    assert_eq!(code.exception_table.len(), 1);
    assert!(code.exception_table[0].catch_type.is_none());
    assert_eq!(code.exception_table[0].handler_pc, 1);
    assert!(code.attributes.is_empty());
}

#[test]
fn dump_renders_sections() {
    let class = ClassFile::parse(&sample()).unwrap();
    let out = dump(&class);

    assert_eq!(
        out,
        indoc! {"
            [class]
            version 52.0
            name Foo
            flags 0x0021
            super java/lang/Object

            [fields]
            0x0018 X I
              ConstantValue int 5

            [methods]
            0x0001 m ()V
              Code stack=0 locals=1 length=1
                bytes b1

            [attributes]
            SourceFile Foo.java
        "}
    );
}
