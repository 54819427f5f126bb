use roast_classfile::access::{ACC_PUBLIC, ACC_STATIC};
use roast_classfile::constants::attr;
use roast_classfile::{Constant, CpIndex, ExceptionEntry};

use crate::diagnostics::DiagnosticKind;
use crate::encoder::Encoder;
use crate::model::{
    CodeBlock, ExceptionHandler, FrameState, FrameType, LineEntry, LocalVariable, MethodKind,
    PoolConstant, PoolRef, TypeDescriptor,
};
use crate::options::{EmitOptions, TargetVersion};
use crate::problem::problem_text;
use crate::test_utils::{bare_options, class, emit_dump, emit_with, field, method, parse};

fn with_body(access: u16, name: &str, descriptor: &str, body: CodeBlock) -> TypeDescriptor {
    let mut ty = class("a/B");
    let mut m = method(access, name, descriptor);
    m.body = Some(body);
    ty.methods.push(m);
    ty
}

fn nops(len: usize) -> Vec<u8> {
    let mut code = vec![0; len];
    code.push(0xB1);
    code
}

/// The message a placeholder body throws, read back through its `ldc`.
fn thrown_text(class: &roast_classfile::ClassFile, name: &str) -> String {
    let code = class.methods.iter().find(|m| m.name == name).unwrap();
    let code = code.code(&class.pool).unwrap().unwrap();
    assert_eq!(code.code[0], 0xBB, "placeholder starts with new");
    let index = match code.code[4] {
        0x12 => code.code[5] as u16,
        0x13 => u16::from_be_bytes([code.code[5], code.code[6]]),
        op => panic!("expected ldc, found {op:#04x}"),
    };
    class.pool.string(CpIndex(index)).unwrap().to_string()
}

#[test]
fn handlers_are_flattened_per_range() {
    let body = CodeBlock {
        max_stack: 1,
        max_locals: 1,
        code: nops(10),
        exception_handlers: vec![
            ExceptionHandler {
                ranges: vec![0, 3, 5, 5, 6, 9],
                handler_pc: 10,
                catch_type: Some("java/lang/Exception".to_string()),
            },
            ExceptionHandler {
                ranges: vec![0, 9],
                handler_pc: 10,
                catch_type: None,
            },
        ],
        ..CodeBlock::default()
    };
    let emitted = emit_with(&with_body(ACC_PUBLIC, "m", "()V", body), bare_options());
    let class = parse(&emitted);
    let code = class.methods[0].code(&class.pool).unwrap().unwrap();

    let catch = code.exception_table[0].catch_type;
    assert_eq!(class.pool.class_name(catch).unwrap(), "java/lang/Exception");
    assert_eq!(
        code.exception_table,
        vec![
            ExceptionEntry {
                start_pc: 0,
                end_pc: 3,
                handler_pc: 10,
                catch_type: catch,
            },
            ExceptionEntry {
                start_pc: 6,
                end_pc: 9,
                handler_pc: 10,
                catch_type: catch,
            },
            ExceptionEntry {
                start_pc: 0,
                end_pc: 9,
                handler_pc: 10,
                catch_type: CpIndex::NONE,
            },
        ]
    );
    assert!(emitted.diagnostics.is_empty());
}

#[test]
fn unpaired_range_becomes_placeholder() {
    let body = CodeBlock {
        code: nops(4),
        exception_handlers: vec![ExceptionHandler {
            ranges: vec![0, 2, 3],
            handler_pc: 4,
            catch_type: None,
        }],
        ..CodeBlock::default()
    };
    let emitted = emit_with(&with_body(ACC_PUBLIC, "m", "(J)V", body), bare_options());

    assert_eq!(emitted.diagnostics.len(), 1);
    let diagnostic = &emitted.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::UnpairedExceptionRange);
    assert_eq!(diagnostic.member.as_deref(), Some("m(J)V"));
    assert!(emitted.has_errors());

    let class = parse(&emitted);
    assert_eq!(
        thrown_text(&class, "m"),
        problem_text(&["handler at 4 has 3 range bounds"])
    );
    let code = class.methods[0].code(&class.pool).unwrap().unwrap();
    assert_eq!((code.max_stack, code.max_locals), (3, 3));
    assert!(code.exception_table.is_empty());
}

#[test]
fn pool_operands_are_patched() {
    // ldc, getstatic, pop, return
    let body = CodeBlock {
        max_stack: 2,
        max_locals: 1,
        code: vec![0x12, 0, 0xB2, 0, 0, 0x57, 0xB1],
        pool_refs: vec![
            PoolRef {
                offset: 1,
                width: 1,
                constant: PoolConstant::Int(100_000),
            },
            PoolRef {
                offset: 3,
                width: 2,
                constant: PoolConstant::FieldRef {
                    owner: "java/lang/System".to_string(),
                    name: "out".to_string(),
                    descriptor: "Ljava/io/PrintStream;".to_string(),
                },
            },
        ],
        ..CodeBlock::default()
    };
    let emitted = emit_with(&with_body(ACC_PUBLIC, "m", "()V", body), bare_options());
    let class = parse(&emitted);
    let code = class.methods[0].code(&class.pool).unwrap().unwrap();

    assert_eq!(
        class.pool.get(CpIndex(code.code[1] as u16)),
        Some(&Constant::Integer(100_000))
    );
    let field = CpIndex(u16::from_be_bytes([code.code[3], code.code[4]]));
    assert_eq!(
        class.pool.member_ref(field).unwrap(),
        ("java/lang/System", "out", "Ljava/io/PrintStream;")
    );
    assert_eq!(code.code[5..], [0x57, 0xB1]);
}

#[test]
fn narrow_operand_past_index_255_becomes_placeholder() {
    let mut ty = with_body(
        ACC_PUBLIC,
        "m",
        "()V",
        CodeBlock {
            max_stack: 1,
            code: vec![0x12, 0, 0x57, 0xB1],
            pool_refs: vec![PoolRef {
                offset: 1,
                width: 1,
                constant: PoolConstant::Int(7),
            }],
            ..CodeBlock::default()
        },
    );
    for i in 0..300 {
        ty.fields.push(field(0, &format!("f{i}"), "I"));
    }

    let emitted = emit_with(&ty, bare_options());

    assert_eq!(
        emitted.diagnostics[0].kind,
        DiagnosticKind::ConstantIndexOverflow
    );
    let class = parse(&emitted);
    let code = class.methods[0].code(&class.pool).unwrap().unwrap();
    assert_eq!(code.code[0], 0xBB);
    assert_eq!(code.code[4], 0x13, "problem text needs ldc_w");
}

#[test]
fn operand_outside_code_becomes_placeholder() {
    let body = CodeBlock {
        code: vec![0xB1],
        pool_refs: vec![PoolRef {
            offset: 0,
            width: 2,
            constant: PoolConstant::Class("a/C".to_string()),
        }],
        ..CodeBlock::default()
    };
    let emitted = emit_with(&with_body(ACC_PUBLIC, "m", "()V", body), bare_options());

    assert_eq!(
        emitted.diagnostics[0].kind,
        DiagnosticKind::ConstantIndexOverflow
    );
}

#[test]
fn oversized_code_becomes_placeholder() {
    let body = CodeBlock {
        code: nops(70_000),
        ..CodeBlock::default()
    };
    let emitted = emit_with(&with_body(ACC_PUBLIC, "m", "()V", body), bare_options());

    assert_eq!(emitted.diagnostics[0].kind, DiagnosticKind::CodeTooLarge);
    let class = parse(&emitted);
    assert_eq!(
        thrown_text(&class, "m"),
        problem_text(&["70001 bytes of code (max 65535)"])
    );
}

#[test]
fn debug_tables() {
    let body = CodeBlock {
        max_stack: 0,
        max_locals: 2,
        code: vec![0xB1],
        lines: vec![LineEntry { pc: 0, line: 7 }],
        local_variables: vec![
            LocalVariable {
                slot: 0,
                name: "this".to_string(),
                descriptor: "La/B;".to_string(),
                signature: None,
                ranges: vec![(0, 1)],
            },
            LocalVariable {
                slot: 1,
                name: "xs".to_string(),
                descriptor: "Ljava/util/List;".to_string(),
                signature: Some("Ljava/util/List<Ljava/lang/String;>;".to_string()),
                ranges: vec![(0, 1), (1, 1)],
            },
        ],
        ..CodeBlock::default()
    };
    let ty = with_body(ACC_PUBLIC, "m", "(Ljava/util/List;)V", body);
    let options = bare_options().line_numbers(true).local_variables(true);

    insta::assert_snapshot!(emit_dump(&ty, options), @r"
    [class]
    version 52.0
    name a/B
    flags 0x0021
    super java/lang/Object

    [fields]

    [methods]
    0x0001 m (Ljava/util/List;)V
      Code stack=0 locals=2 length=1
        bytes b1
        LineNumberTable 0:7
        LocalVariableTable
          0 this La/B; 0+1
          1 xs Ljava/util/List; 0+1
        LocalVariableTypeTable
          1 xs Ljava/util/List<Ljava/lang/String;>; 0+1

    [attributes]
    ");
}

#[test]
fn type_table_needs_generics() {
    let body = CodeBlock {
        code: vec![0xB1],
        local_variables: vec![LocalVariable {
            slot: 0,
            name: "xs".to_string(),
            descriptor: "Ljava/util/List;".to_string(),
            signature: Some("Ljava/util/List<*>;".to_string()),
            ranges: vec![(0, 1)],
        }],
        ..CodeBlock::default()
    };
    let ty = with_body(ACC_PUBLIC | ACC_STATIC, "m", "(Ljava/util/List;)V", body);
    let options = bare_options()
        .local_variables(true)
        .target(TargetVersion::Jdk1_4);

    let class = parse(&emit_with(&ty, options));
    let code = class.methods[0].code(&class.pool).unwrap().unwrap();

    assert!(code.attribute(attr::LOCAL_VARIABLE_TABLE).is_some());
    assert!(code.attribute(attr::LOCAL_VARIABLE_TYPE_TABLE).is_none());
}

#[test]
fn empty_tables_are_omitted() {
    let body = CodeBlock {
        code: vec![0xB1],
        local_variables: vec![LocalVariable {
            slot: 0,
            name: "dead".to_string(),
            descriptor: "I".to_string(),
            signature: None,
            ranges: vec![(1, 1)],
        }],
        ..CodeBlock::default()
    };
    let ty = with_body(ACC_STATIC, "m", "()V", body);

    let class = parse(&emit_with(&ty, EmitOptions::new()));
    let code = class.methods[0].code(&class.pool).unwrap().unwrap();

    assert!(code.attributes.is_empty());
}

#[test]
fn stack_map_table() {
    let body = CodeBlock {
        max_stack: 1,
        max_locals: 3,
        code: nops(9),
        frames: vec![
            FrameState {
                offset: 3,
                locals: vec![FrameType::object("a/B"), FrameType::Integer],
                stack: vec![],
            },
            FrameState {
                offset: 8,
                locals: vec![
                    FrameType::object("a/B"),
                    FrameType::Integer,
                    FrameType::object("java/lang/String"),
                ],
                stack: vec![],
            },
        ],
        ..CodeBlock::default()
    };
    let ty = with_body(ACC_PUBLIC, "m", "(I)V", body);

    insta::assert_snapshot!(emit_dump(&ty, bare_options().stack_maps(true)), @r"
    [class]
    version 52.0
    name a/B
    flags 0x0021
    super java/lang/Object

    [fields]

    [methods]
    0x0001 m (I)V
      Code stack=1 locals=3 length=10
        bytes 00 00 00 00 00 00 00 00 00 b1
        StackMapTable
          same delta=3
          append delta=4 locals=[java/lang/String]

    [attributes]
    ");
}

#[test]
fn stack_maps_need_frames_and_target() {
    let frame = FrameState {
        offset: 1,
        locals: vec![],
        stack: vec![],
    };
    let framed = CodeBlock {
        code: nops(1),
        frames: vec![frame],
        ..CodeBlock::default()
    };
    let ty = with_body(ACC_STATIC, "m", "()V", framed);
    let old = bare_options()
        .stack_maps(true)
        .target(TargetVersion::Jdk1_5);
    let class = parse(&emit_with(&ty, old));
    let code = class.methods[0].code(&class.pool).unwrap().unwrap();
    assert!(code.attribute(attr::STACK_MAP_TABLE).is_none());

    let plain = with_body(ACC_STATIC, "m", "()V", crate::test_utils::return_body(0, 0));
    let class = parse(&emit_with(&plain, bare_options().stack_maps(true)));
    let code = class.methods[0].code(&class.pool).unwrap().unwrap();
    assert!(code.attribute(attr::STACK_MAP_TABLE).is_none());
    // No frames means the attribute name is never interned either
    let named = Constant::Utf8(attr::STACK_MAP_TABLE.to_string());
    assert!(class.pool.iter().all(|(_, c)| *c != named));
}

#[test]
fn class_initializer_has_no_receiver() {
    let body = CodeBlock {
        code: nops(2),
        frames: vec![FrameState {
            offset: 2,
            locals: vec![],
            stack: vec![],
        }],
        ..CodeBlock::default()
    };
    // Flags are forced to static regardless of what the front end set
    let ty = with_body(ACC_PUBLIC, "<clinit>", "()V", body);
    let class = parse(&emit_with(&ty, bare_options().stack_maps(true)));

    let clinit = &class.methods[0];
    assert_eq!(clinit.access_flags, ACC_STATIC);
    let code = clinit.code(&class.pool).unwrap().unwrap();
    let table = code.attribute(attr::STACK_MAP_TABLE).unwrap();
    assert_eq!(
        roast_classfile::StackMapFrame::read_table(&table.info),
        Some(vec![roast_classfile::StackMapFrame::Same { offset_delta: 2 }])
    );
}

#[test]
fn misordered_frames_become_placeholder() {
    let frame = |offset| FrameState {
        offset,
        locals: vec![],
        stack: vec![],
    };
    let body = CodeBlock {
        code: nops(6),
        frames: vec![frame(5), frame(2)],
        ..CodeBlock::default()
    };
    let ty = with_body(ACC_STATIC, "m", "()V", body);

    let emitted = emit_with(&ty, bare_options().stack_maps(true));

    assert_eq!(emitted.diagnostics[0].kind, DiagnosticKind::FrameOrder);
    let class = parse(&emitted);
    let code = class.methods[0].code(&class.pool).unwrap().unwrap();
    assert!(code.attribute(attr::STACK_MAP_TABLE).is_none());
}

#[test]
fn synthetic_bodies_skip_line_numbers() {
    let mut ty = class("a/B");
    let mut m = method(ACC_STATIC, "access$0", "()V");
    m.kind = MethodKind::Synthetic;
    m.body = Some(CodeBlock {
        code: vec![0xB1],
        lines: vec![LineEntry { pc: 0, line: 3 }],
        ..CodeBlock::default()
    });
    ty.methods.push(m);

    let class = parse(&emit_with(&ty, EmitOptions::new()));
    let member = &class.methods[0];
    let code = member.code(&class.pool).unwrap().unwrap();

    assert!(code.line_numbers().is_none());
    assert_eq!(member.access_flags, ACC_STATIC | 0x1000);
}

#[test]
fn unresolved_attribute_leaves_no_bytes() {
    let mut enc = Encoder::new(EmitOptions::new());
    let mut list = enc.begin_attributes();

    enc.exceptions_attribute(
        &mut list,
        &[Some("java/io/IOException".to_string()), None],
    )
    .unwrap();
    enc.end_attributes(list);

    assert_eq!(enc.body.as_slice(), &[0, 0]);
    assert_eq!(enc.diagnostics.len(), 1);
    assert_eq!(enc.diagnostics[0].kind, DiagnosticKind::AttributeSkipped);
    assert!(enc.diagnostics[0].is_warning());
}

#[test]
fn committed_attribute_is_counted() {
    let mut enc = Encoder::new(EmitOptions::new());
    let mut list = enc.begin_attributes();
    enc.exceptions_attribute(&mut list, &[Some("java/io/IOException".to_string())])
        .unwrap();
    enc.end_attributes(list);

    // #1 "Exceptions", #3 the IOException class
    let bytes = enc.body.as_slice();
    assert_eq!(&bytes[..2], &[0, 1]);
    assert_eq!(&bytes[2..8], &[0, 1, 0, 0, 0, 4]);
    assert_eq!(&bytes[8..], &[0, 1, 0, 3]);
}
