//! Human-readable class file dump for debugging and snapshot tests.

use std::fmt::Write as _;

use super::constants::{attr, element_tag};
use super::frame::StackMapFrame;
use super::ids::CpIndex;
use super::reader::{
    Attribute, ClassFile, CodeAttribute, Constant, ConstantPoolView, Member, ReadError, Reader,
};
use super::verification::VerificationType;

/// Generate a human-readable dump of a decoded class file.
pub fn dump(class: &ClassFile) -> String {
    let mut out = String::new();
    let pool = &class.pool;

    writeln!(out, "[class]").unwrap();
    writeln!(out, "version {}.{}", class.major_version, class.minor_version).unwrap();
    writeln!(out, "name {}", class_name(pool, class.this_class)).unwrap();
    writeln!(out, "flags {:#06x}", class.access_flags).unwrap();
    if class.super_class.is_none() {
        writeln!(out, "super -").unwrap();
    } else {
        writeln!(out, "super {}", class_name(pool, class.super_class)).unwrap();
    }
    if !class.interfaces.is_empty() {
        let names: Vec<_> = class.interfaces.iter().map(|&i| class_name(pool, i)).collect();
        writeln!(out, "interfaces {}", names.join(", ")).unwrap();
    }
    out.push('\n');

    dump_members(&mut out, "fields", &class.fields, pool);
    dump_members(&mut out, "methods", &class.methods, pool);

    writeln!(out, "[attributes]").unwrap();
    for a in &class.attributes {
        dump_attribute(&mut out, a, pool, 0);
    }

    out
}

fn dump_members(out: &mut String, section: &str, members: &[Member], pool: &ConstantPoolView) {
    writeln!(out, "[{section}]").unwrap();
    for m in members {
        writeln!(out, "{:#06x} {} {}", m.access_flags, m.name, m.descriptor).unwrap();
        for a in &m.attributes {
            dump_attribute(out, a, pool, 1);
        }
    }
    out.push('\n');
}

fn class_name(pool: &ConstantPoolView, index: CpIndex) -> String {
    pool.class_name(index)
        .map(str::to_string)
        .unwrap_or_else(|_| format!("<bad {index}>"))
}

fn utf8(pool: &ConstantPoolView, index: CpIndex) -> String {
    pool.utf8(index)
        .map(str::to_string)
        .unwrap_or_else(|_| format!("<bad {index}>"))
}

fn constant_value(pool: &ConstantPoolView, index: CpIndex) -> String {
    match pool.get(index) {
        Some(Constant::Integer(v)) => format!("int {v}"),
        Some(Constant::Float(v)) => format!("float {v:?}"),
        Some(Constant::Long(v)) => format!("long {v}"),
        Some(Constant::Double(v)) => format!("double {v:?}"),
        Some(Constant::String(text)) => format!("string {:?}", utf8(pool, *text)),
        _ => format!("<bad {index}>"),
    }
}

fn hex(bytes: &[u8]) -> String {
    let parts: Vec<_> = bytes.iter().map(|b| format!("{b:02x}")).collect();
    parts.join(" ")
}

fn dump_attribute(out: &mut String, a: &Attribute, pool: &ConstantPoolView, depth: usize) {
    let pad = "  ".repeat(depth);
    let name = a.name.as_str();
    match name {
        attr::CONSTANT_VALUE => match a.u2() {
            Some(i) => writeln!(out, "{pad}{name} {}", constant_value(pool, CpIndex(i))).unwrap(),
            None => writeln!(out, "{pad}{name} <malformed>").unwrap(),
        },
        attr::SIGNATURE | attr::SOURCE_FILE => match a.u2() {
            Some(i) => writeln!(out, "{pad}{name} {}", utf8(pool, CpIndex(i))).unwrap(),
            None => writeln!(out, "{pad}{name} <malformed>").unwrap(),
        },
        attr::EXCEPTIONS => match a.u2_list() {
            Some(list) => {
                let names: Vec<_> = list.iter().map(|&i| class_name(pool, CpIndex(i))).collect();
                writeln!(out, "{pad}{name} {}", names.join(", ")).unwrap();
            }
            None => writeln!(out, "{pad}{name} <malformed>").unwrap(),
        },
        attr::CODE => match CodeAttribute::parse(&a.info, pool) {
            Ok(code) => dump_code(out, &code, pool, depth),
            Err(e) => writeln!(out, "{pad}{name} <{e}>").unwrap(),
        },
        attr::LINE_NUMBER_TABLE => match line_numbers(&a.info) {
            Ok(rows) => writeln!(out, "{pad}{name} {}", rows.join(" ")).unwrap(),
            Err(_) => writeln!(out, "{pad}{name} <malformed>").unwrap(),
        },
        attr::LOCAL_VARIABLE_TABLE | attr::LOCAL_VARIABLE_TYPE_TABLE => {
            writeln!(out, "{pad}{name}").unwrap();
            let mut r = Reader::new(&a.info);
            let Ok(n) = r.u2() else { return };
            for _ in 0..n {
                match local_variable(&mut r, pool) {
                    Ok(row) => writeln!(out, "{pad}  {row}").unwrap(),
                    Err(_) => return,
                }
            }
        }
        attr::STACK_MAP_TABLE => {
            writeln!(out, "{pad}{name}").unwrap();
            for frame in StackMapFrame::read_table(&a.info).unwrap_or_default() {
                writeln!(out, "{pad}  {}", format_frame(&frame, pool)).unwrap();
            }
        }
        attr::INNER_CLASSES => {
            writeln!(out, "{pad}{name}").unwrap();
            let mut r = Reader::new(&a.info);
            let Ok(n) = r.u2() else { return };
            for _ in 0..n {
                let (Ok(inner), Ok(outer), Ok(simple), Ok(flags)) = (r.u2(), r.u2(), r.u2(), r.u2())
                else {
                    return;
                };
                let outer = match outer {
                    0 => "-".to_string(),
                    i => class_name(pool, CpIndex(i)),
                };
                let simple = match simple {
                    0 => "-".to_string(),
                    i => utf8(pool, CpIndex(i)),
                };
                writeln!(
                    out,
                    "{pad}  {} outer={outer} name={simple} flags={flags:#06x}",
                    class_name(pool, CpIndex(inner))
                )
                .unwrap();
            }
        }
        attr::ENCLOSING_METHOD => {
            let mut r = Reader::new(&a.info);
            let (Ok(class), Ok(method)) = (r.u2(), r.u2()) else {
                writeln!(out, "{pad}{name} <malformed>").unwrap();
                return;
            };
            let owner = class_name(pool, CpIndex(class));
            match pool.name_and_type(CpIndex(method)) {
                Ok((m, d)) => writeln!(out, "{pad}{name} {owner} {m}{d}").unwrap(),
                Err(_) => writeln!(out, "{pad}{name} {owner}").unwrap(),
            }
        }
        attr::RUNTIME_VISIBLE_ANNOTATIONS | attr::RUNTIME_INVISIBLE_ANNOTATIONS => {
            writeln!(out, "{pad}{name}").unwrap();
            let mut r = Reader::new(&a.info);
            let Ok(n) = r.u2() else { return };
            for _ in 0..n {
                match annotation(&mut r, pool) {
                    Ok(text) => writeln!(out, "{pad}  {text}").unwrap(),
                    Err(_) => return,
                }
            }
        }
        attr::RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS
        | attr::RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS => {
            let mut r = Reader::new(&a.info);
            let Ok(params) = r.u1() else { return };
            writeln!(out, "{pad}{name} params={params}").unwrap();
            for p in 0..params {
                let Ok(n) = r.u2() else { return };
                for _ in 0..n {
                    match annotation(&mut r, pool) {
                        Ok(text) => writeln!(out, "{pad}  {p}: {text}").unwrap(),
                        Err(_) => return,
                    }
                }
            }
        }
        attr::ANNOTATION_DEFAULT => {
            let mut r = Reader::new(&a.info);
            match element_value(&mut r, pool) {
                Ok(v) => writeln!(out, "{pad}{name} {v}").unwrap(),
                Err(_) => writeln!(out, "{pad}{name} <malformed>").unwrap(),
            }
        }
        _ if a.info.is_empty() => writeln!(out, "{pad}{name}").unwrap(),
        _ => writeln!(out, "{pad}{name} ({} bytes)", a.info.len()).unwrap(),
    }
}

fn dump_code(out: &mut String, code: &CodeAttribute, pool: &ConstantPoolView, depth: usize) {
    let pad = "  ".repeat(depth);
    writeln!(
        out,
        "{pad}Code stack={} locals={} length={}",
        code.max_stack,
        code.max_locals,
        code.code.len()
    )
    .unwrap();
    if !code.code.is_empty() {
        writeln!(out, "{pad}  bytes {}", hex(&code.code)).unwrap();
    }
    for e in &code.exception_table {
        let catch = if e.catch_type.is_none() {
            "any".to_string()
        } else {
            class_name(pool, e.catch_type)
        };
        writeln!(
            out,
            "{pad}  handler {}..{} -> {} {catch}",
            e.start_pc, e.end_pc, e.handler_pc
        )
        .unwrap();
    }
    for a in &code.attributes {
        dump_attribute(out, a, pool, depth + 1);
    }
}

fn format_vtype(ty: VerificationType, pool: &ConstantPoolView) -> String {
    match ty {
        VerificationType::Top => "top".into(),
        VerificationType::Integer => "int".into(),
        VerificationType::Float => "float".into(),
        VerificationType::Long => "long".into(),
        VerificationType::Double => "double".into(),
        VerificationType::Null => "null".into(),
        VerificationType::UninitializedThis => "uninit_this".into(),
        VerificationType::Object(i) => class_name(pool, i),
        VerificationType::Uninitialized(offset) => format!("uninit@{offset}"),
    }
}

fn format_vtypes(types: &[VerificationType], pool: &ConstantPoolView) -> String {
    let parts: Vec<_> = types.iter().map(|&t| format_vtype(t, pool)).collect();
    format!("[{}]", parts.join(", "))
}

fn format_frame(frame: &StackMapFrame, pool: &ConstantPoolView) -> String {
    let head = format!("{} delta={}", frame.kind_name(), frame.offset_delta());
    match frame {
        StackMapFrame::Same { .. } => head,
        StackMapFrame::SameLocals1StackItem { stack, .. } => {
            format!("{head} stack={}", format_vtypes(&[*stack], pool))
        }
        StackMapFrame::Chop { k, .. } => format!("{head} k={k}"),
        StackMapFrame::Append { locals, .. } => {
            format!("{head} locals={}", format_vtypes(locals, pool))
        }
        StackMapFrame::Full { locals, stack, .. } => format!(
            "{head} locals={} stack={}",
            format_vtypes(locals, pool),
            format_vtypes(stack, pool)
        ),
    }
}

type Parsed = Result<String, ReadError>;

fn line_numbers(info: &[u8]) -> Result<Vec<String>, ReadError> {
    let mut r = Reader::new(info);
    let n = r.u2()?;
    let mut rows = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let pc = r.u2()?;
        let line = r.u2()?;
        rows.push(format!("{pc}:{line}"));
    }
    Ok(rows)
}

fn local_variable(r: &mut Reader<'_>, pool: &ConstantPoolView) -> Parsed {
    let start = r.u2()?;
    let len = r.u2()?;
    let var = utf8(pool, CpIndex(r.u2()?));
    let ty = utf8(pool, CpIndex(r.u2()?));
    let slot = r.u2()?;
    Ok(format!("{slot} {var} {ty} {start}+{len}"))
}

fn annotation(r: &mut Reader<'_>, pool: &ConstantPoolView) -> Parsed {
    let ty = utf8(pool, CpIndex(r.u2()?));
    let n = r.u2()?;
    if n == 0 {
        return Ok(format!("@{ty}"));
    }
    let mut pairs = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let name = utf8(pool, CpIndex(r.u2()?));
        pairs.push(format!("{name}={}", element_value(r, pool)?));
    }
    Ok(format!("@{ty}({})", pairs.join(", ")))
}

fn element_value(r: &mut Reader<'_>, pool: &ConstantPoolView) -> Parsed {
    let tag = r.u1()?;
    Ok(match tag {
        element_tag::BYTE
        | element_tag::CHAR
        | element_tag::INT
        | element_tag::SHORT
        | element_tag::BOOLEAN => match pool.get(CpIndex(r.u2()?)) {
            Some(Constant::Integer(v)) => format!("{v}"),
            _ => "<bad>".into(),
        },
        element_tag::LONG => match pool.get(CpIndex(r.u2()?)) {
            Some(Constant::Long(v)) => format!("{v}L"),
            _ => "<bad>".into(),
        },
        element_tag::FLOAT => match pool.get(CpIndex(r.u2()?)) {
            Some(Constant::Float(v)) => format!("{v:?}f"),
            _ => "<bad>".into(),
        },
        element_tag::DOUBLE => match pool.get(CpIndex(r.u2()?)) {
            Some(Constant::Double(v)) => format!("{v:?}"),
            _ => "<bad>".into(),
        },
        element_tag::STRING => format!("{:?}", utf8(pool, CpIndex(r.u2()?))),
        element_tag::ENUM => {
            let ty = utf8(pool, CpIndex(r.u2()?));
            let constant = utf8(pool, CpIndex(r.u2()?));
            format!("{ty}.{constant}")
        }
        element_tag::CLASS => format!("{}.class", utf8(pool, CpIndex(r.u2()?))),
        element_tag::ANNOTATION => annotation(r, pool)?,
        element_tag::ARRAY => {
            let n = r.u2()?;
            let items = (0..n)
                .map(|_| element_value(r, pool))
                .collect::<Result<Vec<_>, _>>()?;
            format!("[{}]", items.join(", "))
        }
        _ => format!("<tag {tag}>"),
    })
}
