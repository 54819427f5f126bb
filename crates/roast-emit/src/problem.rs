//! Placeholder bodies for members that failed to compile.
//!
//! A broken member is still emitted, with a body that throws
//! `java.lang.Error` carrying the compilation problems as its message. The
//! class stays loadable and the failure surfaces when the member runs.

use roast_classfile::constants::opcode;

use super::constant_pool::{ConstantPool, PoolError};
use super::model::{CodeBlock, LineEntry};

pub const ERROR_CLASS: &str = "java/lang/Error";
const ERROR_INIT_DESCRIPTOR: &str = "(Ljava/lang/String;)V";

/// Header line for `count` problems.
pub fn problem_header(count: usize) -> &'static str {
    if count > 1 {
        "Unresolved compilation problems: \n"
    } else {
        "Unresolved compilation problem: \n"
    }
}

/// Message thrown by a placeholder body: the header, then one tab-indented
/// line per problem.
pub fn problem_text<S: AsRef<str>>(messages: &[S]) -> String {
    let mut text = problem_header(messages.len()).to_string();
    for message in messages {
        text.push('\t');
        text.push_str(message.as_ref());
        text.push('\n');
    }
    text
}

/// Build the placeholder body:
///
/// ```text
/// new java/lang/Error
/// dup
/// ldc "<text>"
/// invokespecial java/lang/Error.<init>(Ljava/lang/String;)V
/// athrow
/// ```
///
/// Pool indices are resolved here, so `ldc` or `ldc_w` is picked by the
/// text's index. When `text` is too long for the pool, the header line of
/// `problem_count` problems is thrown instead. A `line` of 0 means unknown.
pub fn stub_code(
    pool: &mut ConstantPool,
    text: &str,
    problem_count: usize,
    max_locals: u16,
    line: u16,
) -> Result<CodeBlock, PoolError> {
    let message = match pool.string(text) {
        Ok(index) => index,
        Err(PoolError::StringTooLong { len }) => {
            log::debug!("placeholder text of {len} bytes replaced by its header");
            pool.string(problem_header(problem_count))?
        }
        Err(e) => return Err(e),
    };
    let error = pool.class(ERROR_CLASS)?;
    let init = pool.method_ref(ERROR_CLASS, "<init>", ERROR_INIT_DESCRIPTOR)?;

    let mut code = Vec::with_capacity(12);
    code.push(opcode::NEW);
    code.extend_from_slice(&error.to_be_bytes());
    code.push(opcode::DUP);
    match u8::try_from(message.get()) {
        Ok(index) => code.extend_from_slice(&[opcode::LDC, index]),
        Err(_) => {
            code.push(opcode::LDC_W);
            code.extend_from_slice(&message.to_be_bytes());
        }
    }
    code.push(opcode::INVOKESPECIAL);
    code.extend_from_slice(&init.to_be_bytes());
    code.push(opcode::ATHROW);

    Ok(CodeBlock {
        max_stack: 3,
        max_locals,
        code,
        lines: if line > 0 {
            vec![LineEntry { pc: 0, line }]
        } else {
            Vec::new()
        },
        ..CodeBlock::default()
    })
}
