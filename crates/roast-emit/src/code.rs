//! Code attribute encoding.
//!
//! One routine completes every kind of body (ordinary methods, class
//! initializers, synthetic methods and placeholder stubs). The kind only
//! selects which debug tables are written and whether a receiver is assumed.

use roast_classfile::constants::{MAX_CODE_LEN, MAX_U2, attr};

use super::diagnostics::DiagnosticKind;
use super::encoder::{AttributeList, Encoder};
use super::error::Failure;
use super::frames;
use super::model::{CodeBlock, LineEntry, LocalVariable};

/// Which kind of body a Code attribute holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CodeKind {
    Normal,
    /// `<clinit>`: never has a receiver, whatever its flags say
    ClassInit,
    /// Compiler-generated: no source lines or variable names
    Synthetic,
    /// Placeholder stub: straight-line code, no frames, no variables
    Problem,
}

impl CodeKind {
    fn writes_lines(self) -> bool {
        !matches!(self, Self::Synthetic)
    }

    fn writes_local_variables(self) -> bool {
        matches!(self, Self::Normal | Self::ClassInit)
    }

    fn writes_frames(self) -> bool {
        !matches!(self, Self::Problem)
    }
}

/// The method a body belongs to.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CodeTarget<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
    pub is_static: bool,
    pub kind: CodeKind,
}

impl CodeTarget<'_> {
    fn has_receiver(&self) -> bool {
        !self.is_static && self.kind != CodeKind::ClassInit
    }
}

/// Resolved exception_table row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct HandlerEntry {
    start: u16,
    end: u16,
    handler: u16,
    catch_type: u16,
}

impl Encoder {
    pub fn code_attribute(
        &mut self,
        list: &mut AttributeList,
        target: &CodeTarget<'_>,
        block: &CodeBlock,
    ) -> Result<(), Failure> {
        if block.code.len() > MAX_CODE_LEN {
            return Err(Failure::member(
                DiagnosticKind::CodeTooLarge,
                format!("{} bytes of code (max 65535)", block.code.len()),
            ));
        }
        let code = self.patch_pool_refs(block)?;
        let handlers = self.exception_table(block)?;

        self.attribute(list, attr::CODE, |enc| {
            enc.body.u2(block.max_stack);
            enc.body.u2(block.max_locals);
            enc.body.u4(code.len() as u32);
            enc.body.bytes(&code);

            enc.body.u2(handlers.len() as u16);
            for h in &handlers {
                enc.body.u2(h.start);
                enc.body.u2(h.end);
                enc.body.u2(h.handler);
                enc.body.u2(h.catch_type);
            }

            let mut nested = enc.begin_attributes();
            if enc.options.line_numbers && target.kind.writes_lines() {
                enc.line_number_table(&mut nested, &block.lines)?;
            }
            if enc.options.local_variables && target.kind.writes_local_variables() {
                enc.local_variable_tables(&mut nested, &block.local_variables)?;
            }
            if enc.options.writes_stack_maps() && target.kind.writes_frames() {
                enc.stack_map_table(&mut nested, target, block)?;
            }
            enc.end_attributes(nested);
            log::trace!(
                "code {}{}: {} bytes, {} handlers",
                target.name,
                target.descriptor,
                code.len(),
                handlers.len()
            );
            Ok(true)
        })
    }

    /// Copy the instruction bytes with every pool operand filled in.
    fn patch_pool_refs(&mut self, block: &CodeBlock) -> Result<Vec<u8>, Failure> {
        let mut code = block.code.clone();
        for r in &block.pool_refs {
            let index = self.pool.constant(&r.constant)?;
            let at = r.offset as usize;
            let overflow =
                |message: String| Failure::member(DiagnosticKind::ConstantIndexOverflow, message);
            match (r.width, code.get_mut(at..at + r.width as usize)) {
                (1, Some(operand)) => {
                    let Ok(narrow) = u8::try_from(index.get()) else {
                        return Err(overflow(format!(
                            "constant {index} at offset {at} needs a wide operand"
                        )));
                    };
                    operand[0] = narrow;
                }
                (2, Some(operand)) => operand.copy_from_slice(&index.to_be_bytes()),
                (width, _) => {
                    return Err(overflow(format!(
                        "no {width}-byte operand at offset {at} for constant {index}"
                    )));
                }
            }
        }
        Ok(code)
    }

    /// Flatten handlers into exception_table rows, skipping empty ranges.
    fn exception_table(&mut self, block: &CodeBlock) -> Result<Vec<HandlerEntry>, Failure> {
        let mut rows = Vec::new();
        for handler in &block.exception_handlers {
            if handler.ranges.len() % 2 != 0 {
                return Err(Failure::member(
                    DiagnosticKind::UnpairedExceptionRange,
                    format!(
                        "handler at {} has {} range bounds",
                        handler.handler_pc,
                        handler.ranges.len()
                    ),
                ));
            }
            let catch_type = match &handler.catch_type {
                Some(name) => self.pool.class(name)?.get(),
                None => 0,
            };
            for pair in handler.ranges.chunks_exact(2) {
                let (start, end) = (pair[0], pair[1]);
                if start == end {
                    continue;
                }
                rows.push(HandlerEntry {
                    start,
                    end,
                    handler: handler.handler_pc,
                    catch_type,
                });
            }
        }
        if rows.len() > MAX_U2 {
            return Err(Failure::member(
                DiagnosticKind::TooManyExceptionHandlers,
                format!("{} exception table entries (max 65535)", rows.len()),
            ));
        }
        Ok(rows)
    }

    fn line_number_table(
        &mut self,
        list: &mut AttributeList,
        lines: &[LineEntry],
    ) -> Result<(), Failure> {
        if lines.is_empty() {
            return Ok(());
        }
        if lines.len() > MAX_U2 {
            return Err(Failure::member(
                DiagnosticKind::TooManyLineEntries,
                format!("{} line number entries (max 65535)", lines.len()),
            ));
        }
        self.attribute(list, attr::LINE_NUMBER_TABLE, |enc| {
            enc.body.u2(lines.len() as u16);
            for entry in lines {
                enc.body.u2(entry.pc);
                enc.body.u2(entry.line);
            }
            Ok(true)
        })
    }

    /// LocalVariableTable, plus LocalVariableTypeTable for generic locals.
    fn local_variable_tables(
        &mut self,
        list: &mut AttributeList,
        locals: &[LocalVariable],
    ) -> Result<(), Failure> {
        let live = |v: &LocalVariable| v.ranges.iter().filter(|(s, e)| e > s).count();
        let total: usize = locals.iter().map(live).sum();
        if total == 0 {
            return Ok(());
        }
        if total > MAX_U2 {
            return Err(Failure::member(
                DiagnosticKind::TooManyLocalVariables,
                format!("{total} local variable entries (max 65535)"),
            ));
        }
        self.attribute(list, attr::LOCAL_VARIABLE_TABLE, |enc| {
            enc.body.u2(total as u16);
            for v in locals {
                enc.local_variable_rows(v, &v.descriptor)?;
            }
            Ok(true)
        })?;

        let generic: Vec<&LocalVariable> = locals
            .iter()
            .filter(|v| v.signature.is_some() && live(*v) > 0)
            .collect();
        if generic.is_empty() || !self.options.generics() {
            return Ok(());
        }
        self.attribute(list, attr::LOCAL_VARIABLE_TYPE_TABLE, |enc| {
            enc.body.u2(generic.iter().map(|v| live(*v)).sum::<usize>() as u16);
            for v in &generic {
                if let Some(signature) = &v.signature {
                    enc.local_variable_rows(v, signature)?;
                }
            }
            Ok(true)
        })
    }

    fn local_variable_rows(&mut self, v: &LocalVariable, ty: &str) -> Result<(), Failure> {
        let name = self.pool.utf8(&v.name)?;
        let ty = self.pool.utf8(ty)?;
        for &(start, end) in &v.ranges {
            if end <= start {
                continue;
            }
            self.body.u2(start);
            self.body.u2(end - start);
            self.body.u2(name.get());
            self.body.u2(ty.get());
            self.body.u2(v.slot);
        }
        Ok(())
    }

    /// StackMapTable; dropped when the method has no frames.
    fn stack_map_table(
        &mut self,
        list: &mut AttributeList,
        target: &CodeTarget<'_>,
        block: &CodeBlock,
    ) -> Result<(), Failure> {
        if block.frames.is_empty() {
            return Ok(());
        }
        self.attribute(list, attr::STACK_MAP_TABLE, |enc| {
            let initial = frames::initial_locals(
                target.owner,
                target.name,
                target.descriptor,
                !target.has_receiver(),
            )
            .map_err(|e| Failure::member(DiagnosticKind::InvalidDescriptor, e.to_string()))?;
            let initial = frames::resolve_types(&initial, &mut enc.pool)?;
            let resolved = block
                .frames
                .iter()
                .map(|f| frames::resolve(f, &mut enc.pool))
                .collect::<Result<Vec<_>, _>>()?;
            let compressed = frames::compress(&initial, &resolved)
                .map_err(|e| Failure::member(DiagnosticKind::FrameOrder, e.to_string()))?;

            let mut payload = Vec::new();
            frames::write_table(&compressed, &mut payload);
            enc.body.bytes(&payload);
            Ok(!compressed.is_empty())
        })
    }
}
