use std::fmt::Write;

use crate::chunk::Chunk;
use crate::opcode::OpCode;
use crate::value::Constant;

/// Renders a chunk as a human-readable listing, one instruction per line.
/// Used by `reyna-driver`'s `--check`/trace logging and by tests that want
/// to assert on emitted shape without hand-decoding bytes.
pub fn disassemble(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");
    let mut offset = 0;
    while offset < chunk.code.len() {
        offset = disassemble_instruction(chunk, offset, &mut out);
    }
    out
}

fn disassemble_instruction(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let line = chunk.line_at(offset);
    let _ = write!(out, "{offset:04} {line:4} ");
    let op = match OpCode::try_from(chunk.code[offset]) {
        Ok(op) => op,
        Err(_) => {
            let _ = writeln!(out, "UNKNOWN {:02x}", chunk.code[offset]);
            return offset + 1;
        }
    };
    match op {
        OpCode::Closure => {
            let k = chunk.code[offset + 1];
            let constant = &chunk.constants[k as usize];
            let _ = writeln!(out, "{op:?} const[{k}] = {}", describe_constant(constant));
            let upvalue_count = match constant {
                Constant::Function(proto) => proto.upvalues.len(),
                _ => 0,
            };
            offset + 2 + upvalue_count * 2
        }
        OpCode::Constant | OpCode::GetGlobal | OpCode::DefineGlobal | OpCode::SetGlobal | OpCode::GetField
        | OpCode::SetField | OpCode::Struct | OpCode::Class | OpCode::Method | OpCode::GetSuper => {
            let k = chunk.code[offset + 1];
            let _ = writeln!(out, "{op:?} const[{k}] = {}", describe_constant(&chunk.constants[k as usize]));
            offset + 2
        }
        OpCode::GetLocal | OpCode::SetLocal | OpCode::GetUpvalue | OpCode::SetUpvalue | OpCode::Call
        | OpCode::BuildArray => {
            let operand = chunk.code[offset + 1];
            let _ = writeln!(out, "{op:?} {operand}");
            offset + 2
        }
        OpCode::Jump | OpCode::JumpIfFalse | OpCode::Loop | OpCode::TryBegin => {
            let target = chunk.read_u16(offset + 1);
            let _ = writeln!(out, "{op:?} {target}");
            offset + 3
        }
        _ => {
            let _ = writeln!(out, "{op:?}");
            offset + 1
        }
    }
}

fn describe_constant(c: &Constant) -> String {
    match c {
        Constant::Int64(n) => n.to_string(),
        Constant::Float64(n) => n.to_string(),
        Constant::Str(sym) => format!("<sym {}>", sym.as_u32()),
        Constant::Function(proto) => format!("<fn {}>", proto.name.as_u32()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disassembles_a_simple_arithmetic_chunk() {
        let mut chunk = Chunk::new();
        chunk.add_constant(Constant::Int64(1));
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_byte(0, 1);
        chunk.write_op(OpCode::Return, 1);
        let text = disassemble(&chunk, "test");
        assert!(text.contains("Constant const[0] = 1"));
        assert!(text.contains("Return"));
    }
}
