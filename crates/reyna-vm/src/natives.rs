//! The standard library surface (§6): a fixed set of natives bound into
//! `globals` at startup, grounded on `examples/original_source/src/
//! stdlib.py`'s `register_stdlib`. `python(code)` is the one exception -
//! it is never installed by [`NativeRegistry::install_default`]; a host
//! opts in explicitly via [`NativeRegistry::register_sandbox_escape`]
//! (SPEC_FULL.md §2).

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::object::NativeFn;
use crate::value::Value;
use crate::vm::Vm;

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).copied().unwrap_or(Value::Nil)
}

fn clock(vm: &mut Vm, _args: &[Value]) -> Result<Value> {
    let _ = vm;
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64();
    Ok(Value::Float(secs))
}

fn input(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let prompt = if args.is_empty() { String::new() } else { vm.stringify(arg(args, 0)) };
    let line = vm.read_line(&prompt).unwrap_or_default();
    vm.alloc_string(line)
}

fn read_file(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return vm.alloc_string("Error: path required".to_string());
    }
    let path = vm.stringify(arg(args, 0));
    let text = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => format!("Error: {e}"),
    };
    vm.alloc_string(text)
}

fn write_file(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    if args.len() < 2 {
        return Ok(Value::Bool(false));
    }
    let path = vm.stringify(arg(args, 0));
    let content = vm.stringify(arg(args, 1));
    Ok(Value::Bool(std::fs::write(&path, content).is_ok()))
}

fn str_conv(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    let s = if args.is_empty() { String::new() } else { vm.stringify(arg(args, 0)) };
    vm.alloc_string(s)
}

fn int_conv(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Ok(Value::Int(0));
    }
    let v = arg(args, 0);
    let n = match v {
        Value::Int(n) => n,
        Value::Float(f) => f as i64,
        _ => vm.stringify(v).trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
    };
    Ok(Value::Int(n))
}

fn float_conv(vm: &mut Vm, args: &[Value]) -> Result<Value> {
    if args.is_empty() {
        return Ok(Value::Float(0.0));
    }
    let v = arg(args, 0);
    let f = match v {
        Value::Int(n) => n as f64,
        Value::Float(f) => f,
        _ => vm.stringify(v).trim().parse::<f64>().unwrap_or(0.0),
    };
    Ok(Value::Float(f))
}

/// Installs the stdlib natives into a freshly-constructed [`Vm`]. Mirrors
/// `stdlib.py`'s `register_stdlib`, minus `python` (see module docs).
pub struct NativeRegistry;

impl NativeRegistry {
    pub fn install_default(vm: &mut Vm) -> Result<()> {
        vm.define_native("clock", clock)?;
        vm.define_native("input", input)?;
        vm.define_native("read_file", read_file)?;
        vm.define_native("write_file", write_file)?;
        vm.define_native("str", str_conv)?;
        vm.define_native("int", int_conv)?;
        vm.define_native("float", float_conv)?;
        Ok(())
    }

    /// Opts a host into the `python(code)` escape hatch under the name
    /// `func` is registered as. The default `reyna-driver` binary never
    /// calls this - a program calling `python(...)` against the default
    /// registry hits an ordinary "undefined variable" error instead.
    pub fn register_sandbox_escape(vm: &mut Vm, name: &str, func: NativeFn) -> Result<()> {
        vm.define_native(name, func)
    }
}
