use crate::cons::Cons;
use crate::error::{BridgeError, BridgeResult};
use crate::value::Value;

/// Renders `value` as wire text.
///
/// `false` and `Nil` share the `NIL` atom. Floats always go out as
/// double-float tokens (`1.5d0`).
pub fn to_wire(value: &Value) -> BridgeResult<String> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) -> BridgeResult<()> {
    match value {
        Value::Nil | Value::Bool(false) => out.push_str("NIL"),
        Value::Bool(true) => out.push('T'),
        Value::Integer(n) => out.push_str(&n.to_string()),
        Value::Float(v) => out.push_str(&float_token(*v)?),
        Value::Complex(c) => {
            out.push_str("#C(");
            out.push_str(&float_token(c.re)?);
            out.push(' ');
            out.push_str(&float_token(c.im)?);
            out.push(')');
        }
        Value::Ratio(r) => {
            let r = r.reduced();
            out.push_str(&r.numer().to_string());
            out.push('/');
            out.push_str(&r.denom().to_string());
        }
        Value::String(text) => write_string(out, text),
        Value::Verbatim(text) | Value::Symbol(text) => out.push_str(text),
        Value::Vector(items) => {
            out.push_str("#(");
            write_sequence(out, items)?;
            out.push(')');
        }
        Value::Tuple(items) => {
            out.push('(');
            write_sequence(out, items)?;
            out.push(')');
        }
        Value::HashTable(table) => {
            out.push_str("#{");
            for (idx, (key, value)) in table.iter().enumerate() {
                if idx > 0 {
                    out.push(' ');
                }
                write_value(out, key)?;
                out.push(' ');
                write_value(out, value)?;
            }
            out.push('}');
        }
        Value::Cons(cell) => write_cons(out, cell)?,
        Value::Handle(handle) => {
            out.push('#');
            out.push_str(&handle.id().to_string());
            out.push('?');
        }
    }
    Ok(())
}

fn write_sequence(out: &mut String, items: &[Value]) -> BridgeResult<()> {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        write_value(out, item)?;
    }
    Ok(())
}

fn write_cons(out: &mut String, cell: &Cons) -> BridgeResult<()> {
    out.push('(');
    let mut iter = cell.iter();
    for (idx, item) in iter.by_ref().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        write_value(out, item)?;
    }
    if let Some(tail) = iter.terminator().filter(|tail| !tail.is_nil()) {
        out.push_str(" . ");
        write_value(out, tail)?;
    }
    out.push(')');
    Ok(())
}

fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
}

fn float_token(value: f64) -> BridgeResult<String> {
    if !value.is_finite() {
        return Err(BridgeError::unsupported(format!(
            "float {value} has no wire form"
        )));
    }
    Ok(format!("{value:e}").replacen('e', "d", 1))
}
