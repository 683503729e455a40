//! Inspection and repr formatting.

use std::fmt::Write;

use super::Value;

/// Containers nested deeper than this print as `...`.
const MAX_DEPTH: usize = 64;

pub(super) fn inspect(value: &Value) -> String {
    match value {
        Value::Str(s) => s.to_string(),
        other => repr(other),
    }
}

pub(super) fn repr(value: &Value) -> String {
    let mut out = String::new();
    write_repr(&mut out, value, 0);
    out
}

fn write_repr(out: &mut String, value: &Value, depth: usize) {
    if depth > MAX_DEPTH {
        out.push_str("...");
        return;
    }
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Int(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Float(f) => out.push_str(&format_float(*f)),
        Value::Str(s) => quote_into(out, s),
        Value::List(items) => {
            let items = items.read();
            write_seq(out, "[", "]", &items, depth);
        }
        Value::Tuple(items) => {
            if items.len() == 1 {
                out.push('(');
                write_repr(out, &items[0], depth + 1);
                out.push_str(",)");
            } else {
                write_seq(out, "(", ")", items, depth);
            }
        }
        Value::Dict(map) => {
            out.push('{');
            for (i, (key, value)) in map.read().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                quote_into(out, key);
                out.push_str(": ");
                write_repr(out, value, depth + 1);
            }
            out.push('}');
        }
        Value::Instance(inst) => {
            let _ = write!(out, "<{} object>", inst.class().name());
        }
        Value::Class(class) => {
            let _ = write!(out, "<class '{}'>", class.name());
        }
        Value::Function(func) => {
            let _ = write!(out, "<function {}>", func.name());
        }
        Value::Builtin(builtin) => {
            let _ = write!(out, "<builtin function {}>", builtin.name());
        }
        Value::Error(err) => {
            let _ = write!(out, "ERROR: {}", err.message);
        }
        Value::BoundMethod(bound) => {
            let _ = write!(
                out,
                "<bound method {}.{}>",
                bound.receiver.type_name(),
                bound.method_name()
            );
        }
    }
}

fn write_seq(out: &mut String, open: &str, close: &str, items: &[Value], depth: usize) {
    out.push_str(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_repr(out, item, depth + 1);
    }
    out.push_str(close);
}

/// Single quotes unless the text holds a single quote and no double quote.
fn quote_into(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Float text in the shortest round-trip form.
///
/// Integral values keep a trailing `.0`; very large or small magnitudes use
/// exponent notation with a signed, two-digit exponent (`1e+20`, `1.5e-05`).
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{f:e}");
        let Some((mantissa, exponent)) = text.split_once('e') else {
            return text;
        };
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(rest) => ('-', rest),
            None => ('+', exponent),
        };
        return format!("{mantissa}e{sign}{digits:0>2}");
    }
    if f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}
