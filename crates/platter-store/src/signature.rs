//! Canonical argument signatures.
//!
//! Two calls with structurally equal argument lists must land on the same
//! cache slot, so the signature is a canonical JSON rendering of the
//! argument list: array order is preserved, object keys are sorted
//! recursively. Key order in caller-supplied objects never matters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical, order-preserving encoding of a call's argument list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgSignature(String);

impl ArgSignature {
    /// Sign an argument list.
    pub fn of(args: &[Value]) -> Self {
        let mut out = String::from("[");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_canonical(arg, &mut out);
        }
        out.push(']');
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArgSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_escaped(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(fields) => {
            let mut keys: Vec<&String> = fields.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(key, out);
                out.push(':');
                write_canonical(&fields[key], out);
            }
            out.push('}');
        }
    }
}

fn write_escaped(text: &str, out: &mut String) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_argument_lists_collide() {
        let a = ArgSignature::of(&[json!(1), json!("x")]);
        let b = ArgSignature::of(&[json!(1), json!("x")]);
        assert_eq!(a, b);
    }

    #[test]
    fn different_arguments_do_not_collide() {
        let a = ArgSignature::of(&[json!(1)]);
        let b = ArgSignature::of(&[json!(2)]);
        assert_ne!(a, b);
    }

    #[test]
    fn argument_order_is_preserved() {
        let a = ArgSignature::of(&[json!(1), json!(2)]);
        let b = ArgSignature::of(&[json!(2), json!(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn object_key_order_is_canonicalized() {
        let a = ArgSignature::of(&[json!({"a": 1, "b": 2})]);
        let b = ArgSignature::of(&[json!({"b": 2, "a": 1})]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), r#"[{"a":1,"b":2}]"#);
    }

    #[test]
    fn nested_objects_are_canonicalized_too() {
        let a = ArgSignature::of(&[json!([{"z": {"b": 1, "a": 2}}])]);
        let b = ArgSignature::of(&[json!([{"z": {"a": 2, "b": 1}}])]);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_argument_list_has_a_signature() {
        assert_eq!(ArgSignature::of(&[]).as_str(), "[]");
    }

    #[test]
    fn strings_are_escaped() {
        let sig = ArgSignature::of(&[json!("a\"b\\c\n")]);
        assert_eq!(sig.as_str(), r#"["a\"b\\c\n"]"#);
    }
}
