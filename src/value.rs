use crate::statics;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Largest magnitude at which every integer is exactly representable as `f64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Represents a number that keeps the integer/float distinction of the source text,
/// so untouched fields are written back the way they were read.
#[derive(Debug, Clone, Copy)]
pub enum PackNumber {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl PackNumber {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PackNumber::I64(v) => Some(*v),
            PackNumber::U64(v) => i64::try_from(*v).ok(),
            PackNumber::F64(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            PackNumber::I64(v) => *v as f64,
            PackNumber::U64(v) => *v as f64,
            PackNumber::F64(v) => *v,
        }
    }

    fn write(&self, out: &mut String) {
        match self {
            PackNumber::I64(v) => out.push_str(&v.to_string()),
            PackNumber::U64(v) => out.push_str(&v.to_string()),
            PackNumber::F64(v) => {
                if v.is_nan() {
                    out.push_str("NaN");
                } else if v.is_infinite() {
                    if v.is_sign_negative() {
                        out.push_str("-Infinity");
                    } else {
                        out.push_str("Infinity");
                    }
                } else {
                    let mut buf = ryu::Buffer::new();
                    out.push_str(buf.format(*v));
                }
            }
        }
    }
}

// Numeric equality: the parser may hand back a positive integer as either I64 or U64,
// and `5` and `5.0` denote the same value.
impl PartialEq for PackNumber {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PackNumber::F64(_), _) | (_, PackNumber::F64(_)) => self.as_f64() == other.as_f64(),
            (PackNumber::U64(a), PackNumber::U64(b)) => a == b,
            (a, b) => match (a.as_i64(), b.as_i64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl Serialize for PackNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PackNumber::I64(v) => serializer.serialize_i64(*v),
            PackNumber::U64(v) => serializer.serialize_u64(*v),
            PackNumber::F64(v) => serializer.serialize_f64(*v),
        }
    }
}

/// A JSON document node. Objects keep their key order.
#[derive(Debug, Clone, PartialEq)]
pub enum PackValue {
    Null,
    Bool(bool),
    Number(PackNumber),
    String(String),
    Array(Vec<PackValue>),
    Object(IndexMap<String, PackValue>),
}

impl PackValue {
    pub fn int(v: i64) -> Self {
        PackValue::Number(PackNumber::I64(v))
    }

    /// Writes integral reals as integers (`5` rather than `5.0`).
    pub fn real(v: f64) -> Self {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < MAX_EXACT_INT {
            PackValue::Number(PackNumber::I64(v as i64))
        } else {
            PackValue::Number(PackNumber::F64(v))
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, PackValue>> {
        match self {
            PackValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, PackValue>> {
        match self {
            PackValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PackValue]> {
        match self {
            PackValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PackValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PackValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view; floats with no fractional part count too (`12.0`).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PackValue::Number(PackNumber::F64(v))
                if v.is_finite() && v.fract() == 0.0 && v.abs() < MAX_EXACT_INT =>
            {
                Some(*v as i64)
            }
            PackValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PackValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&PackValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PackValue> {
        self.as_object_mut().and_then(|m| m.get_mut(key))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PackValue::Null => "null",
            PackValue::Bool(_) => "bool",
            PackValue::Number(_) => "number",
            PackValue::String(_) => "string",
            PackValue::Array(_) => "array",
            PackValue::Object(_) => "object",
        }
    }

    /// Parses JSON text. JSON5 extensions (comments, trailing commas) are tolerated
    /// since pack files are commonly edited by hand.
    pub fn parse(text: &str) -> Result<PackValue, json5::Error> {
        json5::from_str::<PackValue>(text)
    }

    /// Pretty JSON with `indent` spaces per level and the given newline sequence.
    /// Empty containers are written inline (`{}` / `[]`).
    pub fn to_json_pretty(&self, indent: usize, newline: &str) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0, indent, newline);
        out
    }

    pub fn to_json_compact(&self) -> String {
        let mut out = String::new();
        self.write_compact(&mut out);
        out
    }

    fn write_pretty(&self, out: &mut String, depth: usize, indent: usize, newline: &str) {
        match self {
            PackValue::Array(values) if !values.is_empty() => {
                out.push('[');
                out.push_str(newline);
                for (i, v) in values.iter().enumerate() {
                    out.push_str(&" ".repeat((depth + 1) * indent));
                    v.write_pretty(out, depth + 1, indent, newline);
                    if i + 1 != values.len() {
                        out.push(',');
                    }
                    out.push_str(newline);
                }
                out.push_str(&" ".repeat(depth * indent));
                out.push(']');
            }
            PackValue::Object(map) if !map.is_empty() => {
                out.push('{');
                out.push_str(newline);
                for (i, (k, v)) in map.iter().enumerate() {
                    out.push_str(&" ".repeat((depth + 1) * indent));
                    write_escaped_string(out, k);
                    out.push_str(": ");
                    v.write_pretty(out, depth + 1, indent, newline);
                    if i + 1 != map.len() {
                        out.push(',');
                    }
                    out.push_str(newline);
                }
                out.push_str(&" ".repeat(depth * indent));
                out.push('}');
            }
            scalar => scalar.write_compact(out),
        }
    }

    fn write_compact(&self, out: &mut String) {
        match self {
            PackValue::Null => out.push_str("null"),
            PackValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            PackValue::Number(n) => n.write(out),
            PackValue::String(s) => write_escaped_string(out, s),
            PackValue::Array(values) => {
                out.push('[');
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    v.write_compact(out);
                }
                out.push(']');
            }
            PackValue::Object(map) => {
                out.push('{');
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_escaped_string(out, k);
                    out.push(':');
                    v.write_compact(out);
                }
                out.push('}');
            }
        }
    }
}

impl From<bool> for PackValue {
    fn from(v: bool) -> Self {
        PackValue::Bool(v)
    }
}

impl From<i64> for PackValue {
    fn from(v: i64) -> Self {
        PackValue::int(v)
    }
}

impl From<&str> for PackValue {
    fn from(v: &str) -> Self {
        PackValue::String(v.to_owned())
    }
}

impl From<String> for PackValue {
    fn from(v: String) -> Self {
        PackValue::String(v)
    }
}

fn write_escaped_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write as _;
                write!(out, "\\u{:04x}", c as u32).ok();
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl Serialize for PackValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PackValue::Null => serializer.serialize_unit(),
            PackValue::Bool(v) => serializer.serialize_bool(*v),
            PackValue::Number(n) => n.serialize(serializer),
            PackValue::String(s) => serializer.serialize_str(s),
            PackValue::Array(values) => values.serialize(serializer),
            PackValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PackValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> de::Visitor<'de> for ValueVisitor {
            type Value = PackValue;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(PackValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(PackValue::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(PackValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(PackValue::Number(PackNumber::I64(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(PackValue::Number(PackNumber::U64(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(PackValue::Number(PackNumber::F64(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(PackValue::String(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(PackValue::String(v))
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<PackValue>()? {
                    values.push(value);
                }
                Ok(PackValue::Array(values))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut values = IndexMap::new();
                while let Some((key, value)) = map.next_entry::<String, PackValue>()? {
                    values.insert(key, value);
                }
                Ok(PackValue::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Newline style of a text, used so rewritten documents keep the host's line endings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => statics::NL_LF,
            LineEnding::CrLf => statics::NL_CRLF,
        }
    }

    /// Majority vote over actual line terminators; a stray CRLF in an LF file
    /// does not flip the result.
    pub fn detect(text: &[u8]) -> LineEnding {
        let mut lf_count = 0usize;
        let mut crlf_count = 0usize;

        for (i, b) in text.iter().enumerate() {
            if *b != b'\n' {
                continue;
            }
            if i > 0 && text[i - 1] == b'\r' {
                crlf_count += 1;
            } else {
                lf_count += 1;
            }
        }

        if crlf_count > lf_count {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LineEnding, PackNumber, PackValue};
    use indexmap::IndexMap;

    #[test]
    fn parse_keeps_key_order() {
        let v = PackValue::parse(r#"{ "z": 1, "a": 2, "m": 3 }"#).unwrap();
        let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn parse_tolerates_trailing_commas_and_comments() {
        let v = PackValue::parse("{ // note\n \"a\": [1, 2,], }").unwrap();
        assert_eq!(v.get("a").and_then(|a| a.as_array()).map(|a| a.len()), Some(2));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(PackValue::parse("{ \"a\": ").is_err());
    }

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(PackNumber::I64(5), PackNumber::U64(5));
        assert_eq!(PackNumber::I64(5), PackNumber::F64(5.0));
        assert_ne!(PackNumber::I64(5), PackNumber::F64(5.5));
        assert_ne!(PackNumber::I64(-1), PackNumber::U64(u64::MAX));
    }

    #[test]
    fn object_equality_ignores_key_order() {
        let a = PackValue::parse(r#"{ "x": 1, "y": true }"#).unwrap();
        let b = PackValue::parse(r#"{ "y": true, "x": 1 }"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn real_writes_integral_values_as_integers() {
        assert_eq!(PackValue::real(5.0).to_json_compact(), "5");
        assert_eq!(PackValue::real(7.5).to_json_compact(), "7.5");
        assert_eq!(PackValue::real(f64::INFINITY).to_json_compact(), "Infinity");
    }

    #[test]
    fn as_i64_accepts_integral_floats_only() {
        assert_eq!(PackValue::Number(PackNumber::F64(12.0)).as_i64(), Some(12));
        assert_eq!(PackValue::Number(PackNumber::F64(12.5)).as_i64(), None);
        assert_eq!(PackValue::from("12").as_i64(), None);
    }

    #[test]
    fn pretty_output_layout() {
        let mut inner = IndexMap::new();
        inner.insert("list".to_string(), PackValue::Array(vec![PackValue::int(1)]));
        inner.insert("empty".to_string(), PackValue::Object(IndexMap::new()));
        inner.insert("none".to_string(), PackValue::Array(Vec::new()));
        let mut root = IndexMap::new();
        root.insert("k".to_string(), PackValue::Object(inner));

        let text = PackValue::Object(root).to_json_pretty(2, "\n");
        assert_eq!(
            text,
            "{\n  \"k\": {\n    \"list\": [\n      1\n    ],\n    \"empty\": {},\n    \"none\": []\n  }\n}"
        );
    }

    #[test]
    fn strings_are_escaped() {
        let v = PackValue::from("a\"b\\c\nd\u{1}");
        assert_eq!(v.to_json_compact(), "\"a\\\"b\\\\c\\nd\\u0001\"");
    }

    #[test]
    fn detect_line_ending_uses_majority() {
        let mostly_lf = b"{\n  a: 1,\n  b: 2,\r\n  c: 3,\n}\n";
        assert_eq!(LineEnding::detect(mostly_lf), LineEnding::Lf);

        let mostly_crlf = b"{\r\n  a: 1,\r\n  b: 2,\n  c: 3,\r\n}\r\n";
        assert_eq!(LineEnding::detect(mostly_crlf), LineEnding::CrLf);
    }
}
