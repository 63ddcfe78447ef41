//! The encoded-value model, spec.md §3 ("Encoded value (`enc`)") and §8
//! invariant 2 (round-trip). The C source packs every scalar into one
//! tagged machine word; in Rust the tag is the enum discriminant and the
//! compiler enforces spec.md §3's invariant ("the tag fully determines the
//! decoding procedure") by construction — there is no way to build a
//! `Value` whose tag disagrees with its payload, and no `ILLEGAL` sentinel
//! is representable, so that part of the invariant needs no runtime check.
//!
//! Grounded on `core.rs`'s `Diff`/`Serialize` split (one `encode`/`decode`
//! per concrete type), generalised per spec.md §9 design note into a
//! single sum type.

use crate::ids::RecordId;

/// Days since the Unix epoch (spec.md §3, `DATE`).
pub type Days = i32;

/// Centiseconds since midnight (spec.md §3, `TIME`).
pub type Centiseconds = i32;

/// A decimal fixed-point number stored as an integer scaled by
/// [`FIXPOINT_SCALE`]. The original WhiteDB fixpoint type is inline and
/// carries a fixed number of decimal digits; we keep that shape rather
/// than switching to an arbitrary-precision decimal, since nothing in the
/// spec asks for more range.
pub const FIXPOINT_SCALE: i64 = 1_000;

/// One encoded value: every supported scalar, plus a record reference.
/// Variant order is the type-ordering used by `compare::type_rank` (spec.md
/// §4.1 step 2 — "consistent but arbitrary across types").
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Record(RecordId),
    Int(i64),
    Double(f64),
    /// Scaled by [`FIXPOINT_SCALE`].
    Fixpoint(i64),
    Str {
        value: String,
        lang: Option<String>,
    },
    Uri {
        value: String,
        prefix: Option<String>,
    },
    XmlLiteral {
        value: String,
        xsdtype: Option<String>,
    },
    Blob {
        bytes: Vec<u8>,
        type_tag: Option<String>,
    },
    Char(char),
    Date(Days),
    Time(Centiseconds),
    Var(u32),
    AnonConst(u32),
}

impl Value {
    pub fn str(value: impl Into<String>) -> Value {
        Value::Str {
            value: value.into(),
            lang: None,
        }
    }

    pub fn str_lang(value: impl Into<String>, lang: impl Into<String>) -> Value {
        Value::Str {
            value: value.into(),
            lang: Some(lang.into()),
        }
    }

    pub fn fixpoint_from_f64(v: f64) -> Value {
        Value::Fixpoint((v * FIXPOINT_SCALE as f64).round() as i64)
    }

    pub fn fixpoint_as_f64(&self) -> Option<f64> {
        match self {
            Value::Fixpoint(n) => Some(*n as f64 / FIXPOINT_SCALE as f64),
            _ => None,
        }
    }

    /// True for `Value::Record` — used by the meta-bit "array unwrap"
    /// rule in the hash-index JSON variant (spec.md §4.3).
    pub fn as_record(&self) -> Option<RecordId> {
        match self {
            Value::Record(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical byte encoding used by the hash index (spec.md §4.3,
    /// `decode_for_hashing`). Stable across inserts and lookups — tested
    /// as a `round-trip-equal-values-hash-identically` property (spec.md
    /// §9 design note).
    pub fn encode_for_hashing(&self, out: &mut Vec<u8>) {
        match self {
            Value::Null => out.push(0),
            Value::Record(r) => {
                out.push(1);
                out.extend_from_slice(&r.0.to_le_bytes());
            }
            Value::Int(n) => {
                out.push(2);
                out.extend_from_slice(&n.to_le_bytes());
            }
            Value::Double(d) => {
                out.push(3);
                out.extend_from_slice(&d.to_bits().to_le_bytes());
            }
            Value::Fixpoint(n) => {
                out.push(4);
                out.extend_from_slice(&n.to_le_bytes());
            }
            Value::Str { value, lang } => {
                out.push(5);
                out.extend_from_slice(value.as_bytes());
                out.push(0);
                if let Some(l) = lang {
                    out.extend_from_slice(l.as_bytes());
                }
            }
            Value::Uri { value, prefix } => {
                out.push(6);
                if let Some(p) = prefix {
                    out.extend_from_slice(p.as_bytes());
                }
                out.push(0);
                out.extend_from_slice(value.as_bytes());
            }
            Value::XmlLiteral { value, xsdtype } => {
                out.push(7);
                if let Some(t) = xsdtype {
                    out.extend_from_slice(t.as_bytes());
                }
                out.push(0);
                out.extend_from_slice(value.as_bytes());
            }
            Value::Blob { bytes, type_tag } => {
                out.push(8);
                out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                out.extend_from_slice(bytes);
                if let Some(t) = type_tag {
                    out.extend_from_slice(t.as_bytes());
                }
            }
            Value::Char(c) => {
                out.push(9);
                out.extend_from_slice(&(*c as u32).to_le_bytes());
            }
            Value::Date(d) => {
                out.push(10);
                out.extend_from_slice(&d.to_le_bytes());
            }
            Value::Time(t) => {
                out.push(11);
                out.extend_from_slice(&t.to_le_bytes());
            }
            Value::Var(v) => {
                out.push(12);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Value::AnonConst(v) => {
                out.push(13);
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
}

#[cfg(test)]
#[path = "value_test.rs"]
mod value_test;
