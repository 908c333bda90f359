//! Unified logical type vocabulary.
//!
//! Every source type system is mapped into [`UnifiedType`]. Projection
//! generation and row mapping only ever look at unified types, never at raw
//! source type strings.

use std::fmt;

/// Logical type shared by all sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnifiedType {
    /// Boolean.
    Bool,
    /// Integer of any width.
    Int,
    /// Floating point of any width.
    Float,
    /// Exact numeric carried as text to avoid precision loss.
    NumericString,
    /// Character data.
    String,
    /// Binary data.
    Bytes,
    /// Calendar date.
    Date,
    /// Date and time without timezone.
    DateTime,
    /// Instant with timezone.
    Timestamp,
    /// JSON document.
    Json,
    /// 128-bit identifier.
    Uuid,
    /// List or set of an element type.
    Array(Box<UnifiedType>),
    /// Key/value collection.
    Map(Box<UnifiedType>, Box<UnifiedType>),
    /// Recognized as unmappable. Terminal; never retried, never an error.
    Unsupported,
}

impl UnifiedType {
    /// Array of the given element type.
    pub fn array_of(element: UnifiedType) -> Self {
        UnifiedType::Array(Box::new(element))
    }

    /// Map with the given key and value types.
    pub fn map_of(key: UnifiedType, value: UnifiedType) -> Self {
        UnifiedType::Map(Box::new(key), Box::new(value))
    }

    /// Check if this type is the terminal unsupported classification.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, UnifiedType::Unsupported)
    }

    /// Element type of an array.
    pub fn element(&self) -> Option<&UnifiedType> {
        match self {
            UnifiedType::Array(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for UnifiedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnifiedType::Bool => write!(f, "BOOL"),
            UnifiedType::Int => write!(f, "INT64"),
            UnifiedType::Float => write!(f, "FLOAT64"),
            UnifiedType::NumericString => write!(f, "NUMERIC_STRING"),
            UnifiedType::String => write!(f, "STRING"),
            UnifiedType::Bytes => write!(f, "BYTES"),
            UnifiedType::Date => write!(f, "DATE"),
            UnifiedType::DateTime => write!(f, "DATETIME"),
            UnifiedType::Timestamp => write!(f, "TIMESTAMP"),
            UnifiedType::Json => write!(f, "JSON"),
            UnifiedType::Uuid => write!(f, "UUID"),
            UnifiedType::Array(inner) => write!(f, "ARRAY<{}>", inner),
            UnifiedType::Map(k, v) => write!(f, "MAP<{},{}>", k, v),
            UnifiedType::Unsupported => write!(f, "UNSUPPORTED"),
        }
    }
}

/// Shape of a raw type string after composite parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawShape<'a> {
    /// A scalar type name with size arguments stripped.
    Scalar(&'a str),
    /// A collection of one element type.
    Array(&'a str),
    /// A key/value collection.
    Map(&'a str, &'a str),
}

/// Split a raw type into its composite shape.
///
/// Recognizes `ARRAY<T>` (GoogleSQL), `T[]` (PostgreSQL), `list<T>`, `set<T>`,
/// `map<K, V>` and `frozen<T>` (CQL). Matching of the constructor names is
/// case-insensitive. Size arguments such as `STRING(MAX)` are stripped from
/// scalars.
pub(crate) fn parse_shape(raw: &str) -> RawShape<'_> {
    let raw = raw.trim();

    if let Some(inner) = raw.strip_suffix("[]") {
        return RawShape::Array(inner.trim());
    }

    if let Some((ctor, args)) = split_angle(raw) {
        match ctor.to_ascii_lowercase().as_str() {
            "frozen" => return parse_shape(args),
            "array" | "list" | "set" => return RawShape::Array(args),
            "map" => {
                if let Some((k, v)) = split_top_level_comma(args) {
                    return RawShape::Map(k, v);
                }
            }
            _ => {}
        }
        // Unknown constructor: keep the whole string so the lookup fails.
        return RawShape::Scalar(raw);
    }

    RawShape::Scalar(strip_size(raw))
}

/// `ctor<args>` → (`ctor`, `args`).
fn split_angle(raw: &str) -> Option<(&str, &str)> {
    let open = raw.find('<')?;
    if !raw.ends_with('>') {
        return None;
    }
    let ctor = raw[..open].trim();
    let args = raw[open + 1..raw.len() - 1].trim();
    if ctor.is_empty() || args.is_empty() {
        return None;
    }
    Some((ctor, args))
}

/// Split `K, V` at the first comma that is not nested inside `<>` or `()`.
fn split_top_level_comma(args: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (i, c) in args.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            ',' if depth == 0 => {
                let (k, v) = (args[..i].trim(), args[i + 1..].trim());
                if k.is_empty() || v.is_empty() {
                    return None;
                }
                return Some((k, v));
            }
            _ => {}
        }
    }
    None
}

/// `varchar(255)` → `varchar`, `STRING(MAX)` → `STRING`.
///
/// Only a trailing parenthesized group is removed, so multi-word names such
/// as `timestamp(6) with time zone` keep their suffix words.
pub(crate) fn strip_size(raw: &str) -> &str {
    match (raw.find('('), raw.ends_with(')')) {
        (Some(open), true) => raw[..open].trim_end(),
        _ => raw,
    }
}
