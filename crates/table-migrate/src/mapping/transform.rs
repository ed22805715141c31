//! Named column transforms.
//!
//! A transform is a plain function pointer paired with a name. Mapping files
//! refer to transforms by name; programmatic mappings may register their own
//! with [`Transform::new`]. Every transform must accept NULL.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::core::SqlValue;

/// Signature of a column transform.
pub type TransformFn = fn(SqlValue) -> SqlValue;

/// A named, pure value transform.
#[derive(Clone, Copy)]
pub struct Transform {
    name: &'static str,
    func: TransformFn,
}

/// Transforms available to mapping files by name.
const BUILTINS: &[(&str, TransformFn)] = &[
    ("empty_to_null", empty_to_null),
    ("falsy_to_null", falsy_to_null),
    ("trim", trim),
    ("lowercase", lowercase),
    ("uppercase", uppercase),
    ("bool_to_int", bool_to_int),
    ("zero_date_to_null", zero_date_to_null),
];

impl Transform {
    /// Create a transform from a function pointer.
    pub const fn new(name: &'static str, func: TransformFn) -> Self {
        Self { name, func }
    }

    /// Look up a built-in transform by name.
    pub fn builtin(name: &str) -> Option<Self> {
        BUILTINS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(n, f)| Self::new(n, f))
    }

    /// Names of all built-in transforms.
    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        BUILTINS.iter().map(|(n, _)| *n)
    }

    /// Transform name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Apply the transform to a raw source value.
    pub fn apply(&self, value: SqlValue) -> SqlValue {
        (self.func)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transform({})", self.name)
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Serialize for Transform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

impl<'de> Deserialize<'de> for Transform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Transform::builtin(&name).ok_or_else(|| {
            let known: Vec<&str> = Transform::builtin_names().collect();
            de::Error::custom(format!(
                "unknown transform '{}', expected one of: {}",
                name,
                known.join(", ")
            ))
        })
    }
}

/// Blank or whitespace-only text becomes NULL.
pub fn empty_to_null(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(s) if s.trim().is_empty() => SqlValue::Null,
        other => other,
    }
}

/// Any falsy value (NULL, false, 0, empty text) becomes NULL.
pub fn falsy_to_null(value: SqlValue) -> SqlValue {
    if value.is_falsy() {
        SqlValue::Null
    } else {
        value
    }
}

/// Strip surrounding whitespace from text.
pub fn trim(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(s) => SqlValue::Text(s.trim().to_string()),
        other => other,
    }
}

pub fn lowercase(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(s) => SqlValue::Text(s.to_lowercase()),
        other => other,
    }
}

pub fn uppercase(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(s) => SqlValue::Text(s.to_uppercase()),
        other => other,
    }
}

/// Booleans (and their common textual spellings) become 0/1 integers.
pub fn bool_to_int(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Bool(b) => SqlValue::Int(i64::from(b)),
        SqlValue::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" => SqlValue::Int(1),
            "false" | "no" | "n" => SqlValue::Int(0),
            _ => SqlValue::Text(s),
        },
        other => other,
    }
}

/// MySQL zero dates (`0000-00-00`) become NULL.
pub fn zero_date_to_null(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(s) if s.starts_with("0000-00-00") => SqlValue::Null,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let t = Transform::builtin("trim").unwrap();
        assert_eq!(t.name(), "trim");
        assert_eq!(t.apply(SqlValue::from("  x ")), SqlValue::from("x"));
        assert!(Transform::builtin("nope").is_none());
    }

    #[test]
    fn test_every_builtin_accepts_null() {
        for name in Transform::builtin_names() {
            let t = Transform::builtin(name).unwrap();
            assert_eq!(t.apply(SqlValue::Null), SqlValue::Null, "{}", name);
        }
    }

    #[test]
    fn test_empty_vs_falsy() {
        assert_eq!(empty_to_null(SqlValue::from("  ")), SqlValue::Null);
        assert_eq!(empty_to_null(SqlValue::Int(0)), SqlValue::Int(0));
        assert_eq!(falsy_to_null(SqlValue::Int(0)), SqlValue::Null);
        assert_eq!(falsy_to_null(SqlValue::from("spec")), SqlValue::from("spec"));
        assert_eq!(falsy_to_null(SqlValue::Bytes(vec![])), SqlValue::Bytes(vec![]));
    }

    #[test]
    fn test_bool_to_int() {
        assert_eq!(bool_to_int(SqlValue::Bool(true)), SqlValue::Int(1));
        assert_eq!(bool_to_int(SqlValue::from("No")), SqlValue::Int(0));
        assert_eq!(bool_to_int(SqlValue::from("maybe")), SqlValue::from("maybe"));
    }

    #[test]
    fn test_zero_date() {
        assert_eq!(
            zero_date_to_null(SqlValue::from("0000-00-00 00:00:00")),
            SqlValue::Null
        );
        assert_eq!(
            zero_date_to_null(SqlValue::from("2024-01-01")),
            SqlValue::from("2024-01-01")
        );
    }

    #[test]
    fn test_deserialize_unknown_name_fails() {
        let err = serde_yaml::from_str::<Transform>("shout").unwrap_err();
        assert!(err.to_string().contains("unknown transform 'shout'"));
    }

    #[test]
    fn test_custom_transform() {
        fn redact(_: SqlValue) -> SqlValue {
            SqlValue::from("***")
        }
        let t = Transform::new("redact", redact);
        assert_eq!(t.apply(SqlValue::from("secret")), SqlValue::from("***"));
        assert_eq!(format!("{:?}", t), "Transform(redact)");
    }
}
