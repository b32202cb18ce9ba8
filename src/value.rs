use std::fmt;

/// A value staged for an insert or an update of a row. See [`crate::Cursor::update_value`].
///
/// Staged values are merged into the staging row in their canonical text form (see the `Display`
/// implementation). This is lossy: e.g. a `Real` is written with the precision of its shortest
/// round trip representation and a `Blob` as lower case hex. Applications which need the typed
/// original afterwards must keep their own copy.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

impl Value {
    /// `true` if the value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical text form of the value as it is written into the staging row. `None` for `Null`.
    pub fn to_text(&self) -> Option<String> {
        if self.is_null() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(text) => f.write_str(text),
            Value::Blob(bytes) => bytes.iter().try_for_each(|byte| write!(f, "{byte:02x}")),
            // The engine has no boolean type. Booleans are stored as integers.
            Value::Boolean(b) => write!(f, "{}", i32::from(*b)),
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Real(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(value.to_vec())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::Value;

    #[test]
    fn canonical_text() {
        assert_eq!(Some("42".to_owned()), Value::from(42).to_text());
        assert_eq!(Some("1.5".to_owned()), Value::from(1.5).to_text());
        assert_eq!(Some("Bob".to_owned()), Value::from("Bob").to_text());
        assert_eq!(Some("00ff".to_owned()), Value::from(&[0u8, 255][..]).to_text());
        assert_eq!(Some("1".to_owned()), Value::from(true).to_text());
        assert_eq!(None, Value::from(None::<i32>).to_text());
    }

    #[test]
    fn precision_is_lost() {
        // Integers beyond the precision of f64 collapse in their text representation.
        let staged = Value::from(9_007_199_254_740_993_f64);
        assert_eq!(Some("9007199254740992".to_owned()), staged.to_text());
    }
}
