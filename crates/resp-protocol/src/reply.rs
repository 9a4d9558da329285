//! Typed reply coercion.
//!
//! Command methods declare the Rust type they expect and [`FromValue`]
//! converts the decoded [`Value`] into it, failing with
//! [`ProtocolError::UnexpectedReply`] when the shape does not match.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::ProtocolError;
use crate::value::Value;

/// Conversion from a decoded reply into a Rust type.
pub trait FromValue: Sized {
    /// Convert the reply, consuming it.
    fn from_value(value: Value) -> Result<Self, ProtocolError>;
}

fn unexpected<T>(expected: &'static str, value: &Value) -> Result<T, ProtocolError> {
    Err(ProtocolError::UnexpectedReply {
        expected,
        actual: value.type_name(),
    })
}

fn text(bytes: &[u8]) -> Result<&str, ProtocolError> {
    std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ProtocolError> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self, ProtocolError> {
        match value {
            Value::Simple(_) => Ok(()),
            other => unexpected("status", &other),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ProtocolError> {
        match value {
            Value::Integer(n) => Ok(n),
            Value::Bulk(ref data) => {
                let s = text(data)?;
                s.parse()
                    .map_err(|_| ProtocolError::InvalidInteger(s.to_string()))
            }
            Value::Simple(ref s) => s
                .parse()
                .map_err(|_| ProtocolError::InvalidInteger(s.clone())),
            other => unexpected("integer", &other),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ProtocolError> {
        i64::from_value(value).map(|n| n != 0)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ProtocolError> {
        match value {
            Value::Bulk(data) => text(&data).map(str::to_string),
            Value::Simple(s) => Ok(s),
            Value::Integer(n) => Ok(n.to_string()),
            other => unexpected("string", &other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ProtocolError> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ProtocolError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            Value::Nil => Ok(Vec::new()),
            other => unexpected("array", &other),
        }
    }
}

impl<K, V> FromValue for HashMap<K, V>
where
    K: FromValue + Eq + Hash,
    V: FromValue,
{
    fn from_value(value: Value) -> Result<Self, ProtocolError> {
        Ok(value.into_pairs()?.into_iter().collect())
    }
}

impl Value {
    /// Interpret a flat array of alternating keys and values as pairs.
    ///
    /// An odd-length array fails with [`ProtocolError::OddPairs`]; no partial
    /// result is returned.
    pub fn into_pairs<K: FromValue, V: FromValue>(self) -> Result<Vec<(K, V)>, ProtocolError> {
        let items = match self {
            Value::Array(items) => items,
            other => return unexpected("array", &other),
        };
        if items.len() % 2 != 0 {
            return Err(ProtocolError::OddPairs(items.len()));
        }
        let mut pairs = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            pairs.push((K::from_value(k)?, V::from_value(v)?));
        }
        Ok(pairs)
    }

    /// Convert into any [`FromValue`] type.
    pub fn convert<T: FromValue>(self) -> Result<T, ProtocolError> {
        T::from_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_coercion() {
        assert_eq!(Value::Integer(5).convert::<i64>().unwrap(), 5);
        assert_eq!(Value::from("17").convert::<i64>().unwrap(), 17);
        assert!(matches!(
            Value::from("x").convert::<i64>(),
            Err(ProtocolError::InvalidInteger(_))
        ));
        assert!(Value::Integer(1).convert::<bool>().unwrap());
        assert!(!Value::Integer(0).convert::<bool>().unwrap());
    }

    #[test]
    fn test_string_list_with_nils() {
        let value = Value::Array(vec![Value::Nil, Value::from("evicted")]);
        let items: Vec<Option<String>> = value.convert().unwrap();
        assert_eq!(items, vec![None, Some("evicted".to_string())]);
    }

    #[test]
    fn test_unexpected_shape() {
        let err = Value::Integer(3).convert::<Vec<i64>>().unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnexpectedReply {
                expected: "array",
                actual: "integer"
            }
        );
        assert!(Value::ok().convert::<()>().is_ok());
        assert!(Value::Integer(1).convert::<()>().is_err());
    }

    #[test]
    fn test_pairs_even() {
        let value = Value::from(vec![
            Value::simple("Capacity"),
            Value::Integer(100),
            Value::simple("Size"),
            Value::Integer(296),
        ]);
        let map: HashMap<String, i64> = value.convert().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["Capacity"], 100);
        assert_eq!(map["Size"], 296);
    }

    #[test]
    fn test_pairs_odd_rejected() {
        let value = Value::from(vec![Value::from("k"), Value::Integer(1), Value::from("dangling")]);
        let err = value.into_pairs::<String, i64>().unwrap_err();
        assert_eq!(err, ProtocolError::OddPairs(3));
    }

    #[test]
    fn test_mixed_value_map_renders_integers() {
        let value = Value::from(vec![
            Value::from("k"),
            Value::Integer(10),
            Value::from("decay"),
            Value::from("0.9"),
        ]);
        let map: HashMap<String, String> = value.convert().unwrap();
        assert_eq!(map["k"], "10");
        assert_eq!(map["decay"], "0.9");
    }
}
