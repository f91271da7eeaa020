//! Quantity serialization helpers for source-stream numbers.
//!
//! The block stream is not consistent about how it renders integers: block numbers arrive as
//! decimal strings, gas figures as `0x`-hex strings, and hand-written fixtures use raw JSON
//! numbers. Deserialization accepts all three; serialization always emits a `0x`-hex quantity.

use core::str::FromStr;
use private::ConvertRuint;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::Value;

/// Serializes a primitive number as a "quantity" hex string.
pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: ConvertRuint,
    S: Serializer,
{
    value.into_ruint().serialize(serializer)
}

/// Deserializes a primitive number from a hex string, a decimal string or a raw number.
pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: ConvertRuint,
    D: Deserializer<'de>,
{
    let ruint = match Value::deserialize(deserializer)? {
        Value::String(s) => T::Ruint::from_str(s.trim())
            .map_err(|_| de::Error::custom(format!("invalid quantity string: {s}")))?,
        Value::Number(num) => T::Ruint::from_str(&num.to_string())
            .map_err(|_| de::Error::custom(format!("invalid quantity number: {num}")))?,
        other => {
            return Err(de::Error::custom(format!(
                "expected a string or number quantity, got {other}"
            )));
        }
    };
    T::from_ruint(ruint).ok_or_else(|| de::Error::custom("quantity out of range"))
}

/// Quantity helpers for `Option<T>` fields. `null` and absent fields are `None`.
pub mod opt {
    use super::private::ConvertRuint;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an optional quantity, emitting `null` for `None`.
    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: ConvertRuint,
        S: Serializer,
    {
        match value {
            Some(value) => super::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional quantity.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: ConvertRuint,
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(transparent)]
        struct Wrapper<T: ConvertRuint>(#[serde(with = "super")] T);

        Ok(Option::<Wrapper<T>>::deserialize(deserializer)?.map(|w| w.0))
    }
}

/// Private implementation details of the [`quantity`](self) module.
#[allow(unnameable_types)]
mod private {
    use core::str::FromStr;

    #[doc(hidden)]
    pub trait ConvertRuint: Copy + Sized {
        type Ruint: Copy
            + serde::Serialize
            + serde::de::DeserializeOwned
            + TryFrom<Self>
            + TryInto<Self>
            + FromStr;

        #[inline]
        fn into_ruint(self) -> Self::Ruint {
            // Widening into the matching ruint alias never fails.
            match self.try_into() {
                Ok(ruint) => ruint,
                Err(_) => unreachable!("primitive always fits its ruint alias"),
            }
        }

        #[inline]
        fn from_ruint(ruint: Self::Ruint) -> Option<Self> {
            ruint.try_into().ok()
        }
    }

    macro_rules! impl_from_ruint {
        ($($primitive:ty = $ruint:ty),* $(,)?) => {
            $(
                impl ConvertRuint for $primitive {
                    type Ruint = $ruint;
                }
            )*
        };
    }

    impl_from_ruint! {
        u8   = alloy_primitives::U8,
        u32  = alloy_primitives::U32,
        u64  = alloy_primitives::U64,
        u128 = alloy_primitives::U128,
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Value {
        #[serde(with = "super")]
        inner: u64,
        #[serde(with = "super::opt", default)]
        maybe: Option<u128>,
    }

    #[test]
    fn test_quantity_accepts_all_renderings() {
        for raw in [r#"{"inner":"0x1e"}"#, r#"{"inner":"30"}"#, r#"{"inner":30}"#] {
            let value: Value = serde_json::from_str(raw).unwrap();
            assert_eq!(value, Value { inner: 30, maybe: None });
        }
    }

    #[test]
    fn test_quantity_serializes_hex() {
        let value = Value { inner: 930_793, maybe: Some(21_000) };
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"inner":"0xe33e9","maybe":"0x5208"}"#);
        assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), value);
    }

    #[test]
    fn test_quantity_rejects_garbage() {
        assert!(serde_json::from_str::<Value>(r#"{"inner":"0xzz"}"#).is_err());
        assert!(serde_json::from_str::<Value>(r#"{"inner":true}"#).is_err());
        assert!(serde_json::from_str::<Value>(r#"{"inner":"0x10000000000000000"}"#).is_err());
    }

    #[test]
    fn test_optional_quantity_null() {
        let value: Value = serde_json::from_str(r#"{"inner":1,"maybe":null}"#).unwrap();
        assert_eq!(value.maybe, None);
    }
}
