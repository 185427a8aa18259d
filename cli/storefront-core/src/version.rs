use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Version marker for persisted state files.
///
/// Serializes as the literal integer `V` and refuses to deserialize any
/// other value, so bumping the version parameter invalidates files written
/// by older builds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Version<const V: u8>;

impl<const V: u8> Serialize for Version<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(V)
    }
}

impl<'de, const V: u8> Deserialize<'de> for Version<V> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = u8::deserialize(deserializer)?;
        if version != V {
            return Err(D::Error::custom(format!(
                "version mismatch, expected {V} but found {version}"
            )));
        }
        Ok(Version)
    }
}
