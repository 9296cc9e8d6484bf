//! Decoding for fields the API may send as an explicit `null`.

use serde::{Deserialize, Deserializer};

/// Decodes `null` the same as an absent field: the type's default.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
