//! Helpers for partial-update bodies.

use serde::{Deserialize, Deserializer};

/// Deserialize a field that may be absent, explicitly `null`, or set.
///
/// Pair with `#[serde(default)]`: an absent field stays `None`, `null`
/// becomes `Some(None)` and a value becomes `Some(Some(value))`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
