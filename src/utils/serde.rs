/*!
 * Serde utilities for common serialization/deserialization patterns.
 *
 * Patch payloads need to tell an absent field apart from an explicit `null`:
 * `{"parentListId": null}` moves a list to the root, while omitting the key
 * leaves the parent untouched.
 */

use serde::{Deserialize, Deserializer};

/// Deserialize a field that may be absent, `null`, or carry a value.
///
/// Combined with `#[serde(default)]` the result is:
/// - key omitted → `None`
/// - key present with `null` → `Some(None)`
/// - key present with a value → `Some(Some(value))`
///
/// # Usage with serde
///
/// ```rust
/// use serde::Deserialize;
/// use tasklist_core::utils::serde::deserialize_nullable_field;
///
/// #[derive(Deserialize)]
/// struct Patch {
///     #[serde(default, deserialize_with = "deserialize_nullable_field")]
///     parent: Option<Option<String>>,
/// }
///
/// let cleared: Patch = serde_json::from_str(r#"{"parent": null}"#).unwrap();
/// assert_eq!(cleared.parent, Some(None));
/// ```
pub fn deserialize_nullable_field<'de, D, T>(
    deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
