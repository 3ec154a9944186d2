use serde::{de, Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Generic deserializer that treats empty strings as None for any type that implements FromStr
///
/// Required request fields use this so that `""` is rejected the same way as a
/// missing key.
///
/// # Examples
///
/// ```
/// use serde::Deserialize;
/// use http_server::empty_string_as_none;
///
/// #[derive(Deserialize)]
/// struct NewUser {
///     #[serde(default, deserialize_with = "empty_string_as_none")]
///     name: Option<String>,
/// }
/// ```
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => FromStr::from_str(s).map_err(de::Error::custom).map(Some),
    }
}
