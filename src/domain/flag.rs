//! Broker boolean flags.
//!
//! The broker encodes booleans as `0`/`1` integers, occasionally as JSON
//! booleans or numeric strings. All three decode to `bool`.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Deserialize a broker flag into a `bool`.
pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
        Flag::Text(value) => value == "1" || value.eq_ignore_ascii_case("true"),
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "super::deserialize")]
        on: bool,
    }

    fn decode(json: &str) -> bool {
        serde_json::from_str::<Holder>(json).unwrap().on
    }

    #[test]
    fn integers_strings_and_booleans_decode() {
        assert!(decode(r#"{"on": 1}"#));
        assert!(!decode(r#"{"on": 0}"#));
        assert!(decode(r#"{"on": true}"#));
        assert!(decode(r#"{"on": "1"}"#));
        assert!(!decode(r#"{"on": "no"}"#));
    }

    #[test]
    fn missing_flag_defaults_to_false() {
        assert!(!decode("{}"));
    }
}
