//! Command-line options forwarded to `electron-pdf`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// A single option value. Deserializes untagged, so `landscape = true`,
/// `marginsType = 1` and `pageSize = "A4"` all work in configuration files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}
impl Display for OptionValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}
impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}
impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}
impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}
impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
impl FromStr for OptionValue {
    type Err = std::convert::Infallible;

    /// Command-line values are loosely typed: `true`/`false` become flags,
    /// integers stay integers, everything else is passed through as text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "true" => Self::Flag(true),
            "false" => Self::Flag(false),
            s => s.parse::<i64>().map_or_else(|_| Self::Text(s.to_string()), Self::Integer),
        })
    }
}

/// Ordered mapping of option name to value.
///
/// No validation happens here: whatever `electron-pdf` accepts is forwarded
/// as-is. Ordering is by key so that the generated argument vector is
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionOptions(BTreeMap<String, OptionValue>);

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Option<OptionValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new set of options where `overrides` win on key collision.
    pub fn merged(&self, overrides: &ConversionOptions) -> ConversionOptions {
        let mut merged = self.clone();
        merged.0.extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Builds the argument vector placed before the input and output paths.
    ///
    /// - `true` flags become `--key`
    /// - `false` flags are omitted
    /// - everything else becomes `--key=value`
    pub fn to_args(&self) -> Vec<OsString> {
        self.0
            .iter()
            .filter_map(|(key, value)| match value {
                OptionValue::Flag(true) => Some(format!("--{key}")),
                OptionValue::Flag(false) => None,
                value => Some(format!("--{key}={value}")),
            })
            .map(OsString::from)
            .collect()
    }
}
impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for ConversionOptions {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
impl<K: Into<String>, V: Into<OptionValue>> Extend<(K, V)> for ConversionOptions {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.0.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn overrides_win_on_collision() {
        let defaults = ConversionOptions::new().with("pageSize", "A4").with("landscape", false);
        let overrides = ConversionOptions::new().with("landscape", true);
        let merged = defaults.merged(&overrides);
        assert_eq!(merged.get("landscape"), Some(&OptionValue::Flag(true)));
        assert_eq!(merged.get("pageSize"), Some(&OptionValue::Text("A4".to_string())));
        // Defaults are left untouched.
        assert_eq!(defaults.get("landscape"), Some(&OptionValue::Flag(false)));
    }

    #[test]
    fn args_are_sorted_and_false_flags_dropped() {
        let options: ConversionOptions = [
            ("printBackground", OptionValue::Flag(true)),
            ("landscape", OptionValue::Flag(false)),
            ("pageSize", OptionValue::Text("A4".into())),
            ("marginsType", OptionValue::Integer(1)),
        ]
        .into_iter()
        .collect();
        let args: Vec<_> = options.to_args().into_iter().map(|a| a.into_string().unwrap()).collect();
        assert_eq!(args, ["--marginsType=1", "--pageSize=A4", "--printBackground"]);
    }

    #[test]
    fn empty_options_have_no_args() {
        assert!(ConversionOptions::new().to_args().is_empty());
    }

    #[rstest]
    #[case("true", OptionValue::Flag(true))]
    #[case("false", OptionValue::Flag(false))]
    #[case("2", OptionValue::Integer(2))]
    #[case("A4", OptionValue::Text("A4".to_string()))]
    #[case("1.5", OptionValue::Text("1.5".to_string()))]
    fn parses_loose_values(#[case] input: &str, #[case] expected: OptionValue) {
        assert_eq!(input.parse::<OptionValue>().unwrap(), expected);
    }

    #[test]
    fn deserializes_untagged_values() {
        let options: ConversionOptions =
            serde_json::from_str(r#"{"landscape": true, "marginsType": 1, "scale": 0.5, "pageSize": "A4"}"#).unwrap();
        assert_eq!(options.get("landscape"), Some(&OptionValue::Flag(true)));
        assert_eq!(options.get("marginsType"), Some(&OptionValue::Integer(1)));
        assert_eq!(options.get("scale"), Some(&OptionValue::Float(0.5)));
        assert_eq!(options.get("pageSize"), Some(&OptionValue::Text("A4".to_string())));
    }
}
