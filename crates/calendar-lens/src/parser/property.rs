//! Property splitting: `NAME;P1=V1;P2=V2:VALUE` → name, parameters, value.
//!
//! Splitting never fails. A line with no `:` has an empty value, and a
//! parameter token with no `=` is dropped.

use std::collections::BTreeMap;

/// A split content line. Names and parameter keys are upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Property {
    pub name: String,
    pub params: BTreeMap<String, String>,
    pub value: String,
}

impl Property {
    /// Look up a parameter by key, ignoring case.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Whether the line carries `VALUE=DATE` (an all-day date value).
    pub fn is_date_value(&self) -> bool {
        self.param("VALUE")
            .is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
    }
}

/// Split one logical line into a [`Property`].
pub fn split_property(line: &str) -> Property {
    let (head, value) = line.split_once(':').unwrap_or((line, ""));

    let mut tokens = head.split(';');
    let name = tokens
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_uppercase();

    let params = tokens
        .filter_map(|token| token.split_once('='))
        .map(|(key, val)| (key.trim().to_ascii_uppercase(), unquote(val).to_string()))
        .collect();

    Property {
        name,
        params,
        value: value.to_string(),
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}
