//! URL-encoded form data.
//!
//! [`ParsedForm`] is the form-data container attached to a request's
//! extensions once the form parser middleware has run. Downstream handlers
//! read it from there instead of parsing again.
//!
//! Parsing is strict: a `%` that is not followed by two hex digits and a
//! `;` used as a pair separator are both rejected.

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced while parsing form data.
#[derive(Debug, Error)]
pub enum FormError {
    /// A `%` escape was not followed by two hex digits.
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),

    /// A `;` was used to separate pairs.
    #[error("invalid semicolon separator in query")]
    SemicolonSeparator,

    /// The pairs could not be decoded.
    #[error("malformed form data: {0}")]
    Malformed(String),

    /// The request body could not be read.
    #[error("failed to read form body: {0}")]
    Body(String),

    /// The request body exceeded the form size limit.
    #[error("form body larger than {0} bytes")]
    TooLarge(usize),
}

/// Decoded form values, keyed and ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: BTreeMap<String, Vec<String>>,
}

impl FormValues {
    /// Creates an empty set of values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URL-encoded string such as `a=1&b=2`.
    ///
    /// # Example
    ///
    /// ```
    /// use logcollector_core::FormValues;
    ///
    /// let values = FormValues::parse("name=alice&tag=a&tag=b").unwrap();
    /// assert_eq!(values.get("name"), Some("alice"));
    /// assert_eq!(values.get_all("tag"), ["a", "b"]);
    ///
    /// assert!(FormValues::parse("bad=%zz").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, FormError> {
        let mut values = Self::new();
        values.merge_encoded(input)?;
        Ok(values)
    }

    /// Parses a URL-encoded string and appends its pairs to these values.
    ///
    /// Escapes that decode to invalid UTF-8 are replaced with U+FFFD.
    pub fn merge_encoded(&mut self, input: &str) -> Result<(), FormError> {
        if input.contains(';') {
            return Err(FormError::SemicolonSeparator);
        }
        validate_escapes(input)?;

        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(input).map_err(|e| FormError::Malformed(e.to_string()))?;
        for (key, value) in pairs {
            self.append(key, value);
        }
        Ok(())
    }

    /// Appends a value under `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Returns the first value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Returns every value for `key`.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encodes the values as `key=value` pairs sorted by key.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (key, values) in &self.values {
            for value in values {
                if !out.is_empty() {
                    out.push('&');
                }
                out.push_str(&urlencoding::encode(key));
                out.push('=');
                out.push_str(&urlencoding::encode(value));
            }
        }
        out
    }
}

/// Form data attached to a request by the form parser middleware.
///
/// `form` holds query and body values together (body values first),
/// `post_form` only the values parsed from the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedForm {
    /// Query and body values.
    pub form: FormValues,
    /// Body values only.
    pub post_form: FormValues,
}

fn validate_escapes(raw: &str) -> Result<(), FormError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(bytes.len());
                return Err(FormError::InvalidEscape(
                    String::from_utf8_lossy(&bytes[i..end]).into_owned(),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
