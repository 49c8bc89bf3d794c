//! Line-oriented wire format spoken by the recommendation service
//!
//! A message is one `key:value` line per pair, each terminated by `\n`.
//! There is no escaping: values must not contain `\n`, and a `:` inside a
//! value only survives because decoding splits on the first `:` of a line.

use std::fmt::Display;

/// Line delimiter between pairs
pub const DELIMITER: u8 = b'\n';

/// Separator between a key and its value
pub const SEPARATOR: char = ':';

/// Ordered key/value pairs exchanged with the recommendation service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pairs: Vec<(String, String)>,
}

impl Message {
    /// Creates an empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair and returns the message, for building requests inline
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Appends a pair, keeping insertion order
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Looks up a value by key.
    ///
    /// When a key repeats, the last occurrence wins, matching how the
    /// service's peers have always folded responses into a map.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encodes the message as `key:value\n` lines in insertion order
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.pairs
                .iter()
                .map(|(k, v)| k.len() + v.len() + 2)
                .sum(),
        );

        for (key, value) in &self.pairs {
            out.extend_from_slice(key.as_bytes());
            out.push(SEPARATOR as u8);
            out.extend_from_slice(value.as_bytes());
            out.push(DELIMITER);
        }

        out
    }

    /// Decodes a buffer leniently.
    ///
    /// Lines without a separator, or whose trimmed key or value is empty, are
    /// dropped rather than rejected. Invalid UTF-8 is replaced, not refused.
    pub fn decode(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        let mut message = Message::new();

        for line in text.split(DELIMITER as char) {
            if line.trim().is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(SEPARATOR) else {
                tracing::debug!(line = %line, "Dropping response line without separator");
                continue;
            };

            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                tracing::debug!(line = %line, "Dropping response line with empty key or value");
                continue;
            }

            message.push(key, value);
        }

        message
    }
}

impl<K, V> FromIterator<(K, V)> for Message
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}
