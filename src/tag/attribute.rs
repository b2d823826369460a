use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::hls::ByteRange;

/// Failure while decoding an attribute-list (RFC 8216 section 4.2).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    #[error("invalid attribute name {0:?}")]
    InvalidName(String),

    #[error("expected NAME=VALUE, found {0:?}")]
    MissingSeparator(String),

    #[error("attribute {0} has an empty value")]
    EmptyValue(String),

    #[error("unterminated quoted string in attribute {0}")]
    UnterminatedQuote(String),

    #[error("unexpected characters after the quoted value of {0}")]
    TrailingCharacters(String),

    #[error("duplicate attribute {0}")]
    DuplicateName(String),

    #[error("malformed hexadecimal sequence in attribute {name}: {value}")]
    MalformedHex { name: String, value: String },

    #[error("integer out of range in attribute {name}: {value}")]
    IntegerOverflow { name: String, value: String },

    #[error("malformed byte range in attribute {name}: {value}")]
    MalformedByteRange { name: String, value: String },

    #[error("attribute {name} must be a {expected}")]
    UnexpectedType { name: String, expected: &'static str },
}

/// A single decoded attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttributeValue {
    QuotedString(String),
    HexSequence(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
    DecimalInteger(u64),
    DecimalFloat(f64),
    EnumeratedString(String),
    /// A `BYTERANGE` quoted string after it has been decoded.
    ResolvedRange { length: u64, offset: Option<u64> },
}

/// Decoded `NAME=VALUE,...` list. Names are unique, order is not kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeList {
    attributes: BTreeMap<String, AttributeValue>,
}

impl AttributeList {
    /// Decode the raw text after a tag's `:`.
    pub fn decode(raw: &str) -> Result<Self, AttributeError> {
        let mut attributes = BTreeMap::new();
        let mut rest = raw.trim();

        if rest.is_empty() {
            return Ok(Self { attributes });
        }

        loop {
            let (name, after) = rest
                .split_once('=')
                .ok_or_else(|| AttributeError::MissingSeparator(rest.to_string()))?;
            let name = name.trim();
            if !is_valid_name(name) {
                return Err(AttributeError::InvalidName(name.to_string()));
            }

            let after = after.trim_start();
            let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
                // Quoted strings cannot contain '"', so the next quote closes it.
                let end = quoted
                    .find('"')
                    .ok_or_else(|| AttributeError::UnterminatedQuote(name.to_string()))?;
                let tail = quoted[end + 1..].trim_start();
                let remainder = match tail.strip_prefix(',') {
                    Some(next) => Some(next),
                    None if tail.is_empty() => None,
                    None => return Err(AttributeError::TrailingCharacters(name.to_string())),
                };
                (
                    AttributeValue::QuotedString(quoted[..end].to_string()),
                    remainder,
                )
            } else {
                let (bare, remainder) = match after.split_once(',') {
                    Some((bare, next)) => (bare, Some(next)),
                    None => (after, None),
                };
                (decode_bare(name, bare.trim())?, remainder)
            };

            if attributes.contains_key(name) {
                return Err(AttributeError::DuplicateName(name.to_string()));
            }
            attributes.insert(name.to_string(), value);

            match remainder {
                Some(next) => rest = next,
                None => break,
            }
        }

        Ok(Self { attributes })
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn quoted_string(&self, name: &str) -> Result<Option<&str>, AttributeError> {
        match self.get(name) {
            None => Ok(None),
            Some(AttributeValue::QuotedString(s)) => Ok(Some(s)),
            Some(_) => Err(unexpected(name, "quoted-string")),
        }
    }

    pub fn enumerated_string(&self, name: &str) -> Result<Option<&str>, AttributeError> {
        match self.get(name) {
            None => Ok(None),
            Some(AttributeValue::EnumeratedString(s)) => Ok(Some(s)),
            Some(_) => Err(unexpected(name, "enumerated-string")),
        }
    }

    pub fn decimal_integer(&self, name: &str) -> Result<Option<u64>, AttributeError> {
        match self.get(name) {
            None => Ok(None),
            Some(AttributeValue::DecimalInteger(n)) => Ok(Some(*n)),
            Some(_) => Err(unexpected(name, "decimal-integer")),
        }
    }

    /// Integers are accepted too: `FRAME-RATE=30` is a valid float.
    pub fn decimal_float(&self, name: &str) -> Result<Option<f64>, AttributeError> {
        match self.get(name) {
            None => Ok(None),
            Some(AttributeValue::DecimalFloat(f)) => Ok(Some(*f)),
            Some(AttributeValue::DecimalInteger(n)) => Ok(Some(*n as f64)),
            Some(_) => Err(unexpected(name, "decimal-floating-point")),
        }
    }

    pub fn hex_sequence(&self, name: &str) -> Result<Option<&[u8]>, AttributeError> {
        match self.get(name) {
            None => Ok(None),
            Some(AttributeValue::HexSequence(bytes)) => Ok(Some(bytes)),
            Some(_) => Err(unexpected(name, "hexadecimal-sequence")),
        }
    }

    /// Read a byte-range attribute, decoded or still quoted.
    pub fn byte_range(&self, name: &str) -> Result<Option<ByteRange>, AttributeError> {
        match self.get(name) {
            None => Ok(None),
            Some(AttributeValue::ResolvedRange { length, offset }) => {
                Ok(Some(ByteRange::new(*length, *offset)))
            }
            Some(AttributeValue::QuotedString(s)) => ByteRange::parse(s).map(Some).ok_or_else(|| {
                AttributeError::MalformedByteRange {
                    name: name.to_string(),
                    value: s.clone(),
                }
            }),
            Some(_) => Err(unexpected(name, "quoted-string")),
        }
    }

    /// Decode a quoted `<n>[@<o>]` attribute in place into `ResolvedRange`.
    pub fn resolve_range(&mut self, name: &str) -> Result<Option<ByteRange>, AttributeError> {
        let Some(range) = self.byte_range(name)? else {
            return Ok(None);
        };
        self.attributes.insert(
            name.to_string(),
            AttributeValue::ResolvedRange {
                length: range.length,
                offset: range.offset,
            },
        );
        Ok(Some(range))
    }
}

fn unexpected(name: &str, expected: &'static str) -> AttributeError {
    AttributeError::UnexpectedType {
        name: name.to_string(),
        expected,
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-')
}

/// Split off the first whitespace-delimited token. The remainder, if any,
/// is returned trimmed.
pub(crate) fn leading_token(s: &str) -> (&str, Option<&str>) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, Some(rest.trim_start())),
        None => (s, None),
    }
}

/// Unsigned decimal-integer: digits only, no sign.
pub(crate) fn parse_decimal_integer(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Signed decimal-floating-point: `-?[0-9]+(.[0-9]*)?`.
pub(crate) fn parse_decimal_float(s: &str) -> Option<f64> {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    s.parse().ok()
}

fn decode_bare(name: &str, value: &str) -> Result<AttributeValue, AttributeError> {
    if value.is_empty() {
        return Err(AttributeError::EmptyValue(name.to_string()));
    }

    if let Some(digits) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        let malformed = || AttributeError::MalformedHex {
            name: name.to_string(),
            value: value.to_string(),
        };
        if digits.is_empty() {
            return Err(malformed());
        }
        let bytes = hex::decode(digits).map_err(|_| malformed())?;
        return Ok(AttributeValue::HexSequence(bytes));
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        return parse_decimal_integer(value)
            .map(AttributeValue::DecimalInteger)
            .ok_or_else(|| AttributeError::IntegerOverflow {
                name: name.to_string(),
                value: value.to_string(),
            });
    }

    if let Some(f) = parse_decimal_float(value) {
        return Ok(AttributeValue::DecimalFloat(f));
    }

    Ok(AttributeValue::EnumeratedString(value.to_string()))
}

/// Serialize bytes as a `0x`-prefixed hex string.
pub(crate) fn serialize_hex<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_value_types() {
        let attrs = AttributeList::decode(
            r#"METHOD=AES-128,URI="https://example.com/key",IV=0x0102030405060708090A0B0C0D0E0F10,BANDWIDTH=1280000,FRAME-RATE=29.97,TIME-OFFSET=-4.5"#,
        )
        .unwrap();

        assert_eq!(attrs.len(), 6);
        assert_eq!(
            attrs.get("METHOD"),
            Some(&AttributeValue::EnumeratedString("AES-128".to_string()))
        );
        assert_eq!(
            attrs.quoted_string("URI").unwrap(),
            Some("https://example.com/key")
        );
        assert_eq!(attrs.hex_sequence("IV").unwrap().unwrap().len(), 16);
        assert_eq!(attrs.decimal_integer("BANDWIDTH").unwrap(), Some(1280000));
        assert_eq!(attrs.decimal_float("FRAME-RATE").unwrap(), Some(29.97));
        assert_eq!(attrs.decimal_float("TIME-OFFSET").unwrap(), Some(-4.5));
    }

    #[test]
    fn test_quoted_commas_are_not_delimiters() {
        let attrs =
            AttributeList::decode(r#"CODECS="avc1.64001f,mp4a.40.2",BANDWIDTH=1000000"#).unwrap();
        assert_eq!(
            attrs.quoted_string("CODECS").unwrap(),
            Some("avc1.64001f,mp4a.40.2")
        );
        assert_eq!(attrs.decimal_integer("BANDWIDTH").unwrap(), Some(1000000));

        let attrs = AttributeList::decode(r#"A=",,,",B=",""#).unwrap();
        assert_eq!(attrs.quoted_string("A").unwrap(), Some(",,,"));
        assert_eq!(attrs.quoted_string("B").unwrap(), Some(","));
    }

    #[test]
    fn test_resolution_is_enumerated() {
        let attrs = AttributeList::decode("RESOLUTION=1920x1080").unwrap();
        assert_eq!(attrs.enumerated_string("RESOLUTION").unwrap(), Some("1920x1080"));
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let attrs = AttributeList::decode(r#" METHOD=AES-128 , URI="k" "#).unwrap();
        assert_eq!(attrs.enumerated_string("METHOD").unwrap(), Some("AES-128"));
        assert_eq!(attrs.quoted_string("URI").unwrap(), Some("k"));
    }

    #[test]
    fn test_empty_list() {
        assert!(AttributeList::decode("").unwrap().is_empty());
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            AttributeList::decode(r#"URI="init.mp4,BYTERANGE=10"#),
            Err(AttributeError::UnterminatedQuote("URI".to_string()))
        );
    }

    #[test]
    fn test_duplicate_name() {
        assert_eq!(
            AttributeList::decode(r#"URI="a",URI="b""#),
            Err(AttributeError::DuplicateName("URI".to_string()))
        );
    }

    #[test]
    fn test_malformed_hex() {
        assert!(matches!(
            AttributeList::decode("IV=0x123"),
            Err(AttributeError::MalformedHex { .. })
        ));
        assert!(matches!(
            AttributeList::decode("IV=0xZZ"),
            Err(AttributeError::MalformedHex { .. })
        ));
        assert!(matches!(
            AttributeList::decode("IV=0x"),
            Err(AttributeError::MalformedHex { .. })
        ));
    }

    #[test]
    fn test_grammar_errors() {
        assert!(matches!(
            AttributeList::decode("method=NONE"),
            Err(AttributeError::InvalidName(_))
        ));
        assert!(matches!(
            AttributeList::decode("METHOD"),
            Err(AttributeError::MissingSeparator(_))
        ));
        assert!(matches!(
            AttributeList::decode("METHOD=NONE,"),
            Err(AttributeError::MissingSeparator(_))
        ));
        assert!(matches!(
            AttributeList::decode("METHOD="),
            Err(AttributeError::EmptyValue(_))
        ));
        assert!(matches!(
            AttributeList::decode(r#"URI="a"b"#),
            Err(AttributeError::TrailingCharacters(_))
        ));
        assert!(matches!(
            AttributeList::decode("BANDWIDTH=99999999999999999999999"),
            Err(AttributeError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let attrs = AttributeList::decode("URI=plain").unwrap();
        assert!(matches!(
            attrs.quoted_string("URI"),
            Err(AttributeError::UnexpectedType { .. })
        ));
        assert_eq!(attrs.decimal_integer("MISSING").unwrap(), None);
    }

    #[test]
    fn test_resolve_range() {
        let mut attrs = AttributeList::decode(r#"URI="init.mp4",BYTERANGE="720@0""#).unwrap();
        let range = attrs.resolve_range("BYTERANGE").unwrap().unwrap();
        assert_eq!(range, ByteRange::new(720, Some(0)));
        assert_eq!(
            attrs.get("BYTERANGE"),
            Some(&AttributeValue::ResolvedRange {
                length: 720,
                offset: Some(0)
            })
        );
        assert_eq!(attrs.byte_range("BYTERANGE").unwrap(), Some(range));

        let mut bad = AttributeList::decode(r#"BYTERANGE="x@1""#).unwrap();
        assert!(matches!(
            bad.resolve_range("BYTERANGE"),
            Err(AttributeError::MalformedByteRange { .. })
        ));
    }

    #[test]
    fn test_number_grammar() {
        assert_eq!(parse_decimal_integer("+3"), None);
        assert_eq!(parse_decimal_integer("42"), Some(42));
        assert_eq!(parse_decimal_float("9.009"), Some(9.009));
        assert_eq!(parse_decimal_float("10"), Some(10.0));
        assert_eq!(parse_decimal_float("1e3"), None);
        assert_eq!(parse_decimal_float(".5"), None);
        assert_eq!(parse_decimal_float("NaN"), None);
    }
}
