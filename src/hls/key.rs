use serde::{Serialize, Serializer};

use crate::{Result, error::TagSite, tag::AttributeList};

/// KEYFORMAT used when the attribute is absent.
pub const DEFAULT_KEY_FORMAT: &str = "identity";

/// Represents an HLS encryption method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMethod {
    None,
    Aes128,
    SampleAes,
}

impl KeyMethod {
    /// Parse from EXT-X-KEY METHOD attribute value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NONE" => Some(Self::None),
            "AES-128" => Some(Self::Aes128),
            "SAMPLE-AES" => Some(Self::SampleAes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Aes128 => "AES-128",
            Self::SampleAes => "SAMPLE-AES",
        }
    }

    pub fn is_encrypted(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Serialize for KeyMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Decryption parameters from an #EXT-X-KEY tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyRef {
    pub method: KeyMethod,
    pub uri: Option<String>,
    #[serde(serialize_with = "serialize_iv")]
    pub iv: Option<[u8; 16]>,
    pub key_format: String,
    pub key_format_versions: Vec<u32>,
}

impl KeyRef {
    /// The `METHOD=NONE` key.
    pub fn none() -> Self {
        Self {
            method: KeyMethod::None,
            uri: None,
            iv: None,
            key_format: DEFAULT_KEY_FORMAT.to_string(),
            key_format_versions: vec![1],
        }
    }

    /// Build from a decoded EXT-X-KEY (or EXT-X-SESSION-KEY) attribute list.
    pub fn from_attributes(attrs: &AttributeList, site: TagSite) -> Result<Self> {
        let raw_method = attrs
            .enumerated_string("METHOD")
            .map_err(|e| site.malformed(e))?
            .ok_or_else(|| site.missing_attribute("METHOD"))?;
        let method = KeyMethod::parse(raw_method).ok_or_else(|| site.invalid_value(raw_method))?;

        if method == KeyMethod::None {
            if let Some(other) = attrs.names().find(|name| *name != "METHOD") {
                return Err(site.illegal_combination(other));
            }
            return Ok(Self::none());
        }

        let uri = attrs
            .quoted_string("URI")
            .map_err(|e| site.malformed(e))?
            .ok_or_else(|| site.missing_attribute("URI"))?;

        let iv = match attrs.hex_sequence("IV").map_err(|e| site.malformed(e))? {
            Some(bytes) => Some(
                <[u8; 16]>::try_from(bytes)
                    .map_err(|_| site.invalid_value(format!("IV=0x{}", hex::encode(bytes))))?,
            ),
            None => None,
        };

        let key_format = attrs
            .quoted_string("KEYFORMAT")
            .map_err(|e| site.malformed(e))?
            .unwrap_or(DEFAULT_KEY_FORMAT)
            .to_string();

        let key_format_versions = match attrs
            .quoted_string("KEYFORMATVERSIONS")
            .map_err(|e| site.malformed(e))?
        {
            Some(raw) => Self::parse_format_versions(raw)
                .ok_or_else(|| site.invalid_value(format!("KEYFORMATVERSIONS=\"{}\"", raw)))?,
            None => vec![1],
        };

        Ok(Self {
            method,
            uri: Some(uri.to_string()),
            iv,
            key_format,
            key_format_versions,
        })
    }

    /// Parse "1/2/5" into positive integers.
    fn parse_format_versions(s: &str) -> Option<Vec<u32>> {
        s.split('/')
            .map(|part| part.trim().parse::<u32>().ok().filter(|v| *v > 0))
            .collect()
    }

    pub fn is_encrypted(&self) -> bool {
        self.method.is_encrypted()
    }
}

fn serialize_iv<S: Serializer>(
    iv: &Option<[u8; 16]>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match iv {
        Some(bytes) => crate::tag::attribute::serialize_hex(bytes, serializer),
        None => serializer.serialize_none(),
    }
}
