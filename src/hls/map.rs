use serde::Serialize;

use super::{KeyMethod, KeyRef, ResolvedByteRange};
use crate::{Result, error::TagSite, tag::AttributeList};

/// Media Initialization Section from an #EXT-X-MAP tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRef {
    pub uri: String,
    pub byte_range: Option<ResolvedByteRange>,
    /// Key in effect when the map tag appeared.
    pub key: Option<KeyRef>,
}

impl MapRef {
    /// Build from a decoded EXT-X-MAP attribute list.
    ///
    /// A BYTERANGE without an offset starts at byte 0 of the resource.
    pub fn from_attributes(
        attrs: &AttributeList,
        key: Option<KeyRef>,
        site: TagSite,
    ) -> Result<Self> {
        let uri = attrs
            .quoted_string("URI")
            .map_err(|e| site.malformed(e))?
            .ok_or_else(|| site.missing_attribute("URI"))?;

        let byte_range = attrs
            .byte_range("BYTERANGE")
            .map_err(|e| site.malformed(e))?
            .and_then(|range| range.resolve(Some(0)));

        // An AES-128 encrypted init section cannot use the media sequence
        // number as its IV.
        if let Some(key) = &key
            && key.method == KeyMethod::Aes128
            && key.iv.is_none()
        {
            return Err(site.missing_attribute("IV"));
        }

        Ok(Self {
            uri: uri.to_string(),
            byte_range,
            key,
        })
    }
}
