use serde::Serialize;

use crate::{Result, error::TagSite, tag::AttributeList};

/// Preferred point at which to start playing, from #EXT-X-START.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StartPoint {
    /// Seconds from the start (positive) or end (negative) of the playlist.
    pub time_offset: f64,
    pub precise: bool,
}

impl StartPoint {
    pub fn from_attributes(attrs: &AttributeList, site: TagSite) -> Result<Self> {
        let time_offset = attrs
            .decimal_float("TIME-OFFSET")
            .map_err(|e| site.malformed(e))?
            .ok_or_else(|| site.missing_attribute("TIME-OFFSET"))?;

        let precise = match attrs
            .enumerated_string("PRECISE")
            .map_err(|e| site.malformed(e))?
        {
            None | Some("NO") => false,
            Some("YES") => true,
            Some(other) => return Err(site.invalid_value(format!("PRECISE={}", other))),
        };

        Ok(Self {
            time_offset,
            precise,
        })
    }
}
