use serde::Serialize;

use crate::{Result, error::TagSite, tag::AttributeList};

/// A variant stream: #EXT-X-STREAM-INF plus the URI line after it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantStream {
    pub uri: String,
    pub bandwidth: u64,
    pub average_bandwidth: Option<u64>,
    pub resolution: Option<(u32, u32)>,
    pub codecs: Option<String>,
    pub frame_rate: Option<f64>,
    pub audio: Option<String>,
    pub video: Option<String>,
    pub subtitles: Option<String>,
    /// Group id, or `NONE`.
    pub closed_captions: Option<String>,
}

impl VariantStream {
    pub fn from_attributes(attrs: &AttributeList, uri: &str, site: TagSite) -> Result<Self> {
        let malformed = |e| site.malformed(e);

        let bandwidth = attrs
            .decimal_integer("BANDWIDTH")
            .map_err(malformed)?
            .ok_or_else(|| site.missing_attribute("BANDWIDTH"))?;

        let resolution = match attrs.enumerated_string("RESOLUTION").map_err(malformed)? {
            Some(raw) => Some(
                Self::parse_resolution(raw)
                    .ok_or_else(|| site.invalid_value(format!("RESOLUTION={}", raw)))?,
            ),
            None => None,
        };

        // CLOSED-CAPTIONS is either a quoted group id or the bare NONE.
        let closed_captions = match attrs.get("CLOSED-CAPTIONS") {
            None => None,
            Some(_) => Some(
                match attrs.enumerated_string("CLOSED-CAPTIONS") {
                    Ok(Some("NONE")) => "NONE",
                    _ => attrs
                        .quoted_string("CLOSED-CAPTIONS")
                        .map_err(malformed)?
                        .unwrap_or_default(),
                }
                .to_string(),
            ),
        };

        let quoted = |name: &str| -> Result<Option<String>> {
            Ok(attrs
                .quoted_string(name)
                .map_err(malformed)?
                .map(str::to_string))
        };

        Ok(Self {
            uri: uri.to_string(),
            bandwidth,
            average_bandwidth: attrs
                .decimal_integer("AVERAGE-BANDWIDTH")
                .map_err(malformed)?,
            resolution,
            codecs: quoted("CODECS")?,
            frame_rate: attrs.decimal_float("FRAME-RATE").map_err(malformed)?,
            audio: quoted("AUDIO")?,
            video: quoted("VIDEO")?,
            subtitles: quoted("SUBTITLES")?,
            closed_captions,
        })
    }

    fn parse_resolution(s: &str) -> Option<(u32, u32)> {
        let (w, h) = s.split_once('x')?;
        Some((w.parse().ok()?, h.parse().ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn variant(raw: &str) -> Result<VariantStream> {
        VariantStream::from_attributes(
            &AttributeList::decode(raw).unwrap(),
            "hi/index.m3u8",
            TagSite::new(2, "EXT-X-STREAM-INF"),
        )
    }

    #[test]
    fn test_parse() {
        let info = variant(
            r#"BANDWIDTH=1000000,RESOLUTION=1280x720,CODECS="avc1.64001f,mp4a.40.2",FRAME-RATE=30,AUDIO="aac",CLOSED-CAPTIONS=NONE"#,
        )
        .unwrap();
        assert_eq!(info.uri, "hi/index.m3u8");
        assert_eq!(info.bandwidth, 1000000);
        assert_eq!(info.resolution, Some((1280, 720)));
        assert_eq!(info.codecs.as_deref(), Some("avc1.64001f,mp4a.40.2"));
        assert_eq!(info.frame_rate, Some(30.0));
        assert_eq!(info.audio.as_deref(), Some("aac"));
        assert_eq!(info.closed_captions.as_deref(), Some("NONE"));
    }

    #[test]
    fn test_quoted_closed_captions() {
        let info = variant(r#"BANDWIDTH=1,CLOSED-CAPTIONS="cc1""#).unwrap();
        assert_eq!(info.closed_captions.as_deref(), Some("cc1"));
    }

    #[test]
    fn test_missing_bandwidth() {
        assert!(matches!(
            variant(r#"CODECS="avc1""#),
            Err(Error::MissingRequiredAttribute {
                attribute: "BANDWIDTH",
                ..
            })
        ));
    }

    #[test]
    fn test_bad_resolution() {
        assert!(matches!(
            variant("BANDWIDTH=1,RESOLUTION=wide"),
            Err(Error::InvalidValue { .. })
        ));
    }
}
