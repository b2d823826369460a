use std::{collections::BTreeSet, str::FromStr};

use serde::Serialize;

use crate::{
    Error, Result,
    hls::{Segment, StartPoint, VariantStream},
    stream::{Line, LineScanner, PlaylistParser},
    tag::{AttributeList, TagName},
};

/// Value of #EXT-X-PLAYLIST-TYPE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaPlaylistType {
    Event,
    Vod,
}

impl MediaPlaylistType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "EVENT" => Some(Self::Event),
            "VOD" => Some(Self::Vod),
            _ => None,
        }
    }
}

/// An attribute-list tag kept as decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRecord {
    pub line: usize,
    pub name: TagName,
    pub attributes: AttributeList,
}

/// An `#EXT` tag the parser does not know. Recorded and otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownTag {
    pub line: usize,
    pub token: String,
}

/// A parsed and validated M3U8 playlist.
///
/// Media playlists carry `segments`; master playlists carry `variants` and
/// `master_tags`. A playlist is never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playlist {
    pub(crate) version: u32,
    pub(crate) version_declared: bool,
    pub(crate) basic_tags: BTreeSet<TagName>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) is_master: bool,
    pub(crate) variants: Vec<VariantStream>,
    pub(crate) master_tags: Vec<TagRecord>,
    pub(crate) date_ranges: Vec<TagRecord>,
    pub(crate) target_duration: Option<u64>,
    pub(crate) media_sequence: Option<u64>,
    pub(crate) discontinuity_sequence: Option<u64>,
    pub(crate) playlist_type: Option<MediaPlaylistType>,
    pub(crate) end_list: bool,
    pub(crate) i_frames_only: bool,
    pub(crate) independent_segments: bool,
    pub(crate) start: Option<StartPoint>,
    pub(crate) unknown_tags: Vec<UnknownTag>,
}

impl Playlist {
    pub(crate) fn new() -> Self {
        Self {
            version: 1,
            version_declared: false,
            basic_tags: BTreeSet::new(),
            segments: Vec::new(),
            is_master: false,
            variants: Vec::new(),
            master_tags: Vec::new(),
            date_ranges: Vec::new(),
            target_duration: None,
            media_sequence: None,
            discontinuity_sequence: None,
            playlist_type: None,
            end_list: false,
            i_frames_only: false,
            independent_segments: false,
            start: None,
            unknown_tags: Vec::new(),
        }
    }

    /// Parse a complete playlist buffer.
    pub fn parse(input: &str) -> Result<Self> {
        PlaylistParser::new().parse(input)
    }

    /// Parse from lines that have already been split, numbered from 1.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parser = PlaylistParser::new();
        for (index, raw) in lines.into_iter().enumerate() {
            let raw = raw.as_ref();
            let raw = if index == 0 {
                raw.strip_prefix('\u{feff}').unwrap_or(raw)
            } else {
                raw
            };
            parser.process_line(Line {
                number: index + 1,
                kind: LineScanner::classify(raw),
            })?;
        }
        parser.finish()
    }

    /// Effective version: the declared one, or 1.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn version_declared(&self) -> bool {
        self.version_declared
    }

    /// Basic tags (EXTM3U, EXT-X-VERSION) that appeared at least once.
    pub fn basic_tags(&self) -> &BTreeSet<TagName> {
        &self.basic_tags
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    pub fn variants(&self) -> &[VariantStream] {
        &self.variants
    }

    /// EXT-X-MEDIA, EXT-X-I-FRAME-STREAM-INF, EXT-X-SESSION-DATA and
    /// EXT-X-SESSION-KEY, in order of appearance.
    pub fn master_tags(&self) -> &[TagRecord] {
        &self.master_tags
    }

    pub fn date_ranges(&self) -> &[TagRecord] {
        &self.date_ranges
    }

    pub fn target_duration(&self) -> Option<u64> {
        self.target_duration
    }

    pub fn media_sequence(&self) -> Option<u64> {
        self.media_sequence
    }

    pub fn discontinuity_sequence(&self) -> Option<u64> {
        self.discontinuity_sequence
    }

    pub fn playlist_type(&self) -> Option<MediaPlaylistType> {
        self.playlist_type
    }

    pub fn end_list(&self) -> bool {
        self.end_list
    }

    pub fn i_frames_only(&self) -> bool {
        self.i_frames_only
    }

    pub fn independent_segments(&self) -> bool {
        self.independent_segments
    }

    pub fn start(&self) -> Option<&StartPoint> {
        self.start.as_ref()
    }

    pub fn unknown_tags(&self) -> &[UnknownTag] {
        &self.unknown_tags
    }

    /// Sum of all segment durations, in seconds.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

impl FromStr for Playlist {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::{KeyMethod, ResolvedByteRange};

    #[test]
    fn test_single_segment() {
        let playlist = Playlist::parse("#EXTM3U\n#EXTINF:9.009,\nseg1.ts\n").unwrap();
        assert_eq!(playlist.version(), 1);
        assert!(!playlist.version_declared());
        assert_eq!(playlist.segments().len(), 1);
        let segment = &playlist.segments()[0];
        assert_eq!(segment.duration, 9.009);
        assert_eq!(segment.uri, "seg1.ts");
        assert_eq!(segment.key, None);
        assert_eq!(segment.init_section, None);
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            Playlist::parse("#EXTINF:10,\nseg1.ts\n"),
            Err(Error::MissingHeader { line: 1 })
        );
        assert_eq!(Playlist::parse(""), Err(Error::MissingHeader { line: 1 }));
        let empty = Playlist::parse("\n\n#EXTM3U\n").unwrap();
        assert!(empty.segments().is_empty());
        assert_eq!(
            Playlist::parse("\n# comment\n#EXTM3U\n"),
            Err(Error::MissingHeader { line: 2 })
        );
    }

    #[test]
    fn test_key_none_with_uri() {
        assert_eq!(
            Playlist::parse("#EXTM3U\n#EXT-X-KEY:METHOD=NONE,URI=\"k\"\n"),
            Err(Error::IllegalAttributeCombination {
                line: 2,
                tag: "EXT-X-KEY",
                attribute: "URI".to_string()
            })
        );
    }

    #[test]
    fn test_map_needs_newer_version() {
        assert_eq!(
            Playlist::parse("#EXTM3U\n#EXT-X-VERSION:2\n#EXT-X-MAP:URI=\"init.mp4\"\n"),
            Err(Error::IncompatibleVersion {
                line: 3,
                feature: "EXT-X-MAP",
                required: 6,
                declared: 2,
            })
        );
    }

    #[test]
    fn test_mixed_playlist_types() {
        let input = "#EXTM3U\n#EXTINF:10,\nseg1.ts\n#EXT-X-STREAM-INF:BANDWIDTH=1000\nlow.m3u8\n";
        assert_eq!(
            Playlist::parse(input),
            Err(Error::MixedPlaylistTypes {
                line: 4,
                tag: "EXT-X-STREAM-INF"
            })
        );

        let input = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1000\nlow.m3u8\n#EXT-X-TARGETDURATION:10\n";
        assert!(matches!(
            Playlist::parse(input),
            Err(Error::MixedPlaylistTypes { line: 4, .. })
        ));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let input = concat!(
            "#EXTM3U\n",
            "#EXT-X-VERSION:7\n",
            "#EXT-X-TARGETDURATION:4\n",
            "#EXT-X-KEY:METHOD=SAMPLE-AES,URI=\"skd://key\",KEYFORMAT=\"com.apple.streamingkeydelivery\",KEYFORMATVERSIONS=\"1\"\n",
            "#EXT-X-MAP:URI=\"init.mp4\"\n",
            "#EXTINF:4.004,\n",
            "seg0.m4s\n",
            "#EXTINF:4.004,\n",
            "seg1.m4s\n",
        );
        let first = Playlist::parse(input).unwrap();
        let second: Playlist = input.parse().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_segment_count_matches_uris() {
        let input = concat!(
            "#EXTM3U\n",
            "#EXT-X-TARGETDURATION:10\n",
            "#EXTINF:10,first\n",
            "a.ts\n",
            "\n",
            "# comment between segments\n",
            "#EXTINF:10,\n",
            "b.ts\n",
            "#EXTINF:8,\n",
            "c.ts\n",
            "#EXT-X-ENDLIST\n",
        );
        let playlist = Playlist::parse(input).unwrap();
        assert_eq!(playlist.segments().len(), 3);
        assert_eq!(playlist.segments()[0].title.as_deref(), Some("first"));
        assert_eq!(playlist.total_duration(), 28.0);
    }

    #[test]
    fn test_byterange_offsets_chain() {
        let input = concat!(
            "#EXTM3U\n",
            "#EXT-X-VERSION:4\n",
            "#EXTINF:10,\n",
            "#EXT-X-BYTERANGE:75232@0\n",
            "segment.ts\n",
            "#EXTINF:10,\n",
            "#EXT-X-BYTERANGE:82112\n",
            "segment.ts\n",
            "#EXTINF:10,\n",
            "#EXT-X-BYTERANGE:69864\n",
            "segment.ts\n",
        );
        let playlist = Playlist::parse(input).unwrap();
        let segments = playlist.segments();
        for pair in segments.windows(2) {
            let previous = pair[0].byte_range.unwrap();
            let next = pair[1].byte_range.unwrap();
            assert_eq!(next.offset, previous.offset + previous.length);
        }
        assert_eq!(
            segments[2].byte_range,
            Some(ResolvedByteRange {
                length: 69864,
                offset: 157344
            })
        );
    }

    #[test]
    fn test_spans_are_copied_by_value() {
        let input = concat!(
            "#EXTM3U\n",
            "#EXT-X-VERSION:6\n",
            "#EXT-X-KEY:METHOD=AES-128,URI=\"k1\",IV=0x00000000000000000000000000000001\n",
            "#EXT-X-MAP:URI=\"init.mp4\"\n",
            "#EXTINF:4,\n",
            "a.m4s\n",
            "#EXT-X-KEY:METHOD=AES-128,URI=\"k2\",IV=0x00000000000000000000000000000002\n",
            "#EXTINF:4,\n",
            "b.m4s\n",
        );
        let playlist = Playlist::parse(input).unwrap();
        let [a, b] = playlist.segments() else {
            panic!("expected two segments");
        };

        assert_eq!(a.key.as_ref().unwrap().uri.as_deref(), Some("k1"));
        assert_eq!(b.key.as_ref().unwrap().uri.as_deref(), Some("k2"));

        // Both see the same map, which captured the key in effect when it appeared.
        assert_eq!(a.init_section, b.init_section);
        let map_key = a.init_section.as_ref().unwrap().key.as_ref().unwrap();
        assert_eq!(map_key.method, KeyMethod::Aes128);
        assert_eq!(map_key.uri.as_deref(), Some("k1"));
    }

    #[test]
    fn test_master_playlist() {
        let input = concat!(
            "#EXTM3U\n",
            "#EXT-X-SESSION-DATA:DATA-ID=\"com.example.title\",VALUE=\"Example\"\n",
            "#EXT-X-STREAM-INF:BANDWIDTH=150000,RESOLUTION=416x234,CODECS=\"avc1.42e00a,mp4a.40.2\"\n",
            "http://example.com/low/index.m3u8\n",
            "#EXT-X-STREAM-INF:BANDWIDTH=640000,AVERAGE-BANDWIDTH=500000,FRAME-RATE=29.970\n",
            "http://example.com/mid/index.m3u8\n",
        );
        let playlist = Playlist::parse(input).unwrap();
        assert!(playlist.is_master());
        assert_eq!(playlist.variants().len(), 2);

        let low = &playlist.variants()[0];
        assert_eq!(low.bandwidth, 150000);
        assert_eq!(low.codecs.as_deref(), Some("avc1.42e00a,mp4a.40.2"));
        assert_eq!(low.resolution, Some((416, 234)));

        let mid = &playlist.variants()[1];
        assert_eq!(mid.average_bandwidth, Some(500000));
        assert_eq!(mid.frame_rate, Some(29.97));

        assert_eq!(playlist.master_tags()[0].name, TagName::ExtXSessionData);
    }

    #[test]
    fn test_unknown_tags_are_ignored() {
        let with_unknown = "#EXTM3U\n#EXT-X-FUTURE-TAG:X=1\n#EXTINF:10,\na.ts\n";
        let without = "#EXTM3U\n#EXTINF:10,\na.ts\n";
        let a = Playlist::parse(with_unknown).unwrap();
        let b = Playlist::parse(without).unwrap();
        assert_eq!(a.segments(), b.segments());
        assert_eq!(a.unknown_tags().len(), 1);
        assert_eq!(a.unknown_tags()[0].token, "EXT-X-FUTURE-TAG");
    }

    #[test]
    fn test_from_lines() {
        let lines = vec!["\u{feff}#EXTM3U", "#EXTINF:10,", "a.ts"];
        let from_lines = Playlist::from_lines(lines).unwrap();
        let parsed = Playlist::parse("#EXTM3U\n#EXTINF:10,\na.ts\n").unwrap();
        assert_eq!(from_lines, parsed);

        let owned: Vec<String> = vec!["#EXTINF:10,".into(), "a.ts".into()];
        assert_eq!(
            Playlist::from_lines(owned),
            Err(Error::MissingHeader { line: 1 })
        );
    }

    #[test]
    fn test_basic_tags_recorded() {
        let playlist =
            Playlist::parse("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-INDEPENDENT-SEGMENTS\n").unwrap();
        let tags: Vec<_> = playlist.basic_tags().iter().copied().collect();
        assert_eq!(tags, vec![TagName::ExtM3U, TagName::ExtXVersion]);
        assert!(playlist.independent_segments());
        assert!(!playlist.is_master());
    }

    #[test]
    fn test_serialize() {
        let playlist = Playlist::parse(
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-PLAYLIST-TYPE:VOD\n#EXTINF:9.5,\na.ts\n#EXT-X-ENDLIST\n",
        )
        .unwrap();
        let json = serde_json::to_value(&playlist).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["playlist_type"], "VOD");
        assert_eq!(json["segments"][0]["uri"], "a.ts");
        assert_eq!(json["basic_tags"][0], "EXTM3U");
        assert_eq!(json["end_list"], true);
    }
}
