use serde::{Serialize, Serializer};

/// Which part of RFC 8216 section 4.3 a tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagCategory {
    /// Allowed in every playlist (4.3.1).
    Basic,
    /// Describes the next segment or a span of segments (4.3.2).
    MediaSegment,
    /// Applies to a whole Media Playlist (4.3.3).
    MediaPlaylist,
    /// Only valid in a Master Playlist (4.3.4).
    MasterPlaylist,
    /// Allowed in either playlist type (4.3.5).
    MediaOrMaster,
}

impl TagCategory {
    /// Tags that make a playlist a Media Playlist.
    pub fn is_media_side(&self) -> bool {
        matches!(self, Self::MediaSegment | Self::MediaPlaylist)
    }

    pub fn is_master(&self) -> bool {
        matches!(self, Self::MasterPlaylist)
    }
}

/// Grammar of the text following the `:` of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    None,
    DecimalInteger,
    /// `<duration>,[<title>]`
    Extinf,
    /// `<n>[@<o>]`
    ByteRange,
    EnumeratedString,
    /// ISO 8601 / RFC 3339 date-time.
    DateTime,
    AttributeList,
}

impl ValueKind {
    pub fn has_value(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Every tag the parser understands. The discriminant indexes `CATALOG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagName {
    ExtM3U,
    ExtXVersion,
    ExtInf,
    ExtXByteRange,
    ExtXDiscontinuity,
    ExtXKey,
    ExtXMap,
    ExtXProgramDateTime,
    ExtXDateRange,
    ExtXTargetDuration,
    ExtXMediaSequence,
    ExtXDiscontinuitySequence,
    ExtXEndList,
    ExtXPlaylistType,
    ExtXIFramesOnly,
    ExtXMedia,
    ExtXStreamInf,
    ExtXIFrameStreamInf,
    ExtXSessionData,
    ExtXSessionKey,
    ExtXIndependentSegments,
    ExtXStart,
}

impl TagName {
    pub fn descriptor(self) -> &'static TagDescriptor {
        &CATALOG[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.descriptor().token
    }
}

impl Serialize for TagName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Static description of one tag.
#[derive(Debug, PartialEq, Eq)]
pub struct TagDescriptor {
    /// Token as written after `#`, e.g. `EXT-X-KEY`.
    pub token: &'static str,
    pub name: TagName,
    pub category: TagCategory,
    pub value: ValueKind,
    /// Lowest EXT-X-VERSION under which the tag may appear at all.
    pub min_version: Option<u32>,
    pub required_attributes: &'static [&'static str],
}

impl TagDescriptor {
    const fn new(
        name: TagName,
        token: &'static str,
        category: TagCategory,
        value: ValueKind,
    ) -> Self {
        Self {
            token,
            name,
            category,
            value,
            min_version: None,
            required_attributes: &[],
        }
    }

    const fn since(mut self, version: u32) -> Self {
        self.min_version = Some(version);
        self
    }

    const fn requires(mut self, attributes: &'static [&'static str]) -> Self {
        self.required_attributes = attributes;
        self
    }

    pub fn has_value(&self) -> bool {
        self.value.has_value()
    }
}

use TagCategory::{Basic, MasterPlaylist, MediaOrMaster, MediaPlaylist, MediaSegment};

static CATALOG: [TagDescriptor; 22] = [
    TagDescriptor::new(TagName::ExtM3U, "EXTM3U", Basic, ValueKind::None),
    TagDescriptor::new(
        TagName::ExtXVersion,
        "EXT-X-VERSION",
        Basic,
        ValueKind::DecimalInteger,
    ),
    TagDescriptor::new(TagName::ExtInf, "EXTINF", MediaSegment, ValueKind::Extinf),
    TagDescriptor::new(
        TagName::ExtXByteRange,
        "EXT-X-BYTERANGE",
        MediaSegment,
        ValueKind::ByteRange,
    )
    .since(4),
    TagDescriptor::new(
        TagName::ExtXDiscontinuity,
        "EXT-X-DISCONTINUITY",
        MediaSegment,
        ValueKind::None,
    ),
    TagDescriptor::new(
        TagName::ExtXKey,
        "EXT-X-KEY",
        MediaSegment,
        ValueKind::AttributeList,
    )
    .requires(&["METHOD"]),
    // 5 inside an I-frames-only playlist, 6 elsewhere; the stricter bound is
    // applied once the whole playlist has been seen.
    TagDescriptor::new(
        TagName::ExtXMap,
        "EXT-X-MAP",
        MediaSegment,
        ValueKind::AttributeList,
    )
    .since(5)
    .requires(&["URI"]),
    TagDescriptor::new(
        TagName::ExtXProgramDateTime,
        "EXT-X-PROGRAM-DATE-TIME",
        MediaSegment,
        ValueKind::DateTime,
    ),
    TagDescriptor::new(
        TagName::ExtXDateRange,
        "EXT-X-DATERANGE",
        MediaSegment,
        ValueKind::AttributeList,
    )
    .requires(&["ID"]),
    TagDescriptor::new(
        TagName::ExtXTargetDuration,
        "EXT-X-TARGETDURATION",
        MediaPlaylist,
        ValueKind::DecimalInteger,
    ),
    TagDescriptor::new(
        TagName::ExtXMediaSequence,
        "EXT-X-MEDIA-SEQUENCE",
        MediaPlaylist,
        ValueKind::DecimalInteger,
    ),
    TagDescriptor::new(
        TagName::ExtXDiscontinuitySequence,
        "EXT-X-DISCONTINUITY-SEQUENCE",
        MediaPlaylist,
        ValueKind::DecimalInteger,
    ),
    TagDescriptor::new(
        TagName::ExtXEndList,
        "EXT-X-ENDLIST",
        MediaPlaylist,
        ValueKind::None,
    ),
    TagDescriptor::new(
        TagName::ExtXPlaylistType,
        "EXT-X-PLAYLIST-TYPE",
        MediaPlaylist,
        ValueKind::EnumeratedString,
    ),
    TagDescriptor::new(
        TagName::ExtXIFramesOnly,
        "EXT-X-I-FRAMES-ONLY",
        MediaPlaylist,
        ValueKind::None,
    )
    .since(4),
    TagDescriptor::new(
        TagName::ExtXMedia,
        "EXT-X-MEDIA",
        MasterPlaylist,
        ValueKind::AttributeList,
    )
    .requires(&["TYPE", "GROUP-ID", "NAME"]),
    TagDescriptor::new(
        TagName::ExtXStreamInf,
        "EXT-X-STREAM-INF",
        MasterPlaylist,
        ValueKind::AttributeList,
    )
    .requires(&["BANDWIDTH"]),
    TagDescriptor::new(
        TagName::ExtXIFrameStreamInf,
        "EXT-X-I-FRAME-STREAM-INF",
        MasterPlaylist,
        ValueKind::AttributeList,
    )
    .requires(&["BANDWIDTH", "URI"]),
    TagDescriptor::new(
        TagName::ExtXSessionData,
        "EXT-X-SESSION-DATA",
        MasterPlaylist,
        ValueKind::AttributeList,
    )
    .requires(&["DATA-ID"]),
    TagDescriptor::new(
        TagName::ExtXSessionKey,
        "EXT-X-SESSION-KEY",
        MasterPlaylist,
        ValueKind::AttributeList,
    )
    .requires(&["METHOD"]),
    TagDescriptor::new(
        TagName::ExtXIndependentSegments,
        "EXT-X-INDEPENDENT-SEGMENTS",
        MediaOrMaster,
        ValueKind::None,
    ),
    TagDescriptor::new(
        TagName::ExtXStart,
        "EXT-X-START",
        MediaOrMaster,
        ValueKind::AttributeList,
    )
    .requires(&["TIME-OFFSET"]),
];

/// Look up a tag token (without the leading `#`). Case-sensitive, exact.
///
/// `None` means the tag is not one we know; callers treat it as ignorable.
pub fn lookup(token: &str) -> Option<&'static TagDescriptor> {
    CATALOG.iter().find(|descriptor| descriptor.token == token)
}

/// All known descriptors in catalog order.
pub fn descriptors() -> &'static [TagDescriptor] {
    &CATALOG
}
