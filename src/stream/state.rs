use chrono::{DateTime, FixedOffset};

use crate::{
    Error, Result,
    error::TagSite,
    hls::{ByteRange, Extinf, KeyMethod, KeyRef, MapRef, Segment},
    tag::AttributeList,
};

/// EXTINF waiting for its URI line.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingExtinf {
    pub extinf: Extinf,
    pub line: usize,
}

/// EXT-X-BYTERANGE waiting for its URI line.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingByteRange {
    pub range: ByteRange,
    pub line: usize,
}

/// EXT-X-STREAM-INF waiting for its URI line.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingVariant {
    pub attributes: AttributeList,
    pub line: usize,
}

/// Where the previous segment's sub-range ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorRange {
    pub uri: String,
    pub end: u64,
}

/// A feature used at `line` that needs at least `version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRequirement {
    pub version: u32,
    pub line: usize,
    pub feature: &'static str,
    /// Only enforced against an explicit EXT-X-VERSION.
    pub declared_only: bool,
}

/// State threaded through the lines of one playlist.
#[derive(Debug, Clone, Default)]
pub struct ParserState {
    /// Whether #EXTM3U has been seen.
    pub header_seen: bool,

    /// Declared EXT-X-VERSION, if any.
    pub version: Option<u32>,

    /// One-shot tags for the next URI.
    pub pending_extinf: Option<PendingExtinf>,
    pub pending_byterange: Option<PendingByteRange>,
    pub pending_discontinuity: bool,
    pub pending_program_date_time: Option<DateTime<FixedOffset>>,
    pub pending_variant: Option<PendingVariant>,

    /// Keys in effect, one per KEYFORMAT, in order of first appearance.
    pub current_keys: Vec<KeyRef>,

    /// Current init segment info.
    pub current_map: Option<MapRef>,

    /// Last byte range end (for continuation).
    pub last_byterange: Option<PriorRange>,

    pub saw_master_tag: bool,
    pub saw_media_tag: bool,

    pub i_frames_only: bool,

    /// Lines carrying EXT-X-MAP; their version bound depends on `i_frames_only`.
    pub map_lines: Vec<usize>,

    pub requirements: Vec<VersionRequirement>,
}

impl ParserState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Version in force: the declared one or the implicit 1.
    pub fn declared_version(&self) -> u32 {
        self.version.unwrap_or(1)
    }

    pub fn require_version(&mut self, version: u32, line: usize, feature: &'static str) {
        self.requirements.push(VersionRequirement {
            version,
            line,
            feature,
            declared_only: false,
        });
    }

    /// Like `require_version`, but a playlist without EXT-X-VERSION passes.
    pub fn require_declared_version(&mut self, version: u32, line: usize, feature: &'static str) {
        self.requirements.push(VersionRequirement {
            version,
            line,
            feature,
            declared_only: true,
        });
    }

    /// All version requirements, including the EXT-X-MAP ones that could
    /// only be decided once the whole playlist was seen.
    pub fn version_requirements(&self) -> impl Iterator<Item = VersionRequirement> + '_ {
        let map_version = if self.i_frames_only { 5 } else { 6 };
        let maps = self.map_lines.iter().map(move |&line| VersionRequirement {
            version: map_version,
            line,
            feature: "EXT-X-MAP",
            declared_only: false,
        });
        self.requirements.iter().copied().chain(maps)
    }

    /// The first key in effect; this is the one segments report as `key`.
    pub fn current_key(&self) -> Option<&KeyRef> {
        self.current_keys.first()
    }

    /// Replace the key with the same KEYFORMAT. `METHOD=NONE` ends every key.
    pub fn update_key(&mut self, key: KeyRef) {
        if key.method == KeyMethod::None {
            self.current_keys.clear();
            self.current_keys.push(key);
            return;
        }

        self.current_keys
            .retain(|existing| existing.method != KeyMethod::None);
        match self
            .current_keys
            .iter_mut()
            .find(|existing| existing.key_format == key.key_format)
        {
            Some(existing) => *existing = key,
            None => self.current_keys.push(key),
        }
    }

    pub fn update_map(&mut self, map: MapRef) {
        self.current_map = Some(map);
    }

    pub fn set_pending_extinf(&mut self, extinf: Extinf, line: usize) {
        if let Some(previous) = &self.pending_extinf {
            tracing::warn!(
                "Line {}: EXTINF replaces the one on line {} before any URI",
                line,
                previous.line
            );
        }
        self.pending_extinf = Some(PendingExtinf { extinf, line });
    }

    pub fn set_byterange(&mut self, range: ByteRange, line: usize) {
        self.pending_byterange = Some(PendingByteRange { range, line });
    }

    pub fn set_pending_variant(&mut self, attributes: AttributeList, line: usize) {
        self.pending_variant = Some(PendingVariant { attributes, line });
    }

    /// Finish a segment at a URI line, consuming every one-shot tag and
    /// copying the spans in effect.
    pub fn take_segment(&mut self, extinf: Extinf, uri: &str) -> Result<Segment> {
        let mut segment = Segment::new(extinf.duration, uri)
            .with_title(extinf.title)
            .with_discontinuity(std::mem::take(&mut self.pending_discontinuity))
            .with_program_date_time(self.pending_program_date_time.take())
            .with_keys(&self.current_keys)
            .with_init_section(self.current_map.clone());

        match self.pending_byterange.take() {
            Some(pending) => {
                let previous_end = self
                    .last_byterange
                    .as_ref()
                    .filter(|prior| prior.uri == uri)
                    .map(|prior| prior.end);
                if pending.range.offset.is_none() && previous_end.is_none() {
                    return Err(Error::MissingPriorByteRange {
                        line: pending.line,
                        value: pending.range.to_string(),
                    });
                }
                let site = TagSite::new(pending.line, "EXT-X-BYTERANGE");
                let (resolved, end) = pending
                    .range
                    .resolve(previous_end)
                    .and_then(|resolved| Some((resolved, resolved.end_offset()?)))
                    .ok_or_else(|| site.invalid_value(pending.range.to_string()))?;
                self.last_byterange = Some(PriorRange {
                    uri: uri.to_string(),
                    end,
                });
                segment = segment.with_byte_range(resolved);
            }
            None => self.last_byterange = None,
        }

        Ok(segment)
    }

    /// One-shot tags still waiting for a URI, by name and line.
    pub fn dangling(&self) -> Vec<(&'static str, usize)> {
        let mut dangling = Vec::new();
        if let Some(pending) = &self.pending_extinf {
            dangling.push(("EXTINF", pending.line));
        }
        if let Some(pending) = &self.pending_byterange {
            dangling.push(("EXT-X-BYTERANGE", pending.line));
        }
        if let Some(pending) = &self.pending_variant {
            dangling.push(("EXT-X-STREAM-INF", pending.line));
        }
        dangling
    }
}
