use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::{KeyRef, MapRef, ResolvedByteRange};
use crate::tag::attribute::{leading_token, parse_decimal_float};

/// Decoded `#EXTINF:<duration>,[<title>]` value.
#[derive(Debug, Clone, PartialEq)]
pub struct Extinf {
    pub duration: f64,
    pub title: Option<String>,
}

impl Extinf {
    /// A missing comma is tolerated; everything is then the duration.
    pub fn parse(value: &str) -> Option<Self> {
        let (duration, title) = match value.split_once(',') {
            Some((duration, title)) => (duration, title.trim()),
            None => (value, ""),
        };

        let (duration, _) = leading_token(duration);
        let duration = parse_decimal_float(duration).filter(|d| *d >= 0.0)?;
        let title = (!title.is_empty()).then(|| title.to_string());

        Some(Self { duration, title })
    }

    /// Integer durations are the only ones allowed below version 3.
    pub fn is_integral(&self) -> bool {
        self.duration.fract() == 0.0
    }
}

/// One media segment: EXTINF + URI plus whatever spans applied to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// Duration in seconds.
    pub duration: f64,
    pub title: Option<String>,
    pub uri: String,
    pub byte_range: Option<ResolvedByteRange>,
    pub discontinuity: bool,
    /// First key in effect. `None` when no EXT-X-KEY preceded the segment.
    pub key: Option<KeyRef>,
    /// Keys of other KEYFORMATs in effect at the same time.
    pub alternate_keys: Vec<KeyRef>,
    pub init_section: Option<MapRef>,
    pub program_date_time: Option<DateTime<FixedOffset>>,
}

impl Segment {
    pub fn new(duration: f64, uri: impl Into<String>) -> Self {
        Self {
            duration,
            title: None,
            uri: uri.into(),
            byte_range: None,
            discontinuity: false,
            key: None,
            alternate_keys: Vec::new(),
            init_section: None,
            program_date_time: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_byte_range(mut self, range: ResolvedByteRange) -> Self {
        self.byte_range = Some(range);
        self
    }

    pub fn with_discontinuity(mut self, discontinuity: bool) -> Self {
        self.discontinuity = discontinuity;
        self
    }

    /// The first key becomes `key`, the rest `alternate_keys`.
    pub fn with_keys(mut self, keys: &[KeyRef]) -> Self {
        if let Some((first, rest)) = keys.split_first() {
            self.key = Some(first.clone());
            self.alternate_keys = rest.to_vec();
        }
        self
    }

    pub fn with_init_section(mut self, map: Option<MapRef>) -> Self {
        self.init_section = map;
        self
    }

    pub fn with_program_date_time(mut self, date_time: Option<DateTime<FixedOffset>>) -> Self {
        self.program_date_time = date_time;
        self
    }

    pub fn is_encrypted(&self) -> bool {
        self.key.as_ref().is_some_and(KeyRef::is_encrypted)
    }
}
