use std::fmt;

use serde::Serialize;

use crate::tag::attribute::parse_decimal_integer;

/// A `<n>[@<o>]` sub-range as written in the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub length: u64,
    pub offset: Option<u64>,
}

impl ByteRange {
    pub fn new(length: u64, offset: Option<u64>) -> Self {
        Self { length, offset }
    }

    /// Parse from "length@offset" or "length" format.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let range = match s.split_once('@') {
            Some((len, off)) => Self {
                length: parse_decimal_integer(len)?,
                offset: Some(parse_decimal_integer(off)?),
            },
            None => Self {
                length: parse_decimal_integer(s)?,
                offset: None,
            },
        };

        // The end of the range must be addressable.
        if let Some(offset) = range.offset {
            offset.checked_add(range.length)?;
        }
        Some(range)
    }

    /// Fill in a missing offset from where the previous sub-range ended.
    ///
    /// `None` when no offset is known or the range would end past `u64::MAX`.
    pub fn resolve(&self, previous_end: Option<u64>) -> Option<ResolvedByteRange> {
        let offset = self.offset.or(previous_end)?;
        offset.checked_add(self.length)?;
        Some(ResolvedByteRange {
            length: self.length,
            offset,
        })
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{}@{}", self.length, offset),
            None => write!(f, "{}", self.length),
        }
    }
}

/// A sub-range whose offset is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedByteRange {
    pub length: u64,
    pub offset: u64,
}

impl ResolvedByteRange {
    /// Offset of the first byte after this range.
    pub fn end_offset(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }
}
