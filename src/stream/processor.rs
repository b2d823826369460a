use chrono::{DateTime, FixedOffset};

use super::{
    rules::{ValidationRule, default_rules},
    scanner::{Line, LineKind, scan},
    state::ParserState,
};
use crate::{
    Error, Result,
    error::TagSite,
    hls::{ByteRange, Extinf, KeyMethod, KeyRef, MapRef, StartPoint, VariantStream},
    playlist::{MediaPlaylistType, Playlist, TagRecord, UnknownTag},
    tag::{
        AttributeList, TagCategory, TagDescriptor, TagName, ValueKind,
        attribute::{leading_token, parse_decimal_integer},
        catalog,
    },
};

/// Single-pass M3U8 parser: applies classified lines to a `ParserState`
/// and assembles a `Playlist`.
pub struct PlaylistParser {
    state: ParserState,
    rules: Vec<Box<dyn ValidationRule>>,
    playlist: Playlist,
}

impl PlaylistParser {
    /// Parser with the default validation rules.
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    pub fn with_rules(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self {
            state: ParserState::new(),
            rules,
            playlist: Playlist::new(),
        }
    }

    /// Parse an entire playlist. Either every line is accepted or the first
    /// error is returned.
    pub fn parse(mut self, input: &str) -> Result<Playlist> {
        for line in scan(input) {
            self.process_line(line)?;
        }
        self.finish()
    }

    /// Apply a single classified line.
    pub fn process_line(&mut self, line: Line<'_>) -> Result<()> {
        let descriptor = match line.kind {
            LineKind::Tag { token, .. } => catalog::lookup(token),
            _ => None,
        };

        for rule in &self.rules {
            rule.check_line(&line, descriptor, &self.state)?;
        }

        match line.kind {
            LineKind::Blank | LineKind::Comment => Ok(()),
            LineKind::Tag { token, value } => match descriptor {
                Some(descriptor) => self.apply_tag(descriptor, value, line.number),
                None => {
                    tracing::debug!("Line {}: ignoring unknown tag #{}", line.number, token);
                    self.playlist.unknown_tags.push(UnknownTag {
                        line: line.number,
                        token: token.to_string(),
                    });
                    Ok(())
                }
            },
            LineKind::Uri(uri) => self.apply_uri(uri, line.number),
        }
    }

    /// Run end-of-stream validation and hand out the finished playlist.
    pub fn finish(mut self) -> Result<Playlist> {
        for rule in &self.rules {
            rule.finish(&self.state)?;
        }

        for (tag, line) in self.state.dangling() {
            tracing::warn!("Line {}: {} is not followed by a URI, dropped", line, tag);
        }

        self.playlist.version = self.state.declared_version();
        self.playlist.version_declared = self.state.version.is_some();
        self.playlist.is_master = self.state.saw_master_tag;
        self.playlist.i_frames_only = self.state.i_frames_only;

        tracing::debug!(
            "Parsed {} playlist: version {}, {} segments, {} variants",
            if self.playlist.is_master { "master" } else { "media" },
            self.playlist.version,
            self.playlist.segments.len(),
            self.playlist.variants.len()
        );

        Ok(self.playlist)
    }

    /// Get current state (for inspection/testing).
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    fn apply_tag(
        &mut self,
        descriptor: &'static TagDescriptor,
        value: Option<&str>,
        line: usize,
    ) -> Result<()> {
        let site = TagSite::new(line, descriptor.token);

        if descriptor.category.is_media_side() {
            self.state.saw_media_tag = true;
        } else if descriptor.category.is_master() {
            self.state.saw_master_tag = true;
        }

        if let Some(version) = descriptor.min_version {
            self.state.require_version(version, line, descriptor.token);
        }

        if descriptor.category == TagCategory::Basic {
            self.playlist.basic_tags.insert(descriptor.name);
        }

        if !descriptor.has_value() {
            if let Some(extra) = value {
                tracing::debug!("Line {}: ignoring value {:?} on #{}", line, extra, site.tag);
            }
            return self.apply_flag(descriptor.name);
        }

        let value = value.ok_or_else(|| site.missing_value())?;

        if descriptor.value == ValueKind::AttributeList {
            let attributes = AttributeList::decode(value).map_err(|e| site.malformed(e))?;
            if let Some(missing) = descriptor
                .required_attributes
                .iter()
                .find(|name| !attributes.contains(name))
            {
                return Err(site.missing_attribute(*missing));
            }
            return self.apply_attribute_tag(descriptor.name, attributes, site);
        }

        self.apply_scalar(descriptor.name, value.trim(), site)
    }

    fn apply_flag(&mut self, name: TagName) -> Result<()> {
        match name {
            TagName::ExtM3U => {
                if self.state.header_seen {
                    tracing::debug!("Repeated #EXTM3U ignored");
                }
                self.state.header_seen = true;
            }
            TagName::ExtXDiscontinuity => self.state.pending_discontinuity = true,
            TagName::ExtXEndList => self.playlist.end_list = true,
            TagName::ExtXIFramesOnly => self.state.i_frames_only = true,
            TagName::ExtXIndependentSegments => self.playlist.independent_segments = true,
            _ => {}
        }
        Ok(())
    }

    fn apply_scalar(&mut self, name: TagName, value: &str, site: TagSite) -> Result<()> {
        match name {
            TagName::ExtXVersion => {
                if self.state.version.is_some() {
                    return Err(Error::DuplicateVersion { line: site.line });
                }
                let value = Self::numeric_token(value, site);
                let version = parse_decimal_integer(value)
                    .and_then(|v| u32::try_from(v).ok())
                    .filter(|v| *v > 0)
                    .ok_or_else(|| Error::InvalidVersion {
                        line: site.line,
                        value: value.to_string(),
                    })?;
                self.state.version = Some(version);
            }
            TagName::ExtInf => {
                let duration = value.split(',').next().unwrap_or_default();
                Self::numeric_token(duration, site);
                let extinf = Extinf::parse(value).ok_or_else(|| site.invalid_value(value))?;
                if !extinf.is_integral() {
                    self.state.require_declared_version(
                        3,
                        site.line,
                        "EXTINF floating-point duration",
                    );
                }
                self.state.set_pending_extinf(extinf, site.line);
            }
            TagName::ExtXByteRange => {
                let range = ByteRange::parse(value).ok_or_else(|| site.invalid_value(value))?;
                if range.offset.is_none() && self.state.last_byterange.is_none() {
                    return Err(Error::MissingPriorByteRange {
                        line: site.line,
                        value: value.to_string(),
                    });
                }
                self.state.set_byterange(range, site.line);
            }
            TagName::ExtXProgramDateTime => {
                let date_time =
                    Self::parse_date_time(value).ok_or_else(|| site.invalid_value(value))?;
                self.state.pending_program_date_time = Some(date_time);
            }
            TagName::ExtXTargetDuration => {
                Self::set_once(&mut self.playlist.target_duration, value, site)?;
            }
            TagName::ExtXMediaSequence => {
                Self::set_once(&mut self.playlist.media_sequence, value, site)?;
            }
            TagName::ExtXDiscontinuitySequence => {
                Self::set_once(&mut self.playlist.discontinuity_sequence, value, site)?;
            }
            TagName::ExtXPlaylistType => {
                if self.playlist.playlist_type.is_some() {
                    return Err(site.duplicate());
                }
                let playlist_type =
                    MediaPlaylistType::parse(value).ok_or_else(|| site.invalid_value(value))?;
                self.playlist.playlist_type = Some(playlist_type);
            }
            other => {
                tracing::debug!("Line {}: no scalar handler for #{}", site.line, other.as_str());
            }
        }
        Ok(())
    }

    fn set_once(slot: &mut Option<u64>, value: &str, site: TagSite) -> Result<()> {
        if slot.is_some() {
            return Err(site.duplicate());
        }
        let token = Self::numeric_token(value, site);
        *slot = Some(parse_decimal_integer(token).ok_or_else(|| site.invalid_value(value))?);
        Ok(())
    }

    /// Leading number of a scalar value. Anything after whitespace is ignored.
    fn numeric_token(value: &str, site: TagSite) -> &str {
        let (token, rest) = leading_token(value);
        if let Some(rest) = rest {
            tracing::debug!("Line {}: ignoring {:?} after #{} value", site.line, rest, site.tag);
        }
        token
    }

    /// RFC 3339, or ISO 8601 with a `+hhmm` offset.
    fn parse_date_time(value: &str) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(value)
            .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
            .ok()
    }

    fn apply_attribute_tag(
        &mut self,
        name: TagName,
        mut attributes: AttributeList,
        site: TagSite,
    ) -> Result<()> {
        match name {
            TagName::ExtXKey => {
                if attributes.contains("IV") {
                    self.state.require_version(2, site.line, "EXT-X-KEY IV attribute");
                }
                if attributes.contains("KEYFORMAT") || attributes.contains("KEYFORMATVERSIONS") {
                    self.state
                        .require_version(5, site.line, "EXT-X-KEY KEYFORMAT attributes");
                }
                let key = KeyRef::from_attributes(&attributes, site)?;
                self.state.update_key(key);
            }
            TagName::ExtXMap => {
                attributes
                    .resolve_range("BYTERANGE")
                    .map_err(|e| site.malformed(e))?;
                let key = self.state.current_key().cloned();
                let map = MapRef::from_attributes(&attributes, key, site)?;
                self.state.map_lines.push(site.line);
                self.state.update_map(map);
            }
            TagName::ExtXStreamInf => {
                if let Some(previous) = &self.state.pending_variant {
                    tracing::warn!(
                        "Line {}: EXT-X-STREAM-INF replaces the one on line {} before any URI",
                        site.line,
                        previous.line
                    );
                }
                self.state.set_pending_variant(attributes, site.line);
            }
            TagName::ExtXMedia => {
                let service = attributes
                    .quoted_string("INSTREAM-ID")
                    .map_err(|e| site.malformed(e))?
                    .is_some_and(|id| id.starts_with("SERVICE"));
                if service {
                    self.state
                        .require_version(7, site.line, "EXT-X-MEDIA INSTREAM-ID SERVICE");
                }
                self.record_master_tag(name, attributes, site);
            }
            TagName::ExtXSessionKey => {
                let key = KeyRef::from_attributes(&attributes, site)?;
                if key.method == KeyMethod::None {
                    return Err(site.invalid_value("METHOD=NONE"));
                }
                self.record_master_tag(name, attributes, site);
            }
            TagName::ExtXIFrameStreamInf | TagName::ExtXSessionData => {
                self.record_master_tag(name, attributes, site);
            }
            TagName::ExtXDateRange => {
                self.playlist.date_ranges.push(TagRecord {
                    line: site.line,
                    name,
                    attributes,
                });
            }
            TagName::ExtXStart => {
                if self.playlist.start.is_some() {
                    return Err(site.duplicate());
                }
                self.playlist.start = Some(StartPoint::from_attributes(&attributes, site)?);
            }
            other => {
                tracing::debug!(
                    "Line {}: no attribute handler for #{}",
                    site.line,
                    other.as_str()
                );
            }
        }
        Ok(())
    }

    fn record_master_tag(&mut self, name: TagName, attributes: AttributeList, site: TagSite) {
        self.playlist.master_tags.push(TagRecord {
            line: site.line,
            name,
            attributes,
        });
    }

    fn apply_uri(&mut self, uri: &str, line: usize) -> Result<()> {
        if let Some(pending) = self.state.pending_variant.take() {
            let site = TagSite::new(pending.line, TagName::ExtXStreamInf.as_str());
            let variant = VariantStream::from_attributes(&pending.attributes, uri, site)?;
            self.playlist.variants.push(variant);
            return Ok(());
        }

        let Some(pending) = self.state.pending_extinf.take() else {
            return Err(Error::MissingExtinf {
                line,
                uri: uri.to_string(),
            });
        };

        let segment = self.state.take_segment(pending.extinf, uri)?;
        tracing::trace!(
            "Segment {}: {} ({}s)",
            self.playlist.segments.len(),
            segment.uri,
            segment.duration
        );
        self.playlist.segments.push(segment);
        Ok(())
    }
}

impl Default for PlaylistParser {
    fn default() -> Self {
        Self::new()
    }
}
