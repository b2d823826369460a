use crate::tag::AttributeError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Line {line}: playlist must begin with #EXTM3U")]
    MissingHeader { line: usize },

    #[error("Line {line}: EXT-X-VERSION appears more than once")]
    DuplicateVersion { line: usize },

    #[error("Line {line}: invalid EXT-X-VERSION value: {value}")]
    InvalidVersion { line: usize, value: String },

    #[error(
        "Line {line}: {feature} requires compatibility version {required}, playlist declares {declared}"
    )]
    IncompatibleVersion {
        line: usize,
        feature: &'static str,
        required: u32,
        declared: u32,
    },

    #[error("Line {line}: {tag} requires a value")]
    MissingValue { line: usize, tag: &'static str },

    #[error("Line {line}: invalid {tag} value: {value}")]
    InvalidValue {
        line: usize,
        tag: &'static str,
        value: String,
    },

    #[error("Line {line}: {tag} appears more than once")]
    DuplicateTag { line: usize, tag: &'static str },

    #[error("Line {line}: URI {uri} is not preceded by #EXTINF")]
    MissingExtinf { line: usize, uri: String },

    #[error("Line {line}: EXT-X-BYTERANGE {value} has no offset and no prior sub-range of the same resource")]
    MissingPriorByteRange { line: usize, value: String },

    #[error("Line {line}: {tag} is missing required attribute {attribute}")]
    MissingRequiredAttribute {
        line: usize,
        tag: &'static str,
        attribute: &'static str,
    },

    #[error("Line {line}: {tag} attribute {attribute} is not allowed with METHOD=NONE")]
    IllegalAttributeCombination {
        line: usize,
        tag: &'static str,
        attribute: String,
    },

    #[error("Line {line}: malformed {tag} attribute list: {source}")]
    MalformedAttributeList {
        line: usize,
        tag: &'static str,
        #[source]
        source: AttributeError,
    },

    #[error("Line {line}: {tag} cannot be mixed with tags of the other playlist type")]
    MixedPlaylistTypes { line: usize, tag: &'static str },
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingHeader { .. } => "MISSING_HEADER",
            Self::DuplicateVersion { .. } => "DUPLICATE_VERSION",
            Self::InvalidVersion { .. } => "INVALID_VERSION",
            Self::IncompatibleVersion { .. } => "INCOMPATIBLE_VERSION",
            Self::MissingValue { .. } => "MISSING_VALUE",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::DuplicateTag { .. } => "DUPLICATE_TAG",
            Self::MissingExtinf { .. } => "MISSING_EXTINF",
            Self::MissingPriorByteRange { .. } => "MISSING_PRIOR_BYTE_RANGE",
            Self::MissingRequiredAttribute { .. } => "MISSING_REQUIRED_ATTRIBUTE",
            Self::IllegalAttributeCombination { .. } => "ILLEGAL_ATTRIBUTE_COMBINATION",
            Self::MalformedAttributeList { .. } => "MALFORMED_ATTRIBUTE_LIST",
            Self::MixedPlaylistTypes { .. } => "MIXED_PLAYLIST_TYPES",
        }
    }

    /// 1-based line number of the offending line.
    pub fn line(&self) -> usize {
        match self {
            Self::MissingHeader { line }
            | Self::DuplicateVersion { line }
            | Self::InvalidVersion { line, .. }
            | Self::IncompatibleVersion { line, .. }
            | Self::MissingValue { line, .. }
            | Self::InvalidValue { line, .. }
            | Self::DuplicateTag { line, .. }
            | Self::MissingExtinf { line, .. }
            | Self::MissingPriorByteRange { line, .. }
            | Self::MissingRequiredAttribute { line, .. }
            | Self::IllegalAttributeCombination { line, .. }
            | Self::MalformedAttributeList { line, .. }
            | Self::MixedPlaylistTypes { line, .. } => *line,
        }
    }
}

/// Where a tag was found. Entity constructors use it to build errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSite {
    pub line: usize,
    pub tag: &'static str,
}

impl TagSite {
    pub fn new(line: usize, tag: &'static str) -> Self {
        Self { line, tag }
    }

    pub fn missing_value(self) -> Error {
        Error::MissingValue {
            line: self.line,
            tag: self.tag,
        }
    }

    pub fn invalid_value(self, value: impl Into<String>) -> Error {
        Error::InvalidValue {
            line: self.line,
            tag: self.tag,
            value: value.into(),
        }
    }

    pub fn duplicate(self) -> Error {
        Error::DuplicateTag {
            line: self.line,
            tag: self.tag,
        }
    }

    pub fn missing_attribute(self, attribute: &'static str) -> Error {
        Error::MissingRequiredAttribute {
            line: self.line,
            tag: self.tag,
            attribute,
        }
    }

    pub fn illegal_combination(self, attribute: impl Into<String>) -> Error {
        Error::IllegalAttributeCombination {
            line: self.line,
            tag: self.tag,
            attribute: attribute.into(),
        }
    }

    pub fn malformed(self, source: AttributeError) -> Error {
        Error::MalformedAttributeList {
            line: self.line,
            tag: self.tag,
            source,
        }
    }
}
