use std::cmp::Reverse;

use super::{Line, ParserState, TagDescriptor, ValidationRule};
use crate::{Error, Result};

/// Every version-gated feature must fit the declared EXT-X-VERSION.
///
/// Checked once at the end so EXT-X-VERSION may appear anywhere.
pub struct CompatibilityRule;

impl ValidationRule for CompatibilityRule {
    fn check_line(
        &self,
        _line: &Line<'_>,
        _tag: Option<&'static TagDescriptor>,
        _state: &ParserState,
    ) -> Result<()> {
        Ok(())
    }

    fn finish(&self, state: &ParserState) -> Result<()> {
        let declared = state.declared_version();

        // Earliest offending line; on a tie, the strictest requirement.
        let violation = state
            .version_requirements()
            .filter(|requirement| requirement.version > declared)
            .filter(|requirement| !requirement.declared_only || state.version.is_some())
            .min_by_key(|requirement| (requirement.line, Reverse(requirement.version)));

        match violation {
            Some(requirement) => Err(Error::IncompatibleVersion {
                line: requirement.line,
                feature: requirement.feature,
                required: requirement.version,
                declared,
            }),
            None => Ok(()),
        }
    }
}
