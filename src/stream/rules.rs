pub mod compatibility;
pub mod header;
pub mod playlist_kind;

use super::{scanner::Line, state::ParserState};
use crate::{Result, tag::TagDescriptor};

pub use compatibility::CompatibilityRule;
pub use header::HeaderRule;
pub use playlist_kind::PlaylistKindRule;

/// Trait for validation rules.
pub trait ValidationRule: Send + Sync {
    /// Check a line before the parser applies it. `tag` is the catalog entry
    /// for tag lines with a known token.
    fn check_line(
        &self,
        line: &Line<'_>,
        tag: Option<&'static TagDescriptor>,
        state: &ParserState,
    ) -> Result<()>;

    /// Check the final state once every line has been applied.
    fn finish(&self, _state: &ParserState) -> Result<()> {
        Ok(())
    }
}

/// Create default set of validation rules.
pub fn default_rules() -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(HeaderRule),
        Box::new(PlaylistKindRule),
        Box::new(CompatibilityRule),
    ]
}
