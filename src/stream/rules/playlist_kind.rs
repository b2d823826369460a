use super::{Line, ParserState, TagDescriptor, ValidationRule};
use crate::{Error, Result};

/// Media Segment / Media Playlist tags and Master Playlist tags cannot share
/// a playlist.
pub struct PlaylistKindRule;

impl ValidationRule for PlaylistKindRule {
    fn check_line(
        &self,
        line: &Line<'_>,
        tag: Option<&'static TagDescriptor>,
        state: &ParserState,
    ) -> Result<()> {
        let Some(descriptor) = tag else {
            return Ok(());
        };

        let mixed = (descriptor.category.is_master() && state.saw_media_tag)
            || (descriptor.category.is_media_side() && state.saw_master_tag);

        if mixed {
            return Err(Error::MixedPlaylistTypes {
                line: line.number,
                tag: descriptor.token,
            });
        }
        Ok(())
    }
}
