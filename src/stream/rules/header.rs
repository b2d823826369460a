use super::{Line, ParserState, TagDescriptor, ValidationRule};
use crate::{Error, Result, tag::TagName};

/// The first non-blank line must be #EXTM3U.
pub struct HeaderRule;

impl ValidationRule for HeaderRule {
    fn check_line(
        &self,
        line: &Line<'_>,
        tag: Option<&'static TagDescriptor>,
        state: &ParserState,
    ) -> Result<()> {
        if state.header_seen || line.kind.is_blank() {
            return Ok(());
        }

        match tag {
            Some(descriptor) if descriptor.name == TagName::ExtM3U => Ok(()),
            _ => Err(Error::MissingHeader { line: line.number }),
        }
    }

    fn finish(&self, state: &ParserState) -> Result<()> {
        if state.header_seen {
            Ok(())
        } else {
            // Nothing but blank lines.
            Err(Error::MissingHeader { line: 1 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::LineScanner;
    use crate::tag::lookup;

    fn check(raw: &str, state: &ParserState) -> Result<()> {
        let kind = LineScanner::classify(raw);
        let tag = match kind {
            crate::stream::LineKind::Tag { token, .. } => lookup(token),
            _ => None,
        };
        HeaderRule.check_line(&Line { number: 1, kind }, tag, state)
    }

    #[test]
    fn test_accepts_header() {
        assert!(check("#EXTM3U", &ParserState::new()).is_ok());
        assert!(check("", &ParserState::new()).is_ok());
    }

    #[test]
    fn test_rejects_other_first_lines() {
        let state = ParserState::new();
        for raw in ["#EXTINF:4,", "segment.ts", "# comment", "#EXT-X-UNKNOWN"] {
            assert_eq!(check(raw, &state), Err(Error::MissingHeader { line: 1 }));
        }
    }

    #[test]
    fn test_only_first_line_is_checked() {
        let state = ParserState {
            header_seen: true,
            ..ParserState::new()
        };
        assert!(check("segment.ts", &state).is_ok());
    }

    #[test]
    fn test_finish_without_header() {
        assert_eq!(
            HeaderRule.finish(&ParserState::new()),
            Err(Error::MissingHeader { line: 1 })
        );
    }
}
