/// Represents the kind of a line in an M3U8 playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    /// `#EXT...` line. `token` excludes the `#`; `value` is the text after `:`.
    Tag {
        token: &'a str,
        value: Option<&'a str>,
    },
    Comment,
    Uri(&'a str),
}

impl LineKind<'_> {
    pub fn is_tag(&self) -> bool {
        matches!(self, Self::Tag { .. })
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

/// A classified line with its 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub number: usize,
    pub kind: LineKind<'a>,
}

/// Lazily splits playlist text into classified lines.
///
/// Scanning borrows the text and holds no other state, so the same buffer
/// can be scanned any number of times.
#[derive(Debug, Clone)]
pub struct LineScanner<'a> {
    lines: std::str::Lines<'a>,
    number: usize,
}

impl<'a> LineScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self {
            lines: text.lines(),
            number: 0,
        }
    }

    /// Classify a single line of an M3U8 playlist.
    pub fn classify(line: &'a str) -> LineKind<'a> {
        let line = line.trim();

        if line.is_empty() {
            return LineKind::Blank;
        }

        let Some(body) = line.strip_prefix('#') else {
            return LineKind::Uri(line);
        };

        if !body.starts_with("EXT") {
            return LineKind::Comment;
        }

        match body.split_once(':') {
            Some((token, value)) => LineKind::Tag {
                token,
                value: Some(value),
            },
            None => LineKind::Tag {
                token: body,
                value: None,
            },
        }
    }
}

impl<'a> Iterator for LineScanner<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.lines.next()?;
        self.number += 1;
        Some(Line {
            number: self.number,
            kind: Self::classify(raw),
        })
    }
}

/// Scan playlist text into classified lines.
pub fn scan(text: &str) -> LineScanner<'_> {
    LineScanner::new(text)
}
