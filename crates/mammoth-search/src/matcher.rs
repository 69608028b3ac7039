use memchr::memmem;
use regex::RegexBuilder;

use crate::{Result, SearchTaskOptions};

/// A compiled query.
///
/// Case-sensitive literals use a `memmem` finder; case-insensitive literals
/// are escaped into a case-folding regex; regex queries compile the user's
/// pattern directly. Literal candidates are overlapping regardless of engine
/// (scanning resumes one character past the previous start, the way editors
/// step through occurrences); regex candidates are non-overlapping (scanning
/// resumes at the previous end).
pub(crate) enum QueryMatcher {
    Literal(memmem::Finder<'static>),
    Pattern { regex: regex::Regex, literal: bool },
}

impl QueryMatcher {
    pub(crate) fn compile(options: &SearchTaskOptions) -> Result<Self> {
        if options.regex {
            let regex = RegexBuilder::new(&options.query)
                .case_insensitive(!options.case_sensitive)
                .multi_line(true)
                .build()?;
            Ok(QueryMatcher::Pattern {
                regex,
                literal: false,
            })
        } else if options.case_sensitive {
            Ok(QueryMatcher::Literal(
                memmem::Finder::new(options.query.as_bytes()).into_owned(),
            ))
        } else {
            let regex = RegexBuilder::new(&regex::escape(&options.query))
                .case_insensitive(true)
                .build()?;
            Ok(QueryMatcher::Pattern {
                regex,
                literal: true,
            })
        }
    }

    /// Next candidate starting at or after byte `from`, which must lie on a
    /// character boundary. Returns the candidate's byte range.
    pub(crate) fn find_at(&self, haystack: &str, from: usize) -> Option<(usize, usize)> {
        match self {
            QueryMatcher::Literal(finder) => finder
                .find(&haystack.as_bytes()[from..])
                .map(|pos| (from + pos, from + pos + finder.needle().len())),
            QueryMatcher::Pattern { regex, .. } => regex
                .find_at(haystack, from)
                .map(|m| (m.start(), m.end())),
        }
    }

    /// Whether candidate occurrences may overlap: true for literal queries,
    /// false for regex iteration.
    pub(crate) fn candidates_overlap(&self) -> bool {
        match self {
            QueryMatcher::Literal(_) => true,
            QueryMatcher::Pattern { literal, .. } => *literal,
        }
    }

    /// Byte offset where scanning resumes after a candidate at
    /// `(start, end)`. A zero-length candidate always advances one character
    /// to guarantee progress.
    pub(crate) fn resume_at(&self, haystack: &str, start: usize, end: usize) -> usize {
        if self.candidates_overlap() || end == start {
            start + next_char_len(haystack, start)
        } else {
            end
        }
    }
}

fn next_char_len(haystack: &str, at: usize) -> usize {
    haystack[at..].chars().next().map_or(1, char::len_utf8)
}
