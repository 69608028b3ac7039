use mammoth_core::PagePosition;

use crate::matcher::QueryMatcher;
use crate::{Result, SearchResult, SearchTaskOptions};

/// Searches one frame of the sliding page window.
///
/// The frame for page N is laid out as
///
/// ```text
/// [prefix symbol][page N][page N + 1][postfix symbol]
/// ```
///
/// where the symbols are the single characters adjacent to the window: the
/// last character of page N - 1 and the first character of page N + 2. The
/// symbols give word-boundary checks and regex anchors real context at the
/// window's edges but are never part of a reported match. A match must start
/// inside page N (the frame's body) and may run into page N + 1 (the tail);
/// candidates starting in the tail are left for the next frame. Partitioning
/// matches by their start page this way reports every match exactly once
/// even though consecutive frames overlap.
pub struct FrameSearcher {
    options: SearchTaskOptions,
    matcher: QueryMatcher,
    frame: String,
    page_number: u64,
    body_start: usize,
    body_end: usize,
    tail_end: usize,
    scan_from: usize,
    overhang: usize,
}

impl FrameSearcher {
    /// Compiles the query eagerly so a malformed pattern is reported to the
    /// caller instead of a running task.
    pub fn new(options: SearchTaskOptions) -> Result<Self> {
        let matcher = QueryMatcher::compile(&options)?;
        Ok(Self {
            options,
            matcher,
            frame: String::new(),
            page_number: 0,
            body_start: 0,
            body_end: 0,
            tail_end: 0,
            scan_from: 0,
            overhang: 0,
        })
    }

    pub fn options(&self) -> &SearchTaskOptions {
        &self.options
    }

    /// Installs the frame for `page_number`.
    ///
    /// `prefix_symbol` is the final character of the previous page (`None` at
    /// the start of the document), `tail_text` the full text of the next page
    /// (`None` at the end), and `postfix_symbol` the first character of the
    /// page after the tail.
    pub fn set_frame(
        &mut self,
        page_number: u64,
        prefix_symbol: Option<char>,
        page_text: &str,
        tail_text: Option<&str>,
        postfix_symbol: Option<char>,
    ) {
        self.frame.clear();
        if let Some(symbol) = prefix_symbol {
            self.frame.push(symbol);
        }
        self.body_start = self.frame.len();
        self.frame.push_str(page_text);
        self.body_end = self.frame.len();
        if let Some(tail) = tail_text {
            self.frame.push_str(tail);
        }
        self.tail_end = self.frame.len();
        if let Some(symbol) = postfix_symbol {
            self.frame.push(symbol);
        }
        self.page_number = page_number;
        self.scan_from = self.body_start;
        self.overhang = 0;
    }

    /// Starts the scan `body_offset` bytes into the body instead of at its
    /// first byte. The walker uses this when the previous frame's final
    /// candidate ran into this page, so non-overlapping iteration resumes
    /// where it left off rather than re-matching the straddled text.
    pub fn start_scan_at(&mut self, body_offset: usize) {
        self.scan_from = (self.body_start + body_offset).min(self.body_end);
    }

    /// Bytes of the tail consumed by the last scan's final candidate. Always
    /// zero when candidates overlap or the scan ended inside the body.
    pub fn scan_overhang(&self) -> usize {
        self.overhang
    }

    /// All matches starting in the frame's body, in document order.
    ///
    /// Zero-length matches are discarded. Matches that would run past the
    /// tail onto the postfix symbol are discarded too: they cannot be
    /// reported faithfully from this window.
    pub fn find_all_matches_in_frame(&mut self) -> Vec<SearchResult> {
        let mut results = Vec::new();
        self.overhang = 0;
        if self.body_start == self.body_end {
            return results;
        }
        let mut from = self.scan_from;
        while from < self.body_end {
            let Some((start, end)) = self.matcher.find_at(&self.frame, from) else {
                break;
            };
            if start >= self.body_end {
                // Candidate starts in the tail; the next frame owns it.
                break;
            }
            from = self.matcher.resume_at(&self.frame, start, end);
            if end == start || end > self.tail_end {
                continue;
            }
            if !self.matcher.candidates_overlap() && end > self.body_end {
                // Non-overlapping iteration consumed part of the tail; the
                // next frame must not re-match it.
                self.overhang = end - self.body_end;
            }
            if self.options.whole_words && !self.is_whole_word(start, end) {
                continue;
            }
            results.push(self.result_for(start, end));
        }
        results
    }

    fn is_whole_word(&self, start: usize, end: usize) -> bool {
        let before = self.frame[..start].chars().next_back();
        let after = self.frame[end..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    }

    fn result_for(&self, start: usize, end: usize) -> SearchResult {
        debug_assert!(start >= self.body_start && start < self.body_end);
        debug_assert!(start < end && end <= self.tail_end);
        let start_position = PagePosition::new(self.page_number, start - self.body_start);
        // The end is expressed in the page holding the final character: an
        // exact page-end stays on this page rather than becoming (N + 1, 0).
        let end_position = if end <= self.body_end {
            PagePosition::new(self.page_number, end - self.body_start)
        } else {
            PagePosition::new(self.page_number + 1, end - self.body_end)
        };
        let prefix_start = step_back(&self.frame, start, self.options.context_chars);
        let postfix_end = step_forward(&self.frame, end, self.options.context_chars);
        SearchResult {
            start: start_position,
            end: end_position,
            matched: self.frame[start..end].to_owned(),
            context_prefix: self.frame[prefix_start..start].to_owned(),
            context_postfix: self.frame[end..postfix_end].to_owned(),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Steps back over at most `chars` characters from byte `from`.
fn step_back(text: &str, from: usize, chars: usize) -> usize {
    let mut index = from;
    for _ in 0..chars {
        match text[..index].chars().next_back() {
            Some(c) => index -= c.len_utf8(),
            None => break,
        }
    }
    index
}

/// Steps forward over at most `chars` characters from byte `from`.
fn step_forward(text: &str, from: usize, chars: usize) -> usize {
    let mut index = from;
    for _ in 0..chars {
        match text[index..].chars().next() {
            Some(c) => index += c.len_utf8(),
            None => break,
        }
    }
    index
}
