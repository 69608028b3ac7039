use mammoth_pager::{Page, PageProvider};

use crate::frame::FrameSearcher;
use crate::{Result, SearchDirection, SearchResult, SearchTaskOptions};

/// The page range a walk will cover, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WalkPlan {
    pub(crate) start_page: u64,
    pub(crate) limit_page: u64,
}

/// Derives the page range for a walk from the options and the page count.
///
/// Forward walks start at the left bound's page (or page zero) and stop
/// after the right bound's page (or the final page); backward walks mirror
/// that. `None` means there is nothing to scan at all.
pub(crate) fn plan_walk(options: &SearchTaskOptions, page_count: u64) -> Option<WalkPlan> {
    if page_count == 0 {
        return None;
    }
    let last = page_count - 1;
    let (start_page, limit_page) = match options.direction {
        SearchDirection::Forward => {
            let start = options.left_bound.map_or(0, |b| b.page_number);
            let limit = options.right_bound.map_or(last, |b| b.page_number.min(last));
            if start > limit {
                return None;
            }
            (start, limit)
        }
        SearchDirection::Backward => {
            let start = options.right_bound.map_or(last, |b| b.page_number.min(last));
            let limit = options.left_bound.map_or(0, |b| b.page_number);
            if start < limit {
                return None;
            }
            (start, limit)
        }
    };
    Some(WalkPlan {
        start_page,
        limit_page,
    })
}

/// Slides a [`FrameSearcher`]'s window across a provider one page per step.
///
/// The walker owns the window state: the body page, the tail page, and one
/// look-ahead page in the walk direction, plus the boundary character carried
/// from the side the window just left. Each step fetches at most one new
/// page; initialization fetches the window plus one neighbor for its edge
/// symbol.
pub(crate) struct FrameWalker<'a, P: PageProvider + ?Sized> {
    provider: &'a P,
    searcher: &'a mut FrameSearcher,
    direction: SearchDirection,
    page_count: u64,
    limit_page: u64,
    cur_page: u64,
    body: Page,
    tail: Option<Page>,
    /// Forward walks: the page after the tail, source of the postfix symbol
    /// and the next tail.
    after_tail: Option<Page>,
    /// Backward walks: the page before the body, source of the prefix symbol
    /// and the next body.
    prev: Option<Page>,
    /// Forward walks: last character of the page most recently retired on
    /// the left.
    prefix_char: Option<char>,
    /// Backward walks: first character of the page most recently retired on
    /// the right.
    postfix_char: Option<char>,
    /// Forward walks: bytes at the head of the current body already consumed
    /// by the previous frame's final candidate. Keeps non-overlapping
    /// candidate iteration aligned across a page boundary, so a straddling
    /// match is never re-matched from its second page.
    scan_carry: usize,
}

impl<'a, P: PageProvider + ?Sized> FrameWalker<'a, P> {
    pub(crate) fn create(
        provider: &'a P,
        searcher: &'a mut FrameSearcher,
        plan: WalkPlan,
        page_count: u64,
    ) -> Result<Self> {
        let direction = searcher.options().direction;
        let start = plan.start_page;
        let body = provider.read_page(start)?;
        let tail = fetch_if_present(provider, page_count, start + 1)?;
        let (prev, after_tail, prefix_char, postfix_char) = match direction {
            SearchDirection::Forward => {
                let after_tail = fetch_if_present(provider, page_count, start + 2)?;
                let prefix_char = if start > 0 {
                    provider.read_page(start - 1)?.text().chars().next_back()
                } else {
                    None
                };
                (None, after_tail, prefix_char, None)
            }
            SearchDirection::Backward => {
                let prev = if start > 0 {
                    Some(provider.read_page(start - 1)?)
                } else {
                    None
                };
                let postfix_char = fetch_if_present(provider, page_count, start + 2)?
                    .and_then(|page| page.text().chars().next());
                (prev, None, None, postfix_char)
            }
        };
        Ok(Self {
            provider,
            searcher,
            direction,
            page_count,
            limit_page: plan.limit_page,
            cur_page: start,
            body,
            tail,
            after_tail,
            prev,
            prefix_char,
            postfix_char,
            scan_carry: 0,
        })
    }

    pub(crate) fn current_page(&self) -> u64 {
        self.cur_page
    }

    /// Installs the current window into the searcher and collects the body
    /// page's matches. Never touches the provider.
    pub(crate) fn search_frame(&mut self) -> Vec<SearchResult> {
        let prefix = match self.direction {
            SearchDirection::Forward => self.prefix_char,
            SearchDirection::Backward => self
                .prev
                .as_ref()
                .and_then(|page| page.text().chars().next_back()),
        };
        let postfix = match self.direction {
            SearchDirection::Forward => self
                .after_tail
                .as_ref()
                .and_then(|page| page.text().chars().next()),
            SearchDirection::Backward => self.postfix_char,
        };
        self.searcher.set_frame(
            self.cur_page,
            prefix,
            self.body.text(),
            self.tail.as_ref().map(|page| page.text()),
            postfix,
        );
        if self.scan_carry > 0 {
            self.searcher.start_scan_at(self.scan_carry);
        }
        self.searcher.find_all_matches_in_frame()
    }

    /// Slides one page in the walk direction, fetching at most one page.
    /// Returns `Ok(false)` once the final planned page has been searched.
    pub(crate) fn advance(&mut self) -> Result<bool> {
        match self.direction {
            SearchDirection::Forward => {
                if self.cur_page >= self.limit_page {
                    return Ok(false);
                }
                let Some(next_body) = self.tail.take() else {
                    return Ok(false);
                };
                self.scan_carry = self.searcher.scan_overhang();
                // An empty body contributes no character; keep the previous
                // symbol so the boundary stays faithful across it.
                self.prefix_char = self.body.text().chars().next_back().or(self.prefix_char);
                self.body = next_body;
                self.tail = self.after_tail.take();
                self.cur_page += 1;
                self.after_tail =
                    fetch_if_present(self.provider, self.page_count, self.cur_page + 2)?;
                Ok(true)
            }
            SearchDirection::Backward => {
                if self.cur_page <= self.limit_page {
                    return Ok(false);
                }
                let Some(next_body) = self.prev.take() else {
                    return Ok(false);
                };
                self.postfix_char = self
                    .tail
                    .as_ref()
                    .and_then(|page| page.text().chars().next())
                    .or(self.postfix_char);
                self.tail = Some(std::mem::replace(&mut self.body, next_body));
                self.cur_page -= 1;
                self.prev = if self.cur_page > 0 {
                    fetch_if_present(self.provider, self.page_count, self.cur_page - 1)?
                } else {
                    None
                };
                Ok(true)
            }
        }
    }
}

fn fetch_if_present<P: PageProvider + ?Sized>(
    provider: &P,
    page_count: u64,
    page_number: u64,
) -> Result<Option<Page>> {
    if page_number < page_count {
        Ok(Some(provider.read_page(page_number)?))
    } else {
        Ok(None)
    }
}
