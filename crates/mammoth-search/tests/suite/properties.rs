use std::io::Write;

use mammoth_pager::{FilePager, MemoryPager, PagerConfig};
use mammoth_search::{SearchEvent, SearchTaskOptions};
use proptest::prelude::*;

use super::support::{
    absolute_spans, page_texts, run_close_on, run_range_on, spans, streamed_matches, terminal,
};

const PROPTEST_CASES: u32 = 256;

fn arb_char() -> impl Strategy<Value = char> {
    // A small pool keeps shrinking effective. Multi-byte characters and
    // newlines stress the byte arithmetic at page boundaries.
    prop_oneof![
        12 => prop::sample::select(vec![
            'a', 'b', 'h', 'e', 'l', 'o', 'w', '0', '1', ' ', '_', '.',
        ]),
        2 => Just('\n'),
        2 => Just('é'),  // 2-byte UTF-8
        2 => Just('中'),  // 3-byte UTF-8
        1 => Just('🦣'),  // 4-byte UTF-8
    ]
}

fn arb_text(max_chars: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(arb_char(), 0..=max_chars)
        .prop_map(|chars| chars.into_iter().collect())
}

fn arb_query() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_char(), 1..=3).prop_map(|chars| chars.into_iter().collect())
}

/// Text, query, and a page size large enough that every occurrence spans at
/// most one page boundary. In-memory paging wastes at most three bytes per
/// page when a wide character does not fit, so `query bytes + 3` guarantees
/// the tail page always holds the rest of a straddling match.
fn arb_paged_input() -> impl Strategy<Value = (String, String, usize)> {
    (arb_text(64), arb_query()).prop_flat_map(|(text, query)| {
        let min_page = query.len() + 3;
        (Just(text), Just(query), min_page..=min_page + 12)
    })
}

fn literal_options(query: &str, case_sensitive: bool, whole_words: bool) -> SearchTaskOptions {
    SearchTaskOptions::new(query)
        .with_case_sensitive(case_sensitive)
        .with_whole_words(whole_words)
}

/// Overlapping literal scan over the whole text, the reference semantics for
/// case-sensitive queries.
fn naive_occurrences(text: &str, query: &str) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    let mut from = 0usize;
    while from <= text.len() {
        let Some(pos) = text[from..].find(query) else {
            break;
        };
        let start = from + pos;
        found.push((start, start + query.len()));
        let step = text[start..].chars().next().map_or(1, char::len_utf8);
        from = start + step;
    }
    found
}

proptest! {
    #![proptest_config(ProptestConfig { cases: PROPTEST_CASES, .. ProptestConfig::default() })]

    #[test]
    fn paging_never_changes_the_matches(
        (text, query, page_size) in arb_paged_input(),
        case_sensitive in any::<bool>(),
        whole_words in any::<bool>(),
    ) {
        let options = literal_options(&query, case_sensitive, whole_words);
        let paged = MemoryPager::new(&text, page_size);
        let whole = MemoryPager::new(&text, text.len().max(1));

        let paged_matches = streamed_matches(&run_range_on(paged.clone(), options.clone()));
        let whole_matches = streamed_matches(&run_range_on(whole.clone(), options));

        prop_assert_eq!(
            absolute_spans(&page_texts(&paged), &paged_matches),
            absolute_spans(&page_texts(&whole), &whole_matches)
        );
        prop_assert_eq!(
            paged_matches.iter().map(|m| m.matched.as_str()).collect::<Vec<_>>(),
            whole_matches.iter().map(|m| m.matched.as_str()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn matched_text_is_the_document_slice(
        (text, query, page_size) in arb_paged_input(),
        case_sensitive in any::<bool>(),
    ) {
        let pager = MemoryPager::new(&text, page_size);
        let texts = page_texts(&pager);
        let matches = streamed_matches(&run_range_on(
            pager,
            literal_options(&query, case_sensitive, false),
        ));
        for (m, (start, end)) in matches.iter().zip(absolute_spans(&texts, &matches)) {
            prop_assert!(text.is_char_boundary(start) && text.is_char_boundary(end));
            prop_assert_eq!(&text[start..end], m.matched.as_str());
        }
    }

    #[test]
    fn close_search_agrees_with_range_search(
        (text, query, page_size) in arb_paged_input(),
        case_sensitive in any::<bool>(),
    ) {
        let options = literal_options(&query, case_sensitive, false);
        let pager = MemoryPager::new(&text, page_size);
        let range = streamed_matches(&run_range_on(pager.clone(), options.clone()));

        let forward = run_close_on(pager.clone(), options.clone());
        let backward = run_close_on(pager, options.backward());
        for (events, expected) in [(forward, range.first()), (backward, range.last())] {
            match (terminal(&events), expected) {
                (
                    SearchEvent::ClosestFound { frame_matches, closest, .. },
                    Some(expected),
                ) => {
                    let winner = &frame_matches[*closest];
                    prop_assert_eq!(winner.start, expected.start);
                    prop_assert_eq!(winner.end, expected.end);
                    prop_assert_eq!(&winner.matched, &expected.matched);
                }
                (SearchEvent::Finished { .. }, None) => {}
                (event, expected) => {
                    prop_assert!(
                        false,
                        "close terminal {:?} disagrees with range match {:?}",
                        event,
                        expected
                    );
                }
            }
        }
    }

    #[test]
    fn backward_range_reports_the_same_matches(
        (text, query, page_size) in arb_paged_input(),
        case_sensitive in any::<bool>(),
    ) {
        let options = literal_options(&query, case_sensitive, false);
        let pager = MemoryPager::new(&text, page_size);
        let forward = spans(&streamed_matches(&run_range_on(pager.clone(), options.clone())));
        let mut backward = spans(&streamed_matches(&run_range_on(pager, options.backward())));
        backward.sort();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn case_sensitive_literals_match_a_naive_scan(
        text in arb_text(64),
        query in arb_query(),
    ) {
        let pager = MemoryPager::new(&text, text.len().max(1));
        let texts = page_texts(&pager);
        let matches = streamed_matches(&run_range_on(pager, literal_options(&query, true, false)));
        prop_assert_eq!(absolute_spans(&texts, &matches), naive_occurrences(&text, &query));
    }

    #[test]
    fn forward_regex_search_agrees_with_a_flat_scan(
        text in arb_text(64),
        pattern in prop::sample::select(vec!["aa", "a.", "[ab]{2}", "^a", "b$"]),
        page_size in 9usize..=24,
    ) {
        // Patterns whose matches fit well inside a page, so every occurrence
        // straddles at most one boundary and the frame walk can reach it.
        let options = SearchTaskOptions::new(pattern)
            .with_regex(true)
            .with_case_sensitive(true);
        let pager = MemoryPager::new(&text, page_size);
        let texts = page_texts(&pager);
        let matches = streamed_matches(&run_range_on(pager, options));

        let re = regex::RegexBuilder::new(pattern)
            .multi_line(true)
            .build()
            .expect("test pattern");
        let flat: Vec<(usize, usize)> = re
            .find_iter(&text)
            .map(|m| (m.start(), m.end()))
            .collect();
        prop_assert_eq!(absolute_spans(&texts, &matches), flat);
    }

    #[test]
    fn file_paging_agrees_with_in_memory_paging(
        text in arb_text(48),
        query in arb_query(),
        case_sensitive in any::<bool>(),
    ) {
        let options = literal_options(&query, case_sensitive, false);
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(text.as_bytes()).expect("write text");
        file.flush().expect("flush text");
        let config = PagerConfig { page_size: 16, cache_budget_bytes: 4096 };
        let pager = FilePager::with_config(file.path(), config).expect("open pager");
        let file_texts = page_texts(&pager);
        let file_matches = streamed_matches(&run_range_on(pager, options.clone()));

        let whole = MemoryPager::new(&text, text.len().max(1));
        let whole_texts = page_texts(&whole);
        let whole_matches = streamed_matches(&run_range_on(whole, options));

        prop_assert_eq!(
            absolute_spans(&file_texts, &file_matches),
            absolute_spans(&whole_texts, &whole_matches)
        );
    }
}
