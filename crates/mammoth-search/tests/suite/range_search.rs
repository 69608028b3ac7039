use mammoth_core::CancellationToken;
use mammoth_search::{EventSender, RangeSearchTask, SearchEvent, SearchTaskOptions};

use super::support::{
    drain, pos, progress_pages, run_range, run_range_on, spans, streamed_matches, terminal,
    CancellingPager, FailingPager,
};

const PAGES: [&str; 2] = ["hello wor", "ld hello"];

#[test]
fn every_match_is_streamed_in_document_order() {
    let events = run_range(&PAGES, SearchTaskOptions::new("hello"));
    let matches = streamed_matches(&events);
    assert_eq!(
        spans(&matches),
        vec![(pos(0, 0), pos(0, 5)), (pos(1, 3), pos(1, 8))]
    );
    assert_eq!(progress_pages(&events), vec![0, 1]);
    assert!(matches!(
        terminal(&events),
        SearchEvent::Finished {
            last_scanned_page: Some(1),
            ..
        }
    ));
}

#[test]
fn results_arrive_frame_by_frame_as_pages_are_scanned() {
    let pages = ["first hit x", "nothing", "second hit"];
    let events = run_range(&pages, SearchTaskOptions::new("hit"));
    let frame_pages: Vec<u64> = events
        .iter()
        .filter_map(|event| match event {
            SearchEvent::FrameResults { page_number, .. } => Some(*page_number),
            _ => None,
        })
        .collect();
    // Page 1 has no matches, so no frame event for it.
    assert_eq!(frame_pages, vec![0, 2]);
}

#[test]
fn a_straddling_match_is_reported_once_on_its_start_page() {
    let events = run_range(&PAGES, SearchTaskOptions::new("world"));
    let matches = streamed_matches(&events);
    assert_eq!(spans(&matches), vec![(pos(0, 6), pos(1, 2))]);
    let SearchEvent::FrameResults { page_number, .. } = events
        .iter()
        .find(|e| matches!(e, SearchEvent::FrameResults { .. }))
        .expect("one frame event")
    else {
        unreachable!()
    };
    assert_eq!(*page_number, 0);
}

#[test]
fn bounds_filter_matches_individually() {
    // Document "aa aa aa" split as "aa a" / "a aa".
    let events = run_range(
        &["aa a", "a aa"],
        SearchTaskOptions::new("a")
            .with_left_bound(pos(0, 1))
            .with_right_bound(pos(1, 1)),
    );
    let matches = streamed_matches(&events);
    assert_eq!(
        spans(&matches),
        vec![
            (pos(0, 1), pos(0, 2)),
            (pos(0, 3), pos(0, 4)),
            (pos(1, 0), pos(1, 1)),
        ]
    );
}

#[test]
fn a_backward_range_streams_pages_in_reverse_order() {
    let pages = ["one match", "quiet", "two match"];
    let events = run_range(&pages, SearchTaskOptions::new("match").backward());
    let frame_pages: Vec<u64> = events
        .iter()
        .filter_map(|event| match event {
            SearchEvent::FrameResults { page_number, .. } => Some(*page_number),
            _ => None,
        })
        .collect();
    assert_eq!(frame_pages, vec![2, 0]);
    assert!(matches!(
        terminal(&events),
        SearchEvent::Finished {
            last_scanned_page: Some(0),
            ..
        }
    ));
}

#[test]
fn overlapping_literal_occurrences_are_all_streamed() {
    let events = run_range(
        &["aaaa"],
        SearchTaskOptions::new("aa").with_case_sensitive(true),
    );
    assert_eq!(streamed_matches(&events).len(), 3);
}

#[test]
fn regex_occurrences_do_not_overlap() {
    let events = run_range(&["aaaa"], SearchTaskOptions::new("aa").with_regex(true));
    assert_eq!(streamed_matches(&events).len(), 2);
}

#[test]
fn a_straddling_regex_match_is_not_rematched_from_its_second_page() {
    // Document "aaa" split "a" / "aa": a flat scan of `aa` yields exactly
    // one occurrence, ending inside page 1. The next frame must not report
    // the overlapping occurrence that starts there.
    let events = run_range(&["a", "aa"], SearchTaskOptions::new("aa").with_regex(true));
    assert_eq!(
        spans(&streamed_matches(&events)),
        vec![(pos(0, 0), pos(1, 1))]
    );
}

#[test]
fn consecutive_straddling_regex_matches_keep_flat_scan_alignment() {
    // "aaaa" paged one byte at a time; a flat scan of `aa` yields two
    // occurrences and every one of them straddles a page boundary.
    let events = run_range(
        &["a", "a", "a", "a"],
        SearchTaskOptions::new("aa").with_regex(true),
    );
    assert_eq!(
        spans(&streamed_matches(&events)),
        vec![(pos(0, 0), pos(1, 1)), (pos(2, 0), pos(3, 1))]
    );
}

#[test]
fn regex_matches_agree_with_a_whole_text_scan() {
    // Word-sized matches placed clear of the page boundaries, so the frame
    // walk and a flat scan must see exactly the same set.
    let pages = ["foo bar\n", "baz foo\n", "quux foop\n"];
    let text: String = pages.concat();
    let expected: Vec<&str> = regex::Regex::new("fo+")
        .expect("test pattern")
        .find_iter(&text)
        .map(|m| m.as_str())
        .collect();
    let events = run_range(&pages, SearchTaskOptions::new("fo+").with_regex(true));
    let streamed: Vec<String> = streamed_matches(&events)
        .into_iter()
        .map(|m| m.matched)
        .collect();
    assert_eq!(streamed, expected);
    assert_eq!(streamed, vec!["foo", "foo", "foo"]);
}

#[test]
fn an_external_stop_is_observed_at_the_next_page_boundary() {
    let token = CancellationToken::new();
    // The token trips while page 3 loads, which happens during the advance
    // off page 0.
    let provider = CancellingPager::new(
        &["hit one", "hit two", "hit three", "hit four", "hit five"],
        3,
        token.clone(),
    );
    let (sender, receiver) = EventSender::channel();
    let task = RangeSearchTask::new(SearchTaskOptions::new("hit"), provider, sender)
        .expect("range task construction")
        .with_external_token(token);
    task.run();
    let events = drain(&receiver);
    assert_eq!(progress_pages(&events), vec![0]);
    // Page 0's results were already delivered; nothing after the stop.
    assert_eq!(streamed_matches(&events).len(), 1);
    assert!(matches!(
        terminal(&events),
        SearchEvent::Stopped { page_number: 1, .. }
    ));
}

#[test]
fn results_streamed_before_a_failure_remain_delivered() {
    let provider = FailingPager::new(&["hit here", "quiet", "quiet", "quiet", "quiet"], 3);
    let events = run_range_on(provider, SearchTaskOptions::new("hit"));
    assert_eq!(streamed_matches(&events).len(), 1);
    let SearchEvent::Failed { error, .. } = terminal(&events) else {
        panic!("expected a failure: {events:#?}");
    };
    assert!(error.contains("injected read failure"), "{error}");
}

#[test]
fn the_bare_task_does_not_enforce_the_result_cap() {
    // Cap enforcement belongs to the session; a task constructed directly
    // streams everything.
    let events = run_range(
        &["xx xx xx xx"],
        SearchTaskOptions::new("xx").with_result_cap(Some(1)),
    );
    assert_eq!(streamed_matches(&events).len(), 4);
    assert!(matches!(terminal(&events), SearchEvent::Finished { .. }));
}

#[test]
fn an_empty_document_finishes_with_nothing_scanned() {
    let events = run_range(&[], SearchTaskOptions::new("x"));
    assert_eq!(events.len(), 1);
    assert!(matches!(
        terminal(&events),
        SearchEvent::Finished {
            last_scanned_page: None,
            ..
        }
    ));
}
