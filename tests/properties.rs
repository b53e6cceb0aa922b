//! Property tests over random pattern sets and inputs.

use multireplace::compile;
use proptest::prelude::*;
use std::io::Cursor;

/// Patterns over `a`/`b` with an optional leading and trailing anchor.
fn pattern() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["", r"\b", r"\^"]),
        "[ab]{1,4}",
        prop::sample::select(vec!["", r"\b", r"\$"]),
    )
        .prop_map(|(lead, body, trail)| format!("{lead}{body}{trail}"))
}

fn pairs() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((pattern(), "[xyz]{0,3}"), 1..5)
}

fn streamed(pairs: &[(String, String)], input: &[u8]) -> (Vec<u8>, bool) {
    let automaton = compile(pairs.iter().map(|(f, t)| (f, t))).unwrap();
    let mut output = Vec::new();
    let changed = automaton.transform(Cursor::new(input), &mut output).unwrap();
    (output, changed)
}

proptest! {
    #[test]
    fn prop_no_occurrence_is_identity(pairs in pairs(), input in "[cd \n]{0,64}") {
        let (output, changed) = streamed(&pairs, input.as_bytes());
        prop_assert_eq!(output, input.as_bytes());
        prop_assert!(!changed);
    }

    #[test]
    fn prop_stream_agrees_with_buffer(pairs in pairs(), input in "[ab \n]{0,64}") {
        let (streamed_output, streamed_changed) = streamed(&pairs, input.as_bytes());
        let automaton = compile(pairs.iter().map(|(f, t)| (f, t))).unwrap();
        let replaced = automaton.replace_bytes(input.as_bytes());
        prop_assert_eq!(streamed_output, replaced.output);
        prop_assert_eq!(streamed_changed, replaced.changed);
    }

    #[test]
    fn prop_deterministic(pairs in pairs(), input in "[ab \n]{0,64}") {
        prop_assert_eq!(
            streamed(&pairs, input.as_bytes()),
            streamed(&pairs, input.as_bytes())
        );
    }

    #[test]
    fn prop_plain_literals_replace_every_occurrence(
        word in "[ab]{1,4}",
        count in 0usize..8,
    ) {
        let input = vec![word.as_str(); count].join(" ");
        let (output, changed) = streamed(&[(word.clone(), "X".to_string())], input.as_bytes());
        prop_assert_eq!(String::from_utf8(output).unwrap(), vec!["X"; count].join(" "));
        prop_assert_eq!(changed, count > 0);
    }
}
