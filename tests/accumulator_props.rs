//! Property tests for the statement-completeness check.

use proptest::prelude::*;
use rish::multiline::{InputAccumulator, BLOCK_KEYWORDS, BRACKET_PAIRS, CLOSING_KEYWORD};

/// Text with no brackets and no keyword tokens.
fn plain_text() -> impl Strategy<Value = String> {
    "[a-z0-9 +*/=,.;:\"'\n-]{0,40}".prop_filter("no keyword tokens", |s| {
        rish::tokenizer::words(s).all(|w| w != CLOSING_KEYWORD && !BLOCK_KEYWORDS.contains(&w))
    })
}

fn accumulate(chunks: &[&str]) -> InputAccumulator {
    let mut acc = InputAccumulator::new();
    for chunk in chunks {
        acc.append(chunk);
    }
    acc
}

proptest! {
    #[test]
    fn plain_statements_never_block(text in plain_text()) {
        prop_assert!(accumulate(&[&text]).is_complete());
    }

    #[test]
    fn fewer_closers_than_openers_blocks(pair in 0usize..3, n in 1usize..20, missing in 1usize..20) {
        let (open, close) = BRACKET_PAIRS[pair];
        let closers = n.saturating_sub(missing);
        let text = format!("{}{}", open.to_string().repeat(n), close.to_string().repeat(closers));
        prop_assert!(!accumulate(&[&text]).is_complete());
    }

    #[test]
    fn equal_closers_in_any_position_balance(
        pair in 0usize..3,
        n in 0usize..20,
        seed in any::<u64>(),
    ) {
        let (open, close) = BRACKET_PAIRS[pair];
        // Interleave n openers and n closers in a seed-dependent order
        let mut chars: Vec<char> = std::iter::repeat(open).take(n)
            .chain(std::iter::repeat(close).take(n))
            .collect();
        let len = chars.len();
        if len > 1 {
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                chars.swap(i, j);
            }
        }
        let text: String = chars.into_iter().collect();
        prop_assert!(accumulate(&["x = ", &text, "\n"]).is_complete());
    }

    #[test]
    fn keyword_inside_identifier_is_ignored(
        kw in prop::sample::select(BLOCK_KEYWORDS),
        prefix in "[a-z_]{0,3}",
        suffix in "[a-z0-9_]{1,3}",
    ) {
        let text = format!("{}{}{}(x)\n", prefix, kw, suffix);
        prop_assert!(accumulate(&[&text]).is_complete());
    }

    #[test]
    fn every_opener_needs_an_end(
        kws in prop::collection::vec(prop::sample::select(BLOCK_KEYWORDS), 1..6),
        ends in 0usize..6,
    ) {
        let mut acc = InputAccumulator::new();
        for kw in &kws {
            acc.append(&format!("{} x\n", kw));
        }
        for _ in 0..ends {
            acc.append("end\n");
        }
        prop_assert_eq!(acc.is_complete(), ends >= kws.len());
    }

    #[test]
    fn clear_always_empties(chunks in prop::collection::vec(".{0,10}", 0..5)) {
        let mut acc = InputAccumulator::new();
        for chunk in &chunks {
            acc.append(chunk);
        }
        prop_assert_eq!(acc.value(), chunks.concat());
        acc.clear();
        prop_assert_eq!(acc.value(), "");
        acc.clear();
        prop_assert_eq!(acc.value(), "");
        prop_assert!(acc.is_complete());
    }
}

#[test]
fn class_substring_and_whole_token() {
    assert!(accumulate(&["classify(x)\n"]).is_complete());

    let mut acc = accumulate(&["class Foo\n"]);
    assert!(!acc.is_complete());
    acc.append("end\n");
    assert!(acc.is_complete());
}
