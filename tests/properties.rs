// tests/properties.rs
// Exhaustive checks over small generated inputs (no randomness, so failures reproduce).

use cve_feed_notifier::format::{truncate_message, MAX_MESSAGE_CHARS, TRUNCATION_PLACEHOLDER};
use cve_feed_notifier::relevance::{is_relevant, DESKTOP_UPDATE_TAG, STABLE_CHANNEL_TAG};

const EXTRA: [&str; 4] = ["Beta updates", "Chrome OS", "Desktop", "stable updates"];

#[test]
fn relevance_holds_for_every_subset_and_order() {
    let pool: Vec<&str> = [DESKTOP_UPDATE_TAG, STABLE_CHANNEL_TAG]
        .into_iter()
        .chain(EXTRA)
        .collect();

    for mask in 0u32..(1 << pool.len()) {
        let mut tags: Vec<&str> = pool
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, t)| *t)
            .collect();
        let expected = tags.contains(&DESKTOP_UPDATE_TAG) && tags.contains(&STABLE_CHANNEL_TAG);

        assert_eq!(is_relevant(&tags), expected, "tags {tags:?}");
        tags.reverse();
        assert_eq!(is_relevant(&tags), expected, "reversed {tags:?}");
        let doubled: Vec<&str> = tags.iter().chain(tags.iter()).copied().collect();
        assert_eq!(is_relevant(&doubled), expected, "doubled {doubled:?}");
    }
}

fn sample_messages() -> Vec<String> {
    let mut out = Vec::new();
    // Many long identifiers.
    out.push(
        (0..300)
            .map(|i| format!("CVE-2024-{i:05}-with-a-long-description-tail"))
            .collect::<Vec<_>>()
            .join(" "),
    );
    // One gigantic token.
    out.push(format!("header {} footer", "A".repeat(9000)));
    // Only short tokens, so the hard cut has to kick in.
    out.push("abc ".repeat(2500));
    // Tokens around the placeholder length.
    out.push(
        (0..600)
            .map(|i| "z".repeat(12 + i % 10))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    // Multi-byte characters.
    out.push("\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022} ".repeat(300));
    out
}

#[test]
fn truncation_always_fits_the_ceiling() {
    for msg in sample_messages() {
        assert!(msg.chars().count() > MAX_MESSAGE_CHARS);
        let out = truncate_message(&msg, MAX_MESSAGE_CHARS);
        assert!(
            out.chars().count() <= MAX_MESSAGE_CHARS,
            "len {}",
            out.chars().count()
        );
    }
}

#[test]
fn truncation_prefers_placeholder_over_cutting() {
    let msg = format!("header {} footer", "A".repeat(9000));
    assert_eq!(
        truncate_message(&msg, MAX_MESSAGE_CHARS),
        format!("header {TRUNCATION_PLACEHOLDER} footer")
    );
}
