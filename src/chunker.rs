//! Splitting of oversized responses into transport-safe chunks.
//!
//! Chunk boundaries fall only on blank lines (the logical-block separator
//! of the assembled output), so a list entry or narrative paragraph is
//! never severed. Concatenating the returned chunks reproduces the input
//! exactly; the continuation marker is added separately at delivery time.

/// Prefix added to every chunk after the first so a multi-part response
/// is recognizable in the transcript.
pub const CONTINUATION_MARKER: &str = "...continued\n\n";

const SEPARATOR: &str = "\n\n";

/// Splits `text` into blank-line-aligned units, each unit keeping its
/// trailing separator so concatenation is lossless.
fn units(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    while let Some(pos) = text[start..].find(SEPARATOR) {
        let end = start + pos + SEPARATOR.len();
        out.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Splits `text` into ordered chunks of at most `max_chars` characters,
/// breaking only on blank lines.
///
/// Chunks after the first are sized to leave room for
/// [`CONTINUATION_MARKER`], so the framed message stays under the limit.
/// A single unit longer than the budget is emitted as its own oversized
/// chunk rather than split mid-block; the separator granularity is
/// assumed coarser than the limit in the common case.
#[must_use]
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let marker_chars = CONTINUATION_MARKER.chars().count();
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for unit in units(text) {
        let unit_chars = unit.chars().count();
        let budget = if chunks.is_empty() {
            max_chars
        } else {
            max_chars.saturating_sub(marker_chars)
        };

        if current_chars + unit_chars > budget && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current.push_str(unit);
        current_chars += unit_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Applies the continuation marker to every chunk after the first.
#[must_use]
pub fn frame_chunks(chunks: Vec<String>) -> Vec<String> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            if i == 0 {
                chunk
            } else {
                format!("{CONTINUATION_MARKER}{chunk}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let parts = split_message("hello", 4096);
        assert_eq!(parts, vec!["hello"]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_message("", 4096).is_empty());
    }

    #[test]
    fn concatenation_reproduces_input() {
        let text = (0..40)
            .map(|i| format!("paragraph {i} {}", "x".repeat(200)))
            .collect::<Vec<_>>()
            .join("\n\n");
        let parts = split_message(&text, 1000);
        assert!(parts.len() > 1);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn chunks_respect_limit_and_break_on_blank_lines() {
        let text = (0..40)
            .map(|i| format!("paragraph {i} {}", "x".repeat(200)))
            .collect::<Vec<_>>()
            .join("\n\n");
        let parts = frame_chunks(split_message(&text, 1000));
        for (i, part) in parts.iter().enumerate() {
            assert!(part.chars().count() <= 1000, "chunk {i} over limit");
            if i > 0 {
                assert!(part.starts_with(CONTINUATION_MARKER));
            }
            // No unit severed: every chunk ends at a block boundary
            assert!(!part.ends_with('x') || i == parts.len() - 1);
        }
    }

    // Scenario from the delivery contract: ~300-character paragraphs,
    // 9,000 characters total, 4,096 limit -> exactly 3 chunks.
    #[test]
    fn nine_thousand_chars_split_into_three_chunks() {
        let paragraph = "a".repeat(298);
        let mut text = String::new();
        while text.chars().count() < 9_000 {
            text.push_str(&paragraph);
            text.push_str("\n\n");
        }
        let text = text.trim_end().to_string();

        let raw = split_message(&text, 4096);
        assert_eq!(raw.len(), 3);
        assert_eq!(raw.concat(), text);

        let framed = frame_chunks(raw);
        assert!(!framed[0].starts_with(CONTINUATION_MARKER));
        assert!(framed[1].starts_with(CONTINUATION_MARKER));
        assert!(framed[2].starts_with(CONTINUATION_MARKER));
        for part in &framed {
            assert!(part.chars().count() <= 4096);
        }
    }

    // Degenerate case: a single block longer than the limit is emitted
    // as its own oversized chunk instead of being split mid-block.
    #[test]
    fn oversized_single_block_is_emitted_whole() {
        let big = "b".repeat(5000);
        let text = format!("intro\n\n{big}\n\noutro");
        let parts = split_message(&text, 4096);

        assert_eq!(parts.concat(), text);
        let oversized: Vec<_> = parts
            .iter()
            .filter(|p| p.chars().count() > 4096)
            .collect();
        assert_eq!(oversized.len(), 1);
        assert!(oversized[0].contains(&big));
    }
}
