//! # Text Chunker
//!
//! Splits extracted document text into overlapping windows that prefer to end
//! on a sentence or word boundary. Positions are counted in `char`s so that
//! multi-byte text is never cut inside a code point.

/// Splits `text` into chunks of at most `chunk_size` characters.
///
/// Consecutive chunks share up to `overlap` characters. Chunks are trimmed and
/// blank ones are dropped, so blank input (or a zero `chunk_size`) yields no
/// chunks at all.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if chunk_size == 0 || text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut chunks = Vec::new();
    let mut start: usize = 0;

    loop {
        let mut end = start.saturating_add(chunk_size).min(len);

        if end < len {
            let window = &chars[start..end];
            let last_period = window.iter().rposition(|c| *c == '.');
            let last_space = window.iter().rposition(|c| c.is_whitespace());
            if let Some(boundary) = last_period.max(last_space) {
                end = start + boundary + 1;
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if end >= len {
            break;
        }

        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_yields_nothing() {
        assert!(split_text("", 100, 10).is_empty());
        assert!(split_text("   \n\t ", 100, 10).is_empty());
        assert!(split_text("some text", 0, 0).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(split_text("  Hello world.  ", 100, 20), vec!["Hello world."]);
    }

    #[test]
    fn test_huge_chunk_size_does_not_overflow() {
        assert_eq!(split_text("one two three", usize::MAX, 0), vec!["one two three"]);
        assert_eq!(split_text("one two three", usize::MAX, 5), vec!["one two three"]);
    }

    #[test]
    fn test_default_sizes_on_a_long_document() {
        let text: String = (0..)
            .map(|i| format!("Sentence number {i} ends here. "))
            .flat_map(|s| s.chars().collect::<Vec<_>>())
            .take(2500)
            .collect();
        assert_eq!(text.chars().count(), 2500);

        let chunks = split_text(&text, 1000, 200);

        assert_eq!(chunks.len(), (2500_usize - 200).div_ceil(1000 - 200));
        assert!(chunks.iter().all(|c| c.chars().count() <= 1000));
        for pair in chunks.windows(2) {
            let next: Vec<char> = pair[1].chars().collect();
            let shared = (0..=next.len())
                .rev()
                .find(|&k| pair[0].ends_with(&next[..k].iter().collect::<String>()))
                .unwrap_or(0);
            assert!((150..=200).contains(&shared), "shared {shared} chars");
        }
        assert!(chunks.last().unwrap().ends_with("Sentence number 83 e"));
    }

    #[test]
    fn test_prefers_sentence_boundary() {
        let chunks = split_text("First sentence. Second sentence here", 20, 0);
        assert_eq!(chunks[0], "First sentence.");
        assert!(chunks.iter().all(|c| c.chars().count() <= 20));
    }

    #[test]
    fn test_overlap_repeats_tail() {
        let text = "aaaa bbbb cccc dddd eeee ffff";
        let chunks = split_text(text, 10, 5);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let first_word = pair[1].split_whitespace().next().unwrap();
            assert!(pair[0].contains(first_word), "{pair:?}");
        }
    }

    #[test]
    fn test_overlap_not_smaller_than_chunk_still_terminates() {
        let chunks = split_text("abcdefghijklmnopqrstuvwxyz", 5, 10);
        assert_eq!(chunks, vec!["abcde", "fghij", "klmno", "pqrst", "uvwxy", "z"]);
    }

    #[test]
    fn test_cyrillic_is_split_by_chars() {
        let text = "Привет мир. ".repeat(50);
        let chunks = split_text(&text, 37, 7);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.chars().count() <= 37));
    }

    #[test]
    fn test_every_word_is_covered() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
                    Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.";
        let chunks = split_text(text, 24, 6);
        let joined = chunks.join(" ");
        for word in text.split_whitespace() {
            assert!(joined.contains(word), "missing {word}");
        }
    }
}
