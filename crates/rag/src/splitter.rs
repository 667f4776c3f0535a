//! Overlapping text chunker with natural-breakpoint preference.
//!
//! Cuts a document into chunks of at most `chunk_size` bytes. Within each
//! window the cut lands after the latest paragraph break, then line break,
//! then sentence end, then space, falling back to a raw cut at the window
//! edge. Consecutive chunks overlap by up to `overlap` bytes for context
//! continuity.

/// Separator preference, most to least desirable.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Configurable chunker. Sizes are in bytes; cuts always land on UTF-8
/// character boundaries.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl TextSplitter {
    /// Creates a splitter. `overlap` is clamped below `chunk_size` so every
    /// window makes forward progress.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Splits `text` into overlapping chunks. Empty input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return vec![];
        }
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let hard_end = floor_char_boundary(text, (start + self.chunk_size).min(text.len()));

            if hard_end == text.len() {
                chunks.push(text[start..].to_string());
                break;
            }

            let cut = self.find_cut(&text[start..hard_end]).map(|p| start + p);
            let end = cut.unwrap_or(hard_end);

            chunks.push(text[start..end].to_string());

            // Step back by the overlap, never behind the previous start.
            let next = floor_char_boundary(text, end.saturating_sub(self.overlap));
            start = if next > start { next } else { end };
        }

        chunks
    }

    /// Finds the preferred cut inside one window: the end of the latest
    /// occurrence of the highest-priority separator present.
    fn find_cut(&self, window: &str) -> Option<usize> {
        for sep in SEPARATORS {
            if let Some(pos) = window.rfind(sep) {
                if pos > 0 {
                    return Some(pos + sep.len());
                }
            }
        }
        None
    }
}

/// Largest char-boundary index not exceeding `index`.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let splitter = TextSplitter::new(1000, 200);
        let chunks = splitter.split("short text");
        assert_eq!(chunks, vec!["short text".to_string()]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        let splitter = TextSplitter::new(1000, 200);
        assert!(splitter.split("").is_empty());
    }

    #[test]
    fn raw_fallback_cuts_fixed_windows() {
        // No separators at all: cuts at 1000, steps back 200.
        let text = "a".repeat(2500);
        let splitter = TextSplitter::new(1000, 200);
        let chunks = splitter.split(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1000);
        assert_eq!(chunks[1].len(), 1000);
        assert_eq!(chunks[2].len(), 900);
    }

    #[test]
    fn prefers_paragraph_break() {
        let text = format!("{}\n\n{}", "a".repeat(600), "b".repeat(600));
        let splitter = TextSplitter::new(1000, 100);
        let chunks = splitter.split(&text);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].ends_with("\n\n"));
        assert!(chunks[1].starts_with('a'), "overlap carries prior context");
        assert!(chunks[1].ends_with('b'));
    }

    #[test]
    fn prefers_sentence_end_over_space() {
        let sentence = "only one break here. then more words follow after it";
        let padded = format!("{}{}", sentence, " x".repeat(30));
        let splitter = TextSplitter::new(60, 10);
        let chunks = splitter.split(&padded);

        assert!(chunks[0].ends_with(". "), "chunk was: {:?}", chunks[0]);
    }

    #[test]
    fn chunks_never_exceed_size_and_cover_text() {
        let text = "word ".repeat(500);
        let splitter = TextSplitter::new(120, 30);
        let chunks = splitter.split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 120);
        }
        // The last chunk reaches the end of the document.
        assert!(text.ends_with(chunks.last().unwrap().as_str()));
    }

    #[test]
    fn multibyte_text_cuts_on_char_boundaries() {
        let text = "héllo wörld ".repeat(100);
        let splitter = TextSplitter::new(50, 10);
        // Would panic on a non-boundary slice.
        let chunks = splitter.split(&text);
        assert!(!chunks.is_empty());
    }
}
