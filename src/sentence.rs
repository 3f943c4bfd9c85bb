//! Sentence segmentation as a pluggable text-to-offsets service.
//!
//! The default splitter uses Unicode sentence boundaries (UAX #29) and
//! respects explicit newlines in the source text.

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into sentences, returned as `[begin, end)` char offsets.
pub trait SentenceSplitter {
    fn split(&self, text: &str) -> Vec<(usize, usize)>;
}

/// Splitter based on Unicode sentence boundaries.
#[derive(Debug, Clone)]
pub struct UnicodeSentenceSplitter {
    /// When true, a newline always ends a sentence.
    pub split_on_newlines: bool,
}

impl UnicodeSentenceSplitter {
    pub fn new() -> Self {
        Self {
            split_on_newlines: true,
        }
    }

    pub fn with_newlines(mut self, split_on_newlines: bool) -> Self {
        self.split_on_newlines = split_on_newlines;
        self
    }
}

impl Default for UnicodeSentenceSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn split(&self, text: &str) -> Vec<(usize, usize)> {
        let segments: Vec<(usize, &str)> = if self.split_on_newlines {
            let mut offset = 0;
            text.split_inclusive('\n')
                .map(|line| {
                    let start = offset;
                    offset += line.len();
                    (start, line)
                })
                .collect()
        } else {
            vec![(0, text)]
        };

        let mut sentences = Vec::new();
        for (segment_start, segment) in segments {
            for (offset, piece) in segment.split_sentence_bound_indices() {
                let trimmed = piece.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let leading = piece.len() - piece.trim_start().len();
                let begin = char_offset(text, segment_start + offset + leading);
                sentences.push((begin, begin + trimmed.chars().count()));
            }
        }
        sentences
    }
}

fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_sentences() {
        let splitter = UnicodeSentenceSplitter::default();
        assert_eq!(
            splitter.split("Take Aspirin daily. Stop Daraprim now."),
            vec![(0, 19), (20, 38)]
        );
    }

    #[test]
    fn test_newline_ends_sentence() {
        let splitter = UnicodeSentenceSplitter::default();
        assert_eq!(splitter.split("Aspirin 100 mg\nonce daily"), vec![(0, 14), (15, 25)]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let splitter = UnicodeSentenceSplitter::default();
        assert_eq!(splitter.split("A.\n\n  \nB."), vec![(0, 2), (7, 9)]);
    }

    #[test]
    fn test_char_offsets_with_multibyte_text() {
        let splitter = UnicodeSentenceSplitter::default();
        assert_eq!(splitter.split("Übelkeit. Schwindel."), vec![(0, 9), (10, 20)]);
    }

    #[test]
    fn test_empty_text() {
        assert!(UnicodeSentenceSplitter::default().split("").is_empty());
    }
}
