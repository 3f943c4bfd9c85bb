//! Text rendering of an occurrence array with centroid markers.
//!
//! ```text
//! abcd
//! 1122
//!   ╰╯ Med peak 2
//! ╰──╯ extent at boundary 0
//! ```

use std::fmt::{self, Write};
use unicode_width::UnicodeWidthChar;

use crate::{AnnotatedDocument, Centroid, OccurrenceArray, Plateau};

struct Marker {
    interval: Plateau,
    description: String,
}

pub struct CentroidDisplay<'a> {
    chars: Vec<char>,
    distribution: &'a OccurrenceArray,
    markers: Vec<Marker>,
}

impl<'a> CentroidDisplay<'a> {
    /// Text is taken stripped or not to match `distribution`.
    pub fn new(document: &AnnotatedDocument, distribution: &'a OccurrenceArray) -> Self {
        CentroidDisplay {
            chars: document.text(distribution.is_stripped()).chars().collect(),
            distribution,
            markers: Vec::new(),
        }
    }

    /// Mark the local maximum and the extent of `centroid` at `boundary`.
    pub fn include(&mut self, centroid: &Centroid, boundary: u32) -> &mut Self {
        self.markers.push(Marker {
            interval: centroid.local_maximum(),
            description: format!("{} peak {}", centroid.label(), centroid.peak()),
        });
        self.markers.push(Marker {
            interval: centroid.extent(boundary),
            description: format!("extent at boundary {}", boundary),
        });
        self
    }
}

impl<'a> fmt::Display for CentroidDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.distribution.counts();
        let len = counts.len().min(self.chars.len());

        let mut text_line = String::new();
        let mut count_line = String::new();
        let mut starts = Vec::with_capacity(len);
        let mut ends = Vec::with_capacity(len);
        let mut col = 0;
        for i in 0..len {
            let ch = self.chars[i];
            let count = counts[i].to_string();
            let char_width = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
            let width = char_width.max(count.len());

            starts.push(col);
            text_line.push(ch);
            text_line.extend(std::iter::repeat(' ').take(width - char_width));
            write!(count_line, "{:<w$}", count, w = width)?;
            col += width;
            ends.push(col);
        }
        f.write_str(text_line.trim_end())?;
        f.write_char('\n')?;
        f.write_str(count_line.trim_end())?;

        for marker in &self.markers {
            let (Some(&start), Some(&end)) = (starts.get(marker.interval.start), ends.get(marker.interval.end)) else {
                continue;
            };
            f.write_char('\n')?;
            for _ in 0..start {
                f.write_char(' ')?;
            }
            f.write_char('╰')?;
            for _ in (start + 1)..end.saturating_sub(1) {
                f.write_char('─')?;
            }
            if end - start > 1 {
                f.write_char('╯')?;
            }
            write!(f, " {}", marker.description)?;
        }
        Ok(())
    }
}
