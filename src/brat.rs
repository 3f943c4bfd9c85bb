//! Reading brat standoff annotations into a [`SpanIndex`].
//!
//! Only text-bound annotations (`T` lines) carry spans:
//!
//! ```text
//! T1	Medication 25 33	Daraprim
//! T2	Dose 2493 2504;2505 2509	25 mg daily
//! ```
//!
//! Events, relations, attributes, normalizations, equivalences and notes
//! are skipped.

use log::{trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

use crate::{AgreementError, AgreementResult, Span, SpanIndex, SpanInstance};

static TEXT_BOUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(T\d+)\t(\S+) ([0-9 ;]+)\t(.*)$").expect("Invalid text-bound regex"));

static FRAGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\s+(\d+)\s*$").expect("Invalid fragment regex"));

/// Parse the contents of a `.ann` file.
pub fn parse_brat(content: &str) -> AgreementResult<SpanIndex> {
    let mut index = SpanIndex::new();
    for (n, line) in content.lines().enumerate() {
        let line_no = n + 1;
        let line = line.trim_end_matches('\r');
        match line.chars().next() {
            None => continue,
            Some('T') => index.push(parse_text_bound(line, line_no)?),
            Some('E' | 'R' | 'A' | 'M' | 'N' | '*' | '#') => {
                trace!("skipping non text-bound annotation on line {}", line_no);
            }
            Some(_) => warn!("unrecognized annotation on line {}: {}", line_no, line),
        }
    }
    Ok(index)
}

fn parse_text_bound(line: &str, line_no: usize) -> AgreementResult<SpanInstance> {
    let caps = TEXT_BOUND.captures(line).ok_or_else(|| AgreementError::Parse {
        line: line_no,
        message: format!("malformed text-bound annotation: {}", line),
    })?;

    let mut fragments = Vec::new();
    for part in caps[3].split(';') {
        let offsets = FRAGMENT.captures(part).ok_or_else(|| AgreementError::Parse {
            line: line_no,
            message: format!("malformed fragment `{}`", part),
        })?;
        let begin = parse_offset(&offsets[1], line_no)?;
        let end = parse_offset(&offsets[2], line_no)?;
        fragments.push(Span::new(begin, end));
    }

    Ok(SpanInstance::new(&caps[1], &caps[2], fragments, &caps[4]))
}

fn parse_offset(digits: &str, line_no: usize) -> AgreementResult<usize> {
    digits.parse().map_err(|e| AgreementError::Parse {
        line: line_no,
        message: format!("offset `{}`: {}", digits, e),
    })
}

/// Read and parse a `.ann` file.
pub fn load_brat(path: &Path) -> AgreementResult<SpanIndex> {
    let content = fs::read_to_string(path).map_err(|e| AgreementError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_brat(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANN: &str = "T1\tMedication 25 33\tDaraprim\n\
                       T2\tDose 2493 2504;2505 2509\t25 mg daily\n\
                       E1\tMedication:T1\n\
                       A1\tNegated T1\n\
                       #1\tAnnotatorNotes T1\tcheck\n\
                       \n\
                       T3\tFrequency 40 45;50 55\tonce a day\n";

    #[test]
    fn test_text_bound_lines() {
        let index = parse_brat(ANN).unwrap();
        assert_eq!(index.len(), 3);

        let t1 = index.get("T1").unwrap();
        assert_eq!(t1.label, "Medication");
        assert_eq!(t1.fragments(), &[Span::new(25, 33)]);
        assert_eq!(t1.text, "Daraprim");
    }

    #[test]
    fn test_adjacent_fragments_merge() {
        let index = parse_brat(ANN).unwrap();
        assert_eq!(index.get("T2").unwrap().fragments(), &[Span::new(2493, 2509)]);
        assert_eq!(
            index.get("T3").unwrap().fragments(),
            &[Span::new(40, 45), Span::new(50, 55)]
        );
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = parse_brat("T1\tMedication 25 33\tDaraprim\nT2\tDose 12\tx\n").unwrap_err();
        assert!(matches!(err, AgreementError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_load_brat_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("01.ann");
        fs::write(&path, ANN).unwrap();
        assert_eq!(load_brat(&path).unwrap().label_counts().get("Dose"), Some(&1));
        assert!(matches!(
            load_brat(&dir.path().join("missing.ann")),
            Err(AgreementError::Load { .. })
        ));
    }
}
