//! Centroid extraction: local maxima of occurrence arrays and their
//! noise-tolerant extents.
//!
//! A [`Plateau`] is the closed interval of a local maximum. A [`Centroid`]
//! pairs a plateau with the distribution it was found in and grows
//! boundaries outward from it, memoized per boundary value.
//!
//! ```text
//! counts   0 1 2 2 1 0
//! plateau      ╰─╯
//! extent     ╰─────╯   (boundary 0)
//! ```

use log::{debug, trace};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::{AgreementMatrix, AgreementResult, AnnotatedDocument, OccurrenceArray};

/// Closed interval `[start, end]` of character positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Plateau {
    pub start: usize,
    pub end: usize,
}

impl Plateau {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Whether `other` lies completely inside this interval.
    pub fn contains_interval(&self, other: &Plateau) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }

    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Scan `counts` left to right for local maxima.
///
/// Positions where the value holds level are collected as breakpoints; a
/// strict decrease (or the end of the array) closes the current plateau.
/// Plateaus come out in scan order and never overlap.
pub fn find_plateaus(counts: &[u32]) -> Vec<Plateau> {
    let mut plateaus = Vec::new();
    let mut breakpoints: Vec<usize> = Vec::new();
    let mut prev = 0u32;
    let mut declining = false;

    for (i, &value) in counts.iter().enumerate() {
        if value > prev {
            declining = false;
        } else if value == prev {
            if prev != 0 && !declining {
                breakpoints.push(i - 1);
            }
        } else if !declining {
            declining = true;
            breakpoints.push(i - 1);
            let plateau = collapse_breakpoints(&breakpoints);
            trace!("plateau {:?} at height {}", plateau, prev);
            plateaus.push(plateau);
            breakpoints.clear();
        }
        prev = value;
    }

    if !declining && prev != 0 {
        breakpoints.push(counts.len() - 1);
        plateaus.push(collapse_breakpoints(&breakpoints));
    }
    plateaus
}

/// Keep only the run of adjacent breakpoints ending at the last one.
fn collapse_breakpoints(breakpoints: &[usize]) -> Plateau {
    let end = breakpoints.last().copied().unwrap_or(0);
    let mut start = end;
    for &bp in breakpoints.iter().rev().skip(1) {
        if bp + 1 == start {
            start = bp;
        } else {
            break;
        }
    }
    Plateau::new(start, end)
}

/// Direction of boundary growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// Recorded whenever the count changes during boundary growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    /// Positions walked past the plateau edge.
    pub distance: usize,
    /// Drop from the previous distinct count (negative when rising again).
    pub drop: i64,
}

/// Walk outward from a plateau edge until the array edge or a count at or
/// below `boundary`. The last checkpoint's distance is the extent.
pub fn grow_boundary(counts: &[u32], plateau: Plateau, boundary: u32, direction: Direction) -> Vec<Checkpoint> {
    let origin = match direction {
        Direction::Left => plateau.start,
        Direction::Right => plateau.end,
    };
    let Some(&peak) = counts.get(origin) else {
        return vec![Checkpoint { distance: 0, drop: 0 }];
    };

    let mut checkpoints = Vec::new();
    let mut level = i64::from(peak);
    let mut drop = level;
    let mut distance = 0usize;
    loop {
        let pos = match direction {
            Direction::Left => origin.checked_sub(distance + 1),
            Direction::Right => Some(origin + distance + 1).filter(|&p| p < counts.len()),
        };
        let Some(pos) = pos else {
            checkpoints.push(Checkpoint { distance, drop });
            break;
        };
        let value = i64::from(counts[pos]);
        if value <= i64::from(boundary) {
            checkpoints.push(Checkpoint {
                distance,
                drop: level - value,
            });
            break;
        }
        if value != level {
            drop = level - value;
            level = value;
            checkpoints.push(Checkpoint { distance, drop });
        }
        distance += 1;
    }
    checkpoints
}

/// Left and right growth checkpoints for one boundary value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundaryProfile {
    pub left: Vec<Checkpoint>,
    pub right: Vec<Checkpoint>,
}

impl BoundaryProfile {
    pub fn compute(counts: &[u32], plateau: Plateau, boundary: u32) -> Self {
        Self {
            left: grow_boundary(counts, plateau, boundary, Direction::Left),
            right: grow_boundary(counts, plateau, boundary, Direction::Right),
        }
    }

    pub fn left_distance(&self) -> usize {
        self.left.last().map_or(0, |c| c.distance)
    }

    pub fn right_distance(&self) -> usize {
        self.right.last().map_or(0, |c| c.distance)
    }
}

/// A consensus region: one plateau of an occurrence array plus its
/// boundary-dependent extents.
pub struct Centroid {
    label: String,
    plateau: Plateau,
    annotators: Vec<usize>,
    peak: u32,
    distribution: Arc<OccurrenceArray>,
    text: String,
    profiles: Mutex<BTreeMap<u32, Arc<BoundaryProfile>>>,
}

impl std::fmt::Debug for Centroid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Centroid")
            .field("label", &self.label)
            .field("plateau", &self.plateau)
            .field("annotators", &self.annotators)
            .field("peak", &self.peak)
            .field("text", &self.text)
            .finish()
    }
}

impl Centroid {
    pub fn new(
        label: impl Into<String>,
        plateau: Plateau,
        annotators: Vec<usize>,
        distribution: Arc<OccurrenceArray>,
        text: impl Into<String>,
    ) -> Self {
        let peak = distribution.get(plateau.start).unwrap_or(0);
        let mut annotators = annotators;
        annotators.sort_unstable();
        Self {
            label: label.into(),
            plateau,
            annotators,
            peak,
            distribution,
            text: text.into(),
            profiles: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn local_maximum(&self) -> Plateau {
        self.plateau
    }

    /// Annotator indices whose spans built the distribution.
    pub fn annotators(&self) -> &[usize] {
        &self.annotators
    }

    /// Agreement count at the plateau.
    pub fn peak(&self) -> u32 {
        self.peak
    }

    /// Text under the plateau.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn distribution(&self) -> &OccurrenceArray {
        &self.distribution
    }

    /// Growth profile for `boundary`, computed at most once.
    pub fn profile(&self, boundary: u32) -> Arc<BoundaryProfile> {
        let mut profiles = self.profiles.lock();
        Arc::clone(profiles.entry(boundary).or_insert_with(|| {
            Arc::new(BoundaryProfile::compute(
                self.distribution.counts(),
                self.plateau,
                boundary,
            ))
        }))
    }

    /// Boundary values computed so far.
    pub fn cached_boundaries(&self) -> Vec<u32> {
        self.profiles.lock().keys().copied().collect()
    }

    /// Leftmost position of this centroid at `boundary`.
    pub fn left_extend(&self, boundary: u32) -> usize {
        self.plateau.start - self.profile(boundary).left_distance()
    }

    /// Rightmost position of this centroid at `boundary`.
    pub fn right_extend(&self, boundary: u32) -> usize {
        self.plateau.end + self.profile(boundary).right_distance()
    }

    /// `[left_extend, right_extend]` at `boundary`.
    pub fn extent(&self, boundary: u32) -> Plateau {
        let profile = self.profile(boundary);
        Plateau::new(
            self.plateau.start - profile.left_distance(),
            self.plateau.end + profile.right_distance(),
        )
    }

    /// `Some(self)` if the peak reaches `threshold`; populates the
    /// profile for `boundary` either way.
    pub fn qualifies(&self, threshold: u32, boundary: u32) -> Option<&Self> {
        self.profile(boundary);
        if self.peak < threshold {
            None
        } else {
            Some(self)
        }
    }

    /// Inspection view for one boundary value.
    pub fn describe(&self, boundary: u32) -> CentroidView {
        let extent = self.extent(boundary);
        let counts = self.distribution.counts();
        CentroidView {
            label: self.label.clone(),
            text: self.text.clone(),
            annotators: self.annotators.clone(),
            local_maximum: self.plateau,
            extent,
            peak: self.peak,
            profile: (*self.profile(boundary)).clone(),
            counts: counts[extent.start..=extent.end.min(counts.len().saturating_sub(1))].to_vec(),
        }
    }
}

/// Serializable snapshot of a centroid at one boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CentroidView {
    pub label: String,
    pub text: String,
    pub annotators: Vec<usize>,
    pub local_maximum: Plateau,
    pub extent: Plateau,
    pub peak: u32,
    pub profile: BoundaryProfile,
    pub counts: Vec<u32>,
}

type CentroidKey = (String, Vec<usize>);

/// Finds and caches the centroids of a document per (label, annotator subset).
pub struct CentroidExtractor {
    matrix: AgreementMatrix,
    strip_whitespace: bool,
    cache: Mutex<HashMap<CentroidKey, Arc<Vec<Arc<Centroid>>>>>,
}

impl CentroidExtractor {
    pub fn new(document: Arc<AnnotatedDocument>, strip_whitespace: bool) -> Self {
        Self {
            matrix: AgreementMatrix::new(document),
            strip_whitespace,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn matrix(&self) -> &AgreementMatrix {
        &self.matrix
    }

    pub fn strips_whitespace(&self) -> bool {
        self.strip_whitespace
    }

    /// Centroids of `label` built from the annotators in `subset`, in scan order.
    pub fn centroids(&self, label: &str, subset: &[usize]) -> AgreementResult<Arc<Vec<Arc<Centroid>>>> {
        let mut subset = subset.to_vec();
        subset.sort_unstable();
        subset.dedup();

        let key = (label.to_string(), subset);
        let mut cache = self.cache.lock();
        if let Some(found) = cache.get(&key) {
            return Ok(Arc::clone(found));
        }

        let distribution = Arc::new(self.matrix.occurrence_array(label, &key.1, self.strip_whitespace)?);
        let text: Vec<char> = self.matrix.document().text(self.strip_whitespace).chars().collect();
        let centroids: Vec<Arc<Centroid>> = find_plateaus(distribution.counts())
            .into_iter()
            .map(|plateau| {
                let covered: String = text
                    .get(plateau.start..=plateau.end)
                    .map(|chars| chars.iter().collect())
                    .unwrap_or_default();
                Arc::new(Centroid::new(
                    label,
                    plateau,
                    key.1.clone(),
                    Arc::clone(&distribution),
                    covered,
                ))
            })
            .collect();
        debug!(
            "found {} centroids for {} over annotators {:?}",
            centroids.len(),
            label,
            key.1
        );

        let centroids = Arc::new(centroids);
        cache.insert(key, Arc::clone(&centroids));
        Ok(centroids)
    }

    /// Centroids of `label` over every annotator.
    pub fn all_centroids(&self, label: &str) -> AgreementResult<Arc<Vec<Arc<Centroid>>>> {
        let all: Vec<usize> = (0..self.matrix.document().annotators().len()).collect();
        self.centroids(label, &all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Span, SpanIndex, SpanInstance};

    fn plateaus(counts: &[u32]) -> Vec<(usize, usize)> {
        find_plateaus(counts).into_iter().map(|p| (p.start, p.end)).collect()
    }

    fn centroid(counts: Vec<u32>, plateau: Plateau) -> Centroid {
        Centroid::new("Med", plateau, vec![0], Arc::new(OccurrenceArray::new(counts, false)), "")
    }

    #[test]
    fn test_single_hill() {
        assert_eq!(plateaus(&[0, 1, 2, 2, 1, 0]), vec![(2, 3)]);
    }

    #[test]
    fn test_rising_flat_then_peak_keeps_last_run() {
        assert_eq!(plateaus(&[1, 1, 2, 2, 1]), vec![(2, 3)]);
        assert_eq!(plateaus(&[1, 1, 2, 0]), vec![(2, 2)]);
    }

    #[test]
    fn test_two_hills() {
        assert_eq!(plateaus(&[2, 0, 0, 1, 0]), vec![(0, 0), (3, 3)]);
        assert_eq!(plateaus(&[2, 1, 2, 0]), vec![(0, 0), (2, 2)]);
    }

    #[test]
    fn test_hill_after_long_decline() {
        assert_eq!(plateaus(&[3, 2, 1, 2, 0]), vec![(0, 0), (3, 3)]);
    }

    #[test]
    fn test_flat_decline_is_not_a_plateau() {
        assert_eq!(plateaus(&[3, 1, 1, 2, 0]), vec![(0, 0), (3, 3)]);
    }

    #[test]
    fn test_plateau_open_at_array_end() {
        assert_eq!(plateaus(&[0, 1, 2, 2]), vec![(2, 3)]);
        assert_eq!(plateaus(&[1]), vec![(0, 0)]);
    }

    #[test]
    fn test_empty_and_zero_arrays() {
        assert!(plateaus(&[]).is_empty());
        assert!(plateaus(&[0, 0, 0]).is_empty());
    }

    #[test]
    fn test_extents_at_boundary_zero() {
        let c = centroid(vec![0, 1, 2, 2, 1, 0], Plateau::new(2, 3));
        assert_eq!(c.left_extend(0), 1);
        assert_eq!(c.right_extend(0), 4);
        assert_eq!(c.peak(), 2);
    }

    #[test]
    fn test_extents_at_higher_boundary() {
        let c = centroid(vec![0, 1, 2, 2, 1, 0], Plateau::new(2, 3));
        assert_eq!(c.extent(1), Plateau::new(2, 3));
        assert_eq!(c.cached_boundaries(), vec![1]);
        assert_eq!(c.extent(0), Plateau::new(1, 4));
        assert_eq!(c.cached_boundaries(), vec![0, 1]);
    }

    #[test]
    fn test_growth_to_array_edge() {
        let c = centroid(vec![1, 2, 1], Plateau::new(1, 1));
        assert_eq!(c.extent(0), Plateau::new(0, 2));
        let profile = c.profile(0);
        assert_eq!(profile.left, vec![Checkpoint { distance: 0, drop: 1 }, Checkpoint { distance: 1, drop: 1 }]);
    }

    #[test]
    fn test_growth_through_neighbouring_hill() {
        // 1 2 1 3 1 0: growth right from the first peak climbs into the second hill
        let c = centroid(vec![1, 2, 1, 3, 1, 0], Plateau::new(1, 1));
        assert_eq!(c.extent(0), Plateau::new(0, 4));
        let drops: Vec<i64> = c.profile(0).right.iter().map(|cp| cp.drop).collect();
        assert_eq!(drops, vec![1, -2, 2, 1]);
    }

    #[test]
    fn test_qualifies() {
        let c = centroid(vec![0, 1, 2, 2, 1, 0], Plateau::new(2, 3));
        assert!(c.qualifies(2, 0).is_some());
        assert!(c.qualifies(3, 1).is_none());
        assert_eq!(c.cached_boundaries(), vec![0, 1]);
    }

    #[test]
    fn test_describe() {
        let c = centroid(vec![0, 1, 2, 2, 1, 0], Plateau::new(2, 3));
        let view = c.describe(0);
        assert_eq!(view.counts, vec![1, 2, 2, 1]);
        assert_eq!(view.extent, Plateau::new(1, 4));
    }

    #[test]
    fn test_extractor_caches_per_subset() {
        let mut annotations = BTreeMap::new();
        annotations.insert(
            "a".to_string(),
            SpanIndex::from_instances(vec![SpanInstance::new("T1", "Med", vec![Span::new(0, 7)], "Aspirin")]),
        );
        annotations.insert(
            "b".to_string(),
            SpanIndex::from_instances(vec![SpanInstance::new("T1", "Med", vec![Span::new(0, 3)], "Asp")]),
        );
        let doc = Arc::new(AnnotatedDocument::with_annotations("d", "Aspirin daily", annotations));
        let extractor = CentroidExtractor::new(doc, true);

        let both = extractor.centroids("Med", &[1, 0]).unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].local_maximum(), Plateau::new(0, 2));
        assert_eq!(both[0].text(), "Asp");
        assert_eq!(both[0].extent(0), Plateau::new(0, 6));
        assert_eq!(both[0].annotators(), &[0, 1]);

        let again = extractor.all_centroids("Med").unwrap();
        assert!(Arc::ptr_eq(&both, &again));

        assert!(extractor.centroids("Med", &[5]).is_err());
    }
}
