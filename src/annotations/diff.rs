//! Annotation invalidation after buffer edits.
//!
//! Editors report one contiguous edit per change callback, so the changed
//! region is located with a common-prefix / common-suffix scan instead of a
//! full multi-hunk diff. Two disjoint edits delivered in one snapshot are
//! treated as a single region spanning both, which over-invalidates whatever
//! sits between them.

use tracing::trace;

use super::types::Annotation;

/// Contiguous region believed to have changed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRegion {
    /// First differing character offset (same in both snapshots).
    pub start: usize,
    /// End of the changed span in the old snapshot.
    pub old_end: usize,
    /// End of the changed span in the new snapshot.
    pub new_end: usize,
}

impl ChangedRegion {
    /// End of the region in the combined coordinate space used for overlap
    /// tests.
    pub fn end(&self) -> usize {
        self.old_end.max(self.new_end)
    }

    /// Whether an annotation range intersects this region.
    pub fn overlaps(&self, annotation: &Annotation) -> bool {
        !(annotation.to <= self.start || annotation.from >= self.end())
    }
}

/// Locate the changed region between two snapshots.
///
/// Returns `None` when the texts are identical.
pub fn find_changed_region(old_code: &str, new_code: &str) -> Option<ChangedRegion> {
    let old: Vec<char> = old_code.chars().collect();
    let new: Vec<char> = new_code.chars().collect();
    let min_len = old.len().min(new.len());

    let start = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if start == min_len && old.len() == new.len() {
        return None;
    }

    let mut old_end = old.len();
    let mut new_end = new.len();
    while old_end > start && new_end > start && old[old_end - 1] == new[new_end - 1] {
        old_end -= 1;
        new_end -= 1;
    }

    Some(ChangedRegion {
        start,
        old_end,
        new_end,
    })
}

/// Shift a position by a signed delta, clamping at zero.
fn apply_delta(position: usize, delta: i64) -> usize {
    (position as i64).saturating_add(delta).max(0) as usize
}

/// Drop annotations touched by the edit from `old_code` to `new_code` and
/// shift the ones after it by the length change.
///
/// Annotations entirely before the edit are returned unchanged. Nothing is
/// ever merged, split or created.
pub fn invalidate_annotations(
    annotations: &[Annotation],
    old_code: &str,
    new_code: &str,
) -> Vec<Annotation> {
    if annotations.is_empty() {
        return Vec::new();
    }

    if old_code == new_code {
        return annotations.to_vec();
    }

    let Some(region) = find_changed_region(old_code, new_code) else {
        return annotations.to_vec();
    };

    let delta = new_code.chars().count() as i64 - old_code.chars().count() as i64;

    let kept: Vec<Annotation> = annotations
        .iter()
        .filter(|a| !region.overlaps(a))
        .map(|a| {
            if a.to <= region.start {
                a.clone()
            } else {
                Annotation {
                    from: apply_delta(a.from, delta),
                    to: apply_delta(a.to, delta),
                    ..a.clone()
                }
            }
        })
        .collect();

    trace!(
        "Invalidated {} of {} annotations (change {}..{}, delta {})",
        annotations.len() - kept.len(),
        annotations.len(),
        region.start,
        region.end(),
        delta
    );

    kept
}

/// Decide whether a change is large enough that incremental invalidation
/// should give way to a full re-analysis.
///
/// Heuristic: always re-analyze without previous code, when the shorter text
/// is under half the longer one, or when fewer than half of the positions
/// (measured against the longer length) hold the same character. Position-for-
/// position comparison means an early insertion that shifts everything counts
/// as a large change.
pub fn should_reanalyze(old_code: &str, new_code: &str) -> bool {
    if old_code.trim().is_empty() {
        return true;
    }

    let old_len = old_code.chars().count();
    let new_len = new_code.chars().count();
    let max_len = old_len.max(new_len);
    let min_len = old_len.min(new_len);

    if (min_len as f64) < (max_len as f64) * 0.5 {
        return true;
    }

    let matches = old_code
        .chars()
        .zip(new_code.chars())
        .filter(|(a, b)| a == b)
        .count();

    let similarity = matches as f64 / max_len as f64;
    similarity < 0.5
}
