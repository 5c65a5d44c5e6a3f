//! Projection-profile analysis.
//!
//! A projection profile reduces a binary map to per-line foreground counts.
//! Content bands show up as high-count runs, the gap between the two answer
//! columns as a valley. All functions here are pure and O(W·H) or better.

use super::threshold::BinaryMap;

/// A contiguous run of content lines, endpoints inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub end: usize,
}

impl Run {
    /// Vertical extent of the run in lines.
    pub fn extent(&self) -> usize {
        self.end - self.start
    }
}

/// Per-row foreground counts.
pub fn row_profile(map: &BinaryMap) -> Vec<u32> {
    let w = map.width() as usize;
    let data = map.data();
    (0..map.height() as usize)
        .map(|y| data[y * w..(y + 1) * w].iter().filter(|&&v| v != 0).count() as u32)
        .collect()
}

/// Per-column foreground counts over the full map height.
pub fn col_profile(map: &BinaryMap) -> Vec<u32> {
    col_profile_rows(map, 0, map.height() as usize - 1)
}

/// Per-column foreground counts restricted to rows `[row_start, row_end]`.
pub fn col_profile_rows(map: &BinaryMap, row_start: usize, row_end: usize) -> Vec<u32> {
    let w = map.width() as usize;
    let data = map.data();
    let mut profile = vec![0u32; w];
    for y in row_start..=row_end {
        let row = &data[y * w..(y + 1) * w];
        for (x, &v) in row.iter().enumerate() {
            if v != 0 {
                profile[x] += 1;
            }
        }
    }
    profile
}

/// Group lines whose count exceeds `threshold` into contiguous runs.
///
/// A gap of more than `max_gap` consecutive below-threshold lines starts a
/// new run; smaller gaps are absorbed.
pub fn content_runs(profile: &[u32], threshold: f32, max_gap: usize) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut current: Option<Run> = None;

    for (i, &count) in profile.iter().enumerate() {
        if (count as f32) <= threshold {
            continue;
        }
        match current {
            Some(ref mut run) if i - run.end <= max_gap => run.end = i,
            Some(run) => {
                runs.push(run);
                current = Some(Run { start: i, end: i });
            }
            None => current = Some(Run { start: i, end: i }),
        }
    }
    if let Some(run) = current {
        runs.push(run);
    }
    runs
}

/// The run with the greatest extent, if any.
pub fn widest_run(runs: &[Run]) -> Option<Run> {
    runs.iter().copied().max_by_key(Run::extent)
}

/// Minimum-mean sliding window over `profile[band_start..band_end]`.
///
/// Slides a `window` wide window across the band and returns the start
/// index of the position with the lowest mean count. Smoothing over a
/// window, rather than picking the single minimal column, keeps a lone
/// noisy column from deciding the split. Returns `None` when the band is
/// empty; a band narrower than the window is evaluated as one position.
pub fn min_mean_window(
    profile: &[u32],
    band_start: usize,
    band_end: usize,
    window: usize,
) -> Option<usize> {
    if band_start >= band_end || window == 0 {
        return None;
    }
    let band_width = band_end - band_start;
    let window = window.min(band_width);

    let mut best_start = band_start;
    let mut best_mean = f32::INFINITY;
    for start in band_start..=(band_end - window) {
        let sum: u32 = profile[start..start + window].iter().sum();
        let mean = sum as f32 / window as f32;
        if mean < best_mean {
            best_mean = mean;
            best_start = start;
        }
    }
    Some(best_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::threshold::FOREGROUND;

    fn map_from_rows(rows: &[&[u8]]) -> BinaryMap {
        let h = rows.len() as u32;
        let w = rows[0].len() as u32;
        let data: Vec<u8> = rows
            .iter()
            .flat_map(|r| r.iter().map(|&v| if v != 0 { FOREGROUND } else { 0 }))
            .collect();
        BinaryMap::from_raw(w, h, data).unwrap()
    }

    #[test]
    fn profiles_count_foreground_per_line() {
        let map = map_from_rows(&[&[1, 0, 1, 0], &[0, 0, 0, 0], &[1, 1, 1, 1]]);
        assert_eq!(row_profile(&map), vec![2, 0, 4]);
        assert_eq!(col_profile(&map), vec![2, 1, 2, 1]);
    }

    #[test]
    fn col_profile_respects_row_range() {
        let map = map_from_rows(&[&[1, 1], &[0, 1], &[1, 0]]);
        assert_eq!(col_profile_rows(&map, 1, 2), vec![1, 1]);
    }

    #[test]
    fn runs_absorb_small_gaps_and_split_on_large_ones() {
        // Content at 0..=2, gap of 3 (<= max_gap), content at 6..=7,
        // gap of 12 (> max_gap), content at 20.
        let mut profile = vec![0u32; 25];
        for i in [0, 1, 2, 6, 7, 20] {
            profile[i] = 9;
        }
        let runs = content_runs(&profile, 5.0, 10);
        assert_eq!(
            runs,
            vec![Run { start: 0, end: 7 }, Run { start: 20, end: 20 }]
        );
    }

    #[test]
    fn no_runs_when_nothing_clears_threshold() {
        let profile = vec![3u32; 40];
        assert!(content_runs(&profile, 5.0, 10).is_empty());
    }

    #[test]
    fn widest_run_picks_greatest_extent() {
        let runs = vec![Run { start: 0, end: 4 }, Run { start: 10, end: 30 }];
        assert_eq!(widest_run(&runs), Some(Run { start: 10, end: 30 }));
    }

    #[test]
    fn window_mean_ignores_single_noise_spike() {
        // Wide flat valley at 40..60 vs a single zero column at 10
        // surrounded by dense columns. The windowed mean must prefer the
        // wide valley.
        let mut profile = vec![50u32; 100];
        profile[10] = 0;
        for v in profile[40..60].iter_mut() {
            *v = 5;
        }
        let start = min_mean_window(&profile, 5, 95, 10).unwrap();
        assert!((40..=50).contains(&start));
    }

    #[test]
    fn window_clamps_to_narrow_band() {
        let profile = vec![7u32; 30];
        assert_eq!(min_mean_window(&profile, 12, 16, 20), Some(12));
        assert_eq!(min_mean_window(&profile, 12, 12, 20), None);
    }
}
