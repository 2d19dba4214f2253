//! Region labelling.
//!
//! Burns manual cut lines into a boundary mask and assigns a region id to
//! every connected area outside the boundaries.

use std::collections::{BTreeSet, HashMap};

use image::Luma;
use imageproc::drawing::BresenhamLineIter;
use imageproc::region_labelling::{connected_components, Connectivity as PixelConnectivity};

use crate::grid::{mask_to_gray, BoundaryMask, LabelGrid, Mask, RegionId};

/// Neighbourhood used when growing regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge-adjacent pixels only.
    #[default]
    Four,
    /// Edge- and corner-adjacent pixels.
    Eight,
}

impl From<Connectivity> for PixelConnectivity {
    fn from(connectivity: Connectivity) -> Self {
        match connectivity {
            Connectivity::Four => PixelConnectivity::Four,
            Connectivity::Eight => PixelConnectivity::Eight,
        }
    }
}

/// A polyline drawn by the user to force a split, in source pixel `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualCut {
    points: Vec<(i32, i32)>,
}

impl ManualCut {
    /// Minimum number of points for a committed cut.
    pub const MIN_POINTS: usize = 2;

    /// Create a cut, or `None` if fewer than two points were collected.
    pub fn new(points: Vec<(i32, i32)>) -> Option<Self> {
        (points.len() >= Self::MIN_POINTS).then_some(Self { points })
    }

    pub fn points(&self) -> &[(i32, i32)] {
        &self.points
    }

    /// Consecutive point pairs of the polyline.
    pub fn segments(&self) -> impl Iterator<Item = ((i32, i32), (i32, i32))> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

/// Pixels covered by a cut segment, before stroke dilation.
fn segment_pixels(
    start: (i32, i32),
    end: (i32, i32),
) -> impl Iterator<Item = (i32, i32)> {
    BresenhamLineIter::new(
        (start.0 as f32, start.1 as f32),
        (end.0 as f32, end.1 as f32),
    )
}

/// Stamp every cut into `mask` with a square footprint of half-width
/// `stroke_width / 2`. Pixels outside the grid are dropped.
pub fn burn_cuts(mask: &mut BoundaryMask, cuts: &[ManualCut], stroke_width: u32) {
    let (height, width) = mask.dim();
    let half = (stroke_width / 2) as i32;

    for cut in cuts {
        for (start, end) in cut.segments() {
            for (x, y) in segment_pixels(start, end) {
                for dy in -half..=half {
                    for dx in -half..=half {
                        let (px, py) = (x + dx, y + dy);
                        if px >= 0 && py >= 0 && (px as usize) < width && (py as usize) < height {
                            mask[[py as usize, px as usize]] = true;
                        }
                    }
                }
            }
        }
    }
}

/// Compute the label grid for `boundary` plus `cuts`.
///
/// Ids run `1..=K` in row-major order of each region's first pixel; `0`
/// marks boundary pixels. The grid is a pure function of its inputs, but ids
/// carry no meaning across different inputs: any selection made against a
/// previous grid must be dropped.
pub fn label_regions(
    boundary: &BoundaryMask,
    cuts: &[ManualCut],
    stroke_width: u32,
    connectivity: Connectivity,
) -> LabelGrid {
    let mut combined = boundary.clone();
    burn_cuts(&mut combined, cuts, stroke_width);

    let open = combined.mapv(|on_boundary| !on_boundary);
    let raw = connected_components(&mask_to_gray(&open), connectivity.into(), Luma([0u8]));

    // Canonical ids: first-seen order in a row-major scan.
    let (height, width) = combined.dim();
    let mut remap: HashMap<u32, RegionId> = HashMap::new();
    let mut grid = LabelGrid::zeros((height, width));
    for row in 0..height {
        for col in 0..width {
            let label = raw.get_pixel(col as u32, row as u32)[0];
            if label != 0 {
                let next = remap.len() as RegionId + 1;
                grid[[row, col]] = *remap.entry(label).or_insert(next);
            }
        }
    }

    log::debug!(
        "Labelled {} regions ({} manual cuts, stroke {}, {:?}-connected)",
        remap.len(),
        cuts.len(),
        stroke_width,
        connectivity
    );
    grid
}

/// Number of regions in a label grid.
pub fn region_count(grid: &LabelGrid) -> u32 {
    grid.iter().copied().max().unwrap_or(0)
}

/// Region id under source pixel `(x, y)`, or `None` for clicks outside the
/// grid or on boundary pixels.
pub fn region_at(grid: &LabelGrid, x: i64, y: i64) -> Option<RegionId> {
    let (height, width) = grid.dim();
    if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
        return None;
    }
    match grid[[y as usize, x as usize]] {
        0 => None,
        id => Some(id),
    }
}

/// Mask of all pixels whose region id is in `ids`.
pub fn union_mask(grid: &LabelGrid, ids: &BTreeSet<RegionId>) -> Mask {
    grid.mapv(|id| id != 0 && ids.contains(&id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_mask(height: usize, width: usize) -> BoundaryMask {
        BoundaryMask::from_elem((height, width), false)
    }

    #[test]
    fn test_cut_needs_two_points() {
        assert!(ManualCut::new(vec![]).is_none());
        assert!(ManualCut::new(vec![(3, 4)]).is_none());
        let cut = ManualCut::new(vec![(0, 0), (5, 5), (9, 2)]).unwrap();
        assert_eq!(cut.segments().count(), 2);
    }

    #[test]
    fn test_open_mask_is_one_region() {
        let grid = label_regions(&open_mask(8, 8), &[], 1, Connectivity::Four);
        assert!(grid.iter().all(|&id| id == 1));
        assert_eq!(region_count(&grid), 1);
    }

    #[test]
    fn test_vertical_cut_splits_region() {
        let cut = ManualCut::new(vec![(5, 0), (5, 9)]).unwrap();
        let grid = label_regions(&open_mask(10, 10), &[cut], 1, Connectivity::Four);

        assert_eq!(region_at(&grid, 5, 4), None);
        let left = region_at(&grid, 2, 4).unwrap();
        let right = region_at(&grid, 8, 4).unwrap();
        assert_ne!(left, right);
        assert_eq!((left, right), (1, 2));
    }

    #[test]
    fn test_diagonal_cut_leaks_under_eight_connectivity() {
        let cut = ManualCut::new(vec![(0, 0), (9, 9)]).unwrap();

        let four = label_regions(&open_mask(10, 10), &[cut.clone()], 1, Connectivity::Four);
        assert_eq!(region_count(&four), 2);

        let eight = label_regions(&open_mask(10, 10), &[cut.clone()], 1, Connectivity::Eight);
        assert_eq!(region_count(&eight), 1);

        let thick = label_regions(&open_mask(10, 10), &[cut], 2, Connectivity::Eight);
        assert_eq!(region_count(&thick), 2);
    }

    #[test]
    fn test_stroke_width_dilates_cut() {
        let cut = ManualCut::new(vec![(5, 0), (5, 9)]).unwrap();
        let mut mask = open_mask(10, 10);
        burn_cuts(&mut mask, &[cut], 3);
        for row in 0..10 {
            assert!(mask[[row, 4]] && mask[[row, 5]] && mask[[row, 6]]);
            assert!(!mask[[row, 3]] && !mask[[row, 7]]);
        }
    }

    #[test]
    fn test_cut_outside_grid_is_clipped() {
        let cut = ManualCut::new(vec![(-5, 2), (20, 2)]).unwrap();
        let mut mask = open_mask(5, 5);
        burn_cuts(&mut mask, &[cut], 1);
        assert!((0..5).all(|col| mask[[2, col]]));
    }

    #[test]
    fn test_labels_are_scan_ordered_and_deterministic() {
        let mut boundary = open_mask(6, 9);
        for row in 0..6 {
            boundary[[row, 3]] = true;
            boundary[[row, 6]] = true;
        }
        boundary[[3, 0]] = true;
        boundary[[3, 1]] = true;
        boundary[[3, 2]] = true;

        let a = label_regions(&boundary, &[], 1, Connectivity::Four);
        let b = label_regions(&boundary, &[], 1, Connectivity::Four);
        assert_eq!(a, b);

        assert_eq!(a[[0, 0]], 1);
        assert_eq!(a[[0, 4]], 2);
        assert_eq!(a[[0, 7]], 3);
        assert_eq!(a[[5, 0]], 4);
        assert_eq!(a[[0, 3]], 0);
    }

    #[test]
    fn test_region_at_rejects_outside_and_boundary() {
        let mut boundary = open_mask(4, 4);
        boundary[[1, 1]] = true;
        let grid = label_regions(&boundary, &[], 1, Connectivity::Four);
        assert_eq!(region_at(&grid, -1, 0), None);
        assert_eq!(region_at(&grid, 4, 0), None);
        assert_eq!(region_at(&grid, 0, 4), None);
        assert_eq!(region_at(&grid, 1, 1), None);
        assert_eq!(region_at(&grid, 0, 0), Some(1));
    }

    #[test]
    fn test_union_mask_selects_ids() {
        let cut = ManualCut::new(vec![(5, 0), (5, 9)]).unwrap();
        let grid = label_regions(&open_mask(10, 10), &[cut], 1, Connectivity::Four);
        let ids: BTreeSet<RegionId> = [2].into_iter().collect();
        let mask = union_mask(&grid, &ids);
        assert_eq!(mask.iter().filter(|&&v| v).count(), 40);
        assert!(mask[[0, 9]]);
        assert!(!mask[[0, 0]]);
    }
}
