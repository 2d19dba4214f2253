//! SLIC superpixels and label-boundary detection.
//!
//! Clustering runs in CIELAB space with a spatial term weighted by the
//! compactness. Fragments left disconnected after clustering are merged into
//! a neighbouring superpixel so every output label is one connected area.

use std::collections::VecDeque;

use image::RgbImage;
use ndarray::Array2;

use crate::boundary::SuperpixelParams;
use crate::grid::{BoundaryMask, LabelGrid};

const ITERATIONS: usize = 10;

/// Pieces smaller than this fraction of the mean superpixel area are merged
/// into a neighbour.
const MIN_SIZE_FACTOR: f32 = 0.5;

/// D65 reference white.
const WHITE: [f32; 3] = [0.950_47, 1.0, 1.088_83];

#[derive(Debug, Clone, Copy)]
struct Center {
    lab: [f32; 3],
    x: f32,
    y: f32,
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = f32::from(channel) / 255.0;
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn lab_f(t: f32) -> f32 {
    if t > 0.008_856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn rgb_to_lab(rgb: [u8; 3]) -> [f32; 3] {
    let r = srgb_to_linear(rgb[0]);
    let g = srgb_to_linear(rgb[1]);
    let b = srgb_to_linear(rgb[2]);

    let x = (0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b) / WHITE[0];
    let y = (0.212_672_9 * r + 0.715_152_2 * g + 0.072_175 * b) / WHITE[1];
    let z = (0.019_333_9 * r + 0.119_192 * g + 0.950_304_1 * b) / WHITE[2];

    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Oversegment `image` into roughly `params.target_region_count` superpixels.
///
/// Labels are `1..=K` in row-major order of their first pixel. `K` follows
/// the target only approximately: connectivity enforcement can split a
/// cluster into several labels. Identical inputs give identical labels.
pub fn slic(image: &RgbImage, params: &SuperpixelParams) -> LabelGrid {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return LabelGrid::zeros((h, w));
    }

    let lab: Vec<[f32; 3]> = image.pixels().map(|p| rgb_to_lab(p.0)).collect();

    let target = params.target_region_count.max(1) as f32;
    let step = ((w * h) as f32 / target).sqrt().max(1.0);
    let nx = ((w as f32 / step).floor() as usize).max(1);
    let ny = ((h as f32 / step).floor() as usize).max(1);
    let spacing_x = w as f32 / nx as f32;
    let spacing_y = h as f32 / ny as f32;
    let spacing = spacing_x.max(spacing_y);

    let mut centers: Vec<Center> = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let x = (i as f32 + 0.5) * spacing_x;
            let y = (j as f32 + 0.5) * spacing_y;
            let px = (x as usize).min(w - 1);
            let py = (y as usize).min(h - 1);
            centers.push(Center {
                lab: lab[py * w + px],
                x,
                y,
            });
        }
    }

    let spatial_weight = (params.compactness / spacing).powi(2);
    let mut assignment = vec![usize::MAX; w * h];
    let mut distance = vec![f32::INFINITY; w * h];

    for _ in 0..ITERATIONS {
        distance.fill(f32::INFINITY);

        for (k, center) in centers.iter().enumerate() {
            let x0 = (center.x - spacing).floor().max(0.0) as usize;
            let y0 = (center.y - spacing).floor().max(0.0) as usize;
            let x1 = ((center.x + spacing).ceil() as usize).min(w - 1);
            let y1 = ((center.y + spacing).ceil() as usize).min(h - 1);

            for y in y0..=y1 {
                for x in x0..=x1 {
                    let idx = y * w + x;
                    let c = lab[idx];
                    let dl = c[0] - center.lab[0];
                    let da = c[1] - center.lab[1];
                    let db = c[2] - center.lab[2];
                    let dx = x as f32 - center.x;
                    let dy = y as f32 - center.y;
                    let d = dl * dl + da * da + db * db + spatial_weight * (dx * dx + dy * dy);
                    if d < distance[idx] {
                        distance[idx] = d;
                        assignment[idx] = k;
                    }
                }
            }
        }

        let mut sums = vec![[0.0f64; 6]; centers.len()];
        for (idx, &k) in assignment.iter().enumerate() {
            if k == usize::MAX {
                continue;
            }
            let c = lab[idx];
            let s = &mut sums[k];
            s[0] += f64::from(c[0]);
            s[1] += f64::from(c[1]);
            s[2] += f64::from(c[2]);
            s[3] += (idx % w) as f64;
            s[4] += (idx / w) as f64;
            s[5] += 1.0;
        }
        for (center, s) in centers.iter_mut().zip(&sums) {
            if s[5] > 0.0 {
                let n = s[5];
                center.lab = [(s[0] / n) as f32, (s[1] / n) as f32, (s[2] / n) as f32];
                center.x = (s[3] / n) as f32;
                center.y = (s[4] / n) as f32;
            }
        }
    }

    let raw = Array2::from_shape_fn((h, w), |(row, col)| assignment[row * w + col]);
    let mean_size = (w * h) as f32 / centers.len() as f32;
    let min_size = (mean_size * MIN_SIZE_FACTOR) as usize;
    let labels = enforce_connectivity(&raw, min_size);

    log::debug!(
        "SLIC: {}x{} image, target {} -> {} superpixels",
        w,
        h,
        params.target_region_count,
        labels.iter().copied().max().unwrap_or(0)
    );
    labels
}

/// Relabel 4-connected pieces of `raw`, folding pieces smaller than
/// `min_size` into the already-labelled neighbour above or to the left.
fn enforce_connectivity(raw: &Array2<usize>, min_size: usize) -> LabelGrid {
    let (h, w) = raw.dim();
    let mut labels = LabelGrid::zeros((h, w));
    let mut next_label = 1;
    let mut queue = VecDeque::new();
    let mut component = Vec::new();

    for row in 0..h {
        for col in 0..w {
            if labels[[row, col]] != 0 {
                continue;
            }

            let adjacent = if col > 0 {
                labels[[row, col - 1]]
            } else if row > 0 {
                labels[[row - 1, col]]
            } else {
                0
            };

            let source = raw[[row, col]];
            component.clear();
            queue.push_back((row, col));
            labels[[row, col]] = next_label;
            while let Some((r, c)) = queue.pop_front() {
                component.push((r, c));
                for (nr, nc) in neighbours4(r, c, h, w) {
                    if labels[[nr, nc]] == 0 && raw[[nr, nc]] == source {
                        labels[[nr, nc]] = next_label;
                        queue.push_back((nr, nc));
                    }
                }
            }

            if component.len() < min_size && adjacent != 0 {
                for &(r, c) in &component {
                    labels[[r, c]] = adjacent;
                }
            } else {
                next_label += 1;
            }
        }
    }
    labels
}

fn neighbours4(
    row: usize,
    col: usize,
    height: usize,
    width: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let up = (row > 0).then(|| (row - 1, col));
    let down = (row + 1 < height).then_some((row + 1, col));
    let left = (col > 0).then(|| (row, col - 1));
    let right = (col + 1 < width).then_some((row, col + 1));
    [up, down, left, right].into_iter().flatten()
}

/// Mark every pixel whose 4-neighbourhood contains a different label.
///
/// Both sides of a label change are marked, so neighbouring regions are
/// always separated by a closed band at least two pixels wide.
pub fn find_boundaries(labels: &LabelGrid) -> BoundaryMask {
    let (h, w) = labels.dim();
    Array2::from_shape_fn((h, w), |(row, col)| {
        let own = labels[[row, col]];
        neighbours4(row, col, h, w).any(|(r, c)| labels[[r, c]] != own)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_lab_of_white_and_black() {
        let white = rgb_to_lab([255, 255, 255]);
        assert!((white[0] - 100.0).abs() < 0.1);
        assert!(white[1].abs() < 0.1);
        assert!(white[2].abs() < 0.1);

        let black = rgb_to_lab([0, 0, 0]);
        assert!(black[0].abs() < 0.1);
    }

    #[test]
    fn test_uniform_image_gives_grid_of_superpixels() {
        let image = RgbImage::from_pixel(100, 100, Rgb([128, 128, 128]));
        let params = SuperpixelParams {
            target_region_count: 100,
            compactness: 10.0,
        };
        let labels = slic(&image, &params);
        let max = labels.iter().copied().max().unwrap();
        assert!(max >= 2);
        assert!(max <= 100);
        assert!(labels.iter().all(|l| (1..=max).contains(l)));
    }

    #[test]
    fn test_labels_follow_scan_order() {
        let image = RgbImage::from_pixel(60, 40, Rgb([90, 140, 30]));
        let params = SuperpixelParams {
            target_region_count: 24,
            compactness: 10.0,
        };
        let labels = slic(&image, &params);
        let mut seen = 0;
        for &l in labels.iter() {
            assert!(l <= seen + 1, "label {} appeared before {}", l, seen + 1);
            seen = seen.max(l);
        }
    }

    #[test]
    fn test_textured_image_has_no_tiny_superpixels() {
        let image = RgbImage::from_fn(100, 100, |x, y| {
            Rgb([
                ((x * 37 + y * 11) % 256) as u8,
                ((x * y) % 256) as u8,
                ((y * 53) % 256) as u8,
            ])
        });
        let params = SuperpixelParams {
            target_region_count: 500,
            compactness: 10.0,
        };
        let labels = slic(&image, &params);
        let max = labels.iter().copied().max().unwrap() as usize;
        let mut sizes = vec![0usize; max + 1];
        for &l in labels.iter() {
            sizes[l as usize] += 1;
        }
        // 500 target superpixels of 20 px; only the first label may be
        // smaller than half of that
        assert!(sizes[2..].iter().all(|&size| size >= 10));
    }

    #[test]
    fn test_slic_is_deterministic() {
        let image = RgbImage::from_fn(48, 32, |x, y| Rgb([(x * 5) as u8, (y * 7) as u8, 60]));
        let params = SuperpixelParams::default();
        assert_eq!(slic(&image, &params), slic(&image, &params));
    }

    #[test]
    fn test_color_split_is_respected() {
        let image = RgbImage::from_fn(40, 20, |x, _| {
            if x < 20 {
                Rgb([200, 30, 30])
            } else {
                Rgb([30, 30, 200])
            }
        });
        let params = SuperpixelParams {
            target_region_count: 2,
            compactness: 1.0,
        };
        let labels = slic(&image, &params);
        assert_ne!(labels[[10, 2]], labels[[10, 37]]);
    }

    #[test]
    fn test_find_boundaries_is_thick() {
        let mut labels = LabelGrid::from_elem((3, 6), 1);
        for row in 0..3 {
            for col in 3..6 {
                labels[[row, col]] = 2;
            }
        }
        let mask = find_boundaries(&labels);
        for row in 0..3 {
            assert!(!mask[[row, 1]]);
            assert!(mask[[row, 2]]);
            assert!(mask[[row, 3]]);
            assert!(!mask[[row, 4]]);
        }
    }

    #[test]
    fn test_small_fragment_is_merged() {
        let mut raw = Array2::from_elem((4, 4), 0usize);
        raw[[2, 2]] = 1;
        let labels = enforce_connectivity(&raw, 2);
        assert!(labels.iter().all(|&l| l == 1));
    }
}
