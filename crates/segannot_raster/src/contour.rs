//! Iso-contour extraction from binary masks (marching squares).
//!
//! Contours are traced at the 0.5 level between foreground and background,
//! so every vertex sits on the midpoint between two pixel centres. The mask
//! is treated as if surrounded by a one-pixel background frame, which makes
//! every ring closed, including rings of regions touching the image border.
//!
//! In saddle cells (two diagonal foreground pixels) the two foreground
//! pixels are kept apart, matching 4-connected region growing.

use std::collections::{HashMap, HashSet};

use crate::grid::Mask;

/// A closed ring of `(x, y)` vertices in source pixel coordinates.
///
/// The ring is open in storage: the first vertex is not repeated at the end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub vertices: Vec<(f32, f32)>,
}

impl Polygon {
    /// Minimum number of vertices for a non-degenerate ring.
    pub const MIN_VERTICES: usize = 3;

    pub fn new(vertices: Vec<(f32, f32)>) -> Self {
        Self { vertices }
    }

    /// Build a polygon from a flattened `[x0, y0, x1, y1, ...]` list.
    ///
    /// Returns `None` for odd-length lists or fewer than three vertices.
    pub fn from_flat(coords: &[f32]) -> Option<Self> {
        if coords.len() % 2 != 0 || coords.len() < Self::MIN_VERTICES * 2 {
            return None;
        }
        Some(Self {
            vertices: coords.chunks_exact(2).map(|c| (c[0], c[1])).collect(),
        })
    }

    /// Flatten to `[x0, y0, x1, y1, ...]`.
    pub fn to_flat(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|&(x, y)| [x, y]).collect()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Signed-free area by the shoelace formula.
    ///
    /// This differs from the pixel count of the mask the ring was traced
    /// from: the ring passes through pixel-edge midpoints and cuts corners.
    pub fn area(&self) -> f32 {
        let n = self.vertices.len();
        if n < Self::MIN_VERTICES {
            return 0.0;
        }
        let mut twice = 0.0;
        for i in 0..n {
            let (x0, y0) = self.vertices[i];
            let (x1, y1) = self.vertices[(i + 1) % n];
            twice += x0 * y1 - x1 * y0;
        }
        (twice / 2.0).abs()
    }
}

/// Vertex key in doubled, frame-padded coordinates: `(2 * row, 2 * col)`
/// shifted by the padding. Keeps midpoints exact for hashing.
type Key = (i64, i64);

#[derive(Clone, Copy)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Segment table indexed by `tl | tr << 1 | br << 2 | bl << 3`.
const SEGMENTS: [&[(Side, Side)]; 16] = [
    &[],
    &[(Side::Left, Side::Top)],
    &[(Side::Top, Side::Right)],
    &[(Side::Left, Side::Right)],
    &[(Side::Right, Side::Bottom)],
    &[(Side::Left, Side::Top), (Side::Right, Side::Bottom)],
    &[(Side::Top, Side::Bottom)],
    &[(Side::Left, Side::Bottom)],
    &[(Side::Bottom, Side::Left)],
    &[(Side::Top, Side::Bottom)],
    &[(Side::Top, Side::Right), (Side::Bottom, Side::Left)],
    &[(Side::Right, Side::Bottom)],
    &[(Side::Left, Side::Right)],
    &[(Side::Top, Side::Right)],
    &[(Side::Left, Side::Top)],
    &[],
];

fn side_key(row: i64, col: i64, side: Side) -> Key {
    match side {
        Side::Top => (2 * row, 2 * col + 1),
        Side::Right => (2 * row + 1, 2 * col + 2),
        Side::Bottom => (2 * row + 2, 2 * col + 1),
        Side::Left => (2 * row + 1, 2 * col),
    }
}

/// Extract the closed boundary rings of the foreground of `mask`.
///
/// Disjoint components and holes each give their own ring. Rings are
/// returned in the row-major order of their first cell. A mask without
/// foreground yields an empty list.
pub fn extract_polygons(mask: &Mask) -> Vec<Polygon> {
    let (height, width) = mask.dim();
    if height == 0 || width == 0 || !mask.iter().any(|&v| v) {
        return Vec::new();
    }

    // Padded lookup: rows/cols -1 and H/W are background.
    let at = |row: i64, col: i64| -> bool {
        row >= 0
            && col >= 0
            && (row as usize) < height
            && (col as usize) < width
            && mask[[row as usize, col as usize]]
    };

    let mut adjacency: HashMap<Key, Vec<Key>> = HashMap::new();
    let mut order: Vec<Key> = Vec::new();

    // Cell (row, col) spans pixel centres (row..=row+1, col..=col+1) in
    // padded space, i.e. mask rows row-1..=row.
    for row in 0..=height as i64 {
        for col in 0..=width as i64 {
            let tl = at(row - 1, col - 1) as usize;
            let tr = at(row - 1, col) as usize;
            let br = at(row, col) as usize;
            let bl = at(row, col - 1) as usize;
            let case = tl | (tr << 1) | (br << 2) | (bl << 3);

            for &(a, b) in SEGMENTS[case] {
                let ka = side_key(row, col, a);
                let kb = side_key(row, col, b);
                for (from, to) in [(ka, kb), (kb, ka)] {
                    let links = adjacency.entry(from).or_default();
                    if links.is_empty() {
                        order.push(from);
                    }
                    links.push(to);
                }
            }
        }
    }

    let mut visited: HashSet<Key> = HashSet::with_capacity(adjacency.len());
    let mut polygons = Vec::new();

    for &start in &order {
        if visited.contains(&start) {
            continue;
        }
        if let Some(ring) = trace_ring(start, &adjacency, &mut visited) {
            if ring.len() >= Polygon::MIN_VERTICES {
                polygons.push(Polygon::new(
                    ring.into_iter().map(key_to_point).collect(),
                ));
            }
        }
    }

    log::trace!(
        "Extracted {} contour rings from {}x{} mask",
        polygons.len(),
        width,
        height
    );
    polygons
}

/// Walk the ring through `start`. Returns `None` if the walk hits a vertex
/// that does not have exactly two links, which the segment table never
/// produces for a closed frame.
fn trace_ring(
    start: Key,
    adjacency: &HashMap<Key, Vec<Key>>,
    visited: &mut HashSet<Key>,
) -> Option<Vec<Key>> {
    let mut ring = vec![start];
    visited.insert(start);

    let first = adjacency.get(&start)?;
    if first.len() != 2 {
        return None;
    }
    let mut prev = start;
    let mut current = first[0];

    while current != start {
        if !visited.insert(current) {
            return None;
        }
        ring.push(current);

        let links = adjacency.get(&current)?;
        if links.len() != 2 {
            return None;
        }
        let next = if links[0] != prev { links[0] } else { links[1] };
        prev = current;
        current = next;
    }
    Some(ring)
}

/// Doubled padded `(row, col)` key -> `(x, y)` in source pixels.
fn key_to_point((row2, col2): Key) -> (f32, f32) {
    let y = row2 as f32 / 2.0 - 1.0;
    let x = col2 as f32 / 2.0 - 1.0;
    (x, y)
}
