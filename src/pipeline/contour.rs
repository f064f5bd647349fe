//! External contour detection on a binary mask.
//!
//! Only outermost components are reported: a component sitting inside a
//! hole of another component (text inside a bordered table cell, a dot
//! inside a ring) is ignored, the way an external-only contour retrieval
//! ignores child contours.
//!
//! Foreground pixels connect through all 8 neighbours and background pixels
//! through the 4 edge neighbours, so a diagonal gap in a ring does not let
//! the outside leak in. The image is treated as surrounded by background.
//!
//! Downstream only needs the bounding box of each outer boundary, and a
//! simplified boundary has the same extremes as the component it traces, so
//! the box is accumulated directly while labelling the component.

use super::regions::Region;

/// Find the bounding boxes of all external foreground components.
///
/// `mask` holds one byte per pixel in row-major order; any non-zero value is
/// foreground. Results come back in reverse discovery order: the component
/// whose first (top-most, then left-most) pixel comes last in raster-scan
/// order is listed first. Boundary followers that prepend each new outer
/// contour to their list produce the same order, and callers that stable-sort
/// by top edge rely on it for ties.
pub fn external_regions(mask: &[u8], width: u32, height: u32) -> Vec<Region> {
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return Vec::new();
    }
    debug_assert_eq!(mask.len(), w * h);

    let outside = outside_background(mask, w, h);
    let mut visited = vec![false; w * h];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for start in 0..w * h {
        if mask[start] == 0 || visited[start] {
            continue;
        }

        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        let mut external = false;

        visited[start] = true;
        stack.push(start);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            if !external {
                external = touches_outside(&outside, x, y, w, h);
            }

            for (nx, ny) in neighbours8(x, y, w, h) {
                let n = ny * w + nx;
                if mask[n] != 0 && !visited[n] {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }

        if external {
            regions.push(Region {
                x: min_x as u32,
                y: min_y as u32,
                width: (max_x - min_x + 1) as u32,
                height: (max_y - min_y + 1) as u32,
            });
        }
    }

    regions.reverse();
    regions
}

/// Mark every background pixel 4-connected to the image border.
fn outside_background(mask: &[u8], w: usize, h: usize) -> Vec<bool> {
    let mut outside = vec![false; w * h];
    let mut stack = Vec::new();

    let seed = |idx: usize, outside: &mut Vec<bool>, stack: &mut Vec<usize>| {
        if mask[idx] == 0 && !outside[idx] {
            outside[idx] = true;
            stack.push(idx);
        }
    };
    for x in 0..w {
        seed(x, &mut outside, &mut stack);
        seed((h - 1) * w + x, &mut outside, &mut stack);
    }
    for y in 0..h {
        seed(y * w, &mut outside, &mut stack);
        seed(y * w + w - 1, &mut outside, &mut stack);
    }

    while let Some(idx) = stack.pop() {
        let (x, y) = (idx % w, idx / w);
        for (nx, ny) in neighbours4(x, y, w, h) {
            let n = ny * w + nx;
            if mask[n] == 0 && !outside[n] {
                outside[n] = true;
                stack.push(n);
            }
        }
    }

    outside
}

/// A foreground pixel is on an outer boundary if it sits on the image edge
/// or shares an edge with outside background.
fn touches_outside(outside: &[bool], x: usize, y: usize, w: usize, h: usize) -> bool {
    if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
        return true;
    }
    neighbours4(x, y, w, h).any(|(nx, ny)| outside[ny * w + nx])
}

fn neighbours4(x: usize, y: usize, w: usize, h: usize) -> impl Iterator<Item = (usize, usize)> {
    const OFFSETS: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
    offset_neighbours(x, y, w, h, &OFFSETS)
}

fn neighbours8(x: usize, y: usize, w: usize, h: usize) -> impl Iterator<Item = (usize, usize)> {
    const OFFSETS: [(isize, isize); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];
    offset_neighbours(x, y, w, h, &OFFSETS)
}

fn offset_neighbours(
    x: usize,
    y: usize,
    w: usize,
    h: usize,
    offsets: &'static [(isize, isize)],
) -> impl Iterator<Item = (usize, usize)> {
    offsets.iter().filter_map(move |&(dx, dy)| {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < w && ny < h).then_some((nx, ny))
    })
}
