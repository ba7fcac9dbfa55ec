//! 4-connected component labelling.

use outline_core::{BinaryMask, Deadline, Expired};
use serde::{Deserialize, Serialize};

/// Inclusive pixel bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl PixelBox {
    fn at(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) as f64 / 2.0,
            (self.min_y + self.max_y) as f64 / 2.0,
        )
    }
}

/// One 4-connected foreground region.
#[derive(Clone, Debug)]
pub struct Component {
    pub pixels: Vec<(usize, usize)>,
    pub bbox: PixelBox,
    /// First pixel in raster order (topmost, then leftmost). Always on the
    /// region boundary, which makes it a valid Moore-trace start.
    pub start: (usize, usize),
}

impl Component {
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Mask holding only this component.
    pub fn to_mask(&self, width: usize, height: usize) -> BinaryMask {
        let mut mask = BinaryMask::new(width, height);
        for &(x, y) in &self.pixels {
            mask.set(x, y, true);
        }
        mask
    }

    pub fn centroid(&self) -> (f64, f64) {
        let n = self.pixels.len().max(1) as f64;
        let (sx, sy) = self
            .pixels
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x as f64, sy + y as f64));
        (sx / n, sy / n)
    }
}

/// Label 4-connected foreground regions and keep those with
/// `min_size <= len <= max_size`.
///
/// Flooding uses an explicit stack, so the depth of the region never touches
/// the call stack. Components come back in raster order of their start pixel.
pub fn connected_components(
    mask: &BinaryMask,
    min_size: usize,
    max_size: usize,
    deadline: &Deadline,
) -> Result<Vec<Component>, Expired> {
    let (w, h) = (mask.width(), mask.height());
    let mut visited = vec![false; w * h];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut out = Vec::new();

    for y in 0..h {
        deadline.check()?;
        for x in 0..w {
            if visited[y * w + x] || !mask.get(x, y) {
                continue;
            }
            visited[y * w + x] = true;
            stack.push((x, y));
            let mut pixels = Vec::new();
            let mut bbox = PixelBox::at(x, y);

            while let Some((cx, cy)) = stack.pop() {
                pixels.push((cx, cy));
                bbox.include(cx, cy);
                let neighbours = [
                    (cx.wrapping_sub(1), cy),
                    (cx + 1, cy),
                    (cx, cy.wrapping_sub(1)),
                    (cx, cy + 1),
                ];
                for (nx, ny) in neighbours {
                    // wrapping_sub turns -1 into usize::MAX, rejected here
                    if nx >= w || ny >= h {
                        continue;
                    }
                    let idx = ny * w + nx;
                    if !visited[idx] && mask.get(nx, ny) {
                        visited[idx] = true;
                        stack.push((nx, ny));
                    }
                }
            }

            if (min_size..=max_size).contains(&pixels.len()) {
                out.push(Component {
                    pixels,
                    bbox,
                    start: (x, y),
                });
            } else {
                log::trace!(
                    "dropping component at ({x}, {y}) with {} px outside [{min_size}, {max_size}]",
                    pixels.len()
                );
            }
        }
    }
    Ok(out)
}

/// Largest component by pixel count.
pub fn largest_component(components: Vec<Component>) -> Option<Component> {
    components.into_iter().max_by_key(Component::len)
}

/// Component containing `seed`, or else the one whose centroid is nearest
/// to it.
pub fn component_near(components: Vec<Component>, seed: (f64, f64)) -> Option<Component> {
    let (sx, sy) = (seed.0.round() as i64, seed.1.round() as i64);
    let hit = components.iter().position(|c| {
        c.bbox.min_x as i64 <= sx
            && sx <= c.bbox.max_x as i64
            && c.bbox.min_y as i64 <= sy
            && sy <= c.bbox.max_y as i64
            && c.pixels.iter().any(|&(x, y)| x as i64 == sx && y as i64 == sy)
    });
    if let Some(i) = hit {
        return components.into_iter().nth(i);
    }
    components.into_iter().min_by(|a, b| {
        let da = dist2(a.centroid(), seed);
        let db = dist2(b.centroid(), seed);
        da.total_cmp(&db)
    })
}

fn dist2(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> BinaryMask {
        let h = rows.len();
        let w = rows[0].len();
        BinaryMask::from_fn(w, h, |x, y| rows[y].as_bytes()[x] == b'#')
    }

    #[test]
    fn diagonal_pixels_are_separate_components() {
        let mask = mask_from(&["#..", ".#.", "..#"]);
        let comps = connected_components(&mask, 1, usize::MAX, &Deadline::unbounded()).unwrap();
        assert_eq!(comps.len(), 3);
        assert!(comps.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn size_filter_and_bbox() {
        let mask = mask_from(&[
            "##....", //
            "##..#.", //
            "......", //
            ".####.", //
        ]);
        let comps = connected_components(&mask, 2, 4, &Deadline::unbounded()).unwrap();
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].start, (0, 0));
        assert_eq!(comps[0].bbox.area(), 4);
        assert_eq!(comps[1].bbox, PixelBox { min_x: 1, min_y: 3, max_x: 4, max_y: 3 });
    }

    #[test]
    fn large_region_does_not_recurse() {
        let mask = BinaryMask::from_fn(600, 600, |_, _| true);
        let comps = connected_components(&mask, 1, usize::MAX, &Deadline::unbounded()).unwrap();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].len(), 360_000);
    }

    #[test]
    fn picks_component_under_seed_or_nearest() {
        let mask = mask_from(&[
            "##......", //
            "##....##", //
            "......##", //
        ]);
        let comps = connected_components(&mask, 1, usize::MAX, &Deadline::unbounded()).unwrap();
        let hit = component_near(comps.clone(), (6.0, 2.0)).unwrap();
        assert_eq!(hit.start, (6, 1));
        let near = component_near(comps.clone(), (2.0, 0.0)).unwrap();
        assert_eq!(near.start, (0, 0));
        assert_eq!(largest_component(comps).unwrap().len(), 4);
    }
}
