use outline_core::{BinaryMask, Deadline, Expired, GrayImageView};

/// Sobel gradient magnitude, row-major, same size as the input.
///
/// Border pixels replicate their nearest interior neighbour.
pub fn sobel_magnitude(gray: &GrayImageView<'_>, deadline: &Deadline) -> Result<Vec<f32>, Expired> {
    let (w, h) = (gray.width, gray.height);
    let px = |x: i64, y: i64| -> f32 {
        let xc = x.clamp(0, w as i64 - 1) as usize;
        let yc = y.clamp(0, h as i64 - 1) as usize;
        gray.get(xc, yc) as f32
    };

    let mut mag = vec![0f32; w * h];
    for y in 0..h as i64 {
        deadline.check()?;
        for x in 0..w as i64 {
            let gx = (px(x + 1, y - 1) + 2.0 * px(x + 1, y) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2.0 * px(x - 1, y) + px(x - 1, y + 1));
            let gy = (px(x - 1, y + 1) + 2.0 * px(x, y + 1) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2.0 * px(x, y - 1) + px(x + 1, y - 1));
            mag[y as usize * w + x as usize] = (gx * gx + gy * gy).sqrt();
        }
    }
    Ok(mag)
}

/// Hysteresis edge mask.
///
/// Pixels with magnitude above `high` are strong edges. Pixels above `low`
/// are promoted when 8-connected to a strong or already promoted pixel;
/// promotion runs on a worklist until no more pixels change.
pub fn hysteresis_edges(
    gray: &GrayImageView<'_>,
    low: f32,
    high: f32,
    deadline: &Deadline,
) -> Result<BinaryMask, Expired> {
    let (w, h) = (gray.width, gray.height);
    let mag = sobel_magnitude(gray, deadline)?;
    let low = low.min(high);

    let mut mask = BinaryMask::new(w, h);
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if mag[y * w + x] > high {
                mask.set(x, y, true);
                stack.push((x, y));
            }
        }
    }

    let mut popped = 0usize;
    while let Some((x, y)) = stack.pop() {
        popped += 1;
        if popped % 4096 == 0 {
            deadline.check()?;
        }
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if !mask.get(nx, ny) && mag[ny * w + nx] > low {
                    mask.set(nx, ny, true);
                    stack.push((nx, ny));
                }
            }
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline_core::GrayImage;

    #[test]
    fn flat_image_has_no_gradient() {
        let img = GrayImage::from_fn(8, 8, |_, _| 90);
        let mag = sobel_magnitude(&img.view(), &Deadline::unbounded()).unwrap();
        assert!(mag.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn step_edge_is_detected_along_its_length() {
        let img = GrayImage::from_fn(20, 10, |x, _| if x < 10 { 20 } else { 220 });
        let mask = hysteresis_edges(&img.view(), 50.0, 300.0, &Deadline::unbounded()).unwrap();
        for y in 0..10 {
            assert!(mask.get(9, y) && mask.get(10, y), "row {y}");
        }
        assert!(!mask.get(2, 5));
        assert!(!mask.get(17, 5));
    }

    #[test]
    fn weak_edges_need_a_strong_neighbour() {
        // Strong step on the left, isolated weak step on the right.
        let img = GrayImage::from_fn(30, 6, |x, _| match x {
            0..=4 => 0,
            5..=19 => 200,
            _ => 230,
        });
        let mask = hysteresis_edges(&img.view(), 60.0, 400.0, &Deadline::unbounded()).unwrap();
        assert!(mask.get(4, 3));
        assert!(!mask.get(20, 3));
    }
}
