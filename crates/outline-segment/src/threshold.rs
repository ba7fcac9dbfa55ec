//! Global and local intensity thresholding.

use outline_core::{BinaryMask, Deadline, Expired, GrayImageView};

pub fn histogram(gray: &GrayImageView<'_>) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for &v in gray.data {
        hist[v as usize] += 1;
    }
    hist
}

/// Otsu threshold: the `t` maximising `wB·wF·(meanB − meanF)²` where the
/// background class is `[0, t]`.
///
/// Degenerate histograms still produce a threshold: a single occupied bin
/// returns that intensity, two occupied bins return their midpoint, and an
/// empty histogram returns 127.
pub fn otsu_threshold(hist: &[u32; 256]) -> u8 {
    let occupied: Vec<usize> = (0..256).filter(|&i| hist[i] > 0).collect();
    match occupied.as_slice() {
        [] => return 127,
        [only] => return *only as u8,
        [lo, hi] => return ((lo + hi) / 2) as u8,
        _ => {}
    }

    let total: f64 = hist.iter().map(|&h| h as f64).sum();
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0.0;
    let mut w_b = 0.0;
    let mut best = (-1.0_f64, 127u8);

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        sum_b += t as f64 * h as f64;
        if w_b == 0.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0.0 {
            break;
        }
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;
        let between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if between > best.0 {
            best = (between, t as u8);
        }
    }
    best.1
}

/// Foreground where `intensity <= t`.
pub fn threshold_mask(
    gray: &GrayImageView<'_>,
    t: u8,
    deadline: &Deadline,
) -> Result<BinaryMask, Expired> {
    let mut mask = BinaryMask::new(gray.width, gray.height);
    for y in 0..gray.height {
        deadline.check()?;
        for x in 0..gray.width {
            if gray.get(x, y) <= t {
                mask.set(x, y, true);
            }
        }
    }
    Ok(mask)
}

/// Local mean thresholding: foreground where
/// `intensity < mean(block_size × block_size window) − c`.
///
/// The window is clipped at the image border. An even `block_size` is bumped
/// to the next odd value. Window sums come from a summed-area table so the
/// cost does not depend on the block size.
pub fn adaptive_mask(
    gray: &GrayImageView<'_>,
    block_size: usize,
    c: f64,
    deadline: &Deadline,
) -> Result<BinaryMask, Expired> {
    let block = (block_size.max(3)) | 1;
    let r = block / 2;
    let (w, h) = (gray.width, gray.height);
    let stride = w + 1;

    let mut integral = vec![0u64; stride * (h + 1)];
    for y in 0..h {
        deadline.check()?;
        let mut row = 0u64;
        for x in 0..w {
            row += gray.get(x, y) as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row;
        }
    }

    let mut mask = BinaryMask::new(w, h);
    for y in 0..h {
        deadline.check()?;
        let y0 = y.saturating_sub(r);
        let y1 = (y + r + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(r);
            let x1 = (x + r + 1).min(w);
            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let n = ((y1 - y0) * (x1 - x0)) as f64;
            let mean = sum as f64 / n;
            if (gray.get(x, y) as f64) < mean - c {
                mask.set(x, y, true);
            }
        }
    }
    Ok(mask)
}
