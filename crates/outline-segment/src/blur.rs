use outline_core::{Deadline, Expired, GrayImage, GrayImageView};

fn gaussian_kernel(radius: usize) -> Vec<f32> {
    let sigma = (radius as f32 / 2.0).max(0.5);
    let mut k: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let d = i as f32 - radius as f32;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = k.iter().sum();
    k.iter_mut().for_each(|v| *v /= sum);
    k
}

/// Separable Gaussian blur with `sigma = radius / 2`, clamp-to-edge.
///
/// `radius == 0` returns an unmodified copy.
pub fn gaussian_blur(
    gray: &GrayImageView<'_>,
    radius: usize,
    deadline: &Deadline,
) -> Result<GrayImage, Expired> {
    let (w, h) = (gray.width, gray.height);
    if radius == 0 {
        return Ok(GrayImage {
            width: w,
            height: h,
            data: gray.data.to_vec(),
        });
    }
    let kernel = gaussian_kernel(radius);
    let r = radius as i64;

    let mut tmp = vec![0f32; w * h];
    for y in 0..h {
        deadline.check()?;
        for x in 0..w {
            let mut acc = 0.0;
            for (i, kv) in kernel.iter().enumerate() {
                let sx = (x as i64 + i as i64 - r).clamp(0, w as i64 - 1) as usize;
                acc += kv * gray.get(sx, y) as f32;
            }
            tmp[y * w + x] = acc;
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        deadline.check()?;
        for x in 0..w {
            let mut acc = 0.0;
            for (i, kv) in kernel.iter().enumerate() {
                let sy = (y as i64 + i as i64 - r).clamp(0, h as i64 - 1) as usize;
                acc += kv * tmp[sy * w + x];
            }
            out.data[y * w + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(out)
}
