use crate::{sample_bilinear_rgb, Deadline, Expired, RgbImage, RgbImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

/// Pivots smaller than this (in Hartley-normalised coordinates) are treated
/// as singular.
const PIVOT_EPS: f64 = 1e-10;

/// Margin, in source pixels, tolerated outside the image when resampling.
const WARP_EDGE_EPS: f64 = 0.5;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum HomographyError {
    #[error("near-singular pivot {pivot:e} in column {column}")]
    SingularPivot { column: usize, pivot: f64 },
    #[error("homography scale h33 vanished")]
    DegenerateScale,
}

/// Planar projective transform `p' ~ H p`, stored with `h33 = 1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Build from the 9 row-major coefficients.
    pub fn from_coefficients(c: [f64; 9]) -> Self {
        Self::new(Matrix3::from_row_slice(&c))
    }

    /// The 9 row-major coefficients; the last one is 1 for normalised
    /// homographies.
    pub fn coefficients(&self) -> [f64; 9] {
        [
            self.h[(0, 0)],
            self.h[(0, 1)],
            self.h[(0, 2)],
            self.h[(1, 0)],
            self.h[(1, 1)],
            self.h[(1, 2)],
            self.h[(2, 0)],
            self.h[(2, 1)],
            self.h[(2, 2)],
        ]
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0] / v[2], v[1] / v[2])
    }

    pub fn inverse(&self) -> Option<Self> {
        let inv = self.h.try_inverse()?;
        normalize_homography(inv).map(Self::new)
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

/// Translate to the centroid and scale so the mean distance is sqrt(2).
fn normalize_quad(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / 4.0;

    let t = hartley_normalization(cx, cy, mean_dist);
    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0], v[1])
    });
    (out, t)
}

fn normalize_homography(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
///
/// Fails with [`HomographyError::SingularPivot`] as soon as the largest
/// available pivot in a column is below `PIVOT_EPS`.
pub fn solve_gaussian<const N: usize>(
    mut a: SMatrix<f64, N, N>,
    mut b: SVector<f64, N>,
) -> Result<SVector<f64, N>, HomographyError> {
    for col in 0..N {
        let (pivot_row, pivot) = (col..N)
            .map(|r| (r, a[(r, col)]))
            .fold((col, 0.0_f64), |best, (r, v)| {
                if v.abs() > best.1.abs() {
                    (r, v)
                } else {
                    best
                }
            });
        if pivot.abs() < PIVOT_EPS {
            return Err(HomographyError::SingularPivot { column: col, pivot });
        }
        if pivot_row != col {
            a.swap_rows(pivot_row, col);
            b.swap_rows(pivot_row, col);
        }
        for r in col + 1..N {
            let f = a[(r, col)] / a[(col, col)];
            if f == 0.0 {
                continue;
            }
            for c in col..N {
                a[(r, c)] -= f * a[(col, c)];
            }
            b[r] -= f * b[col];
        }
    }

    let mut x = SVector::<f64, N>::zeros();
    for r in (0..N).rev() {
        let mut acc = b[r];
        for c in r + 1..N {
            acc -= a[(r, c)] * x[c];
        }
        x[r] = acc / a[(r, r)];
    }
    Ok(x)
}

/// Compute H such that `dst ~ H * src` from 4 point correspondences.
///
/// Unknowns are `h11..h32` with `h33 = 1`; each correspondence
/// `(x,y) -> (u,v)` contributes two rows:
///
/// ```text
/// h11 x + h12 y + h13 - u h31 x - u h32 y = u
/// h21 x + h22 y + h23 - v h31 x - v h32 y = v
/// ```
///
/// Corner order must be consistent between `src` and `dst`.
pub fn homography_from_4pt(
    src: &[Point2<f64>; 4],
    dst: &[Point2<f64>; 4],
) -> Result<Homography, HomographyError> {
    let (src_n, t_src) = normalize_quad(src);
    let (dst_n, t_dst) = normalize_quad(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = solve_gaussian(a, b)?;

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    // H = T_dst^-1 * Hn * T_src
    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or(HomographyError::DegenerateScale)?;
    let h = normalize_homography(t_dst_inv * hn * t_src).ok_or(HomographyError::DegenerateScale)?;
    Ok(Homography::new(h))
}

/// Resample `src` into an `out_w × out_h` image.
///
/// `dst_to_src` maps destination pixel coordinates to source pixel
/// coordinates (the inverse of the rectifying transform). Destination pixels
/// whose source falls outside the image stay black.
pub fn warp_perspective_rgb(
    src: &RgbImageView<'_>,
    dst_to_src: &Homography,
    out_w: usize,
    out_h: usize,
    deadline: &Deadline,
) -> Result<RgbImage, Expired> {
    let mut out = RgbImage::new(out_w, out_h);
    let max_x = (src.width - 1) as f64 + WARP_EDGE_EPS;
    let max_y = (src.height - 1) as f64 + WARP_EDGE_EPS;

    for y in 0..out_h {
        deadline.check()?;
        for x in 0..out_w {
            let ps = dst_to_src.apply(Point2::new(x as f64, y as f64));
            if !ps.x.is_finite()
                || !ps.y.is_finite()
                || ps.x < -WARP_EDGE_EPS
                || ps.y < -WARP_EDGE_EPS
                || ps.x > max_x
                || ps.y > max_y
            {
                continue;
            }
            out.put_pixel(x, y, sample_bilinear_rgb(src, ps.x, ps.y));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f64>, b: Point2<f64>, tol: f64) {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        assert!(
            dx < tol && dy < tol,
            "expected ({:.6},{:.6}) ~ ({:.6},{:.6}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    #[test]
    fn inverse_round_trips_points() {
        let h = Homography::new(Matrix3::new(
            1.2, 0.1, 5.0, //
            -0.05, 0.9, 3.0, //
            0.001, 0.0005, 1.0,
        ));
        let inv = h.inverse().expect("invertible");

        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(50.0, -20.0),
            Point2::new(320.0, 200.0),
        ] {
            assert_close(inv.apply(h.apply(p)), p, 1e-9);
        }
    }

    #[test]
    fn four_point_solve_recovers_ground_truth() {
        let ground_truth = Homography::new(Matrix3::new(
            0.8, 0.05, 120.0, //
            -0.02, 1.1, 80.0, //
            0.0009, -0.0004, 1.0,
        ));

        let rect = [
            Point2::new(0.0, 0.0),
            Point2::new(180.0, 0.0),
            Point2::new(180.0, 130.0),
            Point2::new(0.0, 130.0),
        ];
        let dst = rect.map(|p| ground_truth.apply(p));

        let recovered = homography_from_4pt(&rect, &dst).expect("recoverable");
        assert!((recovered.coefficients()[8] - 1.0).abs() < 1e-12);

        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(60.0, 40.0),
            Point2::new(150.0, 120.0),
        ] {
            assert_close(recovered.apply(p), ground_truth.apply(p), 1e-6);
        }
    }

    #[test]
    fn collinear_quad_hits_singular_pivot() {
        let src = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 0.0),
        ];
        let dst = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(matches!(
            homography_from_4pt(&src, &dst),
            Err(HomographyError::SingularPivot { .. })
        ));
    }

    #[test]
    fn gaussian_elimination_needs_pivoting() {
        // a[0][0] = 0 forces a row swap.
        let a = SMatrix::<f64, 2, 2>::new(0.0, 1.0, 1.0, 1.0);
        let b = SVector::<f64, 2>::new(2.0, 3.0);
        let x = solve_gaussian(a, b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn warp_with_identity_copies_and_blanks_outside() {
        let mut src = RgbImage::filled(4, 3, [10, 20, 30]);
        src.put_pixel(2, 1, [200, 100, 0]);
        let out = warp_perspective_rgb(
            &src.view(),
            &Homography::identity(),
            6,
            3,
            &Deadline::unbounded(),
        )
        .unwrap();
        assert_eq!(out.get_pixel(2, 1), [200, 100, 0]);
        assert_eq!(out.get_pixel(0, 0), [10, 20, 30]);
        assert_eq!(out.get_pixel(5, 0), [0, 0, 0]);
    }
}
