//! Square-window binary morphology.
//!
//! The `k × k` window is applied as two 1-D passes (rows, then columns);
//! for a square window this is exactly the 2-D operator. Even `k` is bumped
//! to `k + 1` so the window stays centred. `k <= 1` is the identity.
//!
//! [`erode`] treats pixels outside the mask as background. The erosion
//! inside [`close`] ignores them instead, otherwise foreground touching the
//! image border would be eaten and closing would stop being extensive.

use outline_core::BinaryMask;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Copy)]
enum Rule {
    Any,
    All,
    /// Every in-bounds pixel of the window.
    AllInBounds,
}

fn line_pass(src: &BinaryMask, radius: usize, horizontal: bool, rule: Rule) -> BinaryMask {
    let (w, h) = (src.width(), src.height());
    let (lines, len) = if horizontal { (h, w) } else { (w, h) };
    let full = 2 * radius + 1;
    let mut out = BinaryMask::new(w, h);
    let mut prefix = vec![0u32; len + 1];

    for line in 0..lines {
        let at = |i: usize| if horizontal { (i, line) } else { (line, i) };
        for i in 0..len {
            let (x, y) = at(i);
            prefix[i + 1] = prefix[i] + src.get(x, y) as u32;
        }
        for i in 0..len {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius + 1).min(len);
            let count = (prefix[hi] - prefix[lo]) as usize;
            // Out-of-bounds neighbours are background, so `All` needs a full window.
            let keep = match rule {
                Rule::Any => count > 0,
                Rule::All => count == full,
                Rule::AllInBounds => count == hi - lo,
            };
            if keep {
                let (x, y) = at(i);
                out.set(x, y, true);
            }
        }
    }
    out
}

fn apply(mask: &BinaryMask, k: usize, rule: Rule) -> BinaryMask {
    if k <= 1 {
        return mask.clone();
    }
    let radius = (k | 1) / 2;
    let rows = line_pass(mask, radius, true, rule);
    line_pass(&rows, radius, false, rule)
}

/// Foreground if any pixel of the `k × k` neighbourhood is foreground.
pub fn dilate(mask: &BinaryMask, k: usize) -> BinaryMask {
    apply(mask, k, Rule::Any)
}

/// Foreground only if every pixel of the `k × k` neighbourhood is
/// foreground; neighbours outside the mask count as background.
pub fn erode(mask: &BinaryMask, k: usize) -> BinaryMask {
    apply(mask, k, Rule::All)
}

/// `erode(dilate(mask))`: bridges gaps and fills pinholes. Foreground on
/// the image border is never eroded away.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask), fields(width = mask.width(), height = mask.height()))
)]
pub fn close(mask: &BinaryMask, k: usize) -> BinaryMask {
    apply(&dilate(mask, k), k, Rule::AllInBounds)
}

/// `dilate(erode(mask))`: removes specks thinner than the window.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask), fields(width = mask.width(), height = mask.height()))
)]
pub fn open(mask: &BinaryMask, k: usize) -> BinaryMask {
    dilate(&erode(mask, k), k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn naive(mask: &BinaryMask, k: usize, all: bool) -> BinaryMask {
        let r = ((k | 1) / 2) as i64;
        BinaryMask::from_fn(mask.width(), mask.height(), |x, y| {
            let mut any = false;
            let mut every = true;
            for dy in -r..=r {
                for dx in -r..=r {
                    let v = mask.get_signed(x as i64 + dx, y as i64 + dy);
                    any |= v;
                    every &= v;
                }
            }
            if all {
                every
            } else {
                any
            }
        })
    }

    fn mask_strategy() -> impl Strategy<Value = BinaryMask> {
        (1usize..14, 1usize..14).prop_flat_map(|(w, h)| {
            prop::collection::vec(any::<bool>(), w * h)
                .prop_map(move |data| BinaryMask::from_vec(w, h, data).unwrap())
        })
    }

    #[test]
    fn dilation_grows_a_single_pixel_into_a_square() {
        let mut m = BinaryMask::new(7, 7);
        m.set(3, 3, true);
        let d = dilate(&m, 3);
        assert_eq!(d.count(), 9);
        assert!(d.get(2, 2) && d.get(4, 4));
        assert!(!d.get(1, 3));
    }

    #[test]
    fn erosion_treats_border_as_background() {
        let full = BinaryMask::from_fn(5, 5, |_, _| true);
        let e = erode(&full, 3);
        assert_eq!(e.count(), 9);
        assert!(!e.get(0, 2));
        assert!(e.get(1, 1));
    }

    #[test]
    fn closing_fills_a_pinhole_and_opening_drops_a_speck() {
        let mut blob = BinaryMask::from_fn(9, 9, |x, y| (2..7).contains(&x) && (2..7).contains(&y));
        blob.set(4, 4, false);
        assert!(close(&blob, 3).get(4, 4));

        let mut specks = BinaryMask::new(9, 9);
        specks.set(1, 1, true);
        assert!(open(&specks, 3).is_empty());
    }

    #[test]
    fn closing_keeps_foreground_on_the_border() {
        let full = BinaryMask::from_fn(6, 6, |_, _| true);
        assert_eq!(close(&full, 5), full);
    }

    #[test]
    fn small_kernels_are_identity() {
        let mut m = BinaryMask::new(4, 4);
        m.set(0, 3, true);
        assert_eq!(dilate(&m, 1), m);
        assert_eq!(erode(&m, 0), m);
    }

    proptest! {
        #[test]
        fn separable_passes_match_naive_window(mask in mask_strategy(), k in 0usize..6) {
            if k > 1 {
                prop_assert_eq!(dilate(&mask, k), naive(&mask, k, false));
                prop_assert_eq!(erode(&mask, k), naive(&mask, k, true));
            }
        }

        #[test]
        fn closing_is_extensive(mask in mask_strategy(), k in 0usize..6) {
            prop_assert!(mask.is_subset_of(&close(&mask, k)));
        }

        #[test]
        fn opening_is_anti_extensive(mask in mask_strategy(), k in 0usize..6) {
            prop_assert!(open(&mask, k).is_subset_of(&mask));
        }
    }
}
