use crate::GrayImage;

/// Boolean foreground/background grid, row-major.
///
/// A mask always has the dimensions of the image it was computed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl BinaryMask {
    /// All-background mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap an existing row-major buffer. Returns `None` on length mismatch.
    pub fn from_vec(width: usize, height: usize, data: Vec<bool>) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    /// Signed lookup; everything outside the grid is background.
    #[inline]
    pub fn get_signed(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.get(x as usize, y as usize)
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        self.data[y * self.width + x] = value;
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Every foreground pixel of `self` is also foreground in `other`.
    pub fn is_subset_of(&self, other: &BinaryMask) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.data.iter().zip(&other.data).all(|(&a, &b)| !a || b)
    }

    /// Foreground pixel with at least one 4-neighbour in the background.
    pub fn is_boundary(&self, x: usize, y: usize) -> bool {
        if !self.get(x, y) {
            return false;
        }
        let (x, y) = (x as i64, y as i64);
        !(self.get_signed(x + 1, y)
            && self.get_signed(x - 1, y)
            && self.get_signed(x, y + 1)
            && self.get_signed(x, y - 1))
    }

    /// 255 for foreground, 0 for background.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| if v { 255 } else { 0 }).collect(),
        }
    }
}
