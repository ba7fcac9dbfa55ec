/// Fatal problems with the raster handed to the pipeline.
///
/// These are the only errors the detector propagates to its caller; every
/// other failure mode degrades to a fallback result.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid image dimensions (width={width}, height={height})")]
    ZeroDimensions { width: usize, height: usize },

    #[error("image dimensions overflow (width={width}, height={height}, channels={channels})")]
    DimensionOverflow {
        width: usize,
        height: usize,
        channels: usize,
    },

    #[error("invalid image buffer length (expected {expected} bytes, got {got})")]
    BufferLength { expected: usize, got: usize },
}

pub(crate) fn expected_len(
    width: usize,
    height: usize,
    channels: usize,
) -> Result<usize, InputError> {
    if width == 0 || height == 0 {
        return Err(InputError::ZeroDimensions { width, height });
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(InputError::DimensionOverflow {
            width,
            height,
            channels,
        })
}
