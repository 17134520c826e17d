//! Image decoding into channel-first float tensors.

use std::path::Path;

use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageError, ImageReader};
use ndarray::Array3;

use super::target::ImageTensor;
use crate::error::CocodetError;

/// Decodes the image at `path` into a `(3, height, width)` RGB tensor in `[0, 1]`.
///
/// The format is guessed from the file content. Grayscale, alpha and 16-bit
/// inputs are converted to 8-bit-equivalent RGB floats.
pub fn load_image_tensor(path: &Path) -> Result<ImageTensor, CocodetError> {
    let read_error = |source: ImageError| CocodetError::ImageRead {
        path: path.to_path_buf(),
        source,
    };

    let decoded = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| read_error(ImageError::IoError(e)))?
        .decode()
        .map_err(read_error)?;

    let rgb = decoded.into_rgb32f();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);

    let hwc = Array3::from_shape_vec((height, width, 3), rgb.into_raw()).map_err(|_| {
        read_error(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        )))
    })?;

    Ok(hwc.permuted_axes([2, 0, 1]).as_standard_layout().into_owned())
}
