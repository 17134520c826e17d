//! In-memory representation of a COCO-style detection dataset.
//!
//! Boxes are held in pixel-space XYXY form regardless of the file format
//! they came from; COCO's `[x, y, w, h]` and YOLO's normalized
//! center/extent are converted at the edges.
//!
//! ```
//! use cocodet::ir::{Annotation, BBoxXYXY, Category, Dataset, Image, Pixel};
//!
//! let dataset = Dataset {
//!     images: vec![Image::new(1u64, "img1.png", 100, 200)],
//!     annotations: vec![Annotation::new(
//!         1u64,
//!         1u64,
//!         1u64,
//!         BBoxXYXY::<Pixel>::from_xywh(40.0, 60.0, 20.0, 80.0),
//!     )],
//!     categories: vec![Category::new(1u64, "object")],
//! };
//! assert_eq!(dataset.annotations[0].area, 1600.0);
//! ```

mod bbox;
mod ids;
pub mod io_coco_json;
mod model;
mod space;

pub use bbox::BBoxXYXY;
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{Annotation, Category, Dataset, Image};
pub use space::{Normalized, Pixel};
