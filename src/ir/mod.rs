//! Typed representation of annotation data and its on-disk formats.
//!
//! Everything the converter and the validator work with lives here: newtype
//! identifiers, boxes tagged with their coordinate space, the records of one
//! annotation document, the dense [`CategoryMap`], and the COCO / YOLO
//! readers and writers.
//!
//! Records are permissive: a document with a negative box or a zero-width
//! image still parses, so validation can report the problem instead of the
//! parser panicking or silently dropping it.
//!
//! # Example
//!
//! ```
//! use trackprep::ir::{BBoxXYWH, CategoryMap, ImageRecord, Pixel};
//!
//! let image = ImageRecord::new(1u64, "fox/A.jpg", 100, 200);
//! let norm = image.normalize(&BBoxXYWH::<Pixel>::new(10.0, 20.0, 30.0, 40.0))?;
//! assert_eq!((norm.cx, norm.cy), (0.25, 0.2));
//!
//! let classes = CategoryMap::build([7u64, 3]).unwrap();
//! assert_eq!(classes.get(&7), Some(1));
//! # Ok::<(), trackprep::PrepError>(())
//! ```

mod bbox;
mod category_map;
mod ids;
pub mod io_coco_json;
pub mod io_yolo;
mod model;

pub use bbox::{BBoxCXCYWH, BBoxXYWH, Normalized, Pixel};
pub use category_map::{CategoryMap, EmptyCategorySet};
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{AnnotationDocument, AnnotationRecord, CategoryRecord, ImageRecord, NormalizedLabel};
