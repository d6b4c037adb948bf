//! Bounding boxes in the two encodings the pipeline moves between.
//!
//! COCO stores a box as its top-left corner plus size in pixels
//! ([`BBoxXYWH<Pixel>`]); YOLO stores the box centre plus size as fractions of
//! the image size ([`BBoxCXCYWH<Normalized>`]). Both types carry a zero-sized
//! coordinate-space marker so the two cannot be mixed up at compile time.
//!
//! Neither type validates its contents. A box that pokes outside the image
//! stays out of bounds after conversion; validation reports it instead.

use std::fmt;
use std::marker::PhantomData;

/// Marker for absolute pixel coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker for coordinates expressed as fractions of the image size.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

/// A box stored as top-left corner plus width and height.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYWH<TSpace> {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    _space: PhantomData<TSpace>,
}

/// A box stored as centre point plus width and height.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxCXCYWH<TSpace> {
    pub cx: f64,
    pub cy: f64,
    pub width: f64,
    pub height: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> BBoxXYWH<TSpace> {
    /// Creates a box from its top-left corner and size.
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            _space: PhantomData,
        }
    }

    /// Builds a box from a COCO `[x, y, w, h]` array.
    #[inline]
    pub fn from_array([x, y, width, height]: [f64; 4]) -> Self {
        Self::new(x, y, width, height)
    }

    /// The box as a COCO `[x, y, w, h]` array.
    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Right edge.
    #[inline]
    pub fn xmax(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn ymax(&self) -> f64 {
        self.y + self.height
    }

    /// Width times height.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// True when every component is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

impl<TSpace> BBoxCXCYWH<TSpace> {
    /// Creates a box from its centre and size.
    #[inline]
    pub fn new(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            cx,
            cy,
            width,
            height,
            _space: PhantomData,
        }
    }

    /// True when every component is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

impl BBoxXYWH<Pixel> {
    /// Converts to a YOLO centre box relative to an image of the given size.
    ///
    /// No clamping is applied. Callers are responsible for rejecting zero
    /// image dimensions (see [`ImageRecord::normalize`](super::ImageRecord::normalize)).
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxCXCYWH<Normalized> {
        BBoxCXCYWH::new(
            (self.x + self.width / 2.0) / image_width,
            (self.y + self.height / 2.0) / image_height,
            self.width / image_width,
            self.height / image_height,
        )
    }
}

impl BBoxCXCYWH<Normalized> {
    /// Maps a normalized centre box back to a pixel corner box.
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBoxXYWH<Pixel> {
        let width = self.width * image_width;
        let height = self.height * image_height;
        BBoxXYWH::new(
            self.cx * image_width - width / 2.0,
            self.cy * image_height - height / 2.0,
            width,
            height,
        )
    }

    /// True when all four components lie in `(0, 1]`.
    pub fn is_within_unit(&self) -> bool {
        [self.cx, self.cy, self.width, self.height]
            .iter()
            .all(|v| *v > 0.0 && *v <= 1.0)
    }
}

impl<TSpace> fmt::Debug for BBoxXYWH<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BBoxXYWH")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl<TSpace> fmt::Debug for BBoxCXCYWH<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BBoxCXCYWH")
            .field("cx", &self.cx)
            .field("cy", &self.cy)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
