use std::cell::RefCell;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;
use tiny_skia as sk;

use crate::dna::{Chromosome, Polygon};
use crate::error::ImageError;

/// mutable RGBA scratch buffer candidates are painted onto before scoring.
/// tiny-skia keeps bytes premultiplied; since every render starts from opaque white
/// and composites source-over, rendered pixels stay opaque and the bytes are plain RGBA.
#[derive(Clone, Debug)]
pub struct Canvas {
    pix: sk::Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self, ImageError> {
        sk::Pixmap::new(width, height)
            .map(|pix| Self { pix })
            .ok_or(ImageError::EmptyCanvas { width, height })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pix.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pix.height()
    }

    /// interleaved RGBA bytes, row-major, length width * height * 4
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.pix.data()
    }

    /// un-premultiplied RGBA of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pix.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width(), self.height(), |x, y| {
            image::Rgba(self.pixel(x, y).unwrap_or_default())
        })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        profiling::scope!("Canvas::save_png");
        self.to_rgba_image()
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// read-only reference raster (un-premultiplied RGBA) that candidates are scored against
#[derive(Clone, Debug)]
pub struct TargetImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    fingerprint: u64,
}

impl TargetImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyCanvas { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(ImageError::BufferLength { width, height, expected, actual: rgba.len() });
        }
        let mut hasher = DefaultHasher::new();
        (width, height).hash(&mut hasher);
        rgba.hash(&mut hasher);
        let fingerprint = hasher.finish();
        Ok(Self { width, height, rgba, fingerprint })
    }

    /// decode any format the `image` crate understands
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        profiling::scope!("TargetImage::open");
        let img = image::open(path)?.to_rgba8();
        Self::try_from(img)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// content hash; cached chromosome scores are only reused for a matching reference
    #[inline]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// a canvas matching this image's dimensions
    pub fn blank_canvas(&self) -> Result<Canvas, ImageError> {
        Canvas::new(self.width, self.height)
    }
}

impl TryFrom<image::RgbaImage> for TargetImage {
    type Error = ImageError;

    fn try_from(img: image::RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }
}

impl Chromosome {
    /// paint onto `canvas`: clear to opaque white, then fill every polygon in stored
    /// order (later ones on top) with anti-aliased source-over compositing.
    /// vertices are scaled from unit space by the canvas size.
    pub fn draw(&self, canvas: &mut Canvas) {
        profiling::scope!("Chromosome::draw");
        canvas.pix.fill(sk::Color::WHITE);

        let transform = sk::Transform::from_scale(canvas.width() as f32, canvas.height() as f32);
        for poly in self.polygons() {
            draw_polygon(&mut canvas.pix, poly, transform);
        }
    }
}

fn draw_polygon(pix: &mut sk::Pixmap, poly: &Polygon, transform: sk::Transform) {
    profiling::scope!("draw_polygon");

    let Some(path) = poly.cached_path.get_or_init(|| unit_path(poly)).as_ref() else {
        log::warn!("skipping polygon whose path can't be built: {:?}", poly.data());
        return;
    };

    // fully off-canvas in unit space: skip tiny-skia work
    let bounds = path.bounds();
    if bounds.right() < 0.0 || bounds.bottom() < 0.0 || bounds.left() >= 1.0 || bounds.top() >= 1.0 {
        return;
    }

    let [r, g, b, a] = poly.rgba();
    let Some(color) = sk::Color::from_rgba(r, g, b, a) else {
        log::warn!("skipping polygon with invalid color {:?}", poly.rgba());
        return;
    };

    let mut paint = sk::Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint.blend_mode = sk::BlendMode::SourceOver;

    pix.fill_path(path, &paint, sk::FillRule::Winding, transform, None);
}

/// closed path through the vertices, in unit coordinates
fn unit_path(poly: &Polygon) -> Option<sk::Path> {
    let mut points = poly.points();
    let (x0, y0) = points.next()?;
    let mut pb = sk::PathBuilder::new();
    pb.move_to(x0, y0);
    for (x, y) in points {
        pb.line_to(x, y);
    }
    pb.close();
    pb.finish()
}

// per-thread scratch canvas so parallel evaluators never share one
thread_local! {
    static SCRATCH_CANVAS: RefCell<Option<Canvas>> = const { RefCell::new(None) };
}

/// run `f` with this thread's scratch canvas, (re)allocating it when the size changes.
/// the canvas is taken out of the slot while `f` runs, so nested calls get their own.
pub fn with_scratch_canvas<T>(
    width: u32,
    height: u32,
    f: impl FnOnce(&mut Canvas) -> T,
) -> Result<T, ImageError> {
    profiling::scope!("with_scratch_canvas");
    let cached = SCRATCH_CANVAS.with(|cell| cell.borrow_mut().take());
    let mut canvas = match cached {
        Some(c) if c.width() == width && c.height() == height => c,
        _ => Canvas::new(width, height)?,
    };

    let out = f(&mut canvas);

    SCRATCH_CANVAS.with(|cell| *cell.borrow_mut() = Some(canvas));
    Ok(out)
}
