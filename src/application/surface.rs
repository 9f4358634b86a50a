use crate::domain::{SignatureError, SignatureImage};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

/// Midnight blue ink
pub const DEFAULT_INK: Rgba<u8> = Rgba([0x1e, 0x3a, 0x8a, 0xff]);
pub const DEFAULT_PEN_WIDTH: f32 = 3.0;

// Distance between stamped discs along a segment, in pixels
const STAMP_SPACING: f32 = 0.5;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Nothing has been drawn")]
    Empty,

    #[error("Failed to encode signature: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Invalid signature image: {0}")]
    Image(#[from] SignatureError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where the surface sits on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn at_origin(width: u32, height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    pub fn to_local(&self, screen: Point) -> Point {
        Point::new(screen.x - self.left, screen.y - self.top)
    }
}

/// Stroke style. Caps and joins are always round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenStyle {
    pub color: Rgba<u8>,
    pub width: f32,
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_INK,
            width: DEFAULT_PEN_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Leave,
}

/// Raw input from either a mouse or a touch screen, in screen coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse { phase: PointerPhase, x: f32, y: f32 },
    Touch { phase: PointerPhase, touches: Vec<Point> },
}

/// What the host should do with the original event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputResponse {
    /// Stop the platform from scrolling or zooming
    pub suppress_default: bool,
}

/// Freehand capture canvas
pub struct DrawingSurface {
    raster: RgbaImage,
    bounds: Bounds,
    pen: PenStyle,
    cursor: Option<Point>,
    has_content: bool,
    locked: bool,
}

impl DrawingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_bounds(Bounds::at_origin(width, height))
    }

    pub fn with_bounds(bounds: Bounds) -> Self {
        Self {
            raster: RgbaImage::new(bounds.width, bounds.height),
            bounds,
            pen: PenStyle::default(),
            cursor: None,
            has_content: false,
            locked: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn pen(&self) -> PenStyle {
        self.pen
    }

    pub fn set_pen(&mut self, pen: PenStyle) {
        self.pen = pen;
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    pub fn is_stroke_open(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_content
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Ignore new ink until `unlock`, used while a save is outstanding
    pub fn lock(&mut self) {
        self.locked = true;
        self.cursor = None;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Start a stroke at a surface-local point
    pub fn begin(&mut self, point: Point) {
        if self.locked || self.cursor.is_some() {
            return;
        }
        self.cursor = Some(point);
    }

    /// Draw from the last point to `point`
    pub fn extend(&mut self, point: Point) {
        if self.locked {
            return;
        }
        let Some(from) = self.cursor else {
            return;
        };
        if self.draw_segment(from, point) {
            self.has_content = true;
        }
        self.cursor = Some(point);
    }

    pub fn end(&mut self) {
        self.cursor = None;
    }

    pub fn clear(&mut self) {
        self.raster = RgbaImage::new(self.raster.width(), self.raster.height());
        self.has_content = false;
    }

    /// Feed a raw pointer or touch event through `begin`/`extend`/`end`
    pub fn handle_input(&mut self, input: &PointerInput) -> InputResponse {
        let (phase, screen) = match input {
            PointerInput::Mouse { phase, x, y } => (*phase, Some(Point::new(*x, *y))),
            PointerInput::Touch { phase, touches } => (*phase, touches.first().copied()),
        };
        let local = screen.map(|p| self.bounds.to_local(p));
        let drawing = self.cursor.is_some();

        match (phase, local) {
            (PointerPhase::Down, Some(point)) => self.begin(point),
            (PointerPhase::Move, Some(point)) => self.extend(point),
            (PointerPhase::Up, _) | (PointerPhase::Leave, _) => self.end(),
            _ => {}
        }

        InputResponse {
            suppress_default: drawing
                && phase == PointerPhase::Move
                && matches!(input, PointerInput::Touch { .. }),
        }
    }

    /// Adopt new on-screen bounds
    ///
    /// Ink in the region shared by the old and new size is kept; anything
    /// outside the new size is cropped away.
    pub fn resize(&mut self, bounds: Bounds) {
        let resized = bounds.width != self.raster.width() || bounds.height != self.raster.height();
        self.bounds = bounds;
        if !resized {
            return;
        }

        let mut raster = RgbaImage::new(bounds.width, bounds.height);
        let shared_w = bounds.width.min(self.raster.width());
        let shared_h = bounds.height.min(self.raster.height());
        for y in 0..shared_h {
            for x in 0..shared_w {
                raster.put_pixel(x, y, *self.raster.get_pixel(x, y));
            }
        }

        self.raster = raster;
        self.has_content = self.raster.pixels().any(|p| p.0[3] != 0);
    }

    /// Encode the current drawing as a PNG data URI
    pub fn export(&self) -> Result<SignatureImage, SurfaceError> {
        if self.is_empty() {
            return Err(SurfaceError::Empty);
        }
        let mut png = Vec::new();
        self.raster
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(SignatureImage::from_png(&png)?)
    }

    // Returns true when at least one pixel was inked
    fn draw_segment(&mut self, from: Point, to: Point) -> bool {
        let Some((from, to)) = self.clip_segment(from, to) else {
            return false;
        };
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let length = (dx * dx + dy * dy).sqrt();
        let steps = (length / STAMP_SPACING).ceil().max(1.0) as u32;

        let mut inked = false;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            inked |= self.stamp(Point::new(from.x + dx * t, from.y + dy * t));
        }
        inked
    }

    // Liang-Barsky against the raster grown by the pen radius
    fn clip_segment(&self, from: Point, to: Point) -> Option<(Point, Point)> {
        if ![from.x, from.y, to.x, to.y].iter().all(|v| v.is_finite()) {
            return None;
        }
        let radius = (self.pen.width / 2.0).max(0.5);
        let (min_x, min_y) = (-radius, -radius);
        let max_x = self.raster.width() as f32 + radius;
        let max_y = self.raster.height() as f32 + radius;

        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let mut t0 = 0.0_f32;
        let mut t1 = 1.0_f32;
        for (p, q) in [
            (-dx, from.x - min_x),
            (dx, max_x - from.x),
            (-dy, from.y - min_y),
            (dy, max_y - from.y),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }

        Some((
            Point::new(from.x + dx * t0, from.y + dy * t0),
            Point::new(from.x + dx * t1, from.y + dy * t1),
        ))
    }

    fn stamp(&mut self, center: Point) -> bool {
        let radius = (self.pen.width / 2.0).max(0.5);
        let (w, h) = (self.raster.width() as f32, self.raster.height() as f32);

        let min_x = (center.x - radius).floor().max(0.0);
        let max_x = (center.x + radius).ceil().min(w - 1.0);
        let min_y = (center.y - radius).floor().max(0.0);
        let max_y = (center.y + radius).ceil().min(h - 1.0);
        if min_x > max_x || min_y > max_y {
            return false;
        }

        let mut inked = false;
        for y in min_y as u32..=max_y as u32 {
            for x in min_x as u32..=max_x as u32 {
                let px = x as f32 + 0.5 - center.x;
                let py = y as f32 + 0.5 - center.y;
                if px * px + py * py <= radius * radius {
                    self.raster.put_pixel(x, y, self.pen.color);
                    inked = true;
                }
            }
        }
        inked
    }
}
