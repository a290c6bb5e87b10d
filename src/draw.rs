//! Software drawing primitives.
//!
//! Everything the menu renders goes through [`Canvas`], a straight-alpha
//! RGBA view over the shared-memory mapping. Text and the scroll/submenu
//! triangles are [`AlphaMask`]es blended with the current foreground
//! color; icons are decoded RGBA images blended source-over.

use image::RgbaImage;

use crate::config::Color;

/// An 8-bit coverage mask, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

impl AlphaMask {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width.max(0) * height.max(0)) as usize],
        }
    }
}

/// Triangle pointing up, used by the top scroll indicator.
pub fn arrow_up() -> AlphaMask {
    let mut mask = AlphaMask::new(ARROW_W, ARROW_H);
    for row in 0..ARROW_H {
        // widen by one pixel each side per row
        let inset = ARROW_H - 1 - row;
        for x in inset..ARROW_W - inset {
            mask.data[(row * ARROW_W + x) as usize] = 0xFF;
        }
    }
    mask
}

/// Triangle pointing down, used by the bottom scroll indicator.
pub fn arrow_down() -> AlphaMask {
    let mut mask = arrow_up();
    mask.data.reverse();
    mask
}

/// Triangle pointing right, drawn on items that own a submenu.
pub fn arrow_right() -> AlphaMask {
    let mut mask = AlphaMask::new(ARROW_H, ARROW_W);
    for col in 0..ARROW_H {
        let inset = col;
        for y in inset..ARROW_W - inset {
            mask.data[(y * ARROW_H + col) as usize] = 0xFF;
        }
    }
    mask
}

/// Width of the up/down scroll triangles (height of the right one).
pub const ARROW_W: i32 = 7;
/// Height of the up/down scroll triangles (width of the right one).
pub const ARROW_H: i32 = 4;

/// Mutable RGBA pixel view, typically over the shm mapping.
pub struct Canvas<'a> {
    pixels: &'a mut [u8],
    width: i32,
    height: i32,
    stride: i32,
}

impl<'a> Canvas<'a> {
    /// Wrap a pixel buffer. `stride` is in bytes and must hold `width`
    /// RGBA pixels per row.
    pub fn new(pixels: &'a mut [u8], width: i32, height: i32, stride: i32) -> Self {
        debug_assert!(stride >= width * 4);
        debug_assert!(pixels.len() >= (stride * height) as usize);
        Self {
            pixels,
            width,
            height,
            stride,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn put(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let off = (y * self.stride + x * 4) as usize;
        self.pixels[off] = color.r;
        self.pixels[off + 1] = color.g;
        self.pixels[off + 2] = color.b;
        self.pixels[off + 3] = color.a;
    }

    #[inline]
    fn blend(&mut self, x: i32, y: i32, color: Color, coverage: u8) {
        if coverage == 0 || x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        if coverage == 0xFF && color.a == 0xFF {
            self.put(x, y, color);
            return;
        }
        let off = (y * self.stride + x * 4) as usize;
        let a = (color.a as u32 * coverage as u32) / 0xFF;
        let mix = |src: u8, dst: u8| ((src as u32 * a + dst as u32 * (0xFF - a)) / 0xFF) as u8;
        self.pixels[off] = mix(color.r, self.pixels[off]);
        self.pixels[off + 1] = mix(color.g, self.pixels[off + 1]);
        self.pixels[off + 2] = mix(color.b, self.pixels[off + 2]);
        self.pixels[off + 3] = self.pixels[off + 3].max(a as u8);
    }

    /// Fill a rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        for row in y.max(0)..(y + h).min(self.height) {
            for col in x.max(0)..(x + w).min(self.width) {
                self.put(col, row, color);
            }
        }
    }

    /// Blend a coverage mask at (x, y) in the given color.
    pub fn blit_mask(&mut self, x: i32, y: i32, mask: &AlphaMask, color: Color) {
        for row in 0..mask.height {
            for col in 0..mask.width {
                let coverage = mask.data[(row * mask.width + col) as usize];
                self.blend(x + col, y + row, color, coverage);
            }
        }
    }

    /// Blend an RGBA image source-over at (x, y).
    pub fn blit_rgba(&mut self, x: i32, y: i32, img: &RgbaImage) {
        for (col, row, px) in img.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            self.blend(x + col as i32, y + row as i32, Color::rgba(r, g, b, 0xFF), a);
        }
    }

    /// Draw a `thickness`-px rectangular border along the canvas edges.
    pub fn frame(&mut self, thickness: i32, color: Color) {
        let (w, h) = (self.width, self.height);
        self.fill_rect(0, 0, w, thickness, color);
        self.fill_rect(0, h - thickness, w, thickness, color);
        self.fill_rect(0, 0, thickness, h, color);
        self.fill_rect(w - thickness, 0, thickness, h, color);
    }
}
