use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

use crate::{DrawCommand, Rgba};

/// Glyph that paints its foreground on the upper half of a cell and its
/// background on the lower half, giving two square-ish pixels per cell.
const HALF_BLOCK: &str = "\u{2580}";

/// Opaque RGB pixel grid that keeps its contents between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn clear(&mut self, color: Rgba) {
        let opaque = Rgba { a: 255, ..color };
        self.pixels.fill(opaque);
    }

    /// Source-over blend of `color` onto the pixel at `(x, y)`. Out-of-range
    /// coordinates are ignored.
    pub fn blend(&mut self, x: usize, y: usize, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let dst = &mut self.pixels[y * self.width + x];
        *dst = blend_over(*dst, color);
    }
}

/// Integer source-over blend. Truncating keeps repeated translucent black
/// overlays converging all the way to black.
fn blend_over(dst: Rgba, src: Rgba) -> Rgba {
    let alpha = u16::from(src.a);
    let inverse = 255 - alpha;
    let mix = |s: u8, d: u8| ((u16::from(s) * alpha + u16::from(d) * inverse) / 255) as u8;

    Rgba::new(mix(src.r, dst.r), mix(src.g, dst.g), mix(src.b, dst.b), 255)
}

/// Rasterises draw commands expressed in a fixed logical resolution onto a
/// framebuffer sized to whatever surface is available.
#[derive(Debug, Clone)]
pub struct RenderGraph {
    logical_width: f32,
    logical_height: f32,
    framebuffer: Framebuffer,
}

impl RenderGraph {
    pub fn new(logical_width: u32, logical_height: u32) -> Self {
        Self {
            logical_width: logical_width as f32,
            logical_height: logical_height as f32,
            framebuffer: Framebuffer::new(0, 0),
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Matches the framebuffer to a surface of `width` x `height` pixels.
    /// A size change discards the old contents and starts from black.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        if self.framebuffer.width == width && self.framebuffer.height == height {
            return false;
        }
        tracing::debug!(width, height, "resizing framebuffer");
        self.framebuffer = Framebuffer::new(width, height);
        true
    }

    /// Sizes the framebuffer for a terminal area, two pixels per cell row.
    pub fn resize_to_area(&mut self, area: Rect) -> bool {
        self.resize(usize::from(area.width), usize::from(area.height) * 2)
    }

    pub fn clear(&mut self, color: Rgba) {
        self.framebuffer.clear(color);
    }

    pub fn submit(&mut self, commands: &[DrawCommand]) {
        for command in commands {
            self.draw(command);
        }
    }

    pub fn widget(&self) -> FrameWidget<'_> {
        FrameWidget {
            framebuffer: &self.framebuffer,
        }
    }

    fn scale(&self) -> (f32, f32) {
        (
            self.framebuffer.width as f32 / self.logical_width,
            self.framebuffer.height as f32 / self.logical_height,
        )
    }

    fn draw(&mut self, command: &DrawCommand) {
        let (sx, sy) = self.scale();
        if sx <= 0.0 || sy <= 0.0 {
            return;
        }

        match *command {
            DrawCommand::Circle {
                x,
                y,
                radius,
                color,
            } => {
                if radius <= 0.0 {
                    return;
                }
                let r2 = radius * radius;
                self.fill_region(x - radius, y - radius, x + radius, y + radius, color, |lx, ly| {
                    let dx = lx - x;
                    let dy = ly - y;
                    dx * dx + dy * dy <= r2
                });
            }
            DrawCommand::Rect {
                x,
                y,
                width,
                height,
                color,
            } => {
                if width <= 0.0 || height <= 0.0 {
                    return;
                }
                self.fill_region(x, y, x + width, y + height, color, |lx, ly| {
                    lx >= x && lx < x + width && ly >= y && ly < y + height
                });
            }
        }
    }

    /// Blends `color` into every pixel whose centre, mapped back to logical
    /// space, satisfies `inside`. The logical bounding box limits the scan.
    fn fill_region<F>(&mut self, left: f32, top: f32, right: f32, bottom: f32, color: Rgba, inside: F)
    where
        F: Fn(f32, f32) -> bool,
    {
        let (sx, sy) = self.scale();
        let width = self.framebuffer.width;
        let height = self.framebuffer.height;

        let x0 = pixel_floor(left * sx, width);
        let x1 = pixel_ceil(right * sx, width);
        let y0 = pixel_floor(top * sy, height);
        let y1 = pixel_ceil(bottom * sy, height);

        for py in y0..y1 {
            let ly = (py as f32 + 0.5) / sy;
            for px in x0..x1 {
                let lx = (px as f32 + 0.5) / sx;
                if inside(lx, ly) {
                    self.framebuffer.blend(px, py, color);
                }
            }
        }
    }
}

fn pixel_floor(value: f32, limit: usize) -> usize {
    (value.floor().max(0.0) as usize).min(limit)
}

fn pixel_ceil(value: f32, limit: usize) -> usize {
    (value.ceil().max(0.0) as usize).min(limit)
}

/// Presents a [`Framebuffer`] in a terminal buffer using half-block glyphs.
pub struct FrameWidget<'a> {
    framebuffer: &'a Framebuffer,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let columns = area.width.min(self.framebuffer.width as u16);
        let rows = area.height.min((self.framebuffer.height / 2) as u16);

        for row in 0..rows {
            for column in 0..columns {
                let x = usize::from(column);
                let y = usize::from(row) * 2;
                let top = self.framebuffer.pixel(x, y).unwrap_or(Rgba::BLACK);
                let bottom = self.framebuffer.pixel(x, y + 1).unwrap_or(Rgba::BLACK);

                if let Some(cell) = buf.cell_mut((area.x + column, area.y + row)) {
                    cell.set_symbol(HALF_BLOCK)
                        .set_fg(Color::Rgb(top.r, top.g, top.b))
                        .set_bg(Color::Rgb(bottom.r, bottom.g, bottom.b));
                }
            }
        }
    }
}
