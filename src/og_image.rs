use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;
use rusttype::{point, Font, Scale};
use walkdir::WalkDir;

/// Default destination, relative to the project root.
pub const DEFAULT_OUTPUT: &str = "og-image.png";

// Website palette (src/css/base.css).
const BG_PRIMARY: Rgba<u8> = Rgba([0x0d, 0x0d, 0x0d, 0xff]);
const BG_SECONDARY: Rgba<u8> = Rgba([0x1a, 0x1a, 0x1a, 0xff]);
const BORDER_SUBTLE: Rgba<u8> = Rgba([0x2a, 0x2a, 0x2a, 0xff]);
const TEXT_SECONDARY: Rgba<u8> = Rgba([0xb0, 0xb0, 0xb0, 0xff]);
const SHADOW: Rgba<u8> = Rgba([20, 20, 20, 0xff]);
const TRAFFIC_LIGHTS: [Rgba<u8>; 3] = [
    Rgba([0xef, 0x44, 0x44, 0xff]), // red
    Rgba([0xea, 0xb3, 0x08, 0xff]), // yellow
    Rgba([0x22, 0xc5, 0x5e, 0xff]), // green
];

// Header gradient endpoints, bg_secondary down to bg_tertiary grey.
const HEADER_GRADIENT_TOP: f32 = 26.0;
const HEADER_GRADIENT_BOTTOM: f32 = 36.0;

const FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Supplemental/RobotoMono-Regular.ttf",
    "/System/Library/Fonts/Supplemental/SourceCodePro-Regular.ttf",
    "/System/Library/Fonts/Monaco.ttf",
    "/usr/share/fonts/truetype/roboto/RobotoMono-Regular.ttf",
    "/usr/share/fonts/truetype/source-code-pro/SourceCodePro-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "src/fonts/RobotoMono-Regular.ttf",
    "src/fonts/SourceCodePro-Regular.ttf",
];

const FONT_SEARCH_DIRS: &[&str] = &[
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/System/Library/Fonts",
    "/Library/Fonts",
];

/// Corner rendering capability, chosen once before drawing starts. `Square`
/// is the degraded path for surfaces where the rounded radius collapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CornerStyle {
    Rounded,
    Square,
}

/// All derived pixel quantities for the window mockup.
///
/// Every field is an integer truncation of a reference constant times
/// `scale`, so layouts at different canvas sizes stay geometrically similar
/// to the 1200x630 reference design.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub width: i32,
    pub height: i32,
    pub scale: f32,
    pub radius: i32,
    pub header_height: i32,
    pub traffic_size: i32,
    pub traffic_gap: i32,
    pub traffic_left: i32,
    pub content_padding: i32,
    pub shadow_offset: i32,
    pub window_width: i32,
    pub window_height: i32,
    pub window_x: i32,
    pub window_y: i32,
    pub font_size: i32,
    pub line_height: i32,
}

impl Layout {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width as i32;
        let height = height as i32;
        let scale = width.min(height) as f32 / 630.0;
        let scaled = |reference: f32| (reference * scale) as i32;

        let window_width = scaled(520.0);
        let window_height = scaled(280.0);
        let font_size = scaled(36.0);
        Self {
            width,
            height,
            scale,
            radius: scaled(16.0),
            header_height: scaled(56.0),
            traffic_size: scaled(12.0),
            traffic_gap: scaled(8.0),
            traffic_left: scaled(24.0),
            content_padding: scaled(32.0),
            shadow_offset: scaled(12.0),
            window_width,
            window_height,
            window_x: (width - window_width) / 2,
            window_y: (height - window_height) / 2,
            font_size,
            line_height: (font_size as f32 * 1.4) as i32,
        }
    }

    /// Top edge of the text block, centered vertically in the content area
    /// below the header.
    pub fn text_block_top(&self, line_count: usize) -> i32 {
        let content_y = self.window_y + self.header_height + self.content_padding;
        let content_height = self.window_height - self.header_height - self.content_padding * 2;
        let total_text_height = line_count as i32 * self.line_height;
        content_y + (content_height - total_text_height) / 2
    }
}

/// Renders the OG card and writes it as a PNG, returning the output path.
///
/// `text` must already contain real newlines; the CLI unescapes `\n` before
/// calling this.
pub fn generate(text: &str, output: Option<&Path>, width: u32, height: u32) -> Result<PathBuf> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let layout = Layout::new(width, height);
    let style = if layout.radius > 0 {
        CornerStyle::Rounded
    } else {
        CornerStyle::Square
    };

    let mut img = RgbaImage::from_pixel(width, height, BG_PRIMARY);

    draw_panel_mut(
        &mut img,
        layout.window_x + layout.shadow_offset,
        layout.window_y + layout.shadow_offset,
        layout.window_width,
        layout.window_height,
        layout.radius + 6,
        style,
        SHADOW,
        None,
    );
    draw_panel_mut(
        &mut img,
        layout.window_x,
        layout.window_y,
        layout.window_width,
        layout.window_height,
        layout.radius,
        style,
        BG_SECONDARY,
        Some(BORDER_SUBTLE),
    );

    draw_header_mut(&mut img, &layout);
    draw_traffic_lights_mut(&mut img, &layout);
    draw_text_lines_mut(&mut img, &layout, text)?;

    img.save(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(output)
}

/// Header strip: 1px-tall gradient bands over the window's top edge, then a
/// separator line at the header's bottom.
fn draw_header_mut(img: &mut RgbaImage, layout: &Layout) {
    for i in 0..layout.header_height {
        let t = i as f32 / (layout.header_height - 1).max(1) as f32;
        let v = (HEADER_GRADIENT_TOP + (HEADER_GRADIENT_BOTTOM - HEADER_GRADIENT_TOP) * t) as u8;
        draw_filled_rect_mut(
            img,
            Rect::at(layout.window_x, layout.window_y + i).of_size(layout.window_width as u32, 1),
            Rgba([v, v, v, 0xff]),
        );
    }

    let separator_y = (layout.window_y + layout.header_height) as f32;
    draw_line_segment_mut(
        img,
        (layout.window_x as f32, separator_y),
        ((layout.window_x + layout.window_width) as f32, separator_y),
        BORDER_SUBTLE,
    );
}

fn draw_traffic_lights_mut(img: &mut RgbaImage, layout: &Layout) {
    let radius = layout.traffic_size / 2;
    let traffic_y = layout.window_y + (layout.header_height - layout.traffic_size) / 2;
    for (i, color) in TRAFFIC_LIGHTS.iter().enumerate() {
        let tx = layout.window_x
            + layout.traffic_left
            + i as i32 * (layout.traffic_size + layout.traffic_gap);
        draw_filled_circle_mut(img, (tx + radius, traffic_y + radius), radius, *color);
    }
}

fn draw_text_lines_mut(img: &mut RgbaImage, layout: &Layout, text: &str) -> Result<()> {
    let font = load_font()?;
    let font_scale = Scale::uniform(layout.font_size as f32);
    let lines: Vec<&str> = text.split('\n').collect();
    let top = layout.text_block_top(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let text_width = measure_text_width(&font, font_scale, line);
        let text_x = layout.window_x + (layout.window_width - text_width) / 2;
        let text_y = top + i as i32 * layout.line_height;
        draw_text_mut(
            img,
            TEXT_SECONDARY,
            text_x.max(0) as u32,
            text_y.max(0) as u32,
            font_scale,
            &font,
            line,
        );
    }
    Ok(())
}

/// Filled rectangle with the selected corner style and an optional 1px
/// outline. The outline is drawn at full size, with the fill inset by one
/// pixel on each side.
#[allow(clippy::too_many_arguments)]
pub fn draw_panel_mut(
    img: &mut RgbaImage,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    radius: i32,
    style: CornerStyle,
    fill: Rgba<u8>,
    outline: Option<Rgba<u8>>,
) {
    if w <= 0 || h <= 0 {
        return;
    }
    match (style, outline) {
        (CornerStyle::Rounded, None) => fill_rounded_rect_mut(img, x, y, w, h, radius, fill),
        (CornerStyle::Rounded, Some(outline)) => {
            fill_rounded_rect_mut(img, x, y, w, h, radius, outline);
            if w > 2 && h > 2 {
                fill_rounded_rect_mut(
                    img,
                    x + 1,
                    y + 1,
                    w - 2,
                    h - 2,
                    (radius - 1).max(0),
                    fill,
                );
            }
        }
        (CornerStyle::Square, None) => {
            draw_filled_rect_mut(img, Rect::at(x, y).of_size(w as u32, h as u32), fill);
        }
        (CornerStyle::Square, Some(outline)) => {
            draw_filled_rect_mut(img, Rect::at(x, y).of_size(w as u32, h as u32), outline);
            if w > 2 && h > 2 {
                draw_filled_rect_mut(
                    img,
                    Rect::at(x + 1, y + 1).of_size((w - 2) as u32, (h - 2) as u32),
                    fill,
                );
            }
        }
    }
}

/// Scanline fill: each row inside a corner arc is shortened by the circular
/// inset on both ends.
fn fill_rounded_rect_mut(img: &mut RgbaImage, x: i32, y: i32, w: i32, h: i32, r: i32, color: Rgba<u8>) {
    let r = r.min(w / 2).min(h / 2).max(0);
    for row in 0..h {
        let inset = if row < r {
            corner_inset(r, r - row)
        } else if row >= h - r {
            corner_inset(r, row - (h - r - 1))
        } else {
            0
        };
        let run = w - inset * 2;
        if run > 0 {
            draw_filled_rect_mut(
                img,
                Rect::at(x + inset, y + row).of_size(run as u32, 1),
                color,
            );
        }
    }
}

/// Horizontal inset of a corner arc row, `dist` rows from the arc's flat
/// edge (1..=r).
fn corner_inset(r: i32, dist: i32) -> i32 {
    let dy = dist as f32 - 0.5;
    let dx = ((r * r) as f32 - dy * dy).max(0.0).sqrt();
    (r as f32 - dx).round() as i32
}

/// Probes the candidate font list, then falls back to any readable TrueType
/// font on the system.
pub fn load_font() -> Result<Font<'static>> {
    for candidate in FONT_CANDIDATES {
        if let Some(font) = try_load_font(Path::new(candidate)) {
            return Ok(font);
        }
    }
    for dir in FONT_SEARCH_DIRS {
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            if entry.path().extension().and_then(|e| e.to_str()) == Some("ttf") {
                if let Some(font) = try_load_font(entry.path()) {
                    return Ok(font);
                }
            }
        }
    }
    bail!("no usable TrueType font found on this system")
}

fn try_load_font(path: &Path) -> Option<Font<'static>> {
    let bytes = fs::read(path).ok()?;
    Font::try_from_vec(bytes)
}

/// Pixel span of the laid-out glyphs; 0 for text with no visible glyphs.
fn measure_text_width(font: &Font<'_>, scale: Scale, text: &str) -> i32 {
    let origin = point(0.0, font.v_metrics(scale).ascent);
    let boxes: Vec<_> = font
        .layout(text, scale, origin)
        .filter_map(|g| g.pixel_bounding_box())
        .collect();
    match (boxes.first(), boxes.last()) {
        (Some(first), Some(last)) => last.max.x - first.min.x,
        _ => 0,
    }
}

/// Turns literal `\n` sequences from the command line into real line breaks.
pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}
