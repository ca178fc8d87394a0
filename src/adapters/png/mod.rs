//! PNG adapter: Implementation of ChartRenderer using the `image` crate.
//!
//! Charts are drawn directly into an RGB buffer so rendering needs no system
//! fonts. Titles, class ticks, feature names and cell counts use a built-in
//! 3x5 pixel font (upper-case letters, digits and a little punctuation).

use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

use crate::domain::ConfusionMatrix;
use crate::ports::{ChartRenderer, FeatureImportance, RenderError};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const AXIS: Rgb<u8> = Rgb([64, 64, 64]);
const SKY_BLUE: Rgb<u8> = Rgb([135, 206, 235]);

/// Ends of the "Blues" ramp: lightest for 0, darkest for the largest cell.
const BLUES_LOW: [u8; 3] = [247, 251, 255];
const BLUES_HIGH: [u8; 3] = [8, 48, 107];

/// Class names for label 0 and label 1.
const CLASS_LABELS: [&str; 2] = ["Normal", "Thalassemia"];

const FONT_W: u32 = 3;
const FONT_H: u32 = 5;

/// 3x5 glyphs for 0-9; each row's low three bits are pixels, MSB leftmost.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Same layout as [`DIGITS`], for A-Z.
const LETTERS: [[u8; 5]; 26] = [
    [0b010, 0b101, 0b111, 0b101, 0b101],
    [0b110, 0b101, 0b110, 0b101, 0b110],
    [0b011, 0b100, 0b100, 0b100, 0b011],
    [0b110, 0b101, 0b101, 0b101, 0b110],
    [0b111, 0b100, 0b110, 0b100, 0b111],
    [0b111, 0b100, 0b110, 0b100, 0b100],
    [0b011, 0b100, 0b101, 0b101, 0b011],
    [0b101, 0b101, 0b111, 0b101, 0b101],
    [0b111, 0b010, 0b010, 0b010, 0b111],
    [0b001, 0b001, 0b001, 0b101, 0b010],
    [0b101, 0b101, 0b110, 0b101, 0b101],
    [0b100, 0b100, 0b100, 0b100, 0b111],
    [0b101, 0b111, 0b111, 0b101, 0b101],
    [0b110, 0b101, 0b101, 0b101, 0b101],
    [0b010, 0b101, 0b101, 0b101, 0b010],
    [0b110, 0b101, 0b110, 0b100, 0b100],
    [0b010, 0b101, 0b101, 0b110, 0b011],
    [0b110, 0b101, 0b110, 0b101, 0b101],
    [0b011, 0b100, 0b010, 0b001, 0b110],
    [0b111, 0b010, 0b010, 0b010, 0b010],
    [0b101, 0b101, 0b101, 0b101, 0b111],
    [0b101, 0b101, 0b101, 0b101, 0b010],
    [0b101, 0b101, 0b111, 0b111, 0b101],
    [0b101, 0b101, 0b010, 0b101, 0b101],
    [0b101, 0b101, 0b010, 0b010, 0b010],
    [0b111, 0b001, 0b010, 0b100, 0b111],
];

fn glyph(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        c @ '0'..='9' => DIGITS[usize::from(c as u8 - b'0')],
        c @ 'A'..='Z' => LETTERS[usize::from(c as u8 - b'A')],
        '.' => [0, 0, 0, 0, 0b010],
        '-' => [0, 0, 0b111, 0, 0],
        '&' => [0b010, 0b101, 0b010, 0b101, 0b011],
        _ => [0; 5],
    }
}

/// Encode an RGB image as PNG bytes.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let dynamic = DynamicImage::ImageRgb8(img.clone());
    let mut cursor = Cursor::new(Vec::new());
    dynamic
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| RenderError::Encoding(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

/// Linear interpolation along the Blues ramp, `t` in [0, 1].
fn blues(t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let mix = |lo: u8, hi: u8| (f64::from(lo) + (f64::from(hi) - f64::from(lo)) * t).round() as u8;
    Rgb([
        mix(BLUES_LOW[0], BLUES_HIGH[0]),
        mix(BLUES_LOW[1], BLUES_HIGH[1]),
        mix(BLUES_LOW[2], BLUES_HIGH[2]),
    ])
}

/// Fill a rectangle, clipped to the image.
fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = x.saturating_add(w).min(img.width());
    let y_end = y.saturating_add(h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

/// Pixel width of `text` at `scale`, including the one-pixel glyph gaps.
fn text_width(text: &str, scale: u32) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        0
    } else {
        n * (FONT_W + 1) * scale - scale
    }
}

/// Draw `text` with its top-left corner at (`x`, `y`).
fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str, scale: u32, color: Rgb<u8>) {
    let mut pen = x;
    for ch in text.chars() {
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..FONT_W {
                if bits & (0b100 >> col) != 0 {
                    fill_rect(
                        img,
                        pen + col * scale,
                        y + row as u32 * scale,
                        scale,
                        scale,
                        color,
                    );
                }
            }
        }
        pen += (FONT_W + 1) * scale;
    }
}

/// Draw `text` centered on (`cx`, `cy`).
fn draw_text_centered(img: &mut RgbImage, cx: u32, cy: u32, text: &str, scale: u32, color: Rgb<u8>) {
    let x = cx.saturating_sub(text_width(text, scale) / 2);
    let y = cy.saturating_sub(FONT_H * scale / 2);
    draw_text(img, x, y, text, scale, color);
}

/// Pixel geometry of the confusion-matrix figure.
#[derive(Debug, Clone, Copy)]
struct MatrixLayout {
    cell: u32,
    pad: u32,
    label_scale: u32,
    left: u32,
    top: u32,
    bar_x: u32,
    bar_w: u32,
    width: u32,
    height: u32,
}

/// Pixel geometry of the feature-importance figure.
#[derive(Debug, Clone, Copy)]
struct BarLayout {
    pad: u32,
    title_scale: u32,
    label_scale: u32,
    left: u32,
    top: u32,
    plot_w: u32,
    plot_h: u32,
    band: u32,
    thickness: u32,
}

/// Chart renderer producing PNG images.
#[derive(Debug, Clone)]
pub struct PngChartRenderer {
    /// Side length of one confusion-matrix cell in pixels
    pub cell_size: u32,
    /// Feature-importance canvas size in pixels
    pub bar_chart_size: (u32, u32),
}

impl Default for PngChartRenderer {
    fn default() -> Self {
        Self {
            cell_size: 140,
            bar_chart_size: (600, 400),
        }
    }
}

impl PngChartRenderer {
    fn matrix_layout(&self) -> Result<MatrixLayout, RenderError> {
        let cell = self.cell_size;
        if cell == 0 {
            return Err(RenderError::CanvasTooSmall("cell_size is 0".into()));
        }

        let pad = (cell / 14).max(2);
        let label_scale = (cell / 70).max(1);
        let line_h = FONT_H * label_scale;
        let row_label_w = CLASS_LABELS
            .iter()
            .map(|l| text_width(l, label_scale))
            .max()
            .unwrap_or(0);

        let left = pad + row_label_w + pad;
        // Title line, then the column labels.
        let top = pad + line_h + pad + line_h + pad;
        let bar_w = (cell / 6).max(1);
        let bar_x = left + 2 * cell + 2 * pad;

        Ok(MatrixLayout {
            cell,
            pad,
            label_scale,
            left,
            top,
            bar_x,
            bar_w,
            width: bar_x + bar_w + pad,
            height: top + 2 * cell + pad,
        })
    }

    fn bar_layout(&self, bars: &[FeatureImportance]) -> Result<BarLayout, RenderError> {
        let (width, height) = self.bar_chart_size;
        let n = bars.len() as u32;

        let pad = (height / 40).max(2);
        let title_scale = (height / 200).max(1);
        let top = pad + FONT_H * title_scale + pad;
        let plot_h = height.saturating_sub(top + pad);
        if plot_h < n {
            return Err(RenderError::CanvasTooSmall(format!(
                "{n} bars need {n} rows of plot area, canvas {width}x{height} leaves {plot_h}"
            )));
        }

        let band = plot_h / n;
        let label_scale = if band >= 14 { 2 } else { 1 };
        let label_w = bars
            .iter()
            .map(|b| text_width(&b.name, label_scale))
            .max()
            .unwrap_or(0);
        let left = pad + label_w + pad;
        let plot_w = width.saturating_sub(left + pad);
        if plot_w == 0 {
            return Err(RenderError::CanvasTooSmall(format!(
                "canvas width {width} leaves no room for bars after {label_w}px of labels"
            )));
        }

        Ok(BarLayout {
            pad,
            title_scale,
            label_scale,
            left,
            top,
            plot_w,
            plot_h,
            band,
            thickness: (band * 4 / 5).max(1),
        })
    }
}

impl ChartRenderer for PngChartRenderer {
    fn confusion_matrix(&self, matrix: &ConfusionMatrix) -> Result<Vec<u8>, RenderError> {
        let layout = self.matrix_layout()?;
        let MatrixLayout {
            cell,
            pad,
            label_scale,
            left,
            top,
            ..
        } = layout;
        let mut img = RgbImage::from_pixel(layout.width, layout.height, WHITE);

        let line_h = FONT_H * label_scale;
        draw_text_centered(
            &mut img,
            left + cell,
            pad + line_h / 2,
            "Confusion Matrix",
            label_scale,
            BLACK,
        );

        let rows = matrix.to_rows();
        let max = matrix.max_cell();
        let count_scale = (cell / 20).max(1);

        for (i, row) in rows.iter().enumerate() {
            for (j, &count) in row.iter().enumerate() {
                let t = if max == 0 {
                    0.0
                } else {
                    count as f64 / max as f64
                };
                let x = left + j as u32 * cell;
                let y = top + i as u32 * cell;
                fill_rect(&mut img, x, y, cell, cell, blues(t));

                // Light text on dark cells.
                let text = if count as f64 > max as f64 / 2.0 {
                    WHITE
                } else {
                    BLACK
                };
                draw_text_centered(
                    &mut img,
                    x + cell / 2,
                    y + cell / 2,
                    &count.to_string(),
                    count_scale,
                    text,
                );
            }
        }

        // Predicted classes across the top, true classes down the left.
        let col_label_y = pad + line_h + pad + line_h / 2;
        for (class, label) in CLASS_LABELS.iter().enumerate() {
            let offset = class as u32 * cell + cell / 2;
            draw_text_centered(&mut img, left + offset, col_label_y, label, label_scale, AXIS);

            let label_x = left.saturating_sub(pad + text_width(label, label_scale));
            let label_y = (top + offset).saturating_sub(line_h / 2);
            draw_text(&mut img, label_x, label_y, label, label_scale, AXIS);
        }

        // Colorbar, darkest at the top.
        let bar_h = 2 * cell;
        for dy in 0..bar_h {
            let t = 1.0 - f64::from(dy) / f64::from(bar_h.saturating_sub(1).max(1));
            fill_rect(&mut img, layout.bar_x, top + dy, layout.bar_w, 1, blues(t));
        }

        encode_png(&img)
    }

    fn feature_importance(&self, bars: &[FeatureImportance]) -> Result<Vec<u8>, RenderError> {
        if bars.is_empty() {
            return Err(RenderError::EmptyInput("no feature importances".into()));
        }

        let layout = self.bar_layout(bars)?;
        let BarLayout {
            pad,
            left,
            top,
            plot_w,
            plot_h,
            band,
            thickness,
            ..
        } = layout;
        let (width, height) = self.bar_chart_size;
        let mut img = RgbImage::from_pixel(width, height, WHITE);

        draw_text_centered(
            &mut img,
            width / 2,
            pad + FONT_H * layout.title_scale / 2,
            "Feature Importance",
            layout.title_scale,
            BLACK,
        );

        let max = bars
            .iter()
            .map(|b| b.importance)
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);

        // First bar at the bottom.
        for (i, bar) in bars.iter().enumerate() {
            let length = if max > 0.0 && bar.importance.is_finite() {
                ((bar.importance.max(0.0) / max) * f64::from(plot_w)).round() as u32
            } else {
                0
            };
            let band_top = (top + plot_h).saturating_sub((i as u32 + 1) * band);
            let y = band_top + (band - thickness) / 2;
            fill_rect(&mut img, left, y, length, thickness, SKY_BLUE);

            let label_x = left.saturating_sub(pad + text_width(&bar.name, layout.label_scale));
            let label_y = (band_top + band / 2).saturating_sub(FONT_H * layout.label_scale / 2);
            draw_text(&mut img, label_x, label_y, &bar.name, layout.label_scale, AXIS);
        }

        // Axes
        fill_rect(&mut img, left.saturating_sub(1), top, 1, plot_h, AXIS);
        fill_rect(&mut img, left.saturating_sub(1), top + plot_h, plot_w + 1, 1, AXIS);

        encode_png(&img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FEATURE_NAMES;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn decode(bytes: &[u8]) -> RgbImage {
        image::load_from_memory(bytes)
            .expect("Should decode PNG")
            .to_rgb8()
    }

    fn any_ink(img: &RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> bool {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .any(|(x, y)| *img.get_pixel(x, y) != WHITE)
    }

    fn all_features() -> Vec<FeatureImportance> {
        FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| FeatureImportance {
                name: (*name).to_string(),
                importance: (i + 1) as f64 / 66.0,
            })
            .collect()
    }

    #[test]
    fn test_confusion_matrix_png() {
        let renderer = PngChartRenderer::default();
        let layout = renderer.matrix_layout().expect("Should lay out");
        let cm = ConfusionMatrix::from_labels(&[0, 0, 0, 1, 1], &[0, 0, 0, 1, 0]);
        let bytes = renderer.confusion_matrix(&cm).expect("Should render");

        assert!(bytes.starts_with(&PNG_SIGNATURE));
        let img = decode(&bytes);
        assert_eq!((img.width(), img.height()), (layout.width, layout.height));

        // Top-left cell (tn = 3, the max) is darkest; top-right (fp = 0) is lightest.
        let (left, top, cell) = (layout.left, layout.top, layout.cell);
        assert_eq!(*img.get_pixel(left + 2, top + 2), Rgb(BLUES_HIGH));
        assert_eq!(*img.get_pixel(left + cell + 2, top + 2), Rgb(BLUES_LOW));
    }

    #[test]
    fn test_confusion_matrix_has_title_and_class_labels() {
        let renderer = PngChartRenderer::default();
        let layout = renderer.matrix_layout().expect("Should lay out");
        let img = decode(
            &renderer
                .confusion_matrix(&ConfusionMatrix::default())
                .expect("Should render"),
        );

        let line_h = FONT_H * layout.label_scale;
        // Title row.
        assert!(any_ink(&img, 0..layout.width, layout.pad..layout.pad + line_h));
        // Column labels above the cells.
        assert!(any_ink(
            &img,
            layout.left..layout.left + 2 * layout.cell,
            layout.pad + line_h + layout.pad..layout.top
        ));
        // Row labels left of the cells.
        assert!(any_ink(&img, 0..layout.left, layout.top..layout.top + 2 * layout.cell));
    }

    #[test]
    fn test_confusion_matrix_rejects_zero_cell() {
        let renderer = PngChartRenderer {
            cell_size: 0,
            ..PngChartRenderer::default()
        };
        assert!(matches!(
            renderer.confusion_matrix(&ConfusionMatrix::default()),
            Err(RenderError::CanvasTooSmall(_))
        ));
    }

    #[test]
    fn test_feature_importance_png() {
        let renderer = PngChartRenderer {
            cell_size: 140,
            bar_chart_size: (300, 200),
        };
        let bars = vec![
            FeatureImportance {
                name: "Hb".into(),
                importance: 0.1,
            },
            FeatureImportance {
                name: "Mentzer Index".into(),
                importance: 0.4,
            },
        ];
        let layout = renderer.bar_layout(&bars).expect("Should lay out");
        let img = decode(&renderer.feature_importance(&bars).expect("Should render"));
        assert_eq!((img.width(), img.height()), (300, 200));

        let plot_bottom = layout.top + layout.plot_h;
        let top_band_center = plot_bottom - 2 * layout.band + layout.band / 2;
        let bottom_band_center = plot_bottom - layout.band + layout.band / 2;

        // Longest bar (top band) reaches the right end of the plot area.
        assert_eq!(
            *img.get_pixel(layout.left + layout.plot_w - 1, top_band_center),
            SKY_BLUE
        );
        // Shorter bar stops at a quarter of the plot width.
        assert_eq!(
            *img.get_pixel(layout.left + layout.plot_w / 2, bottom_band_center),
            WHITE
        );
        // Each band has its feature name to the left of the axis.
        let label_h = FONT_H * layout.label_scale;
        for center in [top_band_center, bottom_band_center] {
            assert!(any_ink(
                &img,
                0..layout.left - 1,
                center - label_h / 2..center + label_h / 2 + 1
            ));
        }
    }

    #[test]
    fn test_feature_importance_all_features_default_canvas() {
        let renderer = PngChartRenderer::default();
        let bars = all_features();
        let layout = renderer.bar_layout(&bars).expect("Should lay out");
        assert!(layout.plot_w > 0);
        assert!(layout.band * bars.len() as u32 <= layout.plot_h);

        let img = decode(&renderer.feature_importance(&bars).expect("Should render"));
        assert_eq!((img.width(), img.height()), (600, 400));
    }

    #[test]
    fn test_feature_importance_small_canvas_is_an_error() {
        let renderer = PngChartRenderer {
            cell_size: 140,
            bar_chart_size: (40, 10),
        };
        assert!(matches!(
            renderer.feature_importance(&all_features()),
            Err(RenderError::CanvasTooSmall(_))
        ));
    }

    #[test]
    fn test_feature_importance_never_panics_on_small_canvases() {
        let bars = all_features();
        for width in [1, 5, 20, 60, 130, 250] {
            for height in [1, 10, 20, 30, 60] {
                let renderer = PngChartRenderer {
                    cell_size: 140,
                    bar_chart_size: (width, height),
                };
                match renderer.feature_importance(&bars) {
                    Ok(bytes) => assert!(bytes.starts_with(&PNG_SIGNATURE)),
                    Err(RenderError::CanvasTooSmall(_)) => {}
                    Err(other) => panic!("Unexpected error for {width}x{height}: {other}"),
                }
            }
        }
    }

    #[test]
    fn test_feature_importance_rejects_empty() {
        let renderer = PngChartRenderer::default();
        assert!(matches!(
            renderer.feature_importance(&[]),
            Err(RenderError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_font_covers_labels() {
        let titles = ["Confusion Matrix", "Feature Importance"];
        let texts = FEATURE_NAMES
            .iter()
            .chain(CLASS_LABELS.iter())
            .chain(titles.iter());
        for text in texts {
            for ch in text.chars().filter(|c| *c != ' ') {
                assert_ne!(glyph(ch), [0; 5], "no glyph for {ch:?} in {text:?}");
            }
        }
        assert_eq!(text_width("", 2), 0);
        assert_eq!(text_width("HB", 1), 7);
    }

    #[test]
    fn test_blues_endpoints() {
        assert_eq!(blues(0.0), Rgb(BLUES_LOW));
        assert_eq!(blues(1.0), Rgb(BLUES_HIGH));
        assert_eq!(blues(2.0), Rgb(BLUES_HIGH));
    }
}
