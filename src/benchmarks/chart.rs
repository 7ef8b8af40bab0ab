// Bar chart rendering for benchmark reports
//
// One PNG per test case: one bar per variant (height = mean duration),
// value labels above the bars, variant names under the axis. Bars from the
// same library (first word of the label) share a color.

use crate::benchmarks::font::{self, GLYPH_HEIGHT};
use crate::benchmarks::Report;
use crate::errors::{BenchError, ErrorKind, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use std::process::Command;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 500;
const LEFT: u32 = 80;
const RIGHT: u32 = 780;
const TOP: u32 = 70;
const BOTTOM: u32 = 410;
const GRID_LINES: u32 = 5;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([170, 170, 170]);
const PALETTE: [Rgb<u8>; 4] =
    [Rgb([21, 76, 121]), Rgb([68, 84, 199]), Rgb([196, 98, 45]), Rgb([62, 140, 84])];

/// `images/test_07.png` style path for the chart of test `index`
pub fn chart_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("test_{:02}.png", index))
}

/// Bar value label: the mean in seconds, two decimals
pub fn value_label(seconds: f64) -> String {
    format!("{:.2} s", seconds)
}

/// Unit that keeps the largest axis tick readable with two decimals
pub fn display_unit(max_seconds: f64) -> (&'static str, f64) {
    if max_seconds >= 1.0 {
        ("s", 1.0)
    } else if max_seconds >= 1e-3 {
        ("ms", 1e3)
    } else {
        ("us", 1e6)
    }
}

pub fn render(report: &Report) -> Result<RgbImage> {
    let means: Vec<f64> = report.results.iter().map(|r| r.mean).collect();
    if report.results.is_empty() || means.iter().any(|m| !m.is_finite() || *m < 0.0) {
        return Err(BenchError::new(
            ErrorKind::Chart,
            format!("Cannot chart '{}': means must be finite", report.test_name),
        ));
    }

    let max_mean = means.iter().copied().fold(0.0, f64::max);
    let (unit, factor) = display_unit(max_mean);
    // An all-zero chart still needs a non-zero axis
    let y_max = if max_mean > 0.0 { max_mean * 1.2 } else { 1.0 };
    let plot_h = (BOTTOM - TOP) as f64;
    let y_of = |seconds: f64| BOTTOM as i64 - ((seconds / y_max) * plot_h).round() as i64;

    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    let title = report.test_name.as_str();
    let title_x = (WIDTH as i64 - font::text_width(title, 2) as i64) / 2;
    font::draw_text(&mut img, title_x, 20, title, 2, INK);

    for step in 0..=GRID_LINES {
        let value = y_max * step as f64 / GRID_LINES as f64;
        let y = y_of(value);
        if step > 0 {
            dashed_hline(&mut img, LEFT, RIGHT, y, GRID);
        }
        let tick = format!("{:.2}", value * factor);
        let tick_x = LEFT as i64 - 6 - font::text_width(&tick, 1) as i64;
        font::draw_text(&mut img, tick_x, y - GLYPH_HEIGHT as i64 / 2, &tick, 1, INK);
    }
    font::draw_text(&mut img, 8, TOP as i64 - 22, &format!("Duration [{}]", unit), 1, INK);

    let families = family_colors(report);
    let n = report.results.len() as u32;
    let slot = (RIGHT - LEFT) / n;
    let bar_w = slot * 3 / 5;

    for (i, result) in report.results.iter().enumerate() {
        let x = LEFT + slot * i as u32 + (slot - bar_w) / 2;
        let top = y_of(result.mean).clamp(TOP as i64, BOTTOM as i64) as u32;
        let h = BOTTOM - top;

        fill_rect(&mut img, x, top, bar_w, h, INK);
        if bar_w > 6 && h > 6 {
            fill_rect(&mut img, x + 3, top + 3, bar_w - 6, h - 3, families[i]);
        }

        let value = value_label(result.mean);
        let value_x = x as i64 + (bar_w as i64 - font::text_width(&value, 1) as i64) / 2;
        font::draw_text(&mut img, value_x, top as i64 - 12, &value, 1, INK);

        let label_x =
            x as i64 + (bar_w as i64 - font::text_width(&result.label, 1) as i64) / 2;
        font::draw_text(&mut img, label_x, BOTTOM as i64 + 10, &result.label, 1, INK);
    }

    // Axes on top of everything else
    fill_rect(&mut img, LEFT, TOP, 2, BOTTOM - TOP + 1, INK);
    fill_rect(&mut img, LEFT, BOTTOM, RIGHT - LEFT, 2, INK);

    let xlabel = "Library";
    let xlabel_x = (WIDTH as i64 - font::text_width(xlabel, 2) as i64) / 2;
    font::draw_text(&mut img, xlabel_x, HEIGHT as i64 - 40, xlabel, 2, INK);

    Ok(img)
}

/// Render `report` and write it to `output_dir`, creating the directory
/// if needed. Returns the path written.
pub fn save(report: &Report, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .map_err(|e| BenchError::from(e).with_context(output_dir.display().to_string()))?;

    let path = chart_path(output_dir, report.index);
    render(report)?
        .save(&path)
        .map_err(|e| BenchError::from(e).with_context(path.display().to_string()))?;

    tracing::debug!(target: "frame_duel::chart", path = %path.display(), "chart written");
    Ok(path)
}

/// Hand the image to the platform viewer without waiting for it to close
pub fn open_in_viewer(path: &Path) -> Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };

    command.arg(path).spawn().map_err(|e| {
        BenchError::from(e)
            .with_context(format!("opening {}", path.display()))
            .with_help("run without --show on headless machines")
    })?;
    Ok(())
}

fn family_colors(report: &Report) -> Vec<Rgb<u8>> {
    let mut seen: Vec<&str> = Vec::new();
    report
        .results
        .iter()
        .map(|r| {
            let family = r.label.split_whitespace().next().unwrap_or("");
            let idx = match seen.iter().position(|f| *f == family) {
                Some(idx) => idx,
                None => {
                    seen.push(family);
                    seen.len() - 1
                }
            };
            PALETTE[idx % PALETTE.len()]
        })
        .collect()
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    // Rect::of_size rejects empty sizes
    if w == 0 || h == 0 {
        return;
    }
    draw_filled_rect_mut(img, Rect::at(x as i32, y as i32).of_size(w, h), color);
}

const DASH: u32 = 6;

fn dashed_hline(img: &mut RgbImage, x0: u32, x1: u32, y: i64, color: Rgb<u8>) {
    if y < 0 || y >= img.height() as i64 {
        return;
    }
    let end = x1.min(img.width());
    let mut start = x0;
    while start < end {
        let stop = (start + DASH - 1).min(end - 1);
        draw_line_segment_mut(img, (start as f32, y as f32), (stop as f32, y as f32), color);
        start += DASH * 2;
    }
}
