//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid, deterministic output.
//!
//! Plot elements:
//! - calibration points `(Ls, dLs)`: `o`
//! - fitted correction `A·sin(2π(Ls - C)/360) + B`: `-` line over Ls in [0, 360]

use crate::domain::Harmonic;
use crate::fit::FitReport;

const LS_MIN: f64 = 0.0;
const LS_MAX: f64 = 360.0;

/// Render the calibration points and the fitted correction.
pub fn render_fit_plot(report: &FitReport, width: usize, height: usize) -> String {
    let width = width.max(9);
    let height = height.max(5);

    let points: Vec<(f64, f64)> = report.points.iter().map(|p| (p.ls, p.d_ls)).collect();
    let curve = sample_curve(&report.harmonic, width);
    render_plot(&points, &curve, width, height)
}

fn render_plot(points: &[(f64, f64)], curve: &[(f64, f64)], width: usize, height: usize) -> String {
    let (y_min, y_max) = y_range(points, curve).unwrap_or((-1.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    draw_curve(&mut grid, curve, y_min, y_max);

    for &(ls, d_ls) in points {
        let x = map_x(ls, width);
        let y = map_y(d_ls, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: Ls=[{LS_MIN:.0}, {LS_MAX:.0}] deg | dLs=[{y_min:.2}, {y_max:.2}] deg\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn sample_curve(harmonic: &Harmonic, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let ls = LS_MIN + u * (LS_MAX - LS_MIN);
            (ls, harmonic.correction(ls))
        })
        .collect()
}

fn y_range(points: &[(f64, f64)], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points.iter().chain(curve) {
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        // Flat correction: centre it.
        Some((min_y - 1.0, min_y + 1.0))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(ls: f64, width: usize) -> usize {
    let u = ((ls - LS_MIN) / (LS_MAX - LS_MIN)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(ls, y) in curve {
        let x = map_x(ls, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
