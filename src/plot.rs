//! Static SVG rendering of metric curves against the load multiplier.

use crate::debug::format_f64;
use crate::metric::Metric;
use crate::registry::KnownNetwork;
use crate::sweep::SweepOutcome;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 420.0;
const LEFT: f64 = 70.0;
const RIGHT: f64 = 20.0;
const TOP: f64 = 40.0;
const BOTTOM: f64 = 50.0;
const TICK: f64 = 5.0;

/// One polyline of the plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub label: String,
    pub color: &'static str,
    /// `(dash, offset)` for a dashed stroke.
    pub dash: Option<(f64, f64)>,
    pub points: Vec<(f64, f64)>,
}

fn color(metric: Metric) -> &'static str {
    match metric {
        Metric::LIndex => "#808080",
        Metric::InjectionMargin => "#000000",
        Metric::SingleBranch => "#0E21A0",
        Metric::PathAccumulated => "#d62728",
    }
}

/// Critical-value curve of every metric in the outcome. On networks with a
/// single branch the two branch-level curves coincide, so they are dashed
/// out of phase to keep both visible.
pub fn curves(outcome: &SweepOutcome, nl: usize) -> Vec<Curve> {
    outcome
        .series
        .values()
        .map(|s| {
            let metric = s.metric();
            let dash = match metric {
                Metric::SingleBranch if nl == 1 => Some((6.0, 0.0)),
                Metric::PathAccumulated if nl == 1 => Some((6.0, 6.0)),
                _ => None,
            };
            Curve {
                label: metric.label().to_string(),
                color: color(metric),
                dash,
                points: s.critical_curve(),
            }
        })
        .collect()
}

/// Renders the plot of one network into `<out_dir>/metric_<plot name>.svg`.
pub fn write_plot(
    out_dir: &Path,
    known: &KnownNetwork,
    outcome: &SweepOutcome,
    nl: usize,
) -> io::Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(known.plot_file_name());
    let svg = render_svg(known.description, &curves(outcome, nl));
    fs::write(&path, svg)?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

/// Step between ticks for a range, rounded to 1, 2 or 5 times a power of
/// ten.
fn tick_step(span: f64, target: usize) -> f64 {
    let raw = span / target as f64;
    let mag = 10f64.powf(raw.log10().floor());
    let norm = raw / mag;
    let nice = if norm < 1.5 {
        1.0
    } else if norm < 3.0 {
        2.0
    } else if norm < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * mag
}

fn ticks(lo: f64, hi: f64) -> Vec<f64> {
    let step = tick_step(hi - lo, 5);
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < 1e-12 {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = 0.05 * (hi - lo);
    (lo - pad, hi + pad)
}

pub fn render_svg(title: &str, curves: &[Curve]) -> String {
    let all = || curves.iter().flat_map(|c| c.points.iter());
    let (x0, x1) = bounds(all().map(|p| p.0));
    let (y0, y1) = bounds(all().map(|p| p.1));

    let (pw, ph) = (WIDTH - LEFT - RIGHT, HEIGHT - TOP - BOTTOM);
    let sx = |x: f64| LEFT + (x - x0) / (x1 - x0) * pw;
    let sy = |y: f64| TOP + (1.0 - (y - y0) / (y1 - y0)) * ph;

    let mut s = String::new();
    // writing to a String cannot fail
    let _ = writeln!(
        s,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = writeln!(s, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        s,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="14">{}</text>"#,
        LEFT + pw / 2.0,
        TOP / 2.0 + 5.0,
        escape(title)
    );

    // grid and inward ticks
    for x in ticks(x0, x1) {
        let px = sx(x);
        let _ = writeln!(
            s,
            r##"<line x1="{px:.2}" y1="{t:.2}" x2="{px:.2}" y2="{b:.2}" stroke="#e6e6e6" stroke-width="0.5"/>"##,
            t = TOP,
            b = TOP + ph
        );
        let _ = writeln!(
            s,
            r#"<line x1="{px:.2}" y1="{b:.2}" x2="{px:.2}" y2="{bt:.2}" stroke="black"/>"#,
            b = TOP + ph,
            bt = TOP + ph - TICK
        );
        let _ = writeln!(
            s,
            r#"<text x="{px:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
            TOP + ph + 16.0,
            format_f64(x)
        );
    }
    for y in ticks(y0, y1) {
        let py = sy(y);
        let _ = writeln!(
            s,
            r##"<line x1="{l:.2}" y1="{py:.2}" x2="{r:.2}" y2="{py:.2}" stroke="#e6e6e6" stroke-width="0.5"/>"##,
            l = LEFT,
            r = LEFT + pw
        );
        let _ = writeln!(
            s,
            r#"<line x1="{l:.2}" y1="{py:.2}" x2="{lt:.2}" y2="{py:.2}" stroke="black"/>"#,
            l = LEFT,
            lt = LEFT + TICK
        );
        let _ = writeln!(
            s,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="end">{}</text>"#,
            LEFT - 6.0,
            py + 4.0,
            format_f64(y)
        );
    }
    let _ = writeln!(
        s,
        r#"<rect x="{LEFT}" y="{TOP}" width="{pw}" height="{ph}" fill="none" stroke="black"/>"#
    );
    let _ = writeln!(
        s,
        r#"<text x="{:.2}" y="{:.2}" text-anchor="middle">Load multiplier [-]</text>"#,
        LEFT + pw / 2.0,
        HEIGHT - 12.0
    );
    let _ = writeln!(
        s,
        r#"<text x="16" y="{:.2}" text-anchor="middle" transform="rotate(-90 16 {:.2})">Metric value [-]</text>"#,
        TOP + ph / 2.0,
        TOP + ph / 2.0
    );

    for c in curves.iter().filter(|c| !c.points.is_empty()) {
        let pts: Vec<String> = c
            .points
            .iter()
            .map(|&(x, y)| format!("{:.2},{:.2}", sx(x), sy(y)))
            .collect();
        let _ = writeln!(
            s,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="1.5"{}/>"#,
            pts.join(" "),
            c.color,
            dash_attr(c)
        );
    }

    // legend, no frame
    for (i, c) in curves.iter().enumerate() {
        let y = TOP + 14.0 + 16.0 * i as f64;
        let x = LEFT + pw - 190.0;
        let _ = writeln!(
            s,
            r#"<line x1="{:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="{}" stroke-width="1.5"{}/>"#,
            x,
            x + 20.0,
            c.color,
            dash_attr(c)
        );
        let _ = writeln!(
            s,
            r#"<text x="{:.2}" y="{:.2}">{}</text>"#,
            x + 26.0,
            y + 4.0,
            escape(&c.label)
        );
    }
    s.push_str("</svg>\n");
    s
}

fn dash_attr(c: &Curve) -> String {
    c.dash.map_or(String::new(), |(d, o)| {
        format!(r#" stroke-dasharray="{} {}" stroke-dashoffset="{}""#, d, d, o)
    })
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
