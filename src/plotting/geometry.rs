//! Pixel geometry for the time-series chart: value scaling, y-axis ticks,
//! smoothed paths and pointer hit testing.

use std::fmt::Write as _;

/// Fractions of the scaled maximum at which y-axis ticks are placed
pub const TICK_FRACTIONS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Default headroom above the tallest point
pub const DEFAULT_HEADROOM: f64 = 1.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Linear mapping from data space to the plot's pixel space.
///
/// Values map from `[0, max]` onto `[height - padding, padding]`; indices are
/// spread evenly across `[padding, width - padding]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScale {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    /// Top of the value axis, headroom included
    pub max: f64,
}

impl ChartScale {
    /// A data maximum that is not positive is floored at 1.
    pub fn new(data_max: f64, width: f64, height: f64, padding: f64, headroom: f64) -> Self {
        let data_max = if data_max > 0.0 { data_max } else { 1.0 };
        Self {
            width,
            height,
            padding,
            max: data_max * headroom,
        }
    }

    fn plot_width(&self) -> f64 {
        (self.width - 2.0 * self.padding).max(0.0)
    }

    fn plot_height(&self) -> f64 {
        (self.height - 2.0 * self.padding).max(0.0)
    }

    /// Horizontal pixel of point `index` out of `count`.
    pub fn x(&self, index: usize, count: usize) -> f64 {
        if count <= 1 {
            return self.padding;
        }
        self.padding + index as f64 * self.plot_width() / (count - 1) as f64
    }

    /// Vertical pixel of `value`.
    pub fn y(&self, value: f64) -> f64 {
        self.height - self.padding - (value / self.max) * self.plot_height()
    }

    /// Nearest point index for a pointer at horizontal pixel `x`.
    pub fn index_at(&self, x: f64, count: usize) -> Option<usize> {
        match count {
            0 => None,
            1 => Some(0),
            _ => {
                let step = self.plot_width() / (count - 1) as f64;
                if step <= 0.0 || !x.is_finite() {
                    return Some(0);
                }
                let raw = ((x - self.padding) / step).round();
                Some(raw.clamp(0.0, (count - 1) as f64) as usize)
            }
        }
    }

    /// The five y-axis ticks, bottom to top.
    pub fn ticks(&self) -> Vec<Tick> {
        TICK_FRACTIONS
            .iter()
            .map(|fraction| {
                let value = self.max * fraction;
                Tick {
                    value,
                    y: self.y(value),
                    label: format!("{}", value.round() as i64),
                }
            })
            .collect()
    }
}

/// A y-axis tick. Labels are rounded, so small ranges can repeat a label.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub y: f64,
    pub label: String,
}

/// Map a series of values to pixel points under `scale`.
pub fn scale_to_pixels(values: &[f64], scale: &ChartScale) -> Vec<Point> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Point::new(scale.x(i, values.len()), scale.y(*v)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    QuadTo { ctrl: Point, to: Point },
}

/// A smoothed polyline made of quadratic segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SmoothPath {
    commands: Vec<PathCommand>,
}

/// Smooth a polyline with midpoint control points.
///
/// Between each pair `(c, n)` two quadratic segments are emitted around the
/// horizontal midpoint `mx`: one controlled by `(mx, c.y)` ending at the pair's
/// midpoint, one controlled by `(mx, n.y)` ending at `n`. The curve passes
/// through every input point and is flat at each of them.
pub fn build_smooth_path(points: &[Point]) -> SmoothPath {
    let Some(first) = points.first() else {
        return SmoothPath::default();
    };

    let mut commands = Vec::with_capacity(1 + 2 * points.len().saturating_sub(1));
    commands.push(PathCommand::MoveTo(*first));

    for pair in points.windows(2) {
        let (cur, next) = (pair[0], pair[1]);
        let mid = cur.midpoint(&next);
        commands.push(PathCommand::QuadTo {
            ctrl: Point::new(mid.x, cur.y),
            to: mid,
        });
        commands.push(PathCommand::QuadTo {
            ctrl: Point::new(mid.x, next.y),
            to: next,
        });
    }

    SmoothPath { commands }
}

fn fmt_coord(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

impl SmoothPath {
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn endpoints(&self) -> Option<(Point, Point)> {
        let first = match self.commands.first()? {
            PathCommand::MoveTo(p) => *p,
            PathCommand::QuadTo { to, .. } => *to,
        };
        let last = match self.commands.last()? {
            PathCommand::MoveTo(p) => *p,
            PathCommand::QuadTo { to, .. } => *to,
        };
        Some((first, last))
    }

    /// SVG path data (`M x y Q cx cy x y ...`).
    pub fn to_svg_d(&self) -> String {
        let mut d = String::new();
        for cmd in &self.commands {
            if !d.is_empty() {
                d.push(' ');
            }
            // Writing into a String cannot fail
            let _ = match cmd {
                PathCommand::MoveTo(p) => write!(d, "M {} {}", fmt_coord(p.x), fmt_coord(p.y)),
                PathCommand::QuadTo { ctrl, to } => write!(
                    d,
                    "Q {} {} {} {}",
                    fmt_coord(ctrl.x),
                    fmt_coord(ctrl.y),
                    fmt_coord(to.x),
                    fmt_coord(to.y)
                ),
            };
        }
        d
    }

    /// The path closed down to `baseline_y`, for filled areas under a line.
    pub fn to_area_d(&self, baseline_y: f64) -> String {
        let Some((first, last)) = self.endpoints() else {
            return String::new();
        };
        format!(
            "{} L {} {} L {} {} Z",
            self.to_svg_d(),
            fmt_coord(last.x),
            fmt_coord(baseline_y),
            fmt_coord(first.x),
            fmt_coord(baseline_y)
        )
    }

    /// Approximate the curve with straight lines, `steps` per quadratic segment.
    pub fn flatten(&self, steps: usize) -> Vec<Point> {
        let steps = steps.max(1);
        let mut out = Vec::new();
        let mut cursor: Option<Point> = None;

        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    out.push(p);
                    cursor = Some(p);
                }
                PathCommand::QuadTo { ctrl, to } => {
                    let from = cursor.unwrap_or(ctrl);
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        let u = 1.0 - t;
                        out.push(Point::new(
                            u * u * from.x + 2.0 * u * t * ctrl.x + t * t * to.x,
                            u * u * from.y + 2.0 * u * t * ctrl.y + t * t * to.y,
                        ));
                    }
                    cursor = Some(to);
                }
            }
        }
        out
    }
}
