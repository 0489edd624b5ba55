use plotters::style::{RGBAColor, RGBColor};

/// Chart theme configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTheme {
    pub background_color: RGBAColor,
    pub text_color: RGBAColor,
    pub grid_color: RGBAColor,
    pub axis_color: RGBAColor,
    pub hover_color: RGBAColor,
    /// Series colors, cycled when there are more series than colors
    pub palette: Vec<RGBColor>,
}

impl ChartTheme {
    pub fn series_color(&self, index: usize) -> RGBColor {
        if self.palette.is_empty() {
            return RGBColor(255, 255, 255);
        }
        self.palette[index % self.palette.len()]
    }
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background_color: RGBAColor(0, 0, 0, 0.94),
            text_color: RGBAColor(255, 255, 255, 0.8),
            grid_color: RGBAColor(255, 255, 255, 0.15),
            axis_color: RGBAColor(255, 255, 255, 0.8),
            hover_color: RGBAColor(255, 255, 255, 0.4),
            palette: vec![
                RGBColor(59, 130, 246),
                RGBColor(16, 185, 129),
                RGBColor(245, 158, 11),
                RGBColor(239, 68, 68),
                RGBColor(139, 92, 246),
                RGBColor(236, 72, 153),
                RGBColor(107, 114, 128),
            ],
        }
    }
}

/// Chart style configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub line_width: u32,
    pub font_size: u32,
    /// Straight segments per quadratic curve when rasterizing smoothed paths
    pub curve_steps: usize,
    pub marker_radius: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            line_width: 2,
            font_size: 12,
            curve_steps: 8,
            marker_radius: 4,
        }
    }
}
