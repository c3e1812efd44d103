use crate::engine::{Color, Rect, Renderer, Screen};
use crate::loader::style::VisualStyle;

/// Rounded loading bar centered near the bottom of the canvas
/// ┌──────────────────── width ────────────────────┐
/// │ margin ┌──── fill (inner width * progress) ──┐ │
/// │        └─────────────────────────────────────┘ │
/// └────────────────────────────────────────────────┘
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressBar {
    width: f32,
    height: f32,
    margin: f32,
    bottom_offset: f32,
    radius: f32,
    fill_radius: f32,
    min_fill_width: f32,
    line_width: f32,
}

impl ProgressBar {
    pub fn from_style(style: &VisualStyle) -> Self {
        ProgressBar {
            width: style.bar_width,
            height: style.bar_height,
            margin: style.bar_margin,
            bottom_offset: style.bar_bottom_offset,
            radius: style.bar_radius,
            fill_radius: style.fill_radius,
            min_fill_width: style.min_fill_width,
            line_width: style.line_width,
        }
    }

    pub fn outline(&self, screen: &Screen) -> Rect {
        Rect::new(
            screen.width / 2.0 - self.width / 2.0,
            screen.height - self.bottom_offset,
            self.width,
            self.height,
        )
    }

    /// inner bar, its width tracks progress but never drops below the minimum
    pub fn fill(&self, screen: &Screen, progress: f32) -> Rect {
        let outline = self.outline(screen);
        let inner_width = (self.width - self.margin * 2.0).max(0.0);
        let width = (inner_width * progress.clamp(0.0, 1.0)).max(self.min_fill_width);
        Rect::new(
            outline.x + self.margin,
            outline.y + self.margin,
            width,
            (self.height - self.margin * 2.0).max(0.0),
        )
    }

    pub fn draw_loading(&self, renderer: &Renderer, screen: &Screen, progress: f32, color: &Color) {
        renderer.round_rect(
            &self.outline(screen),
            self.radius,
            Some(color),
            None,
            self.line_width,
        );
        renderer.round_rect(
            &self.fill(screen, progress),
            self.fill_radius,
            None,
            Some(color),
            self.line_width,
        );
    }

    /// only the full inner bar, at `opacity`
    pub fn draw_fading(&self, renderer: &Renderer, screen: &Screen, opacity: f32, color: &Color) {
        if opacity <= 0.0 {
            return;
        }
        let faded = color.with_alpha(color.a * opacity);
        renderer.round_rect(
            &self.fill(screen, 1.0),
            self.fill_radius,
            Some(&faded),
            Some(&faded),
            self.line_width,
        );
    }
}
