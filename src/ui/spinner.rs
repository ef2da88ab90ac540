/// Pulse spinner
/// Drawn in place of an image slot until the slot settles
use iced::widget::canvas::{self, Path, Stroke};
use iced::{Color, Point, Rectangle};

use crate::Message;

/// Accent color shared with the rest of the list
pub const ACCENT: Color = Color {
    r: 0.231,
    g: 0.510,
    b: 0.965,
    a: 1.0,
};

/// One frame of the spinner animation
#[derive(Debug, Clone, Copy)]
pub struct Spinner {
    /// Animation progress in [0, 1)
    pub phase: f32,
}

impl Spinner {
    /// Ring grows from a third of the slot to full size while fading out
    fn ring(&self) -> (f32, f32) {
        let scale = 0.33 + 0.67 * (self.phase / 0.8).min(1.0);
        let alpha = if self.phase < 0.8 { 1.0 - self.phase / 0.8 } else { 0.0 };
        (scale, alpha)
    }

    /// Dot breathes between 80% and 100% of half the slot
    fn dot_scale(&self) -> f32 {
        let wave = (self.phase * std::f32::consts::TAU).cos();
        0.9 - 0.1 * wave
    }
}

impl canvas::Program<Message> for Spinner {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &iced::Theme,
        bounds: Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
        let radius = bounds.width.min(bounds.height) / 2.0;

        let (ring_scale, ring_alpha) = self.ring();
        if ring_alpha > 0.0 {
            let ring = Path::circle(center, (radius - 1.5) * ring_scale);
            frame.stroke(
                &ring,
                Stroke::default()
                    .with_color(Color { a: ring_alpha, ..ACCENT })
                    .with_width(3.0),
            );
        }

        let dot = Path::circle(center, radius * 0.5 * self.dot_scale());
        frame.fill(&dot, ACCENT);

        vec![frame.into_geometry()]
    }
}
