use super::MaskBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushMode {
    /// Remove opacity ("destination-out")
    Erase,
    /// Paint opacity back towards fully opaque ("source-over")
    Restore,
}

/// One dab of the manual edit tool, in native image pixels.
/// Consumed immediately by [`BrushStroke::apply`]; nothing is retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushStroke {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub mode: BrushMode,
}

impl BrushStroke {
    pub fn new(x: f32, y: f32, radius: f32, mode: BrushMode) -> Self {
        Self { x, y, radius, mode }
    }

    /// Brush strength at `dist` from the centre: 1.0 at the centre,
    /// falling linearly to 0.0 at the radius.
    fn strength(&self, dist: f32) -> f32 {
        if dist >= self.radius {
            0.0
        } else {
            1.0 - dist / self.radius
        }
    }

    /// Blend the dab into `mask`. Pixels outside the radius are untouched.
    ///
    /// Erase followed by restore with the same dab is only approximately
    /// the identity: it is exact at the centre and outside the radius, but
    /// the two falloffs compose differently in between.
    pub fn apply(&self, mask: &mut MaskBuffer) {
        if self.radius <= 0.0 || mask.is_empty() {
            return;
        }
        let _span = tracing::debug_span!("brush", mode = ?self.mode).entered();

        let (width, height) = mask.dimensions();
        let min_x = (self.x - self.radius).floor().max(0.0) as u32;
        let min_y = (self.y - self.radius).floor().max(0.0) as u32;
        let max_x = ((self.x + self.radius).ceil().max(0.0) as u32).min(width.saturating_sub(1));
        let max_y = ((self.y + self.radius).ceil().max(0.0) as u32).min(height.saturating_sub(1));

        if min_x >= width || min_y >= height {
            return;
        }

        let alpha = mask.as_gray_mut();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f32 - self.x;
                let dy = y as f32 - self.y;
                let s = self.strength((dx * dx + dy * dy).sqrt());
                if s <= 0.0 {
                    continue;
                }

                let pixel = alpha.get_pixel_mut(x, y);
                let a = pixel[0] as f32;
                let blended = match self.mode {
                    BrushMode::Erase => destination_out(a, s),
                    BrushMode::Restore => source_over(a, s),
                };
                pixel[0] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Existing alpha scaled down by the removal strength
fn destination_out(dst: f32, strength: f32) -> f32 {
    dst * (1.0 - strength)
}

/// Opaque paint laid over the existing alpha with coverage `strength`
fn source_over(dst: f32, strength: f32) -> f32 {
    255.0 * strength + dst * (1.0 - strength)
}
