//! View transform for the editor canvas.
//!
//! Zoom and pan only change how the image is shown; they never touch the
//! source or the mask. The transform is needed to map pointer positions
//! back to native pixels for brush input and prompt points.

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 4.0;
pub const ZOOM_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    native: (u32, u32),
    container: (f32, f32),
    zoom: f32,
    pan: (f32, f32),
}

impl Viewport {
    /// Fit a `native`-sized image into a `container` ("contain", never upscaled)
    pub fn new(native: (u32, u32), container: (f32, f32)) -> Self {
        Self {
            native,
            container,
            zoom: 1.0,
            pan: (0.0, 0.0),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> (f32, f32) {
        self.pan
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        // keep steps on the 0.1 grid
        let snapped = (zoom * 10.0).round() / 10.0;
        self.zoom = snapped.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan.0 += dx;
        self.pan.1 += dy;
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = (0.0, 0.0);
    }

    pub fn resize_container(&mut self, width: f32, height: f32) {
        self.container = (width, height);
    }

    fn fit_scale(&self) -> f32 {
        let (nw, nh) = (self.native.0.max(1) as f32, self.native.1.max(1) as f32);
        (self.container.0 / nw).min(self.container.1 / nh).min(1.0)
    }

    /// On-screen size of the image, zoom included
    pub fn displayed_size(&self) -> (f32, f32) {
        let s = self.fit_scale() * self.zoom;
        (self.native.0 as f32 * s, self.native.1 as f32 * s)
    }

    /// Screen position of the image's top-left corner
    pub fn origin(&self) -> (f32, f32) {
        let (dw, dh) = self.displayed_size();
        (
            self.container.0 / 2.0 - dw / 2.0 + self.pan.0 * self.zoom,
            self.container.1 / 2.0 - dh / 2.0 + self.pan.1 * self.zoom,
        )
    }

    /// Native pixels per screen pixel
    pub fn scale(&self) -> f32 {
        let (dw, _) = self.displayed_size();
        if dw <= 0.0 {
            return 1.0;
        }
        self.native.0 as f32 / dw
    }

    /// Map a pointer position to native image coordinates
    pub fn screen_to_image(&self, sx: f32, sy: f32) -> (f32, f32) {
        let (ox, oy) = self.origin();
        let scale = self.scale();
        ((sx - ox) * scale, (sy - oy) * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-3 && (a.1 - b.1).abs() < 1e-3
    }

    #[test]
    fn test_fit_downscales_wide_image() {
        let view = Viewport::new((1000, 500), (500.0, 500.0));
        assert!(approx(view.displayed_size(), (500.0, 250.0)));
        assert!(approx(view.origin(), (0.0, 125.0)));
        assert!(approx(view.screen_to_image(250.0, 250.0), (500.0, 250.0)));
        assert!((view.scale() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let view = Viewport::new((100, 100), (800.0, 600.0));
        assert!(approx(view.displayed_size(), (100.0, 100.0)));
        assert!(approx(view.screen_to_image(400.0, 300.0), (50.0, 50.0)));
    }

    #[test]
    fn test_zoom_and_pan_move_the_mapping() {
        let mut view = Viewport::new((1000, 500), (500.0, 500.0));
        view.set_zoom(2.0);
        assert!(approx(view.screen_to_image(250.0, 250.0), (500.0, 250.0)));

        view.pan_by(10.0, 0.0);
        // pan is applied inside the scale, so 10px of pan moves 20 screen px
        assert!(approx(view.screen_to_image(270.0, 250.0), (500.0, 250.0)));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = Viewport::new((10, 10), (10.0, 10.0));
        for _ in 0..100 {
            view.zoom_in();
        }
        assert_eq!(view.zoom(), MAX_ZOOM);
        for _ in 0..100 {
            view.zoom_out();
        }
        assert_eq!(view.zoom(), MIN_ZOOM);
        view.reset();
        assert_eq!(view.zoom(), 1.0);
    }
}
