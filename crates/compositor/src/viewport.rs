//! Viewport transform math and surface presentation.
//!
//! [`Viewport`] is pure math and unit-testable without a GPU: it maps the
//! composited offscreen content onto the visible surface under the active fit
//! mode, zoom scale, pan position, and device pixel ratio. [`present`] issues
//! the single presentation draw each frame.
//!
//! Coordinate conventions: surface space is centered on the surface midpoint
//! (positive x right, positive y down); pan arrives in normalized `[0,1]²`
//! coordinates with `(0.5, 0.5)` meaning centered.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use strata_common::{BlendState, DrawCall, DrawUniforms, ProgramId, RenderBackend, Size};

use crate::error::CompositorResult;
use crate::offscreen::BufferPair;
use crate::pipeline::RenderStats;

/// Which image axis is matched to the surface when computing the base scale.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitMode {
    /// Surface width / image width.
    #[default]
    Width,
    /// Surface height / image height.
    Height,
}

/// Pan/zoom/fit state for presenting the composited image.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Viewport {
    /// Logical image size being presented.
    pub image_size: Size,
    pub fit: FitMode,
    /// Zoom scale; values below 1 behave as 1.
    pub zoom: f32,
    /// Pan position, normalized `[0,1]²`, DPR-scaled surface coordinates.
    pub pan: [f32; 2],
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(image_size: Size) -> Self {
        Self {
            image_size,
            fit: FitMode::Width,
            zoom: 1.0,
            pan: [0.5, 0.5],
            device_pixel_ratio: 1.0,
        }
    }

    /// Scale from logical image pixels to surface pixels under the fit mode.
    pub fn image_to_surface_scale(&self, surface: Vec2) -> f32 {
        match self.fit {
            FitMode::Width => surface.x / self.image_size.width as f32,
            FitMode::Height => surface.y / self.image_size.height as f32,
        }
    }

    /// Pan offset converted into logical image space and clamped per axis to
    /// half the image extent, so content can never be panned fully out of
    /// view.
    pub fn pan_offset(&self, surface: Vec2) -> Vec2 {
        if self.zoom <= 1.0 {
            return Vec2::ZERO;
        }
        let scale = self.image_to_surface_scale(surface);
        let raw =
            (Vec2::from(self.pan) - Vec2::splat(0.5)) * surface * self.device_pixel_ratio / scale;
        let half = self.image_size.as_vec2() * 0.5;
        raw.clamp(-half, half)
    }

    /// Center of the visible window in centered surface coordinates.
    ///
    /// The `(1 - 1/zoom)` factor anchors zooming at the pan point rather than
    /// the viewport center; at zoom 1 it vanishes, so pan has no visible
    /// effect.
    pub fn view_center(&self, surface: Vec2) -> Vec2 {
        let scale = self.image_to_surface_scale(surface);
        self.pan_offset(surface) * scale * (1.0 - 1.0 / self.zoom.max(1.0))
    }

    /// On-surface extent of the fitted image before zoom.
    pub fn fitted_size(&self, surface: Vec2) -> Vec2 {
        self.image_size.as_vec2() * self.image_to_surface_scale(surface)
    }

    /// Projection from centered surface coordinates to clip space, zoom
    /// window applied around the view center.
    pub fn projection(&self, surface: Vec2) -> Mat4 {
        let center = self.view_center(surface);
        let half = surface * 0.5 / self.zoom.max(1.0);
        Mat4::orthographic_rh(
            center.x - half.x,
            center.x + half.x,
            center.y + half.y,
            center.y - half.y,
            -1.0,
            1.0,
        )
    }
}

/// Draw the composited offscreen result onto the visible surface.
///
/// Runs every frame regardless of whether the offscreen content changed:
/// clear, then a single replace-blend quad sampling the write target.
pub fn present(
    backend: &dyn RenderBackend,
    viewport: &Viewport,
    pair: &BufferPair,
    surface: Vec2,
    stats: &mut RenderStats,
) -> CompositorResult<()> {
    backend.clear(None, [0.0, 0.0, 0.0, 1.0])?;
    stats.clears += 1;

    let fitted = viewport.fitted_size(surface);
    // Unit quad scaled to the fitted extent, centered on the origin.
    let model = Mat4::from_scale(Vec3::new(fitted.x, fitted.y, 1.0))
        * Mat4::from_translation(Vec3::new(-0.5, -0.5, 0.0));
    let mvp = viewport.projection(surface) * model;

    backend.draw(&DrawCall {
        target: None,
        program: ProgramId::Present,
        blend: BlendState::Replace,
        uniforms: DrawUniforms::quad(mvp, pair.write.color.handle),
    })?;
    stats.draws += 1;

    debug!(zoom = viewport.zoom, fit = ?viewport.fit, "Presented frame");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport_1000() -> Viewport {
        Viewport::new(Size::new(1000, 1000))
    }

    #[test]
    fn fit_width_divides_surface_width() {
        let mut vp = viewport_1000();
        vp.fit = FitMode::Width;
        assert!((vp.image_to_surface_scale(Vec2::new(500.0, 800.0)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fit_height_divides_surface_height() {
        let mut vp = viewport_1000();
        vp.fit = FitMode::Height;
        assert!((vp.image_to_surface_scale(Vec2::new(500.0, 800.0)) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn pan_offset_clamps_to_half_image_extent() {
        let mut vp = viewport_1000();
        vp.zoom = 4.0;
        vp.device_pixel_ratio = 2.0;
        let surface = Vec2::new(500.0, 500.0);
        for pan in [[50.0, -30.0], [1.0, 1.0], [-8.0, 9.0], [0.5, 0.5]] {
            vp.pan = pan;
            let offset = vp.pan_offset(surface);
            assert!(offset.x.abs() <= 500.0 + 1e-3, "pan {pan:?} gave {offset}");
            assert!(offset.y.abs() <= 500.0 + 1e-3, "pan {pan:?} gave {offset}");
        }
    }

    #[test]
    fn zoom_one_makes_pan_invisible() {
        let mut vp = viewport_1000();
        vp.zoom = 1.0;
        let surface = Vec2::new(640.0, 480.0);
        for pan in [[0.0, 0.0], [0.25, 0.75], [1.0, 1.0]] {
            vp.pan = pan;
            assert_eq!(vp.view_center(surface), Vec2::ZERO);
        }
    }

    #[test]
    fn zoom_correction_anchors_at_pan_point() {
        let mut vp = viewport_1000();
        vp.zoom = 2.0;
        vp.pan = [1.0, 0.5];
        let surface = Vec2::new(1000.0, 1000.0);
        // Factor (1 - 1/2) halves the raw surface-space offset.
        let expected = vp.pan_offset(surface) * vp.image_to_surface_scale(surface) * 0.5;
        assert_eq!(vp.view_center(surface), expected);
    }

    #[test]
    fn centered_pan_centers_view_at_any_zoom() {
        let mut vp = viewport_1000();
        vp.pan = [0.5, 0.5];
        for zoom in [1.0, 2.0, 8.0] {
            vp.zoom = zoom;
            assert_eq!(vp.view_center(Vec2::new(800.0, 600.0)), Vec2::ZERO);
        }
    }

    #[test]
    fn fitted_size_preserves_aspect_ratio() {
        let mut vp = Viewport::new(Size::new(2000, 1000));
        vp.fit = FitMode::Width;
        let fitted = vp.fitted_size(Vec2::new(1000.0, 1000.0));
        assert!((fitted.x - 1000.0).abs() < 1e-4);
        assert!((fitted.y - 500.0).abs() < 1e-4);
    }
}
