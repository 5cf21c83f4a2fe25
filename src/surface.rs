//! The drawing capability a stage renders into.
//!
//! The browser implementation is [`crate::render::CanvasSurface`]. Keeping the
//! core behind this trait lets ticks, pointer dispatch and clip sequencing run
//! without a DOM.

use crate::error::StageError;
use crate::geom::{Point, Rect};
use crate::tree::Graphic;

/// Backing surface plus its 2D drawing context.
pub trait Surface {
    /// Surface width in pixels.
    fn width(&self) -> f64;

    /// Surface height in pixels.
    fn height(&self) -> f64;

    /// Offset of the surface's top-left corner from the page origin.
    fn offset(&self) -> Point;

    /// Clear a rectangle to transparent.
    fn clear_rect(&mut self, rect: Rect);

    /// Set the cursor shown over the surface. An empty string restores the default.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Surface`] if the style update is rejected.
    fn set_cursor(&mut self, cursor: &str) -> Result<(), StageError>;

    /// Push the current transform and alpha.
    fn save(&mut self);

    /// Pop back to the last saved transform and alpha.
    fn restore(&mut self);

    /// Translate then scale the current transform.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Surface`] if the context rejects the transform.
    fn transform(&mut self, x: f64, y: f64, scale_x: f64, scale_y: f64) -> Result<(), StageError>;

    /// Set the absolute alpha applied to subsequent drawing.
    fn set_alpha(&mut self, alpha: f64);

    /// Draw a graphic at the local origin.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Surface`] if a drawing call fails.
    fn draw(&mut self, graphic: &Graphic) -> Result<(), StageError>;
}
