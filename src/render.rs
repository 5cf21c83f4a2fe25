//! [`Surface`] over an `HtmlCanvasElement` and its 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! Fallible `Canvas2D` calls surface as [`StageError::Surface`].

use std::f64::consts::PI;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::error::StageError;
use crate::geom::{Point, Rect};
use crate::surface::Surface;
use crate::tree::Graphic;

/// Canvas element plus the 2D context drawn into.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Acquire the canvas's 2D context.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::MissingContext`] if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, StageError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|err| StageError::MissingContext(describe(&err)))?
            .ok_or_else(|| StageError::MissingContext("canvas returned no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| StageError::MissingContext("context is not a CanvasRenderingContext2d".into()))?;
        Ok(Self { canvas, ctx })
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> f64 {
        f64::from(self.canvas.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.canvas.height())
    }

    fn offset(&self) -> Point {
        Point::new(f64::from(self.canvas.offset_left()), f64::from(self.canvas.offset_top()))
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.ctx.clear_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn set_cursor(&mut self, cursor: &str) -> Result<(), StageError> {
        self.canvas.style().set_property("cursor", cursor).map_err(js_error)
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn transform(&mut self, x: f64, y: f64, scale_x: f64, scale_y: f64) -> Result<(), StageError> {
        self.ctx.translate(x, y).map_err(js_error)?;
        self.ctx.scale(scale_x, scale_y).map_err(js_error)
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn draw(&mut self, graphic: &Graphic) -> Result<(), StageError> {
        self.ctx.set_fill_style_str(graphic.fill());
        match graphic {
            Graphic::Rect { width, height, .. } => {
                self.ctx.fill_rect(0.0, 0.0, *width, *height);
            }
            Graphic::Ellipse { width, height, .. } => {
                if *width <= 0.0 || *height <= 0.0 {
                    return Ok(());
                }
                let (rx, ry) = (width / 2.0, height / 2.0);
                self.ctx.begin_path();
                self.ctx.ellipse(rx, ry, rx, ry, 0.0, 0.0, 2.0 * PI).map_err(js_error)?;
                self.ctx.fill();
            }
        }
        Ok(())
    }
}

/// Convert a thrown JS value into a surface error.
pub(crate) fn js_error(err: JsValue) -> StageError {
    StageError::Surface(describe(&err))
}

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}
