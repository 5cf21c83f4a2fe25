//! Timeline-driven 2D display framework for the browser canvas.
//!
//! A [`stage::StageCore`] owns a display tree, redraws it on a fixed-interval
//! tick, resolves the pointer's hit target and dispatches synthetic stage
//! events, and drags display objects along with the pointer. Movie clips
//! advance a frame playhead on every render pass, honoring labels, pause
//! counts and goto redirects.
//!
//! The core never touches the DOM. The browser-bound [`web::Stage`] wires
//! canvas mouse events and a `gloo_timers` interval into it and renders through
//! [`render::CanvasSurface`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`stage`] | Render scheduler, drag controller, listener registry ([`stage::StageCore`]) |
//! | [`pointer`] | Pointer dispatch and hit-target tracking on [`stage::StageCore`] |
//! | [`timeline`] | Frame sequencing state machine for movie clips |
//! | [`tree`] | Display node store, hit-testing, coordinate conversion, render traversal |
//! | [`event`] | Pointer input, stage events, listener dispatch |
//! | [`geom`] | Points, rectangles, and local/parent transforms |
//! | [`surface`] | Drawing capability the core renders into |
//! | [`render`] | [`surface::Surface`] over a 2D canvas context |
//! | [`web`] | Browser wrapper: canvas listeners, interval timer, console logging |
//! | [`config`] | Stage settings |
//! | [`error`] | Crate-wide error type |
//! | [`consts`] | Shared constants (default frame rate, cursor names) |

pub mod config;
pub mod consts;
pub mod error;
pub mod event;
pub mod geom;
pub mod pointer;
pub mod render;
pub mod stage;
pub mod surface;
pub mod timeline;
pub mod tree;
pub mod web;

#[cfg(test)]
mod test_support;
