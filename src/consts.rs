//! Shared constants for the stage.

// ── Scheduling ──────────────────────────────────────────────────

/// Frame rate armed when a stage is created without an explicit setting.
pub const DEFAULT_FRAME_RATE: f64 = 20.0;

/// Milliseconds per second; the tick interval is `MS_PER_SECOND / frame_rate`.
pub const MS_PER_SECOND: f64 = 1000.0;

// ── Cursor ──────────────────────────────────────────────────────

/// Cursor shown while the hit target is in button mode.
pub const CURSOR_POINTER: &str = "pointer";

/// Empty cursor value; restores the surface's default cursor.
pub const CURSOR_DEFAULT: &str = "";
