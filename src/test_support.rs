//! In-memory [`Surface`] and [`Ticker`] doubles shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::StageConfig;
use crate::error::StageError;
use crate::geom::{Point, Rect};
use crate::stage::{StageCore, Ticker};
use crate::surface::Surface;
use crate::tree::Graphic;

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Clear(Rect),
    Cursor(String),
    Save,
    Restore,
    Transform(f64, f64, f64, f64),
    Alpha(f64),
    Draw(String),
}

/// Surface that records every call instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub width: f64,
    pub height: f64,
    pub offset: Point,
    pub ops: Vec<Op>,
    pub cursor: String,
    /// When set, `draw` fails with this message.
    pub fail_draw: Option<String>,
    /// When set, `set_cursor` fails with this message.
    pub fail_cursor: Option<String>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, ..Self::default() }
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = Point::new(x, y);
        self
    }

    /// Fill colors of every draw call, in order.
    pub fn draws(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Draw(fill) => Some(fill.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clears(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Clear(rect) => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.ops.clear();
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn offset(&self) -> Point {
        self.offset
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.ops.push(Op::Clear(rect));
    }

    fn set_cursor(&mut self, cursor: &str) -> Result<(), StageError> {
        if let Some(message) = &self.fail_cursor {
            return Err(StageError::Surface(message.clone()));
        }
        self.cursor = cursor.to_string();
        self.ops.push(Op::Cursor(cursor.to_string()));
        Ok(())
    }

    fn save(&mut self) {
        self.ops.push(Op::Save);
    }

    fn restore(&mut self) {
        self.ops.push(Op::Restore);
    }

    fn transform(&mut self, x: f64, y: f64, scale_x: f64, scale_y: f64) -> Result<(), StageError> {
        self.ops.push(Op::Transform(x, y, scale_x, scale_y));
        Ok(())
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.ops.push(Op::Alpha(alpha));
    }

    fn draw(&mut self, graphic: &Graphic) -> Result<(), StageError> {
        if let Some(message) = &self.fail_draw {
            return Err(StageError::Surface(message.clone()));
        }
        self.ops.push(Op::Draw(graphic.fill().to_string()));
        Ok(())
    }
}

/// What a [`CountingTicker`] has been asked to do.
#[derive(Debug, Default)]
pub struct TickerLog {
    pub armed: Vec<f64>,
    pub cancels: usize,
    pub active: bool,
}

/// Ticker that only records arm/cancel calls. Clone the log handle before
/// boxing the ticker to inspect it afterwards.
#[derive(Debug, Default, Clone)]
pub struct CountingTicker {
    pub log: Rc<RefCell<TickerLog>>,
}

impl Ticker for CountingTicker {
    fn arm(&mut self, interval_ms: f64) {
        let mut log = self.log.borrow_mut();
        log.armed.push(interval_ms);
        log.active = true;
    }

    fn cancel(&mut self) {
        let mut log = self.log.borrow_mut();
        log.cancels += 1;
        log.active = false;
    }
}

/// A stage over a counting ticker, plus the ticker's log.
pub fn stage_with(config: StageConfig) -> (StageCore, Rc<RefCell<TickerLog>>) {
    let ticker = CountingTicker::default();
    let log = Rc::clone(&ticker.log);
    (StageCore::new(config, Box::new(ticker)), log)
}

pub fn stage() -> (StageCore, Rc<RefCell<TickerLog>>) {
    stage_with(StageConfig::default())
}

pub fn red_square(size: f64) -> Graphic {
    Graphic::Rect { width: size, height: size, fill: "red".into() }
}

pub fn rect(width: f64, height: f64, fill: &str) -> Graphic {
    Graphic::Rect { width, height, fill: fill.into() }
}
