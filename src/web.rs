//! Browser wrapper: binds a [`StageCore`] to a canvas element.
//!
//! [`Stage`] owns the core and a [`CanvasSurface`] behind an `Rc<RefCell<_>>`
//! shared with the callbacks it registers: one canvas listener per mouse phase
//! and a `gloo_timers` interval driving [`StageCore::tick`]. Callbacks hold weak
//! references, so dropping the `Stage` is enough to stop everything.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Interval;
use js_sys::Date;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{HtmlCanvasElement, MouseEvent};

use crate::config::StageConfig;
use crate::error::StageError;
use crate::event::{PointerInput, PointerKind};
use crate::render::{CanvasSurface, js_error};
use crate::stage::{StageCore, Ticker};

/// Install `console_log` as the `log` backend.
///
/// # Errors
///
/// Returns [`StageError::Logger`] if a logger is already installed.
pub fn init_console_logging(level: log::Level) -> Result<(), StageError> {
    console_log::init_with_level(level).map_err(|err| StageError::Logger(err.to_string()))
}

struct StageInner {
    core: StageCore,
    surface: CanvasSurface,
}

type MouseListener = Closure<dyn FnMut(MouseEvent)>;

/// A stage rendering into a browser canvas.
pub struct Stage {
    inner: Rc<RefCell<StageInner>>,
    canvas: HtmlCanvasElement,
    listeners: Vec<(PointerKind, MouseListener)>,
}

impl Stage {
    /// Bind a stage to `canvas`, register its mouse listeners and arm the
    /// tick timer at `config.frame_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::MissingContext`] if the canvas has no 2D context,
    /// or [`StageError::Surface`] if a listener cannot be registered.
    pub fn new(canvas: HtmlCanvasElement, config: StageConfig) -> Result<Self, StageError> {
        let surface = CanvasSurface::new(canvas.clone())?;
        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<StageInner>>| {
            let ticker = IntervalTicker { stage: weak.clone(), interval: None };
            RefCell::new(StageInner { core: StageCore::new(config, Box::new(ticker)), surface })
        });

        let mut stage = Self { inner, canvas, listeners: Vec::new() };
        for kind in [PointerKind::Down, PointerKind::Up, PointerKind::Move] {
            stage.listen(kind)?;
        }
        log::debug!("stage bound to canvas");
        Ok(stage)
    }

    fn listen(&mut self, kind: PointerKind) -> Result<(), StageError> {
        let weak = Rc::downgrade(&self.inner);
        let listener = Closure::wrap(Box::new(move |event: MouseEvent| {
            event.prevent_default();
            event.stop_propagation();
            on_pointer(&weak, PointerInput::new(kind, f64::from(event.page_x()), f64::from(event.page_y())));
        }) as Box<dyn FnMut(MouseEvent)>);
        self.canvas
            .add_event_listener_with_callback(kind.dom_event(), listener.as_ref().unchecked_ref())
            .map_err(js_error)?;
        self.listeners.push((kind, listener));
        Ok(())
    }

    /// Run `f` against the stage core. Returns `None` if the stage is busy,
    /// which only happens when called from inside one of its own callbacks.
    pub fn with_core<R>(&self, f: impl FnOnce(&mut StageCore) -> R) -> Option<R> {
        match self.inner.try_borrow_mut() {
            Ok(mut inner) => Some(f(&mut inner.core)),
            Err(_) => {
                log::warn!("stage busy; call skipped");
                None
            }
        }
    }

    /// Render one pass immediately, outside the timer.
    ///
    /// # Errors
    ///
    /// Propagates a failing canvas call.
    pub fn render_now(&self) -> Result<(), StageError> {
        let mut guard = self.inner.try_borrow_mut().map_err(|err| StageError::Surface(err.to_string()))?;
        let StageInner { core, surface } = &mut *guard;
        core.render(surface)
    }

    /// Set the cursor shown over the canvas.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Surface`] if the style cannot be set.
    pub fn set_cursor(&self, cursor: &str) -> Result<(), StageError> {
        let mut guard = self.inner.try_borrow_mut().map_err(|err| StageError::Surface(err.to_string()))?;
        let StageInner { core, surface } = &mut *guard;
        core.set_cursor(surface, cursor)
    }

    /// Canvas width in pixels. Read from the element, so it is safe to call
    /// from inside a listener or handler.
    #[must_use]
    pub fn stage_width(&self) -> f64 {
        f64::from(self.canvas.width())
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn stage_height(&self) -> f64 {
        f64::from(self.canvas.height())
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Unregister the canvas listeners and stop the timer. Safe to call twice.
    pub fn dispose(&mut self) {
        for (kind, listener) in self.listeners.drain(..) {
            if let Err(err) =
                self.canvas.remove_event_listener_with_callback(kind.dom_event(), listener.as_ref().unchecked_ref())
            {
                log::warn!("failed to remove {} listener: {err:?}", kind.dom_event());
            }
        }
        match self.inner.try_borrow_mut() {
            Ok(mut inner) => inner.core.shutdown(),
            Err(_) => log::warn!("stage busy during dispose; timer left to lapse"),
        }
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn on_pointer(stage: &Weak<RefCell<StageInner>>, input: PointerInput) {
    let Some(inner) = stage.upgrade() else {
        return;
    };
    let Ok(mut guard) = inner.try_borrow_mut() else {
        log::warn!("{} dropped: stage busy", input.kind.dom_event());
        return;
    };
    let StageInner { core, surface } = &mut *guard;
    let event = core.handle_pointer(input, surface);
    log::trace!("{} dispatched to {:?}", input.kind.dom_event(), event.target);
}

fn on_tick(stage: &Weak<RefCell<StageInner>>) {
    let Some(inner) = stage.upgrade() else {
        return;
    };
    let Ok(mut guard) = inner.try_borrow_mut() else {
        log::warn!("tick skipped: stage busy");
        return;
    };
    let StageInner { core, surface } = &mut *guard;
    let started_ms = Date::now();
    match core.tick(surface) {
        Ok(true) => log::trace!("frame rendered in {:.2} ms", (Date::now() - started_ms).max(0.0)),
        Ok(false) => {}
        Err(err) => log::error!("tick failed: {err}"),
    }
}

/// [`Ticker`] backed by a `gloo_timers` interval. Cancelling drops the
/// interval, which clears it.
struct IntervalTicker {
    stage: Weak<RefCell<StageInner>>,
    interval: Option<Interval>,
}

impl Ticker for IntervalTicker {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn arm(&mut self, interval_ms: f64) {
        let millis = interval_ms.round().max(1.0) as u32;
        let stage = self.stage.clone();
        self.interval = Some(Interval::new(millis, move || on_tick(&stage)));
    }

    fn cancel(&mut self) {
        self.interval = None;
    }
}
