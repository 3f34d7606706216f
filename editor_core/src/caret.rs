//! Caret geometry and element binding.
//!
//! Positions auxiliary elements (autocomplete popups, emoji pickers) at the
//! caret. The host supplies viewport metrics; this module only does the
//! geometry and keeps a queue of bindings requested before the input
//! surface attaches.

use crate::buffer::TextBuffer;
use crate::selection::Selection;

/// Viewport measurements supplied by the host on attach and on scroll.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportMetrics {
    /// Top-left corner of the text area, in viewport pixels.
    pub origin_x: f32,
    pub origin_y: f32,
    /// Monospace cell size.
    pub char_width: f32,
    pub line_height: f32,
    /// Current scroll offsets of the text area.
    pub scroll_left: f32,
    pub scroll_top: f32,
}

/// The caret position in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaretRect {
    pub x: f32,
    pub y: f32,
    pub height: f32,
}

/// Computes the caret rectangle for the selection end.
pub fn caret_rect(buffer: &TextBuffer, selection: Selection, metrics: &ViewportMetrics) -> CaretRect {
    let (line, col) = buffer.char_to_line_col(selection.end);
    CaretRect {
        x: metrics.origin_x + col as f32 * metrics.char_width - metrics.scroll_left,
        y: metrics.origin_y + line as f32 * metrics.line_height - metrics.scroll_top,
        height: metrics.line_height,
    }
}

/// Callback repositioning a bound element.
pub type PositionCallback = Box<dyn FnMut(CaretRect) + Send>;

/// Handle for a caret binding, used to unbind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingId(u64);

/// Binds elements to the caret position. Bindings requested before the
/// input surface attaches are queued and flushed once on attach.
#[derive(Default)]
pub struct CaretBinder {
    next_id: u64,
    pending: Vec<(BindingId, PositionCallback)>,
    live: Vec<(BindingId, PositionCallback)>,
    metrics: Option<ViewportMetrics>,
}

impl CaretBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a positioning callback. Queued until the input attaches.
    pub fn bind(&mut self, callback: PositionCallback) -> BindingId {
        self.next_id += 1;
        let id = BindingId(self.next_id);
        if self.metrics.is_some() {
            self.live.push((id, callback));
        } else {
            self.pending.push((id, callback));
        }
        id
    }

    /// Removes a binding, whether queued or live.
    pub fn unbind(&mut self, id: BindingId) {
        self.pending.retain(|(bound, _)| *bound != id);
        self.live.retain(|(bound, _)| *bound != id);
    }

    /// Marks the input surface as attached and flushes the pending queue.
    /// Calling again only refreshes the metrics; the flush is idempotent.
    pub fn attach(&mut self, metrics: ViewportMetrics) {
        self.metrics = Some(metrics);
        self.live.append(&mut self.pending);
    }

    /// Updates the viewport metrics (scroll changes).
    pub fn set_metrics(&mut self, metrics: ViewportMetrics) {
        if self.metrics.is_some() {
            self.metrics = Some(metrics);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.metrics.is_some()
    }

    /// Repositions every live binding from the current selection.
    /// No-op until the input surface attaches.
    pub fn update(&mut self, buffer: &TextBuffer, selection: Selection) {
        let Some(metrics) = self.metrics else {
            return;
        };
        let rect = caret_rect(buffer, selection, &metrics);
        for (_, callback) in &mut self.live {
            callback(rect);
        }
    }
}
