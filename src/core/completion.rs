//! "Stack complete" edge detector.

/// Fires once per continuous dwell of the last item inside its pin window.
#[derive(Debug, Default)]
pub struct CompletionNotifier {
    inside: bool,
}

impl CompletionNotifier {
    /// Feed this frame's state.  Returns `true` only on a fresh entry.
    pub fn observe(&mut self, in_window: bool) -> bool {
        let entered = in_window && !self.inside;
        self.inside = in_window;
        entered
    }

    pub fn is_complete(&self) -> bool {
        self.inside
    }

    /// Forget the current dwell; the next entry fires again.
    pub fn reset(&mut self) {
        self.inside = false;
    }
}
