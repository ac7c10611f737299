//! Incremental "reveal more" pagination window.

/// Initial number of visible rows and the growth step.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Visible prefix of a scrollable list.
///
/// The UI grows the window by `step` each time the end of the list is
/// reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    visible: usize,
    step: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageWindow {
    /// Creates a window showing `step` rows and growing by `step`.
    ///
    /// A zero step falls back to [`DEFAULT_PAGE_SIZE`].
    pub fn new(step: usize) -> Self {
        let step = if step == 0 { DEFAULT_PAGE_SIZE } else { step };
        Self {
            visible: step,
            step,
        }
    }

    /// Creates a window with an explicit visible count, e.g. restored from UI.
    pub fn with_visible(visible: usize, step: usize) -> Self {
        let mut window = Self::new(step);
        window.visible = visible;
        window
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    /// Handles an end-of-list event.
    pub fn reveal_more(&mut self) {
        self.visible = self.visible.saturating_add(self.step);
    }

    /// Shrinks back to the first page.
    pub fn reset(&mut self) {
        self.visible = self.step;
    }

    /// Returns the visible prefix of `items`.
    pub fn apply<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.visible.min(items.len())]
    }

    /// Whether `total` items exceed the visible window.
    pub fn has_more(&self, total: usize) -> bool {
        total > self.visible
    }
}
