// ABOUTME: Host collaborator — the editor capabilities session commands consume.
// ABOUTME: Windows, groups, views, prompts, panels, dialogs, status markers, and timers.

pub mod memory;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use crate::session::Completion;

pub use memory::{Dialog, MemoryHost, PromptReply};

/// Identifies a window owned by the host.
pub type WindowId = usize;
/// Identifies a view (tab) owned by the host.
pub type ViewId = usize;

/// Deferred work scheduled with [`Host::set_timeout`].
pub type TimerCallback = Box<dyn FnOnce(&mut dyn Host)>;

/// Receives text changes from an input panel.
///
/// The command that opens a prompt owns its listener and hands it to
/// [`Host::show_input_panel`] directly.
pub trait InputListener {
    fn on_change(&mut self, host: &mut dyn Host, text: &str);
}

/// Editor operations the session commands rely on.
pub trait Host {
    fn active_window(&self) -> WindowId;
    /// Open a new window and make it active.
    fn new_window(&mut self) -> WindowId;

    fn num_groups(&self, window: WindowId) -> usize;
    fn focus_group(&mut self, window: WindowId, group: usize);
    /// Opaque pane geometry of a window.
    fn layout(&self, window: WindowId) -> Value;
    fn set_layout(&mut self, window: WindowId, layout: &Value);

    /// All views of a window, group by group.
    fn views(&self, window: WindowId) -> Vec<ViewId>;
    fn views_in_group(&self, window: WindowId, group: usize) -> Vec<ViewId>;
    /// Backing file of a view, `None` for an unsaved buffer.
    fn file_name(&self, view: ViewId) -> Option<PathBuf>;
    /// Full current text of a view.
    fn text(&self, view: ViewId) -> String;

    /// Open a file into the focused group of `window`.
    fn open_file(&mut self, window: WindowId, path: &Path) -> ViewId;
    /// Create an unsaved view in the focused group of `window` holding `text`.
    fn new_buffer(&mut self, window: WindowId, text: &str) -> ViewId;
    fn close_view(&mut self, view: ViewId);

    fn set_status(&mut self, view: ViewId, key: &str, value: &str);
    fn erase_status(&mut self, view: ViewId, key: &str);

    fn message_dialog(&mut self, message: &str);
    fn error_dialog(&mut self, message: &str);

    /// Let the user pick one of `items`; `None` when dismissed.
    fn show_quick_panel(&mut self, items: &[String]) -> Option<usize>;
    /// Ask for a line of text; `None` when dismissed.
    fn show_input_panel(
        &mut self,
        caption: &str,
        initial: &str,
        listener: Option<&mut dyn InputListener>,
    ) -> Option<String>;
    /// Text of the input panel currently open, if any.
    fn input_text(&self) -> Option<String>;
    fn show_completions(&mut self, completions: &[Completion]);

    fn set_timeout(&mut self, delay: Duration, callback: TimerCallback);
}
