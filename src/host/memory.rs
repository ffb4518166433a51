// ABOUTME: In-memory host — windows, groups, and views held in plain collections.
// ABOUTME: Prompt and panel answers are scripted up front; dialogs and popups are recorded.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Value, json};

use super::{Host, InputListener, TimerCallback, ViewId, WindowId};
use crate::session::Completion;

/// A dialog shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Message(String),
    Error(String),
}

/// Scripted answer to the next input panel.
#[derive(Debug, Clone)]
pub enum PromptReply {
    /// Submit this text without any intermediate keystrokes.
    Submit(String),
    /// Feed each string as the panel's text in turn, let pending timers fire,
    /// then submit the last one.
    Type(Vec<String>),
    Cancel,
}

/// A view held by the in-memory host.
#[derive(Debug, Clone)]
pub struct View {
    pub window: WindowId,
    pub file: Option<PathBuf>,
    pub text: String,
    pub status: BTreeMap<String, String>,
}

struct Window {
    layout: Value,
    groups: Vec<Vec<ViewId>>,
    focused: usize,
}

impl Window {
    fn new() -> Self {
        Self {
            layout: MemoryHost::columns_layout(1),
            groups: vec![Vec::new()],
            focused: 0,
        }
    }
}

/// Headless [`Host`] implementation.
pub struct MemoryHost {
    windows: Vec<Window>,
    active: WindowId,
    views: BTreeMap<ViewId, View>,
    next_view: ViewId,
    replies: VecDeque<PromptReply>,
    selections: VecDeque<Option<usize>>,
    input: Option<String>,
    timers: Vec<(Duration, TimerCallback)>,
    /// Every dialog shown, oldest first.
    pub dialogs: Vec<Dialog>,
    /// Caption and initial text of every input panel opened.
    pub prompts: Vec<(String, String)>,
    /// Items of every quick panel opened.
    pub panels: Vec<Vec<String>>,
    /// Every completion popup shown.
    pub completions: Vec<Vec<Completion>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// A host with one empty single-group window.
    pub fn new() -> Self {
        Self {
            windows: vec![Window::new()],
            active: 0,
            views: BTreeMap::new(),
            next_view: 1,
            replies: VecDeque::new(),
            selections: VecDeque::new(),
            input: None,
            timers: Vec::new(),
            dialogs: Vec::new(),
            prompts: Vec::new(),
            panels: Vec::new(),
            completions: Vec::new(),
        }
    }

    /// Layout descriptor for `n` side-by-side groups.
    pub fn columns_layout(n: usize) -> Value {
        let n = n.max(1);
        let cols: Vec<f64> = (0..=n).map(|i| i as f64 / n as f64).collect();
        let cells: Vec<[usize; 4]> = (0..n).map(|i| [i, 0, i + 1, 1]).collect();
        json!({ "cols": cols, "rows": [0.0, 1.0], "cells": cells })
    }

    /// Queue the answer for the next input panel.
    pub fn reply(&mut self, reply: PromptReply) -> &mut Self {
        self.replies.push_back(reply);
        self
    }

    /// Queue the answer for the next quick panel (`None` dismisses it).
    pub fn select(&mut self, index: Option<usize>) -> &mut Self {
        self.selections.push_back(index);
        self
    }

    pub fn view(&self, view: ViewId) -> Option<&View> {
        self.views.get(&view)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn focused_group(&self, window: WindowId) -> usize {
        self.windows.get(window).map_or(0, |w| w.focused)
    }

    pub fn status(&self, view: ViewId, key: &str) -> Option<&str> {
        self.views
            .get(&view)
            .and_then(|v| v.status.get(key))
            .map(String::as_str)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Fire every scheduled timer, shortest delay first, including timers
    /// scheduled by the ones firing. Returns how many fired.
    pub fn run_timers(&mut self) -> usize {
        let mut fired = 0;
        while !self.timers.is_empty() {
            let mut batch = std::mem::take(&mut self.timers);
            batch.sort_by_key(|(delay, _)| *delay);
            for (_, callback) in batch {
                callback(&mut *self as &mut dyn Host);
                fired += 1;
            }
        }
        fired
    }

    fn group_count_of(layout: &Value) -> usize {
        layout
            .get("cells")
            .and_then(Value::as_array)
            .map_or(1, |cells| cells.len().max(1))
    }

    fn add_view(&mut self, window: WindowId, file: Option<PathBuf>, text: String) -> ViewId {
        let id = self.next_view;
        self.next_view += 1;
        if let Some(w) = self.windows.get_mut(window) {
            let group = w.focused.min(w.groups.len() - 1);
            w.groups[group].push(id);
        }
        self.views.insert(
            id,
            View {
                window,
                file,
                text,
                status: BTreeMap::new(),
            },
        );
        id
    }
}

impl Host for MemoryHost {
    fn active_window(&self) -> WindowId {
        self.active
    }

    fn new_window(&mut self) -> WindowId {
        self.windows.push(Window::new());
        self.active = self.windows.len() - 1;
        self.active
    }

    fn num_groups(&self, window: WindowId) -> usize {
        self.windows.get(window).map_or(0, |w| w.groups.len())
    }

    fn focus_group(&mut self, window: WindowId, group: usize) {
        if let Some(w) = self.windows.get_mut(window) {
            if group < w.groups.len() {
                w.focused = group;
            }
        }
    }

    fn layout(&self, window: WindowId) -> Value {
        self.windows
            .get(window)
            .map_or(Value::Null, |w| w.layout.clone())
    }

    fn set_layout(&mut self, window: WindowId, layout: &Value) {
        let Some(w) = self.windows.get_mut(window) else {
            return;
        };
        let count = Self::group_count_of(layout);
        // Views in dropped groups move to the last remaining one.
        if count < w.groups.len() {
            let orphans: Vec<ViewId> = w.groups.drain(count..).flatten().collect();
            w.groups[count - 1].extend(orphans);
        }
        w.groups.resize_with(count, Vec::new);
        w.focused = w.focused.min(count - 1);
        w.layout = layout.clone();
    }

    fn views(&self, window: WindowId) -> Vec<ViewId> {
        self.windows
            .get(window)
            .map(|w| w.groups.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    fn views_in_group(&self, window: WindowId, group: usize) -> Vec<ViewId> {
        self.windows
            .get(window)
            .and_then(|w| w.groups.get(group))
            .cloned()
            .unwrap_or_default()
    }

    fn file_name(&self, view: ViewId) -> Option<PathBuf> {
        self.views.get(&view).and_then(|v| v.file.clone())
    }

    fn text(&self, view: ViewId) -> String {
        self.views
            .get(&view)
            .map(|v| v.text.clone())
            .unwrap_or_default()
    }

    fn open_file(&mut self, window: WindowId, path: &Path) -> ViewId {
        let existing = self.windows.get(window).and_then(|w| {
            w.groups.iter().enumerate().find_map(|(group, views)| {
                views
                    .iter()
                    .find(|id| self.views[*id].file.as_deref() == Some(path))
                    .map(|id| (group, *id))
            })
        });
        if let Some((group, id)) = existing {
            self.focus_group(window, group);
            return id;
        }
        // A missing file opens as an empty view of that path.
        let text = std::fs::read_to_string(path).unwrap_or_default();
        self.add_view(window, Some(path.to_path_buf()), text)
    }

    fn new_buffer(&mut self, window: WindowId, text: &str) -> ViewId {
        self.add_view(window, None, text.to_string())
    }

    fn close_view(&mut self, view: ViewId) {
        if let Some(v) = self.views.remove(&view) {
            if let Some(w) = self.windows.get_mut(v.window) {
                for group in &mut w.groups {
                    group.retain(|id| *id != view);
                }
            }
        }
    }

    fn set_status(&mut self, view: ViewId, key: &str, value: &str) {
        if let Some(v) = self.views.get_mut(&view) {
            v.status.insert(key.to_string(), value.to_string());
        }
    }

    fn erase_status(&mut self, view: ViewId, key: &str) {
        if let Some(v) = self.views.get_mut(&view) {
            v.status.remove(key);
        }
    }

    fn message_dialog(&mut self, message: &str) {
        self.dialogs.push(Dialog::Message(message.to_string()));
    }

    fn error_dialog(&mut self, message: &str) {
        self.dialogs.push(Dialog::Error(message.to_string()));
    }

    fn show_quick_panel(&mut self, items: &[String]) -> Option<usize> {
        self.panels.push(items.to_vec());
        self.selections.pop_front().flatten()
    }

    fn show_input_panel(
        &mut self,
        caption: &str,
        initial: &str,
        mut listener: Option<&mut dyn InputListener>,
    ) -> Option<String> {
        self.prompts.push((caption.to_string(), initial.to_string()));
        self.input = Some(initial.to_string());

        let result = match self.replies.pop_front().unwrap_or(PromptReply::Cancel) {
            PromptReply::Submit(text) => Some(text),
            PromptReply::Type(keystrokes) => {
                for text in keystrokes {
                    self.input = Some(text.clone());
                    if let Some(listener) = listener.as_deref_mut() {
                        listener.on_change(&mut *self as &mut dyn Host, &text);
                    }
                }
                self.run_timers();
                self.input.clone()
            }
            PromptReply::Cancel => None,
        };

        self.input = None;
        result
    }

    fn input_text(&self) -> Option<String> {
        self.input.clone()
    }

    fn show_completions(&mut self, completions: &[Completion]) {
        self.completions.push(completions.to_vec());
    }

    fn set_timeout(&mut self, delay: Duration, callback: TimerCallback) {
        self.timers.push((delay, callback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_host_has_one_single_group_window() {
        let host = MemoryHost::new();
        assert_eq!(host.window_count(), 1);
        assert_eq!(host.num_groups(0), 1);
        assert!(host.views(0).is_empty());
    }

    #[test]
    fn layout_controls_group_count() {
        let mut host = MemoryHost::new();
        host.set_layout(0, &MemoryHost::columns_layout(3));
        assert_eq!(host.num_groups(0), 3);
        assert_eq!(host.layout(0)["cells"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn shrinking_layout_moves_views_to_last_group() {
        let mut host = MemoryHost::new();
        host.set_layout(0, &MemoryHost::columns_layout(2));
        host.focus_group(0, 1);
        let view = host.new_buffer(0, "x");
        host.set_layout(0, &MemoryHost::columns_layout(1));
        assert_eq!(host.views_in_group(0, 0), vec![view]);
        assert_eq!(host.focused_group(0), 0);
    }

    #[test]
    fn views_open_in_focused_group() {
        let mut host = MemoryHost::new();
        host.set_layout(0, &MemoryHost::columns_layout(2));
        let a = host.new_buffer(0, "a");
        host.focus_group(0, 1);
        let b = host.open_file(0, Path::new("/nonexistent/b.txt"));
        assert_eq!(host.views_in_group(0, 0), vec![a]);
        assert_eq!(host.views_in_group(0, 1), vec![b]);
        assert_eq!(host.views(0), vec![a, b]);
        assert_eq!(host.file_name(b), Some(PathBuf::from("/nonexistent/b.txt")));
        assert_eq!(host.text(b), "");
    }

    #[test]
    fn opening_same_file_twice_reuses_view() {
        let mut host = MemoryHost::new();
        let first = host.open_file(0, Path::new("/nonexistent/a"));
        let second = host.open_file(0, Path::new("/nonexistent/a"));
        assert_eq!(first, second);
        assert_eq!(host.views(0).len(), 1);
    }

    #[test]
    fn close_view_removes_it_everywhere() {
        let mut host = MemoryHost::new();
        let view = host.new_buffer(0, "gone");
        host.close_view(view);
        assert!(host.views(0).is_empty());
        assert!(host.view(view).is_none());
    }

    #[test]
    fn status_set_and_erase() {
        let mut host = MemoryHost::new();
        let view = host.new_buffer(0, "");
        host.set_status(view, "ss", "work");
        assert_eq!(host.status(view, "ss"), Some("work"));
        host.erase_status(view, "ss");
        assert_eq!(host.status(view, "ss"), None);
    }

    #[test]
    fn unscripted_prompts_and_panels_cancel() {
        let mut host = MemoryHost::new();
        assert_eq!(host.show_input_panel("Name:", "x", None), None);
        assert_eq!(host.show_quick_panel(&["a".to_string()]), None);
        assert_eq!(host.prompts, vec![("Name:".to_string(), "x".to_string())]);
        assert_eq!(host.panels, vec![vec!["a".to_string()]]);
    }

    #[test]
    fn timers_see_state_at_fire_time() {
        struct Echo;
        impl InputListener for Echo {
            fn on_change(&mut self, host: &mut dyn Host, _text: &str) {
                host.set_timeout(
                    Duration::from_millis(10),
                    Box::new(|host: &mut dyn Host| {
                        let text = host.input_text().unwrap_or_default();
                        host.message_dialog(&text);
                    }),
                );
            }
        }

        let mut host = MemoryHost::new();
        host.reply(PromptReply::Type(vec!["a".into(), "ab".into()]));
        let mut echo = Echo;
        let result = host.show_input_panel("Name:", "", Some(&mut echo));

        assert_eq!(result, Some("ab".to_string()));
        assert_eq!(
            host.dialogs,
            vec![Dialog::Message("ab".into()), Dialog::Message("ab".into())]
        );
        assert_eq!(host.pending_timers(), 0);
    }
}
