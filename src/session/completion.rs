// ABOUTME: Session name completion — prefix filtering over known names for the save prompt.
// ABOUTME: Includes the debounced input listener that feeds completions to the host popup.

use std::rc::Rc;
use std::time::Duration;

use crate::host::{Host, InputListener};

/// A completion candidate and the label the host displays for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub value: String,
    pub label: String,
}

impl Completion {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            label: format!("{}\tsession", value),
        }
    }
}

/// Names starting with `prefix`, in the given order.
///
/// Returns `None` for an empty prefix. When exactly one name matches and it is
/// not the prefix itself, the prefix is appended as a second candidate so the
/// host shows a list instead of inserting the lone match outright.
pub fn complete(names: &[String], prefix: &str) -> Option<Vec<Completion>> {
    if prefix.is_empty() {
        return None;
    }
    let mut matches: Vec<Completion> = names
        .iter()
        .filter(|name| name.starts_with(prefix))
        .map(|name| Completion::new(name))
        .collect();
    if matches.len() == 1 && matches[0].value != prefix {
        matches.push(Completion::new(prefix));
    }
    Some(matches)
}

/// Input listener that shows name completions a short delay after each keystroke.
///
/// Every keystroke schedules a timer. A timer that fires after newer keystrokes
/// reads the prompt's text at fire time, so it never shows stale candidates.
pub struct NameCompleter {
    names: Rc<[String]>,
    delay: Duration,
}

impl NameCompleter {
    pub fn new(names: Vec<String>, delay: Duration) -> Self {
        Self {
            names: names.into(),
            delay,
        }
    }
}

impl InputListener for NameCompleter {
    fn on_change(&mut self, host: &mut dyn Host, _text: &str) {
        let names = Rc::clone(&self.names);
        host.set_timeout(
            self.delay,
            Box::new(move |host: &mut dyn Host| {
                let Some(typed) = host.input_text() else {
                    return;
                };
                if let Some(items) = complete(&names, &typed) {
                    host.show_completions(&items);
                }
            }),
        );
    }
}
