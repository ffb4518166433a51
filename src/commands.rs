// ABOUTME: Session commands — save, save-and-close, load, delete, and edit over a host.
// ABOUTME: Wires the store and codec to host prompts, panels, windows, and views.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SessionError};
use crate::host::{Host, WindowId};
use crate::session::codec::{self, EntryRef, SessionRecord};
use crate::session::{NameCompleter, SessionFile, SessionStore, generate_default_name};

/// Caption of the name prompt opened by the save commands.
pub const NAME_PROMPT: &str = "Session name:";

/// How a command finished when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The user dismissed a prompt or panel; nothing changed.
    Cancelled,
    /// There were no sessions to choose from.
    NoSessions,
}

/// Result of asking the user to pick a session.
enum Pick {
    Chosen(SessionFile),
    Cancelled,
    Empty,
}

/// The command set, bound to one sessions directory.
pub struct SessionCommands {
    store: SessionStore,
    config: Config,
}

impl SessionCommands {
    pub fn new(store: SessionStore, config: Config) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// One-time startup work: move legacy suffix-less files into the current format.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn startup(&self) -> usize {
        match self.store.migrate_legacy() {
            Ok(count) => {
                if count > 0 {
                    info!("migrated {} legacy session files", count);
                }
                count
            }
            Err(e) => {
                warn!("legacy session migration failed: {}", e);
                0
            }
        }
    }

    /// Prompt for a name and save the active window under it.
    pub fn save(&self, host: &mut dyn Host) -> Result<Outcome> {
        let Some(name) = self.prompt_name(host) else {
            return Ok(Outcome::Cancelled);
        };
        let window = host.active_window();
        match self.save_window(host, window, &name) {
            Ok(_) => Ok(Outcome::Completed),
            Err(e) => Err(report(host, e)),
        }
    }

    /// Save the active window, then close all of its views.
    pub fn save_and_close(&self, host: &mut dyn Host) -> Result<Outcome> {
        let window = host.active_window();
        let outcome = self.save(host)?;
        if outcome == Outcome::Completed {
            for view in host.views(window) {
                host.erase_status(view, &self.config.status_key);
                host.close_view(view);
            }
        }
        Ok(outcome)
    }

    /// Pick a session and restore it.
    pub fn load(&self, host: &mut dyn Host) -> Result<Outcome> {
        let file = match self.pick(host, "load")? {
            Pick::Chosen(file) => file,
            Pick::Cancelled => return Ok(Outcome::Cancelled),
            Pick::Empty => return Ok(Outcome::NoSessions),
        };
        match self.restore(host, &file) {
            Ok(_) => Ok(Outcome::Completed),
            Err(e) => Err(report(host, e)),
        }
    }

    /// Pick a session and delete its file. There is no confirmation step.
    pub fn delete(&self, host: &mut dyn Host) -> Result<Outcome> {
        let file = match self.pick(host, "delete")? {
            Pick::Chosen(file) => file,
            Pick::Cancelled => return Ok(Outcome::Cancelled),
            Pick::Empty => return Ok(Outcome::NoSessions),
        };
        match self.store.delete(&file.path) {
            Ok(()) => Ok(Outcome::Completed),
            Err(e) => Err(report(host, e)),
        }
    }

    /// Pick a session and open its raw file for editing.
    pub fn edit(&self, host: &mut dyn Host) -> Result<Outcome> {
        let file = match self.pick(host, "edit")? {
            Pick::Chosen(file) => file,
            Pick::Cancelled => return Ok(Outcome::Cancelled),
            Pick::Empty => return Ok(Outcome::NoSessions),
        };
        if !file.path.is_file() {
            return Err(report(host, SessionError::NotFound(file.path)));
        }
        let window = host.active_window();
        host.open_file(window, &file.path);
        Ok(Outcome::Completed)
    }

    /// Validate `name`, snapshot `window`, and write the session file.
    ///
    /// An invalid name fails before anything is written. An existing session
    /// with the same name is overwritten.
    pub fn save_window(&self, host: &dyn Host, window: WindowId, name: &str) -> Result<PathBuf> {
        let path = self.store.validate_name(name)?;
        let record = capture(host, window);
        codec::save_to(&path, &record)?;
        info!(
            "saved session {} ({} groups, {} entries)",
            path.display(),
            record.group_count(),
            record.entry_count()
        );
        Ok(path)
    }

    /// Decode `file` and reopen its contents, returning the window used.
    ///
    /// A window that already shows files is left alone; the session opens in a
    /// new window instead.
    pub fn restore(&self, host: &mut dyn Host, file: &SessionFile) -> Result<WindowId> {
        let record = codec::load_from(&file.path)?;

        let current = host.active_window();
        let busy = host
            .views(current)
            .into_iter()
            .any(|view| host.file_name(view).is_some());
        let window = if busy || !self.config.reuse_empty_window {
            host.new_window()
        } else {
            current
        };

        host.set_layout(window, &record.layout);
        let group_count = host.num_groups(window);
        for (index, entries) in &record.groups {
            if *index >= group_count {
                warn!(
                    "session {} refers to group {} but the layout has {} groups",
                    file.name, index, group_count
                );
                continue;
            }
            host.focus_group(window, *index);
            for entry in entries {
                match entry {
                    EntryRef::Buffer(text) => {
                        host.new_buffer(window, text);
                    }
                    EntryRef::File(path) => {
                        host.open_file(window, path);
                    }
                }
            }
        }

        for view in host.views(window) {
            host.set_status(view, &self.config.status_key, &file.name);
        }
        info!("loaded session {} into window {}", file.name, window);
        Ok(window)
    }

    fn prompt_name(&self, host: &mut dyn Host) -> Option<String> {
        let names = match self.store.list_names() {
            Ok(names) => names,
            Err(e) => {
                warn!("cannot list sessions for completion: {}", e);
                Vec::new()
            }
        };
        let mut completer = NameCompleter::new(names, self.config.completion_delay());
        host.show_input_panel(NAME_PROMPT, &generate_default_name(), Some(&mut completer))
    }

    fn pick(&self, host: &mut dyn Host, verb: &str) -> Result<Pick> {
        let files = self.store.list_files().map_err(|e| report(host, e))?;
        if files.is_empty() {
            host.message_dialog(&format!("No sessions available to {}.", verb));
            return Ok(Pick::Empty);
        }
        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        let chosen = host
            .show_quick_panel(&names)
            .and_then(|index| files.into_iter().nth(index));
        debug!(
            "{} selection: {:?}",
            verb,
            chosen.as_ref().map(|f| f.name.as_str())
        );
        Ok(chosen.map_or(Pick::Cancelled, Pick::Chosen))
    }
}

/// Snapshot the groups, views, and layout of `window`.
///
/// File-backed views are stored by path, unsaved views by their full text.
pub fn capture(host: &dyn Host, window: WindowId) -> SessionRecord {
    let mut record = SessionRecord::new(host.layout(window));
    for group in 0..host.num_groups(window) {
        let entries = host
            .views_in_group(window, group)
            .into_iter()
            .map(|view| match host.file_name(view) {
                Some(path) => EntryRef::File(path),
                None => EntryRef::Buffer(host.text(view)),
            })
            .collect();
        record.groups.insert(group, entries);
    }
    record
}

/// Show `err` in an error dialog and hand it back to the caller.
fn report(host: &mut dyn Host, err: SessionError) -> SessionError {
    host.error_dialog(&err.to_string());
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Dialog, MemoryHost, PromptReply};
    use std::path::Path;

    /// Helper: commands over a fresh temp directory.
    fn commands(tmp: &Path) -> SessionCommands {
        SessionCommands::new(
            SessionStore::new(tmp.join("sessions"), "simplesession"),
            Config::default(),
        )
    }

    #[test]
    fn capture_records_paths_and_buffer_text() {
        let mut host = MemoryHost::new();
        host.set_layout(0, &MemoryHost::columns_layout(2));
        host.open_file(0, Path::new("/tmp/a.txt"));
        host.new_buffer(0, "hello");

        let record = capture(&host, 0);
        assert_eq!(
            record.groups[&0],
            vec![
                EntryRef::File(PathBuf::from("/tmp/a.txt")),
                EntryRef::Buffer("hello".into())
            ]
        );
        assert_eq!(record.groups[&1], vec![]);
        assert_eq!(record.layout, MemoryHost::columns_layout(2));
    }

    #[test]
    fn save_prompt_defaults_to_timestamp_name() {
        let tmp = tempfile::tempdir().unwrap();
        let cmds = commands(tmp.path());
        let mut host = MemoryHost::new();

        assert_eq!(cmds.save(&mut host).unwrap(), Outcome::Cancelled);
        let (caption, initial) = &host.prompts[0];
        assert_eq!(caption, NAME_PROMPT);
        assert!(crate::session::is_auto_generated(initial));
    }

    #[test]
    fn cancelled_save_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let cmds = commands(tmp.path());
        let mut host = MemoryHost::new();
        host.reply(PromptReply::Cancel);

        assert_eq!(cmds.save(&mut host).unwrap(), Outcome::Cancelled);
        assert!(cmds.store().list_files().unwrap().is_empty());
    }

    #[test]
    fn invalid_name_reports_error_dialog() {
        let tmp = tempfile::tempdir().unwrap();
        let cmds = commands(tmp.path());
        let mut host = MemoryHost::new();
        host.reply(PromptReply::Submit("bad/name".into()));

        let err = cmds.save(&mut host).unwrap_err();
        assert!(matches!(err, SessionError::InvalidName { .. }));
        assert!(matches!(&host.dialogs[..], [Dialog::Error(msg)] if msg.contains("Invalid Session Name")));
    }

    #[test]
    fn pick_with_no_sessions_informs() {
        let tmp = tempfile::tempdir().unwrap();
        let cmds = commands(tmp.path());
        let mut host = MemoryHost::new();

        assert_eq!(cmds.load(&mut host).unwrap(), Outcome::NoSessions);
        assert_eq!(cmds.delete(&mut host).unwrap(), Outcome::NoSessions);
        assert_eq!(cmds.edit(&mut host).unwrap(), Outcome::NoSessions);
        assert_eq!(
            host.dialogs,
            vec![
                Dialog::Message("No sessions available to load.".into()),
                Dialog::Message("No sessions available to delete.".into()),
                Dialog::Message("No sessions available to edit.".into()),
            ]
        );
        assert!(host.panels.is_empty());
    }

    #[test]
    fn out_of_range_selection_is_cancel() {
        let tmp = tempfile::tempdir().unwrap();
        let cmds = commands(tmp.path());
        let mut host = MemoryHost::new();
        cmds.save_window(&host, 0, "only").unwrap();
        host.select(Some(5));

        assert_eq!(cmds.delete(&mut host).unwrap(), Outcome::Cancelled);
        assert_eq!(cmds.store().list_names().unwrap(), vec!["only"]);
    }

    #[test]
    fn startup_migrates_legacy_files() {
        let tmp = tempfile::tempdir().unwrap();
        let cmds = commands(tmp.path());
        cmds.store().ensure_dir().unwrap();
        std::fs::write(cmds.store().dir().join("old"), "{}").unwrap();

        assert_eq!(cmds.startup(), 1);
        assert_eq!(cmds.startup(), 0);
        assert_eq!(cmds.store().list_names().unwrap(), vec!["old"]);
    }
}
