// ABOUTME: Session store — locates, names, orders, and migrates session files on disk.
// ABOUTME: Named sessions sort ahead of timestamp-named ones, each newest first.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

use chrono::{Local, NaiveDateTime};
use glob::Pattern;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SessionError};

/// Format of names produced by [`generate_default_name`].
const DEFAULT_NAME_FORMAT: &str = "%Y%m%d-%H.%M.%S";

static AUTO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}-\d{2}\.\d{2}\.\d{2}$").expect("static regex"));

/// A session file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl SessionFile {
    /// True if the name came from the timestamp formatter rather than the user.
    pub fn is_auto_generated(&self) -> bool {
        is_auto_generated(&self.name)
    }
}

/// Whether `name` has the shape of a generated `YYYYMMDD-HH.MM.SS` name.
pub fn is_auto_generated(name: &str) -> bool {
    AUTO_NAME.is_match(name)
}

/// Current local time as a default session name.
pub fn generate_default_name() -> String {
    default_name_at(Local::now().naive_local())
}

pub fn default_name_at(time: NaiveDateTime) -> String {
    time.format(DEFAULT_NAME_FORMAT).to_string()
}

/// Owner of the sessions directory and of the order sessions are presented in.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
    suffix: String,
}

impl SessionStore {
    /// Create a store over `dir` whose files end in `.<extension>`.
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            suffix: format!(".{}", extension.trim_start_matches('.')),
        }
    }

    /// Create a store using the configured directory and extension.
    pub fn from_config(config: &Config, user_dir: &Path) -> Self {
        Self::new(config.sessions_dir_in(user_dir), &config.extension)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file suffix including its leading dot.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Create the sessions directory if needed. Succeeds if it already exists.
    pub fn ensure_dir(&self) -> Result<&Path> {
        fs::create_dir_all(&self.dir).map_err(|e| SessionError::io(&self.dir, e))?;
        Ok(&self.dir)
    }

    /// Path of the session file for a user-facing name.
    ///
    /// A name typed with the suffix already attached is not suffixed twice.
    pub fn path_for_name(&self, name: &str) -> PathBuf {
        let stem = name.strip_suffix(self.suffix.as_str()).unwrap_or(name);
        self.dir.join(format!("{}{}", stem, self.suffix))
    }

    /// User-facing name of a session file, or `None` if it lacks the suffix.
    pub fn name_of(&self, path: &Path) -> Option<String> {
        let file_name = path.file_name()?.to_str()?;
        file_name
            .strip_suffix(self.suffix.as_str())
            .map(str::to_string)
    }

    /// All session files, named sessions first, then generated ones, each newest first.
    pub fn list_files(&self) -> Result<Vec<SessionFile>> {
        let pattern = format!(
            "{}/*{}",
            Pattern::escape(&self.dir.to_string_lossy()),
            Pattern::escape(&self.suffix)
        );
        let paths = glob::glob(&pattern).map_err(|e| SessionError::Io {
            path: self.dir.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
        })?;

        let mut named = Vec::new();
        let mut generated = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("skipping unreadable session entry {}: {}", e.path().display(), e);
                    continue;
                }
            };
            // Vanished or non-file entries are left out of the listing.
            let Ok(meta) = fs::metadata(&path) else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let Some(name) = self.name_of(&path) else {
                continue;
            };
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let file = SessionFile {
                name,
                path,
                modified,
            };
            if file.is_auto_generated() {
                generated.push(file);
            } else {
                named.push(file);
            }
        }

        named.sort_by(|a, b| b.modified.cmp(&a.modified));
        generated.sort_by(|a, b| b.modified.cmp(&a.modified));
        debug!(
            "found {} named and {} generated sessions in {}",
            named.len(),
            generated.len(),
            self.dir.display()
        );
        named.extend(generated);
        Ok(named)
    }

    /// Session names in presentation order.
    pub fn list_names(&self) -> Result<Vec<String>> {
        Ok(self.list_files()?.into_iter().map(|f| f.name).collect())
    }

    /// Check that `name` can be stored and return the path it would be stored at.
    ///
    /// Creates and removes an empty probe file unless the session already exists,
    /// so a rejected name never leaves anything behind.
    pub fn validate_name(&self, name: &str) -> Result<PathBuf> {
        let stem = name.strip_suffix(self.suffix.as_str()).unwrap_or(name);
        if stem.trim().is_empty() {
            return Err(SessionError::invalid_name(name, "name is empty"));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(SessionError::invalid_name(name, "contains a path separator"));
        }
        if name.contains('\0') {
            return Err(SessionError::invalid_name(name, "contains a null byte"));
        }
        if stem == "." || stem == ".." {
            return Err(SessionError::invalid_name(name, "reserved name"));
        }

        self.ensure_dir()
            .map_err(|e| SessionError::invalid_name(name, e.to_string()))?;
        let path = self.path_for_name(name);
        if path.is_file() {
            return Ok(path);
        }
        File::create(&path).map_err(|e| SessionError::invalid_name(name, e.to_string()))?;
        fs::remove_file(&path).map_err(|e| SessionError::io(&path, e))?;
        Ok(path)
    }

    /// Rename every suffix-less file in the sessions directory to carry the suffix.
    ///
    /// Returns how many files were renamed. A missing directory is created when
    /// possible; failure to do so is logged and treated as nothing to migrate.
    pub fn migrate_legacy(&self) -> Result<usize> {
        if let Err(e) = self.ensure_dir() {
            warn!("cannot prepare sessions directory: {}", e);
            return Ok(0);
        }
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(SessionError::io(&self.dir, e)),
        };

        let mut renamed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| SessionError::io(&self.dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            // Hidden files include in-flight temporary writes.
            if file_name.starts_with('.') || file_name.ends_with(self.suffix.as_str()) {
                continue;
            }
            let target = self.path_for_name(file_name);
            if target.exists() {
                warn!(
                    "not migrating {}: {} already exists",
                    path.display(),
                    target.display()
                );
                continue;
            }
            fs::rename(&path, &target).map_err(|e| SessionError::io(&path, e))?;
            info!("migrated legacy session {} -> {}", path.display(), target.display());
            renamed += 1;
        }
        Ok(renamed)
    }

    /// Remove a session file. A file that is already gone is `NotFound`.
    pub fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| SessionError::io(path, e))?;
        info!("deleted session {}", path.display());
        Ok(())
    }
}
