//! Session persistence on top of the atomic writer.
//!
//! Each session is stored as two JSON files under the store root — the
//! display transcript and the model-native history — plus one shared
//! `catalog.json` mapping session ids to titles. Catalog entries are soft
//! references: they may outlive the content files they point at and are
//! pruned lazily on [`SessionStore::list`].

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use directories::ProjectDirs;
use tracing::{debug, warn};

use crate::api::ChatMessage;
use crate::core::message::DisplayTurn;
use crate::core::session::Session;
use crate::core::title;
use crate::storage::atomic::{self, WriteError};

/// Id → title index used to list and select past sessions.
pub type Catalog = BTreeMap<String, String>;

const CATALOG_FILE: &str = "catalog.json";

/// Why a persisted session could not be loaded as-is.
#[derive(Debug)]
pub enum LoadError {
    /// No content files exist for the id. Not a failure: callers get a fresh
    /// session.
    NotFound,

    /// Content files exist but are unreadable or malformed.
    Corrupt { detail: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotFound => write!(f, "session not found"),
            LoadError::Corrupt { detail } => write!(f, "session data corrupt: {detail}"),
        }
    }
}

impl StdError for LoadError {}

pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Platform data directory used when the host does not configure a root.
    pub fn default_root() -> PathBuf {
        match ProjectDirs::from("org", "permacommons", "causerie") {
            Some(dirs) => dirs.data_dir().join("sessions"),
            None => PathBuf::from(".causerie").join("sessions"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn display_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.display.json"))
    }

    fn history_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.history.json"))
    }

    fn catalog_path(&self) -> PathBuf {
        self.root.join(CATALOG_FILE)
    }

    /// Load the session for `id`, resetting to an empty session when nothing
    /// usable is on disk.
    ///
    /// A missing session is normal (first reference to a new id) and carries
    /// no warning; corrupt content is reported back so the host can surface a
    /// banner, but never halts the caller.
    pub fn load(&self, id: &str) -> (Session, Option<LoadError>) {
        let title = self
            .read_catalog()
            .remove(id)
            .unwrap_or_else(|| title::fallback(id));

        match self.load_strict(id) {
            Ok((display_transcript, model_history)) => (
                Session {
                    id: id.to_string(),
                    title,
                    display_transcript,
                    model_history,
                },
                None,
            ),
            Err(LoadError::NotFound) => (Session::empty(id, title), None),
            Err(err) => {
                warn!(id, %err, "resetting unreadable session");
                (Session::empty(id, title), Some(err))
            }
        }
    }

    /// Load without the fresh-session fallback.
    pub fn load_strict(&self, id: &str) -> Result<(Vec<DisplayTurn>, Vec<ChatMessage>), LoadError> {
        let display_path = self.display_path(id);
        let history_path = self.history_path(id);

        if !display_path.exists() && !history_path.exists() {
            return Err(LoadError::NotFound);
        }

        let display_transcript = read_json_file(&display_path)?;
        let model_history = read_json_file(&history_path)?;
        Ok((display_transcript, model_history))
    }

    /// Persist a session: display transcript, model history, then the catalog
    /// entry.
    ///
    /// Each file is independently atomic. Content files are written before
    /// the catalog so the catalog never references content that failed to
    /// persist.
    pub fn save(&self, session: &Session) -> Result<(), WriteError> {
        atomic::write_json(&self.display_path(&session.id), &session.display_transcript)?;
        atomic::write_json(&self.history_path(&session.id), &session.model_history)?;

        let mut catalog = self.read_catalog();
        catalog.insert(session.id.clone(), session.title.clone());
        atomic::write_json(&self.catalog_path(), &catalog)?;
        Ok(())
    }

    /// Current catalog, with entries whose backing content files have both
    /// vanished pruned and the trimmed catalog re-persisted.
    pub fn list(&self) -> Catalog {
        let mut catalog = self.read_catalog();
        let before = catalog.len();
        catalog.retain(|id, _| self.display_path(id).exists() || self.history_path(id).exists());

        if catalog.len() != before {
            debug!(pruned = before - catalog.len(), "pruned stale catalog entries");
            if let Err(err) = atomic::write_json(&self.catalog_path(), &catalog) {
                warn!(%err, "failed to persist pruned catalog");
            }
        }
        catalog
    }

    /// Produce a fresh, currently-unused session id.
    ///
    /// Ids are fractional epoch values (`secs.micros`). Two sessions created
    /// within the same microsecond tick cannot alias: a taken candidate gets
    /// its fractional part re-randomized until an unused id is found.
    pub fn new_id(&self) -> String {
        let catalog = self.read_catalog();
        let now = Utc::now();
        let mut micros = now.timestamp_subsec_micros();

        loop {
            let candidate = format!("{}.{:06}", now.timestamp(), micros);
            let taken = catalog.contains_key(&candidate)
                || self.display_path(&candidate).exists()
                || self.history_path(&candidate).exists();
            if !taken {
                return candidate;
            }

            let mut buf = [0u8; 4];
            micros = if getrandom::fill(&mut buf).is_ok() {
                u32::from_le_bytes(buf) % 1_000_000
            } else {
                (micros + 1) % 1_000_000
            };
        }
    }

    fn read_catalog(&self) -> Catalog {
        let path = self.catalog_path();
        if !path.exists() {
            return Catalog::new();
        }
        match fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
        {
            Ok(catalog) => catalog,
            Err(detail) => {
                warn!(detail = %detail, "catalog unreadable; starting from an empty index");
                Catalog::new()
            }
        }
    }
}

fn read_json_file<T>(path: &Path) -> Result<T, LoadError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if !path.exists() {
        // One content file present without its sibling means an interrupted
        // first save; treat the absent side as empty rather than corrupt.
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| LoadError::Corrupt {
        detail: format!("{}: {err}", path.display()),
    })?;
    serde_json::from_str(&contents).map_err(|err| LoadError::Corrupt {
        detail: format!("{}: {err}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use tempfile::tempdir;

    fn sample_session(id: &str) -> Session {
        let mut session = Session::empty(id, "Roof questions");
        session
            .display_transcript
            .push(DisplayTurn::new(Role::User, "Hi"));
        session.display_transcript.push(DisplayTurn::with_avatar(
            Role::Assistant,
            "Hello there",
            Some("assets/avatar.png"),
        ));
        session
            .model_history
            .push(ChatMessage::new(Role::User, "Hi"));
        session
            .model_history
            .push(ChatMessage::new(Role::Assistant, "Hello there"));
        session
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = sample_session("1700000000.000001");

        store.save(&session).unwrap();
        let (loaded, warning) = store.load(&session.id);

        assert!(warning.is_none());
        assert_eq!(loaded, session);
    }

    #[test]
    fn missing_session_loads_fresh_without_warning() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        let (session, warning) = store.load("1700000000.000001");

        assert!(warning.is_none());
        assert!(session.is_empty());
        assert!(session.title.starts_with("Chat 2023-11-14"));
    }

    #[test]
    fn corrupt_transcript_resets_session_and_warns() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = sample_session("1700000000.000001");
        store.save(&session).unwrap();

        fs::write(store.display_path(&session.id), "{not json").unwrap();

        let (loaded, warning) = store.load(&session.id);
        assert!(matches!(warning, Some(LoadError::Corrupt { .. })));
        assert!(loaded.is_empty());
        // Catalog title survives the reset.
        assert_eq!(loaded.title, "Roof questions");
    }

    #[test]
    fn list_prunes_entries_with_no_backing_content() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        let kept = sample_session("1700000000.000001");
        let doomed = sample_session("1700000000.000002");
        store.save(&kept).unwrap();
        store.save(&doomed).unwrap();

        fs::remove_file(store.display_path(&doomed.id)).unwrap();
        fs::remove_file(store.history_path(&doomed.id)).unwrap();

        let catalog = store.list();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains_key(&kept.id));

        // The trimmed catalog was re-persisted, not just filtered in memory.
        let reread = store.read_catalog();
        assert!(!reread.contains_key(&doomed.id));
    }

    #[test]
    fn list_keeps_entries_with_partial_content() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = sample_session("1700000000.000001");
        store.save(&session).unwrap();

        fs::remove_file(store.history_path(&session.id)).unwrap();

        let catalog = store.list();
        assert!(catalog.contains_key(&session.id));
    }

    #[test]
    fn new_id_avoids_existing_sessions() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        let id = store.new_id();
        store.save(&sample_session(&id)).unwrap();

        let next = store.new_id();
        assert_ne!(id, next);
        assert!(next.parse::<f64>().is_ok());
    }

    #[test]
    fn save_updates_existing_catalog_title() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let mut session = sample_session("1700000000.000001");
        store.save(&session).unwrap();

        session.title = "Renamed".to_string();
        store.save(&session).unwrap();

        let catalog = store.list();
        assert_eq!(catalog.get(&session.id).map(String::as_str), Some("Renamed"));
    }
}
