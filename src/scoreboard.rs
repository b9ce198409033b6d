//! Scoreboard data: one ordered list of `{name, score}` records per game mode,
//! persisted as a single flat JSON object.
//!
//! The service stores whatever a client posts: `game` picks the list, `name`
//! and `score` are kept as the JSON values they arrived as.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub score: Value,
}

/// What the game client posts to `POST /scoreboard/post`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub game: String,
    pub name: String,
    pub score: i64,
}

/// One posted entry: the list it goes to and the record appended there.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub game: String,
    pub record: ScoreRecord,
}

impl From<ScoreSubmission> for ScoreEntry {
    fn from(sub: ScoreSubmission) -> Self {
        ScoreEntry {
            game: sub.game,
            record: ScoreRecord {
                name: Value::from(sub.name),
                score: Value::from(sub.score),
            },
        }
    }
}

impl From<Value> for ScoreEntry {
    /// Any JSON is accepted. A non-string `game` is keyed by its JSON text and
    /// a missing one by `"undefined"`, the way a JavaScript object key would be.
    fn from(payload: Value) -> Self {
        let field = |k: &str| payload.get(k).cloned();
        let game = match field("game") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => "undefined".to_string(),
        };
        ScoreEntry {
            game,
            record: ScoreRecord {
                name: field("name").unwrap_or(Value::Null),
                score: field("score").unwrap_or(Value::Null),
            },
        }
    }
}

/// Game mode key → records in submission order.
pub type Scoreboard = BTreeMap<String, Vec<ScoreRecord>>;

/// Append an entry to its mode's list, creating the list on first use.
pub fn record(board: &mut Scoreboard, entry: impl Into<ScoreEntry>) {
    let ScoreEntry { game, record } = entry.into();
    board.entry(game).or_default().push(record);
}

#[cfg(feature = "server")]
pub use store::{ScoreStore, ScoreboardError};

#[cfg(feature = "server")]
mod store {
    use std::path::{Path, PathBuf};

    use tokio::sync::Mutex;

    use super::{ScoreEntry, Scoreboard, record};

    #[derive(Debug, thiserror::Error)]
    pub enum ScoreboardError {
        #[error("I/O error on {path}: {source}")]
        Io {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },

        #[error("malformed scoreboard JSON in {path}: {source}")]
        Json {
            path: PathBuf,
            #[source]
            source: serde_json::Error,
        },
    }

    /// Flat-file store. Read-modify-write cycles are serialised within this
    /// process; other writers to the same file are not coordinated.
    pub struct ScoreStore {
        path: PathBuf,
        write_lock: Mutex<()>,
    }

    impl ScoreStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                write_lock: Mutex::new(()),
            }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn io_err(&self, source: std::io::Error) -> ScoreboardError {
            ScoreboardError::Io {
                path: self.path.clone(),
                source,
            }
        }

        /// Current board; a missing file is an empty board.
        pub async fn load(&self) -> Result<Scoreboard, ScoreboardError> {
            let bytes = match tokio::fs::read(&self.path).await {
                Ok(b) => b,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(Scoreboard::new());
                }
                Err(e) => return Err(self.io_err(e)),
            };
            serde_json::from_slice(&bytes).map_err(|source| ScoreboardError::Json {
                path: self.path.clone(),
                source,
            })
        }

        async fn save(&self, board: &Scoreboard) -> Result<(), ScoreboardError> {
            if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| self.io_err(e))?;
            }
            let json = serde_json::to_vec(board).map_err(|source| ScoreboardError::Json {
                path: self.path.clone(),
                source,
            })?;
            tokio::fs::write(&self.path, json)
                .await
                .map_err(|e| self.io_err(e))
        }

        /// Append one record and return the whole updated board.
        pub async fn append(
            &self,
            entry: impl Into<ScoreEntry>,
        ) -> Result<Scoreboard, ScoreboardError> {
            let entry = entry.into();
            let _guard = self.write_lock.lock().await;
            let mut board = self.load().await?;
            log::info!(
                "scoreboard: {} scored {} in {}",
                entry.record.name,
                entry.record.score,
                entry.game
            );
            record(&mut board, entry);
            self.save(&board).await?;
            Ok(board)
        }
    }
}
