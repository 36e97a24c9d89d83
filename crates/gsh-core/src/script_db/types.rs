//! Types used by the script catalogue.

use serde::Serialize;

/// Internal script identifier; never shown to the user as a name.
pub type ScriptId = i64;

/// One catalogued script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptRecord {
    pub id: ScriptId,
    /// How the user named the script. Unique across the catalogue.
    pub human_name: String,
    /// Where the script was imported from.
    pub source_uri: String,
    /// How the script identifies itself.
    pub class_name: String,
}

/// Row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScript {
    pub human_name: String,
    pub source_uri: String,
    pub class_name: String,
}

impl NewScript {
    /// Script whose class name matches its human name.
    pub fn named(human_name: impl Into<String>, source_uri: impl Into<String>) -> Self {
        let human_name = human_name.into();
        Self {
            class_name: human_name.clone(),
            human_name,
            source_uri: source_uri.into(),
        }
    }
}

/// Columns to change; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptUpdate {
    pub human_name: Option<String>,
    pub source_uri: Option<String>,
    pub class_name: Option<String>,
}

impl ScriptUpdate {
    pub fn rename(new_name: impl Into<String>) -> Self {
        Self {
            human_name: Some(new_name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.human_name.is_none() && self.source_uri.is_none() && self.class_name.is_none()
    }
}

/// Which rows an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSelection {
    All,
    Id(ScriptId),
    Name(String),
}

/// Errors from catalogue operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a script named {0:?} already exists")]
    NameTaken(String),
    #[error("{0:?} is not a valid script name")]
    InvalidName(String),
    #[error("failed to remove script data for {name:?}")]
    Cleanup {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
