use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use crate::datetime::wire_date_serde;
use crate::error::TransportError;

/// Server-assigned task identifier. Kept as text whether the server sends a
/// string or a number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TaskType {
    Urgent,
    Normal,
    TeamAlignment,
    Training,
    Administrative,
}

impl TaskType {
    pub fn all() -> [Self; 5] {
        [
            Self::Urgent,
            Self::Normal,
            Self::TeamAlignment,
            Self::Training,
            Self::Administrative,
        ]
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Normal => "normal",
            Self::TeamAlignment => "teamAlignment",
            Self::Training => "training",
            Self::Administrative => "administrative",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for TaskType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .into_iter()
            .find(|kind| kind.as_key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                anyhow!(
                    "unknown task type `{wanted}` (expected one of: urgent, normal, \
                     teamAlignment, training, administrative)"
                )
            })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "taskTypeString")]
    pub task_type: TaskType,

    #[serde(deserialize_with = "wire_date_serde::deserialize")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub is_completed: bool,

    // The server contract spells this field without the second "n".
    #[serde(rename = "isCaceled", default)]
    pub is_canceled: bool,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        task_type: TaskType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::new(id),
            title: title.into(),
            description: None,
            task_type,
            created_at,
            is_completed: false,
            is_canceled: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DayGroup {
    #[serde(deserialize_with = "wire_date_serde::day::deserialize")]
    pub day: NaiveDate,

    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// One successful load. The shape follows the `grouped` request parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Flat(Vec<Task>),
    Grouped(Vec<DayGroup>),
}

impl Payload {
    pub fn decode(grouped: bool, body: &str) -> Result<Self, TransportError> {
        let decoded = if grouped {
            serde_json::from_str::<Vec<DayGroup>>(body).map(Self::Grouped)
        } else {
            serde_json::from_str::<Vec<Task>>(body).map(Self::Flat)
        };
        decoded.map_err(|err| TransportError::Decode(err.to_string()))
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, Self::Grouped(_))
    }

    pub fn tasks(&self) -> Box<dyn Iterator<Item = &Task> + '_> {
        match self {
            Self::Flat(tasks) => Box::new(tasks.iter()),
            Self::Grouped(groups) => Box::new(groups.iter().flat_map(|g| g.tasks.iter())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks().next().is_none()
    }
}
