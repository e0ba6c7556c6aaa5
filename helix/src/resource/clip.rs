//! Clips: short video highlights, looked up by ID or listed per broadcaster/game.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Resource;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseIdError {
    #[error("clip id must be a positive integer, got '{0}'")]
    Invalid(String),
}

/// Positive integer clip identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(u64);

impl ClipId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for ClipId {
    type Error = ParseIdError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        if v == 0 {
            return Err(ParseIdError::Invalid(v.to_string()));
        }
        Ok(Self(v))
    }
}

impl FromStr for ClipId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u64>()
            .map_err(|_| ParseIdError::Invalid(s.to_string()))
            .and_then(ClipId::try_from)
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clip record as returned by `GET /clips`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default)]
    pub broadcaster_id: Option<String>,
    #[serde(default)]
    pub broadcaster_name: Option<String>,
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title.as_deref().unwrap_or(""))
    }
}

/// The clips resource.
pub struct Clips;

impl Resource for Clips {
    type Id = ClipId;
    type Item = Clip;

    const NAMESPACE: &'static str = "helix.clip";
    const PATH: &'static str = "clips";
    const SCOPING_KEYS: &'static [&'static str] = &["broadcaster_id", "game_id"];

    fn parse_id(raw: &str) -> Result<ClipId, String> {
        raw.parse().map_err(|e: ParseIdError| e.to_string())
    }

    fn id_of(item: &Clip) -> Option<ClipId> {
        item.id.parse().ok()
    }
}
