//! Supported reading-tracker platforms

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reading-tracker site a book set was scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// goodreads.com, the primary tracker
    #[default]
    Goodreads,
    /// app.thestorygraph.com
    StoryGraph,
}

impl Platform {
    /// All supported platforms
    pub const ALL: [Platform; 2] = [Platform::Goodreads, Platform::StoryGraph];

    /// Identifier used in config files and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Platform::Goodreads => "goodreads",
            Platform::StoryGraph => "storygraph",
        }
    }

    /// Human-readable name shown in the presence tooltip
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Goodreads => "Goodreads",
            Platform::StoryGraph => "The StoryGraph",
        }
    }

    /// Label of the presence button linking to the user's page
    pub fn button_label(&self) -> String {
        format!("View on {}", self.label())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "goodreads" => Ok(Platform::Goodreads),
            "storygraph" | "thestorygraph" => Ok(Platform::StoryGraph),
            other => Err(CoreError::UnknownPlatform(other.to_string())),
        }
    }
}
