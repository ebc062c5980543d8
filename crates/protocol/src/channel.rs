//! Channel identity and query matching
//!
//! Users name the channels to export with short query strings:
//!
//! ```text
//! you,them                     # conversation by name
//! family#general               # team channel (team name + topic)
//! $id$0000f0b5c2c2211c8d67...  # conversation by id
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// A conversation visible to the transport
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    /// Conversation id
    pub id: String,

    /// Conversation name (`you,them` or a team name)
    pub name: String,

    /// Topic name for team channels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,

    /// Membership type as reported by the transport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members_type: Option<String>,
}

impl Channel {
    /// Create a conversation channel without a topic
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            topic_name: None,
            members_type: None,
        }
    }

    /// Set the topic name
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic_name = Some(topic.into());
        self
    }

    /// Display name: `name` or `name#topic`
    pub fn display_name(&self) -> String {
        match self.topic_name.as_deref() {
            Some(topic) if !topic.is_empty() => format!("{}#{}", self.name, topic),
            _ => self.name.clone(),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Parsed channel query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelQuery {
    /// Match by conversation name (`you,them`)
    Name(String),

    /// Match a team channel by team name and topic (`team#topic`)
    TeamTopic { team: String, topic: String },

    /// Match by conversation id (`$id$<id>`)
    Id(String),
}

impl ChannelQuery {
    /// Find the first channel matching this query
    pub fn find<'a>(&self, channels: &'a [Channel]) -> Option<&'a Channel> {
        channels.iter().find(|channel| self.matches(channel))
    }

    /// Check a single channel against this query
    pub fn matches(&self, channel: &Channel) -> bool {
        match self {
            Self::Name(name) => channel.name == *name,
            Self::TeamTopic { team, topic } => {
                channel.name == *team && channel.topic_name.as_deref() == Some(topic.as_str())
            }
            Self::Id(id) => channel.id == *id,
        }
    }
}

impl FromStr for ChannelQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let query = s.trim();
        if query.is_empty() {
            return Err(QueryError::Empty);
        }

        // `$mode$value`
        if let Some(rest) = query.strip_prefix('$')
            && let Some((mode, value)) = rest.split_once('$')
            && !mode.is_empty()
            && !value.is_empty()
        {
            return match mode {
                "id" => Ok(Self::Id(value.to_string())),
                other => Err(QueryError::unknown_mode(other)),
            };
        }

        // `team#topic`; anything after a second '#' is ignored
        let mut parts = query.split('#');
        if let (Some(team), Some(topic)) = (parts.next(), parts.next())
            && !topic.is_empty()
        {
            return Ok(Self::TeamTopic {
                team: team.to_string(),
                topic: topic.to_string(),
            });
        }

        Ok(Self::Name(query.to_string()))
    }
}

impl fmt::Display for ChannelQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::TeamTopic { team, topic } => write!(f, "{}#{}", team, topic),
            Self::Id(id) => write!(f, "$id${}", id),
        }
    }
}
