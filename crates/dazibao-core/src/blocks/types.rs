use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::defaults::DEFAULT_PORT;

/// The whole persisted tree: every block in display order plus global metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub blocks: Vec<Block>,

    /// Time of the most recent tick committed by any block.
    #[serde(default)]
    pub last_updated: DateTime<Utc>,

    /// HTTP port. Zero or missing means [`DEFAULT_PORT`] after [`normalize`](Self::normalize).
    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub colors: GlobalColors,
}

impl DashboardConfig {
    /// Fill in values that are regenerated on load rather than stored.
    pub fn normalize(&mut self) {
        if self.port == 0 {
            self.port = DEFAULT_PORT;
        }
    }

    /// Check structural invariants that the schedulers rely on.
    pub fn validate(&self) -> Result<(), String> {
        for (index, block) in self.blocks.iter().enumerate() {
            if block.interval == 0 {
                return Err(format!(
                    "block {} ('{}') has interval 0; interval must be at least 1 second",
                    index, block.title
                ));
            }
        }
        Ok(())
    }
}

/// One titled, independently scheduled unit on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(flatten)]
    pub kind: BlockKind,

    pub title: String,

    /// Polling interval in seconds.
    pub interval: u64,

    #[serde(default)]
    pub last_updated: DateTime<Utc>,

    /// Styling, passed through to the page untouched.
    #[serde(default)]
    pub colors: BlockColors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    Single {
        command: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        output: String,
    },
    Group {
        commands: Vec<GroupCommand>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCommand {
    pub label: String,
    pub command: String,
    #[serde(default)]
    pub output: String,
}

impl GroupCommand {
    pub fn new(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
            output: String::new(),
        }
    }
}

impl Block {
    pub fn single(title: impl Into<String>, command: impl Into<String>, interval: u64) -> Self {
        Self {
            kind: BlockKind::Single {
                command: command.into(),
                output: String::new(),
            },
            title: title.into(),
            interval,
            last_updated: DateTime::<Utc>::default(),
            colors: BlockColors::default(),
        }
    }

    pub fn group(title: impl Into<String>, commands: Vec<GroupCommand>, interval: u64) -> Self {
        Self {
            kind: BlockKind::Group { commands },
            title: title.into(),
            interval,
            last_updated: DateTime::<Utc>::default(),
            colors: BlockColors::default(),
        }
    }

    pub fn with_colors(mut self, colors: BlockColors) -> Self {
        self.colors = colors;
        self
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            BlockKind::Single { .. } => "single",
            BlockKind::Group { .. } => "group",
        }
    }

    /// Command strings in declared order.
    pub fn commands(&self) -> Vec<&str> {
        match &self.kind {
            BlockKind::Single { command, .. } => vec![command.as_str()],
            BlockKind::Group { commands } => commands.iter().map(|c| c.command.as_str()).collect(),
        }
    }

    /// Current output slots in declared order.
    pub fn outputs(&self) -> Vec<&str> {
        match &self.kind {
            BlockKind::Single { output, .. } => vec![output.as_str()],
            BlockKind::Group { commands } => commands.iter().map(|c| c.output.as_str()).collect(),
        }
    }

    /// Overwrite every output slot.
    ///
    /// Returns false and leaves the block untouched when `outputs` does not
    /// have exactly one entry per command.
    pub fn set_outputs(&mut self, outputs: Vec<String>) -> bool {
        match &mut self.kind {
            BlockKind::Single { output, .. } => match <[String; 1]>::try_from(outputs) {
                Ok([value]) => {
                    *output = value;
                    true
                }
                Err(_) => false,
            },
            BlockKind::Group { commands } => {
                if commands.len() != outputs.len() {
                    return false;
                }
                for (slot, value) in commands.iter_mut().zip(outputs) {
                    slot.output = value;
                }
                true
            }
        }
    }

    /// Stamp the block as updated at `now`.
    ///
    /// The stamp is strictly greater than the previous one even when the
    /// wall clock has not advanced (or went backwards).
    pub fn touch(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.last_updated = if now > self.last_updated {
            now
        } else {
            self.last_updated + chrono::Duration::nanoseconds(1)
        };
        self.last_updated
    }
}

/// Per-block styling. Known keys are typed; anything else is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockColors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_font_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_font_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_font_size: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalColors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_background: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}
