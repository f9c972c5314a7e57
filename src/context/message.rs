use serde::{Deserialize, Serialize};

use crate::model::Entity;

/// One conversation turn, in either of its two forms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "lowercase")]
pub enum Message {
    /// Chat form: display tokens in text, attachments carried by value.
    Display {
        text: String,
        #[serde(default)]
        attachments: Vec<Entity>,
    },
    /// Execution form: namespace tokens in text, attachments by name.
    Namespace {
        text: String,
        #[serde(default)]
        attachments: Vec<String>,
    },
}

impl Message {
    pub fn display(text: impl Into<String>, attachments: Vec<Entity>) -> Self {
        Message::Display {
            text: text.into(),
            attachments,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Message::Display { text, .. } | Message::Namespace { text, .. } => text,
        }
    }

    pub fn is_contextualized(&self) -> bool {
        matches!(self, Message::Namespace { .. })
    }
}
