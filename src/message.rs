use serde::{Deserialize, Serialize};

use crate::quest::QuestId;

// A selectable option the transport may render as a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    SelectQuest(QuestId),
    StartQuest(QuestId),
    CancelSelection,
}

// One outbound message per inbound player event. Choices carry their display
// label so transports can render buttons without consulting the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub choices: Vec<(String, Choice)>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choices(text: impl Into<String>, choices: Vec<(String, Choice)>) -> Self {
        Reply {
            text: text.into(),
            choices,
        }
    }
}
