use serde::{Deserialize, Serialize};

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The system instructions.
    System,
    /// The user.
    User,
    /// The model.
    Assistant,
    /// The result of a function call.
    Function,
}

/// A chat message in the OpenAI wire shape.
///
/// A sequence of messages forms the conversation sent to a backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote this message.
    pub role: Role,
    /// The text of the message.
    pub content: String,
    /// An optional participant name, required for [`Role::Function`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Creates a message with the given role and content.
    #[inline]
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
        }
    }

    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attaches a participant name.
    #[inline]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}
