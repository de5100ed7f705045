use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayerfigError {
    #[error("Invalid number of values for config item '{item}'; expecting {expected}, got {got}")]
    Arity {
        item: String,
        expected: String,
        got: usize,
    },

    #[error("Invalid value '{value}' for config item '{item}': {reason}")]
    Coercion {
        item: String,
        value: String,
        reason: String,
    },

    #[error("Invalid choice '{value}' for config item '{item}'; valid choices are ({choices})")]
    InvalidChoice {
        item: String,
        value: String,
        choices: String,
    },

    #[error("Invalid value '{value}' for config item '{item}' which takes no values")]
    ZeroArityValue { item: String, value: String },

    #[error("Did not find value for config item '{0}'")]
    RequiredNotFound(String),

    #[error("Invalid config item '{item}': {reason}")]
    InvalidItem { item: String, reason: String },

    #[error("Config item '{0}' has already been added")]
    DuplicateItem(String),

    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    #[error("Action '{0}' is already registered")]
    DuplicateAction(String),

    #[error("Cannot accumulate config item '{item}': {reason}")]
    Accumulate { item: String, reason: String },

    #[error("Unknown key '{key}' in source '{id}'")]
    UnknownKey { key: String, id: String },

    #[error("Source '{id}' failed: {reason}")]
    Source { id: String, reason: String },

    #[error("Failed to deserialize config values: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl LayerfigError {
    /// True for errors raised while building items or registering actions,
    /// as opposed to errors raised while parsing sources.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            LayerfigError::InvalidItem { .. }
                | LayerfigError::DuplicateItem(_)
                | LayerfigError::UnknownAction(_)
                | LayerfigError::DuplicateAction(_)
        )
    }
}

/// Render a value for an error message: strings without quotes, everything
/// else in its JSON form.
pub(crate) fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
