//! Dialog rendering primitive.
//!
//! A prompt is created from a [`PromptConfig`], presented, and resolves
//! once the user picks an action or the prompt is dismissed. While it is on
//! screen its title can be rewritten and it can be dismissed
//! programmatically, which is how progress dialogs are driven.

use async_trait::async_trait;
use std::sync::Arc;

/// A button on a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAction {
    pub label: String,
    /// Rendered as the primary/confirming action
    pub is_default: bool,
}

impl PromptAction {
    /// A secondary (cancel/background) action.
    pub fn secondary(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            is_default: false,
        }
    }

    /// The confirming action.
    pub fn confirm(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            is_default: true,
        }
    }
}

/// Everything needed to render a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    pub title: String,
    pub subtitle: Option<String>,
    /// Whether tapping the backdrop closes the prompt
    pub dismissible: bool,
    /// Buttons, in display order
    pub actions: Vec<PromptAction>,
}

impl PromptConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            dismissible: false,
            actions: Vec::new(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = dismissible;
        self
    }

    pub fn with_action(mut self, action: PromptAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Index of the confirming action, if any.
    pub fn default_action(&self) -> Option<usize> {
        self.actions.iter().position(|a| a.is_default)
    }
}

/// How a presented prompt was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    /// The user pressed the action at this index
    Action(usize),
    /// Closed without an action (programmatic dismiss or backdrop tap)
    Dismissed,
}

/// A created prompt.
#[async_trait]
pub trait PromptHandle: Send + Sync {
    /// Show the prompt and wait until it closes.
    async fn present(&self) -> PromptOutcome;

    /// Replace the title while the prompt is on screen.
    fn set_title(&self, title: &str);

    /// Close the prompt; a pending `present` resolves with `Dismissed`.
    fn dismiss(&self);
}

/// Factory for prompts.
pub trait Prompter: Send + Sync {
    fn create(&self, config: PromptConfig) -> Arc<dyn PromptHandle>;
}
