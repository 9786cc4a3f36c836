//! Scripted prompts.
//!
//! Every prompt created through [`MockPrompter`] is recorded together with
//! the titles it was given and whether it was dismissed. How `present`
//! resolves is taken from a queue of [`PromptChoice`]s, one per prompt.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use crate::traits::{PromptConfig, PromptHandle, PromptOutcome, Prompter};

/// How the simulated user answers a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    /// Press the action at this index immediately
    Select(usize),
    /// Press the action after a delay, unless dismissed first
    SelectAfter(Duration, usize),
    /// Close the prompt without choosing
    Dismiss,
    /// Do nothing; only a programmatic dismiss closes the prompt
    Wait,
}

/// Snapshot of one created prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPrompt {
    pub config: PromptConfig,
    /// Titles set after creation, in order
    pub titles: Vec<String>,
    pub presented: bool,
    pub dismissed: bool,
    pub outcome: Option<PromptOutcome>,
}

impl RecordedPrompt {
    /// The title currently on screen.
    pub fn current_title(&self) -> &str {
        self.titles.last().unwrap_or(&self.config.title)
    }
}

/// [`Prompter`] that records prompts and answers from a script.
///
/// With no choice queued a prompt presses its default action, or waits for
/// a programmatic dismiss when it has none.
#[derive(Debug, Clone, Default)]
pub struct MockPrompter {
    choices: Arc<Mutex<VecDeque<PromptChoice>>>,
    prompts: Arc<Mutex<Vec<Arc<Mutex<RecordedPrompt>>>>>,
}

impl MockPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next created prompt.
    pub fn push_choice(&self, choice: PromptChoice) {
        self.choices.lock().unwrap().push_back(choice);
    }

    pub fn prompts(&self) -> Vec<RecordedPrompt> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.lock().unwrap().clone())
            .collect()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Prompter for MockPrompter {
    fn create(&self, config: PromptConfig) -> Arc<dyn PromptHandle> {
        let choice = self.choices.lock().unwrap().pop_front().unwrap_or_else(|| {
            match config.default_action() {
                Some(index) => PromptChoice::Select(index),
                None => PromptChoice::Wait,
            }
        });
        let record = Arc::new(Mutex::new(RecordedPrompt {
            config,
            titles: Vec::new(),
            presented: false,
            dismissed: false,
            outcome: None,
        }));
        self.prompts.lock().unwrap().push(record.clone());

        let (closed, _) = watch::channel(false);
        Arc::new(MockPromptHandle {
            choice,
            record,
            closed,
        })
    }
}

/// Handle returned by [`MockPrompter`].
#[derive(Debug)]
pub struct MockPromptHandle {
    choice: PromptChoice,
    record: Arc<Mutex<RecordedPrompt>>,
    closed: watch::Sender<bool>,
}

impl MockPromptHandle {
    async fn wait_dismissed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    fn finish(&self, outcome: PromptOutcome) -> PromptOutcome {
        let mut record = self.record.lock().unwrap();
        if record.outcome.is_none() {
            record.outcome = Some(outcome);
        }
        outcome
    }
}

#[async_trait]
impl PromptHandle for MockPromptHandle {
    async fn present(&self) -> PromptOutcome {
        self.record.lock().unwrap().presented = true;
        if *self.closed.borrow() {
            return self.finish(PromptOutcome::Dismissed);
        }

        let outcome = match self.choice {
            PromptChoice::Select(index) => {
                tokio::task::yield_now().await;
                PromptOutcome::Action(index)
            }
            PromptChoice::SelectAfter(delay, index) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => PromptOutcome::Action(index),
                    _ = self.wait_dismissed() => PromptOutcome::Dismissed,
                }
            }
            PromptChoice::Dismiss => PromptOutcome::Dismissed,
            PromptChoice::Wait => {
                self.wait_dismissed().await;
                PromptOutcome::Dismissed
            }
        };
        self.finish(outcome)
    }

    fn set_title(&self, title: &str) {
        self.record.lock().unwrap().titles.push(title.to_string());
    }

    fn dismiss(&self) {
        self.record.lock().unwrap().dismissed = true;
        self.closed.send_replace(true);
    }
}
