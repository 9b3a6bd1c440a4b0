// Content filter - asks a completion model how spammy a message is.
//
// The model answers in free text and is instructed to end with a percentage.
// The last `NN%` token in the answer is the score. No parseable score means
// the message passes: ambiguous output never escalates.

use super::filter_chain::SpamFilter;
use crate::core::actions::ModerationActions;
use crate::core::ai::{AiConfig, AiMessage, AiProvider};
use crate::core::moderation::{FilterVerdict, MessageEvent, MessageKey};
use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use std::sync::{Arc, OnceLock};

pub const DEFAULT_SPAM_THRESHOLD: u32 = 65;
pub const DEFAULT_SUSPICIOUS_THRESHOLD: u32 = 45;
pub const DEFAULT_SUSPICIOUS_REACTION: &str = "👀";

const NON_TEXT_PLACEHOLDER: &str = "<Message is not text>";

pub const DEFAULT_PROMPT: &str = r#"You review messages posted in a technical community chat and rate how likely each one is spam or fraud.

Typical signs of spam:
- promises of large or effortless income
- requests to move the conversation to private messages, bots or external links
- meaningless symbol soup, emoji floods or repeated phrases
- advertising of questionable goods or services, casinos or betting
- offers that are too good to be true

Discussion of hacking, exploits and other specialist topics is normal here, and most members write in Russian; neither is a sign of spam.
Messages that are very short or carry no meaning should be rated 0%.

Explain your reasoning briefly, then give the score. Always answer in exactly this format:
[your reasoning] (spamness [0-100]%)"#;

/// Thresholds and model settings for the content filter.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub prompt: String,
    pub ai: AiConfig,
    /// Score at or above which a message is spam
    pub spam_threshold: u32,
    /// Score at or above which a passing message gets a marker reaction
    pub suspicious_threshold: u32,
    pub suspicious_reaction: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            ai: AiConfig::default(),
            spam_threshold: DEFAULT_SPAM_THRESHOLD,
            suspicious_threshold: DEFAULT_SUSPICIOUS_THRESHOLD,
            suspicious_reaction: DEFAULT_SUSPICIOUS_REACTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Spam likelihood in percent
    Score(u32),
    Unavailable,
}

/// Extract the last `NN%` token from a model answer.
pub fn parse_spam_score(answer: &str) -> Option<u32> {
    static PERCENT: OnceLock<Regex> = OnceLock::new();
    let pattern = PERCENT.get_or_init(|| Regex::new(r"(\d+)%").expect("valid percent pattern"));

    pattern
        .captures_iter(answer)
        .last()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Completion-backed scorer. Without a provider (no credential) it is disabled.
pub struct ContentClassifier<P: AiProvider> {
    provider: Option<P>,
    prompt: String,
    ai: AiConfig,
}

impl<P: AiProvider> ContentClassifier<P> {
    pub fn new(provider: Option<P>, prompt: String, ai: AiConfig) -> Self {
        if provider.is_none() {
            tracing::warn!("No classification credential configured, content filter is disabled");
        }
        Self {
            provider,
            prompt,
            ai,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn classify(&self, text: &str) -> Classification {
        let Some(provider) = &self.provider else {
            return Classification::Unavailable;
        };

        let messages = [AiMessage::system(&self.prompt), AiMessage::user(text)];
        let answer = match provider.chat_complete(&messages, &self.ai).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Classification request failed: {}", e);
                return Classification::Unavailable;
            }
        };

        match parse_spam_score(&answer) {
            Some(score) => Classification::Score(score),
            None => {
                tracing::error!("Failed to parse spamness percent from answer: {}", answer);
                Classification::Unavailable
            }
        }
    }
}

pub struct ContentFilter<P: AiProvider> {
    classifier: ContentClassifier<P>,
    actions: Arc<dyn ModerationActions>,
    spam_threshold: u32,
    suspicious_threshold: u32,
    suspicious_reaction: String,
    // Scores live only between `check` and the end of the chain walk.
    scores: DashMap<MessageKey, u32>,
}

impl<P: AiProvider> ContentFilter<P> {
    pub fn new(provider: Option<P>, config: ClassifierConfig, actions: Arc<dyn ModerationActions>) -> Self {
        Self {
            classifier: ContentClassifier::new(provider, config.prompt, config.ai),
            actions,
            spam_threshold: config.spam_threshold,
            suspicious_threshold: config.suspicious_threshold,
            suspicious_reaction: config.suspicious_reaction,
            scores: DashMap::new(),
        }
    }

    #[cfg(test)]
    fn retained_scores(&self) -> usize {
        self.scores.len()
    }
}

#[async_trait]
impl<P: AiProvider> SpamFilter for ContentFilter<P> {
    fn name(&self) -> &'static str {
        "Content"
    }

    async fn check(&self, event: &MessageEvent) -> FilterVerdict {
        if !self.classifier.is_enabled() {
            return FilterVerdict::Skip;
        }

        let text = event.content().unwrap_or(NON_TEXT_PLACEHOLDER);
        match self.classifier.classify(text).await {
            Classification::Score(score) => {
                tracing::info!(
                    chat_id = event.chat_id,
                    message_id = event.message_id,
                    score,
                    "Message classified"
                );
                self.scores.insert(event.key(), score);
                if score >= self.spam_threshold {
                    FilterVerdict::spam(format!("spamness {}%", score))
                } else {
                    FilterVerdict::NotSpam
                }
            }
            Classification::Unavailable => FilterVerdict::NotSpam,
        }
    }

    async fn on_chain_pass(&self, event: &MessageEvent) {
        let Some((_, score)) = self.scores.remove(&event.key()) else {
            return;
        };
        if score < self.suspicious_threshold {
            return;
        }

        tracing::info!(
            chat_id = event.chat_id,
            message_id = event.message_id,
            score,
            "Marking suspicious message"
        );
        if let Err(e) = self
            .actions
            .react_to_message(event.chat_id, event.message_id, &self.suspicious_reaction)
            .await
        {
            tracing::warn!("Failed to react to suspicious message: {}", e);
        }
    }

    fn release(&self, event: &MessageEvent) {
        self.scores.remove(&event.key());
    }
}

// ============================================================================
// TESTS
// ============================================================================
