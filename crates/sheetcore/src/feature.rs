//! Feature tree and recursive dispatch
//!
//! A feature is either a leaf with a handler or a branch with ordered
//! sub-features. Dispatch walks the tree one token per level. The tree is
//! built once at startup and only read afterwards.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;

use crate::chat::{Button, ChatSender, ChatUser, Reply};
use crate::command::Command;
use crate::error::AppResult;
use crate::state::CommandStateStore;
use crate::utils::{code, escape_markdown_v2};

/// Everything a handler needs to answer one command.
pub struct DispatchContext<'a> {
    pub sender: &'a dyn ChatSender,
    pub states: &'a CommandStateStore,
    pub user: &'a ChatUser,
    pub chat_id: i64,
}

impl DispatchContext<'_> {
    pub async fn reply(&self, reply: Reply) -> AppResult<()> {
        self.sender.send(self.chat_id, reply).await
    }

    /// Sends plain (already formatted) text without a keyboard.
    pub async fn say(&self, text: impl Into<String> + Send) -> AppResult<()> {
        self.reply(Reply::text(text)).await
    }
}

/// Terminal behaviour of a leaf feature.
///
/// The command's cursor is already past the leaf's own word; the handler
/// pulls whatever arguments it needs (usually through `params::get_arg`).
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()>;
}

pub enum FeatureKind {
    Leaf { help: String, handler: Arc<dyn CommandHandler> },
    Branch { sub_features: Vec<Feature> },
}

pub struct Feature {
    /// Lowercase match key, unique among siblings.
    pub command_word: String,
    pub description: String,
    pub button: Option<Button>,
    pub kind: FeatureKind,
}

impl Feature {
    pub fn leaf(
        command_word: &str,
        description: impl Into<String>,
        help: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            command_word: command_word.to_lowercase(),
            description: description.into(),
            button: None,
            kind: FeatureKind::Leaf {
                help: help.into(),
                handler,
            },
        }
    }

    pub fn branch(command_word: &str, description: impl Into<String>, sub_features: Vec<Feature>) -> Self {
        Self {
            command_word: command_word.to_lowercase(),
            description: description.into(),
            button: None,
            kind: FeatureKind::Branch { sub_features },
        }
    }

    pub fn with_button(mut self, label: impl Into<String>, payload: impl Into<String>) -> Self {
        self.button = Some(Button::new(label, payload));
        self
    }

    pub fn sub_features(&self) -> &[Feature] {
        match &self.kind {
            FeatureKind::Leaf { .. } => &[],
            FeatureKind::Branch { sub_features } => sub_features,
        }
    }

    /// Sibling lookup; `word` is compared case-insensitively.
    pub fn find<'f>(features: &'f [Feature], word: &str) -> Option<&'f Feature> {
        let word = word.to_lowercase();
        features.iter().find(|f| f.command_word == word)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeatureTreeError {
    #[error("duplicate command word '{word}' under '{parent}'")]
    DuplicateCommand { parent: String, word: String },

    #[error("empty or multi-word command word under '{parent}'")]
    InvalidCommandWord { parent: String },
}

/// The validated set of top-level features.
pub struct FeatureTree {
    roots: Vec<Feature>,
}

impl FeatureTree {
    pub fn new(roots: Vec<Feature>) -> Result<Self, FeatureTreeError> {
        validate_siblings("/", &roots)?;
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[Feature] {
        &self.roots
    }

    pub fn find_root(&self, word: &str) -> Option<&Feature> {
        Feature::find(&self.roots, word)
    }

    /// Every leaf as `(command path, help)`, depth first in tree order.
    pub fn leaves(&self) -> Vec<(String, &str)> {
        fn walk<'f>(features: &'f [Feature], prefix: &str, out: &mut Vec<(String, &'f str)>) {
            for feature in features {
                let path = join_path(prefix, &feature.command_word);
                match &feature.kind {
                    FeatureKind::Leaf { help, .. } => out.push((path, help.as_str())),
                    FeatureKind::Branch { sub_features } => walk(sub_features, &path, out),
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.roots, "", &mut out);
        out
    }
}

fn validate_siblings(parent: &str, features: &[Feature]) -> Result<(), FeatureTreeError> {
    let mut seen = HashSet::new();
    for feature in features {
        if feature.command_word.is_empty() || feature.command_word.contains(' ') {
            return Err(FeatureTreeError::InvalidCommandWord {
                parent: parent.to_string(),
            });
        }
        if !seen.insert(feature.command_word.as_str()) {
            return Err(FeatureTreeError::DuplicateCommand {
                parent: parent.to_string(),
                word: feature.command_word.clone(),
            });
        }
        validate_siblings(&feature.command_word, feature.sub_features())?;
    }
    Ok(())
}

pub(crate) fn join_path(prefix: &str, word: &str) -> String {
    if prefix.is_empty() {
        word.to_string()
    } else {
        format!("{} {}", prefix, word)
    }
}

/// Listing of `features` as reachable from `path`, with their buttons.
pub fn describe_features(heading: &str, path: &str, features: &[Feature]) -> Reply {
    let mut text = format!("*{}*\n", escape_markdown_v2(heading));
    for feature in features {
        let invocation = format!("/{}", join_path(path, &feature.command_word));
        text.push_str(&format!(
            "\n{} \\- {}",
            code(&invocation),
            escape_markdown_v2(&feature.description)
        ));
    }
    let buttons = features.iter().filter_map(|f| f.button.clone()).collect();
    Reply::text(text).with_buttons(buttons)
}

/// Same listing, prefixed with an unknown-command notice.
pub fn describe_unknown(word: &str, heading: &str, path: &str, features: &[Feature]) -> Reply {
    let mut reply = describe_features(heading, path, features);
    reply.text = format!("Unknown command: {}\n\n{}", code(word), reply.text);
    reply
}

/// Dispatches `command` into `feature`.
///
/// The caller has already consumed the feature's own word. Branches pull
/// one more token and recurse; a missing token gets the branch listing and
/// an unmatched one gets the listing plus an unknown-command notice, with
/// that token rolled back from the stored continuation.
pub fn handle_command<'a>(
    feature: &'a Feature,
    command: &'a mut Command,
    ctx: &'a DispatchContext<'a>,
    prefix: &'a str,
) -> BoxFuture<'a, AppResult<()>> {
    async move {
        let path = join_path(prefix, &feature.command_word);
        match &feature.kind {
            FeatureKind::Leaf { handler, .. } => {
                log::debug!("Running leaf /{} for user {}", path, ctx.user.id);
                handler.handle(command, ctx).await
            }
            FeatureKind::Branch { sub_features } => {
                let Some(word) = command.next_arg() else {
                    return ctx
                        .reply(describe_features(&feature.description, &path, sub_features))
                        .await;
                };

                match Feature::find(sub_features, &word) {
                    Some(sub_feature) => handle_command(sub_feature, command, ctx, &path).await,
                    None => {
                        log::info!("Unknown command '{}' under /{} from user {}", word, path, ctx.user.id);
                        // state is rolled back even if the reply fails
                        ctx.states.rollback(ctx.user.id)?;
                        ctx.reply(describe_unknown(&word, &feature.description, &path, sub_features))
                            .await
                    }
                }
            }
        }
    }
    .boxed()
}
