//! `/start`, `/help` and `/cancel`
//!
//! Start and help describe the whole tree, which does not exist yet when
//! their handlers are built. They share a [`Menu`] slot that
//! `features::build_tree` fills once the tree is validated.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use sheetcore::feature::describe_features;
use sheetcore::utils::{code, escape_markdown_v2};
use sheetcore::{AppResult, Command, CommandHandler, DispatchContext, Feature, FeatureTree, Reply};

use super::profile::UserDirectory;

/// Pre-rendered views of the finished tree.
#[derive(Debug, Clone)]
pub struct Menu {
    pub listing: Reply,
    pub help: String,
}

impl Menu {
    pub fn from_tree(tree: &FeatureTree) -> Self {
        let listing = describe_features("Available commands", "", tree.roots());

        let mut help = String::from("*Commands*\n");
        for (path, usage) in tree.leaves() {
            help.push_str(&format!("\n{} \\- {}", code(&format!("/{}", path)), escape_markdown_v2(usage)));
        }
        Self { listing, help }
    }
}

pub type MenuSlot = Arc<OnceLock<Menu>>;

pub struct Start {
    menu: MenuSlot,
    users: UserDirectory,
}

#[async_trait]
impl CommandHandler for Start {
    async fn handle(&self, _command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        ctx.states.clear(ctx.user.id)?;
        let name = self.users.name_of(ctx.user.id)?;
        let greeting = format!(
            "Hi *{}*\\! Your user id is {}\\.",
            escape_markdown_v2(&name),
            code(&ctx.user.id.to_string())
        );

        let Some(menu) = self.menu.get() else {
            log::warn!("Start requested before the command menu was built");
            return ctx.say(greeting).await;
        };
        let mut reply = menu.listing.clone();
        reply.text = format!("{}\n\n{}", greeting, reply.text);
        ctx.reply(reply).await
    }
}

pub struct Help {
    menu: MenuSlot,
}

#[async_trait]
impl CommandHandler for Help {
    async fn handle(&self, _command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        ctx.states.clear(ctx.user.id)?;
        match self.menu.get() {
            Some(menu) => ctx.say(menu.help.clone()).await,
            None => ctx.say("No commands available yet\\.").await,
        }
    }
}

pub struct Cancel;

#[async_trait]
impl CommandHandler for Cancel {
    async fn handle(&self, _command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        ctx.states.clear(ctx.user.id)?;
        ctx.say("Cancelled\\.").await
    }
}

pub fn features(menu: MenuSlot, users: UserDirectory) -> Vec<Feature> {
    vec![
        Feature::leaf(
            "start",
            "Say hello",
            "/start",
            Arc::new(Start {
                menu: menu.clone(),
                users,
            }),
        ),
        Feature::leaf("help", "List every command", "/help", Arc::new(Help { menu })),
        Feature::leaf("cancel", "Forget the command in progress", "/cancel", Arc::new(Cancel)),
    ]
}
