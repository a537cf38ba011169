//! User profiles: the `users` sheet and the `/profile` commands

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sheetcore::params::{get_arg, Parameter};
use sheetcore::utils::{code, escape_markdown_v2};
use sheetcore::{AppResult, Cell, ChatUser, Command, CommandHandler, DispatchContext, Feature, Row, RowStore, SheetBackend};

use crate::config::sheets;

const USER_COLUMN: usize = 1;
const MAX_DISPLAY_NAME: usize = 32;

/// One row of the `users` sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub display_name: String,
    pub joined_at: Option<NaiveDateTime>,
}

impl Profile {
    fn from_row(row: &Row) -> Option<Self> {
        let text = |i: usize| row.get(i).map(|c| c.to_string()).unwrap_or_default();
        let user_id = row.first()?.as_i64()?;
        let username = Some(text(1)).filter(|s| !s.is_empty());
        let first_name = text(2);
        let display_name = Some(text(3)).filter(|s| !s.is_empty()).unwrap_or_else(|| first_name.clone());
        let joined_at = match row.get(4) {
            Some(Cell::Date(date)) => Some(*date),
            _ => None,
        };
        Some(Self {
            user_id,
            username,
            first_name,
            display_name,
            joined_at,
        })
    }

    fn to_row(&self) -> Row {
        vec![
            Cell::Int(self.user_id),
            Cell::from(self.username.clone().unwrap_or_default()),
            Cell::from(self.first_name.clone()),
            Cell::from(self.display_name.clone()),
            self.joined_at.map(Cell::Date).unwrap_or_default(),
        ]
    }
}

/// Registered users, keyed by Telegram id.
#[derive(Clone)]
pub struct UserDirectory {
    table: RowStore,
}

impl UserDirectory {
    pub fn new(backend: Arc<dyn SheetBackend>) -> Self {
        Self {
            table: RowStore::new(backend, sheets::USERS, sheets::USERS_HEADERS),
        }
    }

    pub fn get(&self, user_id: i64) -> AppResult<Option<Profile>> {
        let row = self.table.read_row(USER_COLUMN, &user_id.to_string())?;
        Ok(row.as_ref().and_then(Profile::from_row))
    }

    /// Registers `user` on first contact and keeps Telegram-side names fresh.
    /// Returns true when the user was new.
    pub fn ensure(&self, user: &ChatUser) -> AppResult<bool> {
        match self.get(user.id)? {
            Some(mut profile) => {
                if profile.username != user.username || profile.first_name != user.first_name {
                    profile.username = user.username.clone();
                    profile.first_name = user.first_name.clone();
                    self.save(&profile)?;
                }
                Ok(false)
            }
            None => {
                let profile = Profile {
                    user_id: user.id,
                    username: user.username.clone(),
                    first_name: user.first_name.clone(),
                    display_name: user.first_name.clone(),
                    joined_at: Some(Utc::now().naive_utc()),
                };
                self.save(&profile)?;
                log::info!("Registered new user {} ({})", user.id, user.handle());
                Ok(true)
            }
        }
    }

    pub fn set_display_name(&self, user_id: i64, display_name: &str) -> AppResult<Option<Profile>> {
        let Some(mut profile) = self.get(user_id)? else {
            return Ok(None);
        };
        profile.display_name = display_name.to_string();
        self.save(&profile)?;
        Ok(Some(profile))
    }

    /// Display name, or the raw id for users we have never seen.
    pub fn name_of(&self, user_id: i64) -> AppResult<String> {
        Ok(self
            .get(user_id)?
            .map(|p| p.display_name)
            .unwrap_or_else(|| user_id.to_string()))
    }

    fn save(&self, profile: &Profile) -> AppResult<()> {
        self.table
            .update_row(USER_COLUMN, &profile.user_id.to_string(), profile.to_row())?;
        Ok(())
    }
}

fn display_name(raw: &str) -> Result<String, String> {
    let length = raw.chars().count();
    if length == 0 || length > MAX_DISPLAY_NAME {
        return Err(format!(
            "A name must be 1 to {} characters\\. Try again:",
            MAX_DISPLAY_NAME
        ));
    }
    Ok(raw.to_string())
}

pub struct ShowProfile {
    users: UserDirectory,
}

#[async_trait]
impl CommandHandler for ShowProfile {
    async fn handle(&self, _command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        let Some(profile) = self.users.get(ctx.user.id)? else {
            return ctx.say("No profile yet\\. Send /start first\\.").await;
        };

        let mut text = format!(
            "*{}*\nUser id: {}",
            escape_markdown_v2(&profile.display_name),
            code(&profile.user_id.to_string())
        );
        if let Some(username) = &profile.username {
            text.push_str(&format!("\nUsername: @{}", escape_markdown_v2(username)));
        }
        if let Some(joined_at) = profile.joined_at {
            text.push_str(&format!(
                "\nJoined: {}",
                escape_markdown_v2(&joined_at.format("%Y-%m-%d").to_string())
            ));
        }
        ctx.say(text).await
    }
}

pub struct SetName {
    users: UserDirectory,
}

#[async_trait]
impl CommandHandler for SetName {
    async fn handle(&self, command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        let param = Parameter::new("display_name", "What should I call you? Send one word:", display_name);
        let Some(name) = get_arg(command, ctx, &param).await? else {
            return Ok(());
        };

        match self.users.set_display_name(ctx.user.id, &name)? {
            Some(_) => ctx.say(format!("Done, you are now *{}*", escape_markdown_v2(&name))).await,
            None => ctx.say("No profile yet\\. Send /start first\\.").await,
        }
    }
}

pub fn feature(users: UserDirectory) -> Feature {
    Feature::branch(
        "profile",
        "Your profile",
        vec![
            Feature::leaf(
                "show",
                "Show your profile",
                "/profile show",
                Arc::new(ShowProfile { users: users.clone() }),
            )
            .with_button("👤 Show profile", "/profile show"),
            Feature::leaf(
                "name",
                "Change your display name",
                "/profile name <name>",
                Arc::new(SetName { users }),
            )
            .with_button("✏️ Change name", "/profile name"),
        ],
    )
    .with_button("👤 Profile", "/profile")
}
