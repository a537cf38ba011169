//! Five-letter word guessing game

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use sheetcore::params::{get_arg, Parameter};
use sheetcore::utils::code;
use sheetcore::{AppResult, Button, Cell, Command, CommandHandler, DispatchContext, Feature, Reply, RowStore, SheetBackend};

use crate::config::{self, game::{MAX_GUESSES, WORD_LENGTH}};

const USER_COLUMN: usize = 1;

pub const DEFAULT_WORDS: &[&str] = &[
    "apple", "beach", "bread", "chair", "cloud", "crane", "dance", "eagle", "flame", "ghost", "grape", "heart",
    "house", "juice", "knife", "lemon", "light", "mango", "music", "night", "ocean", "piano", "plant", "queen",
    "river", "robot", "smile", "snake", "stone", "storm", "sugar", "table", "tiger", "train", "water", "whale",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Correct,
    Present,
    Absent,
}

impl Mark {
    fn symbol(self) -> &'static str {
        match self {
            Mark::Correct => "🟩",
            Mark::Present => "🟨",
            Mark::Absent => "⬜",
        }
    }
}

/// Per-letter feedback. Repeated letters are only marked present as many
/// times as they occur in the answer outside exact matches.
pub fn score(answer: &str, guess: &str) -> Vec<Mark> {
    let answer: Vec<char> = answer.chars().collect();
    let guess: Vec<char> = guess.chars().collect();
    let mut marks = vec![Mark::Absent; guess.len()];
    let mut unmatched = Vec::new();

    for (i, g) in guess.iter().enumerate() {
        if answer.get(i) == Some(g) {
            marks[i] = Mark::Correct;
        } else if let Some(a) = answer.get(i) {
            unmatched.push(*a);
        }
    }
    for (i, g) in guess.iter().enumerate() {
        if marks[i] == Mark::Correct {
            continue;
        }
        if let Some(pos) = unmatched.iter().position(|a| a == g) {
            unmatched.swap_remove(pos);
            marks[i] = Mark::Present;
        }
    }
    marks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
    Quit,
}

impl GameStatus {
    fn as_str(self) -> &'static str {
        match self {
            GameStatus::Playing => "playing",
            GameStatus::Won => "won",
            GameStatus::Lost => "lost",
            GameStatus::Quit => "quit",
        }
    }

    fn parse(raw: &str) -> Self {
        match raw {
            "playing" => GameStatus::Playing,
            "won" => GameStatus::Won,
            "lost" => GameStatus::Lost,
            _ => GameStatus::Quit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub answer: String,
    pub guesses: Vec<String>,
    pub status: GameStatus,
}

impl Game {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            guesses: Vec::new(),
            status: GameStatus::Playing,
        }
    }

    /// Records a guess and updates the status.
    pub fn guess(&mut self, word: &str) {
        self.guesses.push(word.to_string());
        if word == self.answer {
            self.status = GameStatus::Won;
        } else if self.guesses.len() >= MAX_GUESSES {
            self.status = GameStatus::Lost;
        }
    }

    pub fn board(&self) -> String {
        self.guesses
            .iter()
            .map(|g| {
                let marks: String = score(&self.answer, g).into_iter().map(Mark::symbol).collect();
                format!("{} {}", marks, code(&g.to_uppercase()))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone)]
pub struct GameStore {
    table: RowStore,
}

impl GameStore {
    pub fn new(backend: Arc<dyn SheetBackend>) -> Self {
        Self {
            table: RowStore::new(backend, config::sheets::GAMES, config::sheets::GAMES_HEADERS),
        }
    }

    pub fn load(&self, user_id: i64) -> AppResult<Option<Game>> {
        let Some(row) = self.table.read_row(USER_COLUMN, &user_id.to_string())? else {
            return Ok(None);
        };
        let text = |i: usize| row.get(i).map(Cell::to_string).unwrap_or_default();
        let answer = text(1);
        if answer.is_empty() {
            return Ok(None);
        }
        let guesses = text(2)
            .split(',')
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Some(Game {
            answer,
            guesses,
            status: GameStatus::parse(&text(3)),
        }))
    }

    pub fn save(&self, user_id: i64, game: &Game) -> AppResult<()> {
        self.table.update_row(
            USER_COLUMN,
            &user_id.to_string(),
            vec![
                Cell::Int(user_id),
                Cell::from(game.answer.as_str()),
                Cell::from(game.guesses.join(",")),
                Cell::from(game.status.as_str()),
            ],
        )?;
        Ok(())
    }
}

fn guess_word(raw: &str) -> Result<String, String> {
    if raw.chars().count() == WORD_LENGTH && raw.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(raw.to_ascii_lowercase())
    } else {
        Err(format!(
            "A guess must be a {}\\-letter word\\. Try again:",
            WORD_LENGTH
        ))
    }
}

fn no_game() -> Reply {
    Reply::text("No game running\\.").with_buttons(vec![Button::new("🎲 New game", "/game start")])
}

pub struct StartGame {
    games: GameStore,
    words: Arc<Vec<String>>,
}

#[async_trait]
impl CommandHandler for StartGame {
    async fn handle(&self, _command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        if let Some(game) = self.games.load(ctx.user.id)?.filter(|g| g.status == GameStatus::Playing) {
            ctx.states.set(ctx.user.id, "game guess")?;
            let mut text = "You already have a game running\\. Send your next guess:".to_string();
            if !game.guesses.is_empty() {
                text = format!("{}\n\n{}", game.board(), text);
            }
            return ctx.say(text).await;
        }

        let Some(answer) = self.words.choose(&mut rand::rng()).cloned() else {
            log::error!("Word list is empty, cannot start a game");
            return ctx.say("No words available right now\\.").await;
        };

        self.games.save(ctx.user.id, &Game::new(&answer))?;
        ctx.states.set(ctx.user.id, "game guess")?;
        log::info!("User {} started a word game", ctx.user.id);
        ctx.say(format!(
            "I picked a {}\\-letter word\\. You have {} guesses\\. Send your first guess:",
            WORD_LENGTH, MAX_GUESSES
        ))
        .await
    }
}

pub struct Guess {
    games: GameStore,
}

#[async_trait]
impl CommandHandler for Guess {
    async fn handle(&self, command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        let Some(mut game) = self.games.load(ctx.user.id)?.filter(|g| g.status == GameStatus::Playing) else {
            ctx.states.clear(ctx.user.id)?;
            return ctx.reply(no_game()).await;
        };

        let param = Parameter::new("guess", "Send a 5\\-letter word:", guess_word);
        let Some(word) = get_arg(command, ctx, &param).await? else {
            return Ok(());
        };

        game.guess(&word);
        self.games.save(ctx.user.id, &game)?;

        let board = game.board();
        match game.status {
            GameStatus::Won => {
                ctx.states.clear(ctx.user.id)?;
                let reply = Reply::text(format!("{}\n\nSolved in {}\\! 🎉", board, game.guesses.len()))
                    .with_buttons(vec![Button::new("🎲 Play again", "/game start")]);
                ctx.reply(reply).await
            }
            GameStatus::Lost => {
                ctx.states.clear(ctx.user.id)?;
                let reply = Reply::text(format!(
                    "{}\n\nOut of guesses\\. The word was {}",
                    board,
                    code(&game.answer.to_uppercase())
                ))
                .with_buttons(vec![Button::new("🎲 Play again", "/game start")]);
                ctx.reply(reply).await
            }
            _ => {
                // next bare word is another guess
                ctx.states.set(ctx.user.id, "game guess")?;
                let left = MAX_GUESSES - game.guesses.len();
                ctx.say(format!("{}\n\n{} guesses left:", board, left)).await
            }
        }
    }
}

pub struct QuitGame {
    games: GameStore,
}

#[async_trait]
impl CommandHandler for QuitGame {
    async fn handle(&self, _command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        ctx.states.clear(ctx.user.id)?;
        let Some(mut game) = self.games.load(ctx.user.id)?.filter(|g| g.status == GameStatus::Playing) else {
            return ctx.reply(no_game()).await;
        };
        game.status = GameStatus::Quit;
        self.games.save(ctx.user.id, &game)?;
        ctx.say(format!("Game over\\. The word was {}", code(&game.answer.to_uppercase())))
            .await
    }
}

pub fn feature(games: GameStore, words: Vec<String>) -> Feature {
    let words = Arc::new(words);
    Feature::branch(
        "game",
        "Guess the five-letter word",
        vec![
            Feature::leaf(
                "start",
                "Start a new game",
                "/game start",
                Arc::new(StartGame {
                    games: games.clone(),
                    words,
                }),
            )
            .with_button("🎲 New game", "/game start"),
            Feature::leaf(
                "guess",
                "Make a guess",
                "/game guess <word>",
                Arc::new(Guess { games: games.clone() }),
            ),
            Feature::leaf("quit", "Give up", "/game quit", Arc::new(QuitGame { games }))
                .with_button("🏳 Give up", "/game quit"),
        ],
    )
    .with_button("🎲 Game", "/game")
}
