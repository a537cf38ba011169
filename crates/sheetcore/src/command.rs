//! Tokenizer and command argument cursor
//!
//! A `Command` is the tokenised form of one inbound message. Only its string
//! form (`to_string`) is ever persisted; the cursor lives for a single
//! dispatch.

use std::fmt;

/// Splits raw text on ASCII spaces, dropping empty tokens, then trims
/// each token. A token made only of other whitespace survives as `""`.
pub fn tokenise(raw: &str) -> Vec<String> {
    raw.split(' ')
        .filter(|token| !token.is_empty())
        .map(|token| token.trim().to_string())
        .collect()
}

/// Ordered argument list with a forward-only cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    args: Vec<String>,
    cursor: usize,
    has_slash: bool,
}

impl Command {
    /// Builds a command from raw message text.
    ///
    /// The first token is lowercased and loses its leading `/`; a lone `/`
    /// contributes no argument. Later tokens keep their casing.
    pub fn parse(raw: &str) -> Self {
        let mut tokens = tokenise(raw).into_iter();
        let mut args = Vec::new();
        let mut has_slash = false;

        if let Some(first) = tokens.next() {
            match first.strip_prefix('/') {
                Some(rest) => {
                    has_slash = true;
                    if !rest.is_empty() {
                        args.push(rest.to_lowercase());
                    }
                }
                None => args.push(first.to_lowercase()),
            }
        }
        args.extend(tokens);

        Self {
            args,
            cursor: 0,
            has_slash,
        }
    }

    /// Whether the raw text started with `/`.
    pub fn has_slash(&self) -> bool {
        self.has_slash
    }

    /// Returns the next unconsumed argument and advances the cursor.
    pub fn next_arg(&mut self) -> Option<String> {
        let arg = self.args.get(self.cursor).cloned();
        if arg.is_some() {
            self.cursor += 1;
        }
        arg
    }

    /// Removes and returns the last argument, regardless of the cursor.
    pub fn pop_arg(&mut self) -> Option<String> {
        let arg = self.args.pop();
        self.cursor = self.cursor.min(self.args.len());
        arg
    }

    /// Arguments not yet consumed by `next_arg`.
    pub fn remaining(&self) -> &[String] {
        self.args.get(self.cursor..).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Space-joined argument list. Unaffected by the cursor.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}
