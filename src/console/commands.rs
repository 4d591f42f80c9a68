use std::path::PathBuf;

use crate::game::{Multiplier, Target};
use crate::shared::AppError;

/// A player named on the command line, either by list position or by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerRef {
    /// 1-based position in the `players` listing
    Position(usize),
    Name(String),
}

impl PlayerRef {
    fn parse(token: &str) -> Result<Self, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::Validation("Expected a player".to_string()));
        }
        Ok(match token.parse::<usize>() {
            Ok(position) => PlayerRef::Position(position),
            Err(_) => PlayerRef::Name(token.to_string()),
        })
    }
}

/// One line of console input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,

    Players,
    AddPlayer(String),
    RenamePlayer { player: PlayerRef, name: String },
    RemovePlayer(PlayerRef),

    Start(Vec<PlayerRef>),
    /// 1-based position in the `history` listing
    Resume(usize),
    Hit { target: Target, multiplier: Multiplier },
    Miss,
    Undo,
    End,
    Board,

    History,
    Detail(usize),
    DeleteMatch(usize),

    Stats(Option<PlayerRef>),

    Export,
    Import(PathBuf),
    Clear,
}

impl Command {
    /// Parses a console line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>, AppError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,

            "players" => Command::Players,
            "add" => Command::AddPlayer(required(rest, "add <name>")?.to_string()),
            "rename" => {
                let (player, name) = required(rest, "rename <player> <new name>")?
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| usage("rename <player> <new name>"))?;
                Command::RenamePlayer {
                    player: PlayerRef::parse(player)?,
                    name: name.trim().to_string(),
                }
            }
            "remove" => Command::RemovePlayer(PlayerRef::parse(required(rest, "remove <player>")?)?),

            "start" => {
                let roster = required(rest, "start <player>, <player>[, ...]")?
                    .split(',')
                    .map(PlayerRef::parse)
                    .collect::<Result<Vec<_>, _>>()?;
                Command::Start(roster)
            }
            "resume" => Command::Resume(position(rest, "resume <match #>")?),
            "hit" => {
                let (target, multiplier) = parse_hit_args(required(rest, "hit <target> [s|d|t]")?)?;
                Command::Hit { target, multiplier }
            }
            "miss" | "m" => Command::Miss,
            "undo" | "u" => Command::Undo,
            "end" => Command::End,
            "board" => Command::Board,

            "history" => Command::History,
            "detail" => Command::Detail(position(rest, "detail <match #>")?),
            "delete" => Command::DeleteMatch(position(rest, "delete <match #>")?),

            "stats" if rest.is_empty() => Command::Stats(None),
            "stats" => Command::Stats(Some(PlayerRef::parse(rest)?)),

            "export" => Command::Export,
            "import" => Command::Import(PathBuf::from(required(rest, "import <file>")?)),
            "clear" => Command::Clear,

            // Dart shorthand: `t20`, `d19`, `bull`, `20`
            _ if rest.is_empty() => match parse_shorthand(word) {
                Some((target, multiplier)) => Command::Hit { target, multiplier },
                None => {
                    return Err(AppError::Validation(format!(
                        "Unknown command `{}` (type `help`)",
                        word
                    )))
                }
            },
            _ => {
                return Err(AppError::Validation(format!(
                    "Unknown command `{}` (type `help`)",
                    word
                )))
            }
        };

        Ok(Some(command))
    }
}

fn required<'a>(rest: &'a str, usage_text: &str) -> Result<&'a str, AppError> {
    if rest.is_empty() {
        Err(usage(usage_text))
    } else {
        Ok(rest)
    }
}

fn usage(usage_text: &str) -> AppError {
    AppError::Validation(format!("Usage: {}", usage_text))
}

fn position(rest: &str, usage_text: &str) -> Result<usize, AppError> {
    match rest.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(usage(usage_text)),
    }
}

fn parse_multiplier(token: &str) -> Result<Multiplier, AppError> {
    let multiplier = match token.to_ascii_lowercase().as_str() {
        "s" | "single" => Multiplier::Single,
        "d" | "double" => Multiplier::Double,
        "t" | "triple" => Multiplier::Triple,
        other => {
            let value: u8 = other
                .parse()
                .map_err(|_| AppError::Validation(format!("Unknown multiplier `{}`", token)))?;
            Multiplier::try_from(value)?
        }
    };
    Ok(multiplier)
}

fn parse_hit_args(args: &str) -> Result<(Target, Multiplier), AppError> {
    let mut tokens = args.split_whitespace();
    let target = Target::try_from(tokens.next().unwrap_or_default())?;
    let multiplier = match tokens.next() {
        Some(token) => parse_multiplier(token)?,
        None => Multiplier::Single,
    };
    if tokens.next().is_some() {
        return Err(usage("hit <target> [s|d|t]"));
    }
    Ok((target, multiplier))
}

fn parse_shorthand(word: &str) -> Option<(Target, Multiplier)> {
    let lower = word.to_ascii_lowercase();
    let (multiplier, target) = if let Some(rest) = lower.strip_prefix('s') {
        (Multiplier::Single, rest)
    } else if let Some(rest) = lower.strip_prefix('d') {
        (Multiplier::Double, rest)
    } else if let Some(rest) = lower.strip_prefix('t') {
        (Multiplier::Triple, rest)
    } else {
        (Multiplier::Single, lower.as_str())
    };
    Target::try_from(target).ok().map(|target| (target, multiplier))
}
