//! Line-oriented front end driving the services.

pub mod commands;
pub mod render;

pub use commands::{Command, PlayerRef};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::game::{Match, MatchSession, Transition};
use crate::player::Player;
use crate::shared::{AppError, AppState};
use render::Names;

const PROMPT: &str = "cricket> ";

/// Interactive console reading commands from `R` and writing to `W`
pub struct Console<R, W> {
    state: AppState,
    input: Lines<R>,
    output: W,
    session: Option<MatchSession>,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(state: AppState, reader: R, writer: W) -> Self {
        Self {
            state,
            input: reader.lines(),
            output: writer,
            session: None,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs until `quit` or end of input
    pub async fn run(&mut self) -> Result<(), AppError> {
        self.say("Cricket darts scorekeeper. Type `help` for commands.")
            .await?;

        loop {
            self.output.write_all(PROMPT.as_bytes()).await?;
            self.output.flush().await?;

            let Some(line) = self.input.next_line().await? else {
                break;
            };

            match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    debug!(command = ?command, "Console command");
                    if let Err(e) = self.execute(command).await {
                        self.say(&format!("Error: {}", e)).await?;
                    }
                }
                Err(e) => self.say(&format!("Error: {}", e)).await?,
            }
        }

        if self.session.is_some() {
            self.say("Match left in progress; `resume` it from `history` next time.")
                .await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn execute(&mut self, command: Command) -> Result<(), AppError> {
        match command {
            Command::Help => self.say(render::HELP).await,
            Command::Quit => Ok(()),

            Command::Players => {
                let players = self.state.players.list_players().await?;
                self.say(&render::players(&players)).await
            }
            Command::AddPlayer(name) => {
                let player = self.state.players.add_player(&name).await?;
                self.say(&format!("Added {}", player.name)).await
            }
            Command::RenamePlayer { player, name } => {
                let player = self.resolve_player(&player).await?;
                let renamed = self.state.players.rename_player(player.id, &name).await?;
                self.say(&format!("Renamed {} to {}", player.name, renamed.name))
                    .await
            }
            Command::RemovePlayer(player) => {
                let player = self.resolve_player(&player).await?;
                if self.active_match_has_player(player.id) {
                    return Err(busy());
                }
                let question = format!(
                    "Delete {} and all of their match records? [y/N] ",
                    player.name
                );
                if self.confirm(&question).await? {
                    self.state.players.delete_player(player.id).await?;
                    self.say(&format!("Deleted {}", player.name)).await
                } else {
                    self.say("Cancelled").await
                }
            }

            Command::Start(roster) => {
                self.ensure_idle()?;
                let mut player_ids = Vec::with_capacity(roster.len());
                for player in &roster {
                    player_ids.push(self.resolve_player(player).await?.id);
                }
                let session = self.state.matches.start_match(&player_ids).await?;
                self.show_session(session).await
            }
            Command::Resume(position) => {
                self.ensure_idle()?;
                let record = self.match_at(position).await?;
                let session = self.state.matches.resume_match(record.id).await?;
                self.show_session(session).await
            }
            Command::Hit { target, multiplier } => {
                let transition = self
                    .state
                    .matches
                    .record_hit(self.active()?, target, multiplier)
                    .await?;
                self.adopt(transition).await
            }
            Command::Miss => {
                let transition = self.state.matches.record_miss(self.active()?).await?;
                self.adopt(transition).await
            }
            Command::Undo => {
                let transition = self.state.matches.undo(self.active()?).await?;
                self.adopt(transition).await
            }
            Command::End => {
                let session = self
                    .session
                    .take()
                    .ok_or_else(|| AppError::Validation("No match in progress".to_string()))?;
                self.state.matches.end_game(session).await?;
                self.say("Match saved. Resume it later from `history`.").await
            }
            Command::Board => {
                let view = self.active()?.view();
                let names = self.names().await?;
                self.say(&render::board(&view, &names)).await
            }

            Command::History => {
                let matches = self.state.matches.list_matches().await?;
                self.say(&render::history(&matches)).await
            }
            Command::Detail(position) => {
                let record = self.match_at(position).await?;
                let detail = self.state.matches.match_detail(record.id).await?;
                self.say(&render::detail(&detail)).await
            }
            Command::DeleteMatch(position) => {
                let record = self.match_at(position).await?;
                if self.session.as_ref().map(|s| s.match_id()) == Some(record.id) {
                    return Err(busy());
                }
                if self.confirm("Delete this match? [y/N] ").await? {
                    self.state.matches.delete_match(record.id).await?;
                    self.say("Match deleted").await
                } else {
                    self.say("Cancelled").await
                }
            }

            Command::Stats(None) => {
                let summaries = self.state.stats.all_player_stats().await?;
                self.say(&render::all_stats(&summaries)).await
            }
            Command::Stats(Some(player)) => {
                let player = self.resolve_player(&player).await?;
                let stats = self.state.stats.get_player_stats(player.id).await?;
                self.say(&render::player_stats(&player.name, &stats)).await
            }

            Command::Export => {
                let path = self.state.backup.export_to_file().await?;
                self.say(&format!("Backup written to {}", path.display()))
                    .await
            }
            Command::Import(path) => {
                self.ensure_idle()?;
                if !self
                    .confirm("Importing replaces all current data. Continue? [y/N] ")
                    .await?
                {
                    return self.say("Cancelled").await;
                }
                let backup = self.state.backup.import_from_file(&path).await?;
                self.say(&format!(
                    "Imported {} players and {} matches",
                    backup.players.len(),
                    backup.matches.len()
                ))
                .await
            }
            Command::Clear => {
                self.ensure_idle()?;
                let confirmed = self
                    .confirm("Delete ALL players and matches? [y/N] ")
                    .await?
                    && self
                        .confirm("This cannot be undone. Really delete everything? [y/N] ")
                        .await?;
                if confirmed {
                    self.state.backup.clear_all().await?;
                    self.say("All data cleared").await
                } else {
                    self.say("Cancelled").await
                }
            }
        }
    }

    async fn say(&mut self, text: &str) -> Result<(), AppError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    /// Asks a yes/no question; anything but `y`/`yes` (or end of input) is a no
    async fn confirm(&mut self, question: &str) -> Result<bool, AppError> {
        self.output.write_all(question.as_bytes()).await?;
        self.output.flush().await?;

        let answer = self.input.next_line().await?.unwrap_or_default();
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    fn active(&self) -> Result<&MatchSession, AppError> {
        self.session.as_ref().ok_or_else(|| {
            AppError::Validation("No match in progress; `start` or `resume` one".to_string())
        })
    }

    fn ensure_idle(&self) -> Result<(), AppError> {
        if self.session.is_some() {
            return Err(busy());
        }
        Ok(())
    }

    fn active_match_has_player(&self, player_id: Uuid) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.players().iter().any(|mp| mp.player_id == player_id))
    }

    async fn show_session(&mut self, session: MatchSession) -> Result<(), AppError> {
        let names = self.names().await?;
        let text = render::board(&session.view(), &names);
        self.session = Some(session);
        self.say(&text).await
    }

    /// Takes over the committed session, dropping it once the match is won
    async fn adopt(&mut self, transition: Transition) -> Result<(), AppError> {
        let names = self.names().await?;
        let view = transition.session.view();
        let text = format!(
            "{}\n{}",
            render::events(&transition.events, &view, &names),
            render::board(&view, &names)
        );

        self.session = if transition.session.is_over() {
            None
        } else {
            Some(transition.session)
        };
        self.say(&text).await
    }

    async fn names(&self) -> Result<Names, AppError> {
        Ok(self
            .state
            .players
            .list_players()
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect())
    }

    async fn resolve_player(&self, player: &PlayerRef) -> Result<Player, AppError> {
        let players = self.state.players.list_players().await?;
        let found = match player {
            PlayerRef::Position(n) => players.into_iter().nth(n.saturating_sub(1)),
            PlayerRef::Name(name) => players
                .into_iter()
                .find(|p| p.name.eq_ignore_ascii_case(name)),
        };
        found.ok_or_else(|| AppError::NotFound(format!("No player {}", describe(player))))
    }

    async fn match_at(&self, position: usize) -> Result<Match, AppError> {
        self.state
            .repository
            .list_matches()
            .await?
            .into_iter()
            .nth(position.saturating_sub(1))
            .ok_or_else(|| AppError::NotFound(format!("No match #{} in history", position)))
    }
}

fn busy() -> AppError {
    AppError::Validation("A match is in progress; `end` it first".to_string())
}

fn describe(player: &PlayerRef) -> String {
    match player {
        PlayerRef::Position(n) => format!("#{}", n),
        PlayerRef::Name(name) => format!("named {}", name),
    }
}
