//! Match loop: read engine lines, play turns, write answers.

use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{debug, info, warn};

use siege_core::agent::{play_turn, AgentContext};
use siege_core::data::{GameConfig, StrategyConfig};
use siege_core::error::SiegeError;

use crate::protocol::{EngineConfig, FrameEvent, FramePhase, StateFrame, TurnAnswer};

/// Errors that end a match early.
#[derive(Error, Debug)]
pub enum RunError {
    /// Reading stdin or writing stdout failed.
    #[error("Protocol IO failed: {0}")]
    Io(#[from] io::Error),
    /// The configuration line was unusable.
    #[error("Bad game configuration: {0}")]
    Config(#[source] SiegeError),
    /// Input ended before the configuration line.
    #[error("Input closed before the game configuration")]
    MissingConfig,
}

/// Counters for one match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSummary {
    /// Turns answered.
    pub turns_played: u32,
    /// Turns whose offense degraded to idle.
    pub degraded_turns: u32,
    /// Action frames consumed.
    pub action_frames: u32,
    /// Lines that could not be parsed.
    pub bad_frames: u32,
    /// Whether the engine sent the end-of-game frame.
    pub finished: bool,
}

/// Plays one match over a line-oriented channel.
pub struct AlgoRunner {
    strategy: StrategyConfig,
    config: Option<GameConfig>,
    ctx: AgentContext,
    summary: MatchSummary,
}

impl AlgoRunner {
    /// Create a runner that will play with `strategy`.
    #[must_use]
    pub fn new(strategy: StrategyConfig) -> Self {
        Self {
            strategy,
            config: None,
            ctx: AgentContext::new(),
            summary: MatchSummary::default(),
        }
    }

    /// Cross-turn agent state.
    #[must_use]
    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    /// Play the match on stdin/stdout.
    ///
    /// # Errors
    ///
    /// See [`AlgoRunner::run`].
    pub fn run_stdio(self) -> Result<MatchSummary, RunError> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run(stdin.lock(), stdout.lock())
    }

    /// Play until the end-of-game frame or end of input.
    ///
    /// Malformed frames are logged and skipped. A turn frame that cannot be
    /// turned into a board is still answered, with empty lists, so the engine
    /// keeps its pace.
    ///
    /// # Errors
    ///
    /// Returns `RunError` on IO failure or an unusable configuration line.
    pub fn run(mut self, input: impl BufRead, mut output: impl Write) -> Result<MatchSummary, RunError> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if self.config.is_none() {
                let config = EngineConfig::from_json(line)
                    .and_then(|raw| raw.to_game_config())
                    .map_err(RunError::Config)?;
                info!(arena = config.arena.size(), "Game configuration received");
                self.config = Some(config);
                continue;
            }

            let frame = match StateFrame::from_json(line) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable frame");
                    self.summary.bad_frames += 1;
                    continue;
                }
            };

            match frame.phase() {
                Some(FramePhase::Turn) => {
                    let answer = self.answer_turn(&frame);
                    output.write_all(answer.to_lines().as_bytes())?;
                    output.flush()?;
                }
                Some(FramePhase::Action) => self.absorb_events(&frame),
                Some(FramePhase::End) => {
                    info!(turn = frame.turn(), "Game over");
                    self.summary.finished = true;
                    break;
                }
                None => {
                    warn!(turn_info = ?frame.turn_info, "Unknown frame phase");
                    self.summary.bad_frames += 1;
                }
            }
        }

        if self.config.is_none() {
            return Err(RunError::MissingConfig);
        }
        info!(
            turns = self.summary.turns_played,
            degraded = self.summary.degraded_turns,
            "Match finished"
        );
        Ok(self.summary)
    }

    fn answer_turn(&mut self, frame: &StateFrame) -> TurnAnswer {
        let Some(config) = self.config.as_ref() else {
            return TurnAnswer::default();
        };
        let board = match frame.to_game_state(config) {
            Ok(board) => board,
            Err(e) => {
                warn!(turn = frame.turn(), error = %e, "Unreadable turn, passing");
                self.summary.bad_frames += 1;
                return TurnAnswer::default();
            }
        };

        let report = play_turn(&mut self.ctx, &board, &self.strategy);
        self.summary.turns_played += 1;
        if report.degraded.is_some() {
            self.summary.degraded_turns += 1;
        }
        TurnAnswer::from_intents(&report.intents, config)
    }

    fn absorb_events(&mut self, frame: &StateFrame) {
        self.summary.action_frames += 1;
        let turn = frame.turn();
        for event in frame.decode_events() {
            match event {
                FrameEvent::Breach { cell, scorer } => {
                    debug!(%cell, ?scorer, turn, "Breach");
                    self.ctx.record_breach(cell, turn, scorer);
                }
                FrameEvent::Spawn { unit_type, owner } => {
                    self.ctx.observe_spawn(unit_type, owner, turn);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{"unitInformation":[{"shorthand":"FF"},{"shorthand":"EF"},{"shorthand":"DF"},{"shorthand":"PI"},{"shorthand":"EI"},{"shorthand":"SI"},{"shorthand":"RM"},{"shorthand":"UP"}]}"#;

    fn play(lines: &[&str]) -> (Result<MatchSummary, RunError>, String) {
        let input = lines.join("\n");
        let mut output = Vec::new();
        let result = AlgoRunner::new(StrategyConfig::default()).run(input.as_bytes(), &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_requires_config() {
        let (result, output) = play(&[]);
        assert!(matches!(result, Err(RunError::MissingConfig)));
        assert!(output.is_empty());
    }

    #[test]
    fn test_bad_config_is_fatal() {
        let (result, _) = play(&["not json"]);
        assert!(matches!(result, Err(RunError::Config(_))));
    }

    #[test]
    fn test_turn_answers_two_lines() {
        let turn = r#"{"turnInfo":[0,0,-1],"p1Stats":[30,40,5,0],"p2Stats":[30,40,5,0],"p1Units":[],"p2Units":[]}"#;
        let end = r#"{"turnInfo":[2,1,0]}"#;
        let (result, output) = play(&[CONFIG, turn, end]);

        let summary = result.unwrap();
        assert_eq!(summary.turns_played, 1);
        assert!(summary.finished);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[[\"DF\",0,13]"));
        assert_eq!(lines[1], "[]");
    }

    #[test]
    fn test_unreadable_turn_still_answered() {
        let turn = r#"{"turnInfo":[0,0,-1]}"#;
        let (result, output) = play(&[CONFIG, turn, "garbage"]);
        let summary = result.unwrap();
        assert_eq!(summary.bad_frames, 2);
        assert_eq!(output, "[]\n[]\n");
    }
}
