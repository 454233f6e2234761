//! Play command for Quickfire.
//!
//! Runs one interactive challenge session. Answer lines and countdown ticks
//! arrive on a single channel and are applied to the engine in arrival
//! order, so the engine only ever sees one event at a time.

use std::io::{BufRead, Write};
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::{ChallengeEngine, CompletionReason, Phase, TickTimer};
use crate::error::{FailOpen, QuickfireError, Result};
use crate::stats::{HistoryLog, SessionRecord, SessionSummary};

/// Typed to give up on the session.
pub const QUIT_COMMAND: &str = ":q";

/// Input to the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayEvent {
    /// A line typed by the learner.
    Answer(String),
    /// One second of the countdown elapsed.
    Tick,
    /// The learner left (quit command or end of input).
    Quit,
}

/// Options for the play command.
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    /// Output the summary as JSON.
    pub json: bool,
}

impl PlayOptions {
    /// Whether prompts and feedback go to stderr. With JSON output stdout
    /// carries only the summary.
    pub fn transcript_to_stderr(&self) -> bool {
        self.json
    }
}

/// Output format for the play command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// Summary of the finished session; absent when nothing was played.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
    /// Target accuracy the session was played against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_accuracy_percent: Option<u32>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlayOutput {
    /// Create an output for a finished session.
    pub fn finished(summary: SessionSummary, target_accuracy_percent: Option<u32>) -> Self {
        Self {
            success: true,
            summary: Some(summary),
            target_accuracy_percent,
            error: None,
        }
    }

    /// Create an output for a deck with nothing to play.
    pub fn no_cards() -> Self {
        Self {
            success: true,
            summary: None,
            target_accuracy_percent: None,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            summary: None,
            target_accuracy_percent: None,
            error: Some(error.into()),
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        if !self.success {
            return format!(
                "Play failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }

        let Some(summary) = &self.summary else {
            return "No cards available for this session.".to_string();
        };

        let headline = match summary.completion {
            Some(CompletionReason::TimedOut) => "Time's up!",
            Some(CompletionReason::Abandoned) => "Session ended early.",
            _ => "Session complete!",
        };

        let mut lines = vec![headline.to_string(), String::new()];
        lines.push(format!(
            "  Correct:    {} / {}",
            summary.correct_count, summary.total_items
        ));
        lines.push(format!("  Incorrect:  {}", summary.incorrect_count()));
        if summary.unanswered_count() > 0 {
            lines.push(format!("  Unanswered: {}", summary.unanswered_count()));
        }
        lines.push(format!("  Accuracy:   {}%", summary.accuracy_percent));
        lines.push(format!("  Time:       {}s", summary.elapsed_seconds));

        if let Some(target) = self.target_accuracy_percent {
            let verdict = if summary.met_target {
                "passed"
            } else {
                "not reached"
            };
            lines.push(format!("  Target:     {}% ({})", target, verdict));
        }

        lines.join("\n")
    }
}

/// The play command implementation.
pub struct PlayCommand {
    engine: ChallengeEngine,
    history: Option<HistoryLog>,
}

impl PlayCommand {
    /// Create a new play command over a built engine.
    pub fn new(engine: ChallengeEngine, history: Option<HistoryLog>) -> Self {
        Self { engine, history }
    }

    /// The engine driving the session.
    pub fn engine(&self) -> &ChallengeEngine {
        &self.engine
    }

    /// Run one session.
    ///
    /// Prompts and feedback go to `out`. `timer` is released as soon as the
    /// session completes.
    pub fn run<W: Write>(
        &mut self,
        events: &Receiver<PlayEvent>,
        mut timer: Option<TickTimer>,
        out: &mut W,
    ) -> Result<PlayOutput> {
        match self.engine.start() {
            Ok(()) => {}
            Err(QuickfireError::EmptySource) => return Ok(PlayOutput::no_cards()),
            Err(e) => return Err(e),
        }

        let total = self.engine.state().total_items();
        writeln!(
            out,
            "{} cards. Type your answer and press Enter ({} to quit).",
            total, QUIT_COMMAND
        )?;
        self.prompt(out)?;

        while self.engine.phase() == Phase::InProgress {
            let event = events.recv().unwrap_or(PlayEvent::Quit);
            self.handle(event, out)?;
        }

        if let Some(mut timer) = timer.take() {
            timer.cancel();
        }

        self.finish()
    }

    fn handle<W: Write>(&mut self, event: PlayEvent, out: &mut W) -> Result<()> {
        match event {
            PlayEvent::Answer(line) if line.trim() == QUIT_COMMAND => self.engine.abandon(),
            PlayEvent::Answer(line) => {
                let outcome = match self.engine.submit_current(&line) {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_recoverable() => {
                        tracing::debug!("answer rejected: {}", e);
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                };

                if outcome.correct {
                    writeln!(out, "Correct!")?;
                } else {
                    writeln!(out, "Incorrect. The answer was: {}", outcome.expected)?;
                }
                if !outcome.completed {
                    self.prompt(out)?;
                }
                Ok(())
            }
            PlayEvent::Tick => {
                if self.engine.tick()? == Phase::InProgress {
                    if let Some(remaining) = self.engine.remaining_seconds() {
                        if remaining <= 5 || remaining % 10 == 0 {
                            writeln!(out, "  [{}s left]", remaining)?;
                        }
                    }
                }
                Ok(())
            }
            PlayEvent::Quit => self.engine.abandon(),
        }
    }

    fn prompt<W: Write>(&self, out: &mut W) -> Result<()> {
        let Some(item) = self.engine.current_item() else {
            return Ok(());
        };
        let state = self.engine.state();
        writeln!(
            out,
            "\n[{}/{}] {}",
            state.current_index + 1,
            state.total_items(),
            item.prompt
        )?;
        write!(out, "> ")?;
        out.flush()?;
        Ok(())
    }

    fn finish(&self) -> Result<PlayOutput> {
        let summary = self
            .engine
            .summary()
            .ok_or_else(|| QuickfireError::invalid_transition("summarize", self.engine.phase()))?;

        if let Some(log) = &self.history {
            let record = SessionRecord::from_session(
                self.engine.state(),
                self.engine.config(),
                &summary,
                Utc::now(),
            );
            log.append(&record)
                .fail_open_default("writing session history");
        }

        Ok(PlayOutput::finished(
            summary,
            self.engine.config().target_accuracy_percent,
        ))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &PlayOutput, options: &PlayOptions) -> String {
        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            output.format_text()
        }
    }
}

/// Forward lines from `input` as answers, then `Quit` at end of input.
///
/// The reader thread is detached: a blocked read cannot be interrupted.
pub fn spawn_line_reader<R>(input: R, events: Sender<PlayEvent>) -> Result<()>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("quickfire-input".to_string())
        .spawn(move || {
            for line in input.lines() {
                let Ok(line) = line else { break };
                if events.send(PlayEvent::Answer(line)).is_err() {
                    return;
                }
            }
            let _ = events.send(PlayEvent::Quit);
        })
        .map_err(|e| QuickfireError::config(format!("Failed to start input reader: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ReviewItem, SessionConfig};
    use crate::storage::MemoryCardStore;
    use std::io::Cursor;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn deck() -> Arc<MemoryCardStore> {
        Arc::new(MemoryCardStore::with_items(vec![
            ReviewItem::new("c1", "2 + 2", "4"),
            ReviewItem::new("c2", "3 x 25", "75"),
            ReviewItem::new("c3", "Capital of France", "Paris"),
        ]))
    }

    fn command(config: SessionConfig, history: Option<HistoryLog>) -> PlayCommand {
        let engine = ChallengeEngine::builder(deck(), config).build().unwrap();
        PlayCommand::new(engine, history)
    }

    fn explicit() -> SessionConfig {
        SessionConfig::explicit(["c1", "c2", "c3"]).with_target_accuracy(80)
    }

    fn send_all(events: &[PlayEvent]) -> Receiver<PlayEvent> {
        let (tx, rx) = mpsc::channel();
        for event in events {
            tx.send(event.clone()).unwrap();
        }
        rx
    }

    fn answer(s: &str) -> PlayEvent {
        PlayEvent::Answer(s.to_string())
    }

    #[test]
    fn test_full_pass() {
        let mut cmd = command(explicit(), None);
        let rx = send_all(&[answer("4"), answer("75"), answer("Paris")]);
        let mut out = Vec::new();

        let output = cmd.run(&rx, None, &mut out).unwrap();

        let summary = output.summary.clone().unwrap();
        assert_eq!(summary.correct_count, 3);
        assert_eq!(summary.accuracy_percent, 100);
        assert!(summary.met_target);

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("[1/3] 2 + 2"));
        assert!(transcript.contains("Correct!"));
        assert!(output.format_text().contains("Target:     80% (passed)"));
    }

    #[test]
    fn test_wrong_answer_shows_expected() {
        let mut cmd = command(explicit(), None);
        let rx = send_all(&[answer("4"), answer("76"), answer("paris")]);
        let mut out = Vec::new();

        let output = cmd.run(&rx, None, &mut out).unwrap();

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Incorrect. The answer was: 75"));
        assert_eq!(output.summary.unwrap().accuracy_percent, 33);
    }

    #[test]
    fn test_quit_command_abandons() {
        let mut cmd = command(explicit(), None);
        let rx = send_all(&[answer("4"), answer(QUIT_COMMAND)]);

        let output = cmd.run(&rx, None, &mut Vec::new()).unwrap();

        let summary = output.summary.clone().unwrap();
        assert_eq!(summary.completion, Some(CompletionReason::Abandoned));
        assert_eq!(summary.answered_count, 1);
        assert!(output.format_text().contains("Session ended early"));
    }

    #[test]
    fn test_closed_channel_abandons() {
        let mut cmd = command(explicit(), None);
        let rx = send_all(&[answer("4")]);

        let output = cmd.run(&rx, None, &mut Vec::new()).unwrap();

        assert_eq!(
            output.summary.unwrap().completion,
            Some(CompletionReason::Abandoned)
        );
    }

    #[test]
    fn test_ticks_time_out_session() {
        let mut cmd = command(explicit().with_time_limit(3), None);
        let rx = send_all(&[answer("4"), PlayEvent::Tick, PlayEvent::Tick, PlayEvent::Tick]);

        let output = cmd.run(&rx, None, &mut Vec::new()).unwrap();

        let summary = output.summary.clone().unwrap();
        assert_eq!(summary.completion, Some(CompletionReason::TimedOut));
        assert_eq!(summary.answered_count, 1);
        assert_eq!(summary.elapsed_seconds, 3);
        assert!(output.format_text().contains("Time's up!"));
    }

    #[test]
    fn test_real_timer_drives_timeout() {
        let mut cmd = command(explicit().with_time_limit(2), None);
        let (tx, rx) = mpsc::channel();
        let timer = TickTimer::start(Duration::from_millis(5), tx, || PlayEvent::Tick).unwrap();

        let output = cmd.run(&rx, Some(timer), &mut Vec::new()).unwrap();

        assert_eq!(
            output.summary.unwrap().completion,
            Some(CompletionReason::TimedOut)
        );
    }

    #[test]
    fn test_empty_deck_is_not_an_error() {
        let engine = ChallengeEngine::builder(
            Arc::new(MemoryCardStore::new()),
            SessionConfig::default(),
        )
        .build()
        .unwrap();
        let mut cmd = PlayCommand::new(engine, None);

        let output = cmd.run(&send_all(&[]), None, &mut Vec::new()).unwrap();

        assert!(output.success);
        assert!(output.summary.is_none());
        assert!(output.format_text().contains("No cards available"));
    }

    #[test]
    fn test_history_written_on_finish() {
        let temp = TempDir::new().unwrap();
        let log = HistoryLog::new(temp.path().join("history.jsonl"));
        let mut cmd = command(explicit(), Some(log.clone()));
        let rx = send_all(&[answer("4"), answer("75"), answer("x")]);

        cmd.run(&rx, None, &mut Vec::new()).unwrap();

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, cmd.engine().state().id);
        assert_eq!(records[0].correct_answers, 2);
        assert_eq!(records[0].flashcard_ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_history_failure_does_not_fail_session() {
        let temp = TempDir::new().unwrap();
        // A directory where the log file should be makes the append fail.
        let path = temp.path().join("history.jsonl");
        std::fs::create_dir_all(&path).unwrap();
        let mut cmd = command(explicit(), Some(HistoryLog::new(&path)));
        let rx = send_all(&[answer("4"), answer("75"), answer("Paris")]);

        let output = cmd.run(&rx, None, &mut Vec::new()).unwrap();
        assert!(output.success);
    }

    #[test]
    fn test_line_reader_forwards_lines_then_quit() {
        let (tx, rx) = mpsc::channel();
        spawn_line_reader(Cursor::new("4\n75\n"), tx).unwrap();

        let received: Vec<PlayEvent> = rx.iter().collect();
        assert_eq!(received, vec![answer("4"), answer("75"), PlayEvent::Quit]);
    }

    #[test]
    fn test_json_output() {
        let mut cmd = command(explicit(), None);
        let rx = send_all(&[answer("4"), answer("75"), answer("Paris")]);
        let output = cmd.run(&rx, None, &mut Vec::new()).unwrap();

        let json = cmd.format_output(&output, &PlayOptions { json: true });
        assert!(json.contains("\"accuracy_percent\": 100"));
        assert!(json.contains("\"met_target\": true"));
    }

    #[test]
    fn test_json_mode_keeps_transcript_off_stdout() {
        let options = PlayOptions { json: true };
        assert!(options.transcript_to_stderr());
        assert!(!PlayOptions::default().transcript_to_stderr());

        let mut cmd = command(explicit(), None);
        let rx = send_all(&[answer("4"), answer("76"), answer("Paris")]);
        let mut transcript = Vec::new();
        let output = cmd.run(&rx, None, &mut transcript).unwrap();

        let stdout = cmd.format_output(&output, &options);
        let parsed: PlayOutput = serde_json::from_str(&stdout).unwrap();
        assert_eq!(parsed.summary.unwrap().correct_count, 2);

        let transcript = String::from_utf8(transcript).unwrap();
        assert!(transcript.contains("Incorrect. The answer was: 75"));
        assert!(!stdout.contains("Correct!"));
    }
}
