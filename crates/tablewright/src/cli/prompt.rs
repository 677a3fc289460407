//! Input and output collaborators of the interactive shell.
//!
//! The shell never touches stdin or stdout directly: it reads through a
//! [`Prompt`] and reports through a [`MessageSink`]. The console versions
//! use `rustyline` and styled terminal output; the scripted versions replay
//! canned input and record what was shown.

use std::collections::VecDeque;
use std::path::PathBuf;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use crossterm::style::Stylize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tablewright_model::Snapshot;
use tracing::{debug, warn};

use super::commands::CommandSpec;
use super::output::{numbered_list, render_snapshot, snapshot_caption};

/// Source of user input.
pub trait Prompt {
    /// Ask for one line. `None` means input has ended.
    fn ask(&mut self, prompt: &str) -> Option<String>;
}

/// Destination for everything the shell shows.
pub trait MessageSink {
    fn report_info(&mut self, message: &str);

    fn report_error(&mut self, message: &str);

    fn show_table(&mut self, snapshot: &Snapshot);

    /// Numbered list of names.
    fn show_list(&mut self, title: &str, items: &[String]) {
        let lines: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}: {}", i + 1, item))
            .collect();
        self.report_info(&format!("{}\n{}", title, lines.join("\n")));
    }

    /// Help screen for a menu.
    fn show_help(&mut self, title: &str, commands: &[CommandSpec]) {
        let lines: Vec<String> = commands
            .iter()
            .map(|c| format!("{} - {}", c.name, c.help))
            .collect();
        self.report_info(&format!("{}\n{}", title, lines.join("\n")));
    }

    /// Free-form text such as pretty-printed JSON.
    fn show_text(&mut self, text: &str) {
        self.report_info(text);
    }
}

/// Line-edited terminal input with history.
pub struct ConsolePrompt {
    editor: DefaultEditor,
    history: Option<PathBuf>,
}

impl ConsolePrompt {
    pub fn new(history: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = &history {
            if let Err(e) = editor.load_history(path) {
                debug!("No history loaded from {}: {}", path.display(), e);
            }
        }
        Ok(Self { editor, history })
    }

    pub fn save_history(&mut self) {
        if let Some(path) = &self.history {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Err(e) = self.editor.save_history(path) {
                warn!("Failed to save history to {}: {}", path.display(), e);
            }
        }
    }
}

impl Prompt for ConsolePrompt {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str()).ok();
                }
                Some(line)
            }
            // Ctrl-C abandons the current question
            Err(ReadlineError::Interrupted) => Some(String::new()),
            Err(ReadlineError::Eof) => None,
            Err(err) => {
                warn!("Error reading input: {}", err);
                None
            }
        }
    }
}

impl Drop for ConsolePrompt {
    fn drop(&mut self) {
        self.save_history();
    }
}

/// Styled terminal output.
#[derive(Debug, Default)]
pub struct ConsoleSink;

fn panel(title: &str, body: &str, color: Color) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new(title).fg(color)])
        .add_row(vec![Cell::new(body)]);
    table
}

impl MessageSink for ConsoleSink {
    fn report_info(&mut self, message: &str) {
        println!("{}", panel("Information", message, Color::Yellow));
    }

    fn report_error(&mut self, message: &str) {
        eprintln!("{}", panel("Error", message, Color::Red));
    }

    fn show_table(&mut self, snapshot: &Snapshot) {
        println!("{}", snapshot_caption(snapshot).bold().yellow());
        println!("{}", render_snapshot(snapshot));
    }

    fn show_list(&mut self, title: &str, items: &[String]) {
        println!("{}", numbered_list(title, items));
    }

    fn show_help(&mut self, title: &str, commands: &[CommandSpec]) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new(format!("{} - command", title)).fg(Color::Cyan),
                Cell::new("description").fg(Color::Cyan),
            ]);
        for command in commands {
            table.add_row(vec![
                Cell::new(command.name).fg(Color::Green),
                Cell::new(command.help),
            ]);
        }
        println!("{}", table);
    }

    fn show_text(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Replays canned answers, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Every prompt shown so far.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, prompt: &str) -> Option<String> {
        self.asked.push(prompt.to_string());
        self.answers.pop_front()
    }
}

/// What a [`RecordingSink`] was given.
#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Info(String),
    Error(String),
    Table(Snapshot),
    List { title: String, items: Vec<String> },
    Help(String),
    Text(String),
}

/// Keeps everything shown, for assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub shown: Vec<Shown>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infos(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Info(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Error(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tables(&self) -> Vec<&Snapshot> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Table(t) => Some(t),
                _ => None,
            })
            .collect()
    }
}

impl MessageSink for RecordingSink {
    fn report_info(&mut self, message: &str) {
        self.shown.push(Shown::Info(message.to_string()));
    }

    fn report_error(&mut self, message: &str) {
        self.shown.push(Shown::Error(message.to_string()));
    }

    fn show_table(&mut self, snapshot: &Snapshot) {
        self.shown.push(Shown::Table(snapshot.clone()));
    }

    fn show_list(&mut self, title: &str, items: &[String]) {
        self.shown.push(Shown::List {
            title: title.to_string(),
            items: items.to_vec(),
        });
    }

    fn show_help(&mut self, title: &str, _commands: &[CommandSpec]) {
        self.shown.push(Shown::Help(title.to_string()));
    }

    fn show_text(&mut self, text: &str) {
        self.shown.push(Shown::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_prompt_replays_then_ends() {
        let mut prompt = ScriptedPrompt::new(["one", "two"]);
        assert_eq!(prompt.ask("first? ").as_deref(), Some("one"));
        assert_eq!(prompt.ask("second? ").as_deref(), Some("two"));
        assert_eq!(prompt.ask("third? "), None);
        assert_eq!(prompt.asked().len(), 3);
        assert_eq!(prompt.remaining(), 0);
    }

    #[test]
    fn test_recording_sink_filters() {
        let mut sink = RecordingSink::new();
        sink.report_info("hello");
        sink.report_error("bad");
        sink.show_list("Databases", &["main".to_string()]);

        assert_eq!(sink.infos(), vec!["hello"]);
        assert_eq!(sink.errors(), vec!["bad"]);
        assert_eq!(sink.shown.len(), 3);
    }
}
