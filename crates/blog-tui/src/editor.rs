use anyhow::{Context, Result};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};
use std::process::Command;
use tempfile::NamedTempFile;
use tui_textarea::{CursorMove, TextArea};

/// Composer textarea seeded with `content`, cursor at the end
pub fn create_textarea<'a>(content: &str) -> TextArea<'a> {
    let lines: Vec<String> = if content.is_empty() {
        vec![String::new()]
    } else {
        content.split('\n').map(str::to_string).collect()
    };

    let mut textarea = TextArea::new(lines);
    textarea.set_placeholder_text("Write a comment...");
    textarea.move_cursor(CursorMove::Bottom);
    textarea.move_cursor(CursorMove::End);
    textarea.set_max_histories(100);

    textarea
}

/// Extract content from TextArea as a single String
pub fn textarea_content(textarea: &TextArea) -> String {
    textarea.lines().join("\n")
}

fn editor_command() -> String {
    std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| "vim".to_string())
}

/// Suspends the TUI, edits `content` in `$EDITOR` and returns the result
pub fn launch_external_editor(content: &str) -> Result<String> {
    let editor = editor_command();

    let mut temp_file = NamedTempFile::with_suffix(".txt").context("Could not create temp file")?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.flush()?;
    let temp_path = temp_file.path().to_path_buf();

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    let status = Command::new(&editor).arg(&temp_path).status();

    // Restore TUI mode even when the editor failed to start
    let restore_result = (|| -> Result<()> {
        execute!(io::stdout(), EnterAlternateScreen)?;
        execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
        enable_raw_mode()?;
        Ok(())
    })();

    if let Err(e) = restore_result {
        anyhow::bail!("Failed to restore terminal: {}", e);
    }

    match status {
        Ok(exit_status) if exit_status.success() => {
            let edited = std::fs::read_to_string(&temp_path).context("Could not read edited comment")?;
            // Editors append a final newline the composer never had
            Ok(edited.strip_suffix('\n').unwrap_or(&edited).to_string())
        }
        Ok(exit_status) => anyhow::bail!("Editor exited with status: {}", exit_status),
        Err(e) => anyhow::bail!("Failed to launch editor '{}': {}", editor, e),
    }
}
