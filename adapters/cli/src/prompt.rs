use std::io::{self, BufRead, Write};

/// Source of level names requested by the save and load shortcuts.
pub(crate) trait LevelNamePrompt {
    /// Asks for a level name, returning `None` when no answer could be read.
    fn ask(&mut self, message: &str) -> Option<String>;
}

/// Prompt that blocks on the terminal the game was started from.
#[derive(Debug, Default)]
pub(crate) struct StdinPrompt;

impl LevelNamePrompt for StdinPrompt {
    fn ask(&mut self, message: &str) -> Option<String> {
        let mut stdout = io::stdout().lock();
        if let Err(error) = write!(stdout, "{message} ").and_then(|()| stdout.flush()) {
            log::warn!("failed to write prompt: {error}");
        }

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_owned()),
            Err(error) => {
                log::warn!("failed to read level name: {error}");
                None
            }
        }
    }
}
