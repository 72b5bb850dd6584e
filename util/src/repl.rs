use rustyline::{error::ReadlineError, Editor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error<E> {
    #[error(transparent)]
    Readline(ReadlineError),
    #[error("Eval failed: {0:?}")]
    EvalError(E),
}

pub trait Repl {
    type Error: std::fmt::Debug;
    const HISTORY: Option<&'static str> = None;
    const PROMPT: &'static str = ">> ";
    fn evaluate(&mut self, input: String) -> Result<(), Self::Error>;
}

/// Joins lines ending in `\` with the line after them.
#[derive(Default, Debug)]
pub struct LineBuffer {
    pending: Option<String>,
}

impl LineBuffer {
    /// Returns the whole input once `line` does not continue onto the next one.
    pub fn push(&mut self, mut line: String) -> Option<String> {
        if line.ends_with('\\') {
            line.pop();
            line.push('\n');
            match self.pending.as_mut() {
                Some(pending) => pending.push_str(&line),
                None => self.pending = Some(line),
            }
            return None;
        }
        Some(match self.pending.take() {
            Some(mut pending) => {
                pending.push_str(&line);
                pending
            }
            None => line,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

pub fn start_repl<R: Repl>(mut repl: R) -> Result<(), Error<R::Error>> {
    let mut editor = Editor::<()>::new();
    if let Some(history) = R::HISTORY {
        editor.load_history(history).ok();
    }
    let mut buffer = LineBuffer::default();
    loop {
        let prompt = if buffer.is_pending() { ".. " } else { R::PROMPT };
        match editor.readline(prompt) {
            Ok(line) => {
                let input = match buffer.push(line) {
                    Some(input) => input,
                    None => continue,
                };
                editor.add_history_entry(input.as_str());
                repl.evaluate(input).map_err(Error::EvalError)?;
                if let Some(history) = R::HISTORY {
                    editor.save_history(history).map_err(Error::Readline)?;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Bye!");
                break Ok(());
            }
            Err(e) => break Err(Error::Readline(e)),
        }
    }
}
