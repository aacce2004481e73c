use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use pdfchat_index::SearchHit;
use pdfchat_llm::Answer;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const USER_PROMPT: Color = Color::Green;
    const ANSWER: Color = Color::Cyan;
    const PASSAGE: Color = Color::Yellow;
    const SUCCESS: Color = Color::DarkGreen;
    const WARNING: Color = Color::DarkYellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// Passage previews are cut to this many characters.
const PASSAGE_PREVIEW_CHARS: usize = 300;

/// Terminal I/O for the commands and the chat loop.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the chat banner.
    pub fn print_banner(&self, index_dir: &str, top_k: usize) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("pdfchat"),
            ResetColor,
            Print(" - Ask questions about your PDFs\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("Index: {} | Passages per question: {}\n", index_dir, top_k)),
            Print("Type 'exit' or 'quit' to end.\n"),
            Print("---\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Read one question. `None` on EOF or an exit command.
    pub fn read_question(&self) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::USER_PROMPT),
            Print("question> "),
            ResetColor,
        )?;
        stdout.flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let trimmed = input.trim();
        if matches!(trimmed, "exit" | "quit" | "/exit" | "/quit") {
            return Ok(None);
        }
        Ok(Some(trimmed.to_string()))
    }

    /// Print an answer. Declines and empty replies are shown dimmed.
    pub fn print_answer(&self, answer: &Answer) -> Result<()> {
        let mut stdout = io::stdout();
        let color = match answer {
            Answer::Generated(_) => Colors::ANSWER,
            Answer::Insufficient | Answer::Empty => Colors::WARNING,
        };
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("Answer\n"),
            SetForegroundColor(color),
            Print(format!("{}\n", answer.display_text())),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print retrieved passages with rank and raw score.
    pub fn print_passages(&self, passages: &[SearchHit]) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("\nRetrieved passages ({}):\n", passages.len())),
            ResetColor,
        )?;
        for hit in passages {
            execute!(
                stdout,
                SetForegroundColor(Colors::PASSAGE),
                Print(format!("[{}] score={:.4}\n", hit.rank + 1, hit.score)),
                ResetColor,
                Print(format!("{}\n", preview(&hit.content))),
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn print_success(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::SUCCESS),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an error message.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stderr = io::stderr();
        execute!(
            stderr,
            SetForegroundColor(Colors::ERROR),
            Print(format!("Error: {}\n", msg)),
            ResetColor,
        )?;
        stderr.flush()?;
        Ok(())
    }

    /// Show a spinner while a long step runs. Returns a handle to stop it.
    pub fn start_spinner(&self, message: &str) -> Result<SpinnerHandle> {
        let message = message.to_string();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = std::thread::spawn(move || {
            let frames = ['|', '/', '-', '\\'];
            let mut i = 0;
            while running_clone.load(Ordering::SeqCst) {
                let mut stdout = io::stdout();
                execute!(
                    stdout,
                    SetForegroundColor(Colors::DIM),
                    Print(format!("\r{} {}", frames[i % frames.len()], message)),
                    ResetColor,
                )
                .ok();
                stdout.flush().ok();
                i += 1;
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
            let mut stdout = io::stdout();
            execute!(stdout, Print(format!("\r{}\r", " ".repeat(message.len() + 2)))).ok();
            stdout.flush().ok();
        });

        Ok(SpinnerHandle {
            running,
            thread: Some(handle),
        })
    }
}

/// Handle to a running spinner. Drop or call stop() to terminate it.
pub struct SpinnerHandle {
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl SpinnerHandle {
    /// Stop the spinner and wait for the line to be cleared.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}

impl Drop for SpinnerHandle {
    fn drop(&mut self) {
        self.halt();
    }
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > PASSAGE_PREVIEW_CHARS {
        let cut: String = flat.chars().take(PASSAGE_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        flat
    }
}
