//! Line-oriented I/O seam between the interpreter and its host.
//!
//! `print` writes one line per call; `input` shows a prompt and reads one
//! line.  [`StdConsole`] talks to the process's stdin/stdout;
//! [`BufferConsole`] captures output and serves scripted input for tests and
//! embedding.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Result of a read that may give up early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    Eof,
    /// Nothing arrived before the timeout; the read can be resumed.
    TimedOut,
}

pub trait Console {
    /// Emit one line of program output.
    fn print_line(&mut self, line: &str);

    /// Show `prompt` and read one line, without its line terminator.
    /// `Ok(None)` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Like [`read_line`](Console::read_line), but give up after `timeout`.
    /// Calling again with the same prompt after [`LineRead::TimedOut`]
    /// resumes the read without showing the prompt twice.
    ///
    /// The default blocks until a line or end of input.
    fn read_line_timeout(&mut self, prompt: &str, _timeout: Duration) -> io::Result<LineRead> {
        Ok(self.read_line(prompt)?.map_or(LineRead::Eof, LineRead::Line))
    }
}

/// Console backed by stdin/stdout.
///
/// Lines are read on a helper thread (started by the first read) so that a
/// read can time out and resume.
#[derive(Debug, Default)]
pub struct StdConsole {
    /// Whether `read_line` writes the prompt before reading.
    pub echo_prompt: bool,
    lines: Option<Receiver<io::Result<String>>>,
    /// A prompt is showing and its line has not arrived yet.
    prompting: bool,
}

impl StdConsole {
    pub fn new(echo_prompt: bool) -> Self {
        StdConsole { echo_prompt, ..Self::default() }
    }

    fn read(&mut self, prompt: &str, timeout: Option<Duration>) -> io::Result<LineRead> {
        if self.echo_prompt && !self.prompting {
            let mut out = io::stdout().lock();
            write!(out, "{prompt} ")?;
            out.flush()?;
        }
        self.prompting = true;

        if self.lines.is_none() {
            self.lines = Some(spawn_stdin_reader()?);
        }
        let received = match (&self.lines, timeout) {
            (None, _) => Err(RecvTimeoutError::Disconnected),
            (Some(rx), None) => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            (Some(rx), Some(t)) => rx.recv_timeout(t),
        };
        match received {
            Err(RecvTimeoutError::Timeout) => Ok(LineRead::TimedOut),
            Err(RecvTimeoutError::Disconnected) => {
                self.prompting = false;
                Ok(LineRead::Eof)
            }
            Ok(line) => {
                self.prompting = false;
                line.map(LineRead::Line)
            }
        }
    }
}

/// Forward stdin lines over a channel until end of input or a read error.
fn spawn_stdin_reader() -> io::Result<Receiver<io::Result<String>>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new().name("stdin".to_owned()).spawn(move || {
        let stdin = io::stdin();
        loop {
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(Ok(strip_newline(line))).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
    })?;
    Ok(rx)
}

impl Console for StdConsole {
    fn print_line(&mut self, line: &str) {
        let mut out = io::stdout().lock();
        // A closed stdout (e.g. `| head`) must not abort the script.
        let _ = writeln!(out, "{line}");
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.read(prompt, None)? {
            LineRead::Line(line) => Ok(Some(line)),
            LineRead::Eof | LineRead::TimedOut => Ok(None),
        }
    }

    fn read_line_timeout(&mut self, prompt: &str, timeout: Duration) -> io::Result<LineRead> {
        self.read(prompt, Some(timeout))
    }
}

fn strip_newline(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

/// In-memory console.  Clones share the same buffers, so a caller can keep
/// a handle after boxing one into an interpreter.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    output: Rc<RefCell<Vec<String>>>,
    prompts: Rc<RefCell<Vec<String>>>,
    input: Rc<RefCell<VecDeque<String>>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// A console whose `read_line` returns `lines` in order, then EOF.
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let console = Self::new();
        console.input.borrow_mut().extend(lines.into_iter().map(Into::into));
        console
    }

    /// Every line printed so far.
    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    /// Drain the printed lines.
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.borrow_mut())
    }

    /// Every prompt shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Console for BufferConsole {
    fn print_line(&mut self, line: &str) {
        self.output.borrow_mut().push(line.to_owned());
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.borrow_mut().push(prompt.to_owned());
        Ok(self.input.borrow_mut().pop_front())
    }
}
