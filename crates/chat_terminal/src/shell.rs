use std::future::Future;
use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use codementor::transcript::EntryId;
use codementor::{
    ChatSession, ChatTransport, SessionObserver, TranscriptEntry, TurnError, TurnOutcome,
};

use crate::commands::{is_confirmation, parse_command, Command};

pub const BANNER: &str = "🤖 CodeMentor - Seu mentor de lógica de programação";
pub const HELP_TEXT: &str =
    "Comandos: /help, /clear (limpa a conversa), /quit. Também é possível sair com 'sair'.";
pub const FAREWELL: &str = "👋 Até logo! Continue praticando lógica de programação!";
pub const USER_PROMPT: &str = "Você: ";
pub const ASSISTANT_PREFIX: &str = "🤖 CodeMentor: ";
pub const THINKING: &str = "🤔 CodeMentor está pensando...";
pub const CLEAR_PROMPT: &str = "Limpar toda a conversa? (s/N): ";
pub const CLEARED: &str = "🧹 Conversa limpa.";
pub const INTERRUPTED: &str = "⏹️ Resposta interrompida.";
pub const ENDED_BY_USER: &str = "👋 Chat encerrado pelo usuário.";

const SEPARATOR_WIDTH: usize = 50;

/// Prints a turn as it streams. The first write error is kept and reported by
/// [`TerminalPrinter::finish`].
pub struct TerminalPrinter<'w, W: Write> {
    out: &'w mut W,
    printed_fragment: bool,
    error: Option<io::Error>,
}

impl<'w, W: Write> TerminalPrinter<'w, W> {
    pub fn new(out: &'w mut W) -> Self {
        Self {
            out,
            printed_fragment: false,
            error: None,
        }
    }

    pub fn finish(self) -> io::Result<()> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn write(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(error) = result {
            self.error = Some(error);
        }
    }
}

impl<W: Write> SessionObserver for TerminalPrinter<'_, W> {
    fn on_fragment(&mut self, _entry: &TranscriptEntry, fragment: &str) {
        if !self.printed_fragment {
            self.printed_fragment = true;
            self.write(ASSISTANT_PREFIX);
        }
        self.write(fragment);
    }

    fn on_discarded(&mut self, _entry: EntryId) {
        if self.printed_fragment {
            self.write("\n");
        }
    }

    fn on_error(&mut self, _error: &TurnError, entry: &TranscriptEntry) {
        self.write(&entry.content);
        self.write("\n");
    }

    fn on_settled(&mut self, outcome: &TurnOutcome) {
        if outcome.is_committed() {
            self.write("\n");
        }
        self.write(&"-".repeat(SEPARATOR_WIDTH));
        self.write("\n");
    }
}

/// Resolves on Ctrl-C. Never resolves when the handler cannot be installed.
pub async fn ctrl_c() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

/// Read-eval-print loop over `input` until EOF, a quit command or an
/// interrupt at the prompt.
///
/// `interrupt` is called for every wait and raced against it. While a reply
/// is streaming an interrupt abandons that reply and the question stays in
/// history.
pub async fn run_shell<T, R, W, I, F>(
    session: &mut ChatSession<T>,
    mut input: R,
    output: &mut W,
    mut interrupt: I,
) -> io::Result<()>
where
    T: ChatTransport,
    R: AsyncBufRead + Unpin,
    W: Write,
    I: FnMut() -> F,
    F: Future<Output = ()>,
{
    writeln!(output, "{BANNER}")?;
    writeln!(output, "{}", "=".repeat(SEPARATOR_WIDTH))?;
    if let Some(welcome) = session.transcript().welcome() {
        writeln!(output, "{}", welcome.content)?;
    }
    writeln!(output, "{HELP_TEXT}")?;
    writeln!(output)?;

    loop {
        write!(output, "{USER_PROMPT}")?;
        output.flush()?;

        let Some(line) = prompt(&mut input, output, &mut interrupt).await? else {
            return Ok(());
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Some(Command::Help) => writeln!(output, "{HELP_TEXT}")?,
            Some(Command::Clear) => {
                write!(output, "{CLEAR_PROMPT}")?;
                output.flush()?;
                let Some(answer) = prompt(&mut input, output, &mut interrupt).await? else {
                    return Ok(());
                };
                if is_confirmation(&answer) {
                    session.clear();
                    writeln!(output, "{CLEARED}")?;
                }
            }
            Some(Command::Quit) => {
                writeln!(output, "{FAREWELL}")?;
                return Ok(());
            }
            Some(Command::Unknown(command)) => {
                writeln!(output, "Comando desconhecido: {command}. {HELP_TEXT}")?;
            }
            None => {
                writeln!(output, "{THINKING}")?;
                let mut printer = TerminalPrinter::new(output);
                let settled = tokio::select! {
                    _ = session.send(line, &mut printer) => true,
                    _ = interrupt() => false,
                };
                printer.finish()?;

                if !settled {
                    session.discard_interrupted();
                    writeln!(output)?;
                    writeln!(output, "{INTERRUPTED}")?;
                }
            }
        }
    }
}

/// Next input line. `None` means the shell should stop; the goodbye has
/// already been printed.
async fn prompt<R, W, I, F>(
    input: &mut R,
    output: &mut W,
    interrupt: &mut I,
) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    I: FnMut() -> F,
    F: Future<Output = ()>,
{
    let mut line = String::new();
    let read = tokio::select! {
        read = input.read_line(&mut line) => Some(read?),
        _ = interrupt() => None,
    };
    match read {
        Some(0) => {
            writeln!(output)?;
            writeln!(output, "{FAREWELL}")?;
            Ok(None)
        }
        Some(_) => Ok(Some(line)),
        None => {
            tracing::debug!("interrupted at the prompt");
            writeln!(output)?;
            writeln!(output, "{ENDED_BY_USER}")?;
            Ok(None)
        }
    }
}
