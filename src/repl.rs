//! Interactive read-eval-print loop
//!
//! Reads one command per line, runs it against the session, and prints the
//! result. Command failures are reported and the loop carries on; only `exit`,
//! end of input, or a broken output stream end it.

use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use crate::commands::{Command, CommandError, Flow, Session};

/// Prompt printed before every line of input
pub const PROMPT: &str = "Pokedex > ";

/// Runs the prompt until `exit` or end of input.
///
/// # Arguments
/// * `session` - State the commands run against
/// * `input` - Source of command lines
/// * `out` - Where the prompt and command output are written
pub async fn run<R, W>(session: &mut Session, input: R, out: &mut W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "{err}")?;
                continue;
            }
        };

        match session.execute(command, out).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(CommandError::Io(err)) => return Err(err),
            Err(err) => {
                warn!(error = %err, line = %line, "command failed");
                writeln!(out, "Error: {err}")?;
            }
        }
    }

    out.flush()
}
