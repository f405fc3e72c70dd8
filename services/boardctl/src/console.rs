use std::fmt::Display;
use std::io::{self, BufRead, Read, Write};

use admin::{AdminEditSession, AdminGate, Confirm, DeleteOutcome, GateOutcome, NoticeKind};
use board::{format_price, PricedItem};
use sync::PriceSource;
use tracing::debug;

use crate::commands::{parse_command, Command, HELP};

/// Prompted line input plus plain output.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Returns `None` once input is exhausted.
    pub fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// Line reader for use on a multi-threaded runtime worker.
///
/// Every blocking read runs under [`tokio::task::block_in_place`], so the
/// worker's other tasks move to another thread while the operator types.
pub struct RuntimeReader<R>(R);

impl<R: BufRead> RuntimeReader<R> {
    pub fn new(inner: R) -> Self {
        Self(inner)
    }
}

impl<R: BufRead> Read for RuntimeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let inner = &mut self.0;
        tokio::task::block_in_place(move || inner.read(buf))
    }
}

impl<R: BufRead> BufRead for RuntimeReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        let inner = &mut self.0;
        tokio::task::block_in_place(move || inner.fill_buf())
    }

    fn consume(&mut self, amt: usize) {
        self.0.consume(amt);
    }
}

impl<R: BufRead, W: Write> Confirm for Console<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        match self.prompt(&format!("{prompt} [y/N] ")) {
            Ok(Some(answer)) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

/// Asks for the admin secret until it matches or the gate locks.
pub fn login<R: BufRead, W: Write>(console: &mut Console<R, W>, mut gate: AdminGate) -> io::Result<bool> {
    loop {
        let Some(input) = console.prompt("Admin secret: ")? else {
            return Ok(false);
        };
        match gate.attempt(&input) {
            GateOutcome::Granted => return Ok(true),
            GateOutcome::Denied { remaining } => {
                console.say(format!("Wrong secret! {remaining} attempt(s) left."))?;
            }
            GateOutcome::LockedOut => {
                console.say("Too many wrong attempts.")?;
                return Ok(false);
            }
        }
    }
}

pub fn render_items(items: &[PricedItem]) -> String {
    let mut out = format!("{:<6}{:<24}{:>16}{:>16}\n", "ID", "NAME", "BUY", "SELL");
    for item in items {
        out.push_str(&format!(
            "{:<6}{:<24}{:>16}{:>16}\n",
            item.id,
            item.name,
            format_price(item.buy),
            format_price(item.sell)
        ));
    }
    out
}

/// Loads the working copy and serves commands until `quit` or end of input.
pub async fn run<R, W, S>(console: &mut Console<R, W>, session: &mut AdminEditSession<S>) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    S: PriceSource,
{
    load(console, session).await?;
    loop {
        let Some(line) = console.prompt("> ")? else {
            return Ok(());
        };
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(crate::ParseError::Empty) => continue,
            Err(err) => {
                console.say(err)?;
                continue;
            }
        };
        debug!(?command, "admin command");

        let result = match command {
            Command::Quit => return Ok(()),
            Command::Help => {
                console.say(HELP)?;
                Ok(())
            }
            Command::List => {
                match session.items() {
                    Some(items) => console.say(render_items(items).trim_end())?,
                    None => console.say("prices not loaded, try `reset`")?,
                }
                Ok(())
            }
            Command::Set { id, field, value } => session.edit_field(id, field, &value),
            Command::Add => match session.add_row() {
                Ok(id) => {
                    console.say(format!("added item {id}"))?;
                    Ok(())
                }
                Err(err) => Err(err),
            },
            Command::Delete(id) => match session.delete_row(id, console).await {
                Ok(DeleteOutcome::Cancelled) => {
                    console.say("kept")?;
                    Ok(())
                }
                Ok(DeleteOutcome::Deleted(_)) => Ok(()),
                Err(err) => Err(err),
            },
            Command::Save(id) => session.save_one(id).await.map(|_| ()),
            Command::SaveAll => session.save_all().await.map(|_| ()),
            Command::Reset => {
                session.reset();
                load(console, session).await?;
                Ok(())
            }
        };

        if let Some(notice) = session.take_notice() {
            let tag = match notice.kind {
                NoticeKind::Success => "ok",
                NoticeKind::Error => "error",
                NoticeKind::Info => "info",
            };
            console.say(format!("[{tag}] {}", notice.message))?;
        } else if let Err(err) = result {
            console.say(format!("error: {err}"))?;
        }
    }
}

async fn load<R, W, S>(console: &mut Console<R, W>, session: &mut AdminEditSession<S>) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    S: PriceSource,
{
    match session.load().await {
        Ok(_) => {
            let count = session.items().map(<[PricedItem]>::len).unwrap_or(0);
            console.say(format!("loaded {count} item(s)"))
        }
        Err(err) => console.say(format!("failed to load prices: {err}")),
    }
}
