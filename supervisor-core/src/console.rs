//! Line grammar for the host diagnostic console.
//!
//! Host tooling (the emulator, bench scripts) drives the supervisor with
//! short text commands; this module parses one line into a structured
//! [`ConsoleCommand`]. It stays `no_std` friendly by composing `winnow`
//! combinators directly over `&str` with bounded output types.

use core::fmt;

use heapless::Vec as HeaplessVec;
use winnow::ascii::{dec_uint, space1};
use winnow::combinator::{alt, opt, preceded, repeat};
use winnow::prelude::*;

/// Upper bound on bytes accepted by the `raw` command.
pub const MAX_RAW_BYTES: usize = 8;

/// Commands accepted by the diagnostic console.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConsoleCommand {
    /// Print supervisor state.
    Status,
    /// Drive the raw ignition input level.
    Ignition(bool),
    /// Shorthand for a watchdog pat transaction.
    Pat,
    /// Send a framed command and request the response.
    Send { opcode: u8, params: [u8; 2] },
    /// Deliver raw bytes as a single delivery event, with no response request.
    Raw(HeaplessVec<u8, MAX_RAW_BYTES>),
    /// Request a response frame without sending anything first.
    Fill,
    /// Advance the simulated clock while running the polling loop.
    Run { millis: u32 },
    /// Show command help.
    Help,
}

/// Errors surfaced while parsing a console line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConsoleError {
    /// The line held nothing but whitespace.
    Empty,
    /// The line did not match any command form.
    Unrecognized,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Empty => f.write_str("empty line"),
            ConsoleError::Unrecognized => f.write_str("unrecognized command"),
        }
    }
}

/// Parses one console line.
pub fn parse(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ConsoleError::Empty);
    }
    command
        .parse(trimmed)
        .map_err(|_| ConsoleError::Unrecognized)
}

fn command(input: &mut &str) -> ModalResult<ConsoleCommand> {
    alt((status, ignition, pat, send, raw, fill, run, help)).parse_next(input)
}

fn status(input: &mut &str) -> ModalResult<ConsoleCommand> {
    "status".value(ConsoleCommand::Status).parse_next(input)
}

fn ignition(input: &mut &str) -> ModalResult<ConsoleCommand> {
    preceded(
        ("ign", space1),
        alt(("on".value(true), "off".value(false))),
    )
    .map(ConsoleCommand::Ignition)
    .parse_next(input)
}

fn pat(input: &mut &str) -> ModalResult<ConsoleCommand> {
    "pat".value(ConsoleCommand::Pat).parse_next(input)
}

fn send(input: &mut &str) -> ModalResult<ConsoleCommand> {
    preceded(
        ("send", space1),
        (byte, opt(preceded(space1, byte)), opt(preceded(space1, byte))),
    )
    .map(|(opcode, first, second)| ConsoleCommand::Send {
        opcode,
        params: [first.unwrap_or(0), second.unwrap_or(0)],
    })
    .parse_next(input)
}

fn raw(input: &mut &str) -> ModalResult<ConsoleCommand> {
    preceded(
        "raw",
        repeat(1..=MAX_RAW_BYTES, preceded(space1, byte)).fold(
            HeaplessVec::<u8, MAX_RAW_BYTES>::new,
            |mut bytes, value| {
                // Capacity equals the repeat bound, so the push cannot fail.
                let _ = bytes.push(value);
                bytes
            },
        ),
    )
    .map(ConsoleCommand::Raw)
    .parse_next(input)
}

fn fill(input: &mut &str) -> ModalResult<ConsoleCommand> {
    "fill".value(ConsoleCommand::Fill).parse_next(input)
}

fn run(input: &mut &str) -> ModalResult<ConsoleCommand> {
    preceded(("run", space1), dec_uint)
        .map(|millis| ConsoleCommand::Run { millis })
        .parse_next(input)
}

fn help(input: &mut &str) -> ModalResult<ConsoleCommand> {
    alt(("help", "?")).value(ConsoleCommand::Help).parse_next(input)
}

fn byte(input: &mut &str) -> ModalResult<u8> {
    dec_uint::<_, u32, _>.try_map(u8::try_from).parse_next(input)
}
