//! Serial console grammar: one ASCII command per line, keywords
//! case-insensitive, arguments separated by whitespace.

mod line_reader;

pub use line_reader::{ConsoleLineReader, LineReadEvent};

use crate::trigger::Edge;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Ping,
    Trace { line: u8 },
    Trigger { line: u8, edge: Edge },
    Period { period_us: u32 },
    Start,
    Reset,
    Status,
    Dump,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandError {
    Unknown,
    MissingArgument,
    BadNumber,
    UnknownEdge,
    TrailingInput,
}

impl CommandError {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::MissingArgument => "missing_argument",
            Self::BadNumber => "bad_number",
            Self::UnknownEdge => "unknown_edge",
            Self::TrailingInput => "trailing_input",
        }
    }
}

pub fn parse_console_command(line: &[u8]) -> Result<ConsoleCommand, CommandError> {
    let mut tokens = line
        .split(|byte| byte.is_ascii_whitespace())
        .filter(|token| !token.is_empty());
    let keyword = tokens.next().ok_or(CommandError::Unknown)?;

    let command = if keyword.eq_ignore_ascii_case(b"PING") {
        ConsoleCommand::Ping
    } else if keyword.eq_ignore_ascii_case(b"TRACE") {
        ConsoleCommand::Trace {
            line: parse_line_token(tokens.next())?,
        }
    } else if keyword.eq_ignore_ascii_case(b"TRIG") || keyword.eq_ignore_ascii_case(b"TRIGGER")
    {
        let line = parse_line_token(tokens.next())?;
        let edge_token = tokens.next().ok_or(CommandError::MissingArgument)?;
        let edge = Edge::parse(edge_token).map_err(|_| CommandError::UnknownEdge)?;
        ConsoleCommand::Trigger { line, edge }
    } else if keyword.eq_ignore_ascii_case(b"PERIOD") {
        let token = tokens.next().ok_or(CommandError::MissingArgument)?;
        ConsoleCommand::Period {
            period_us: parse_u32_ascii(token).ok_or(CommandError::BadNumber)?,
        }
    } else if keyword.eq_ignore_ascii_case(b"START") {
        ConsoleCommand::Start
    } else if keyword.eq_ignore_ascii_case(b"RESET") {
        ConsoleCommand::Reset
    } else if keyword.eq_ignore_ascii_case(b"STATUS") {
        ConsoleCommand::Status
    } else if keyword.eq_ignore_ascii_case(b"DUMP") {
        ConsoleCommand::Dump
    } else {
        return Err(CommandError::Unknown);
    };

    if tokens.next().is_some() {
        return Err(CommandError::TrailingInput);
    }
    Ok(command)
}

fn parse_line_token(token: Option<&[u8]>) -> Result<u8, CommandError> {
    let token = token.ok_or(CommandError::MissingArgument)?;
    parse_u32_ascii(token)
        .and_then(|value| u8::try_from(value).ok())
        .ok_or(CommandError::BadNumber)
}

fn parse_u32_ascii(token: &[u8]) -> Option<u32> {
    if token.is_empty() {
        return None;
    }
    let mut value = 0u32;
    for &byte in token {
        if !byte.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add((byte - b'0') as u32)?;
    }
    Some(value)
}
