//! Event script parsing.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use mtrace_core::{ControlSignal, ExecutionContext, MemOperand};

/// Script parsing errors.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEvent {
    /// An executed instruction and its memory operands.
    Instruction {
        pc: u64,
        tid: u16,
        operands: Vec<MemOperand>,
    },
    /// A control event, optionally carrying a resume context.
    Control {
        signal: ControlSignal,
        ctx: Option<ExecutionContext>,
    },
}

/// Parse the script at `path`.
///
/// # Errors
/// Fails when the file cannot be read or a line does not parse.
pub fn parse_script(path: impl AsRef<Path>) -> Result<Vec<ScriptEvent>, ScriptError> {
    let file = File::open(path)?;
    parse_reader(BufReader::new(file))
}

/// Parse script lines from `reader`.
///
/// Blank lines and `#` comments are skipped. A `tid N` directive sets the
/// thread id for all instruction lines after it (the id starts at 0).
///
/// # Errors
/// Fails on the first malformed line, reporting its number.
pub fn parse_reader(reader: impl BufRead) -> Result<Vec<ScriptEvent>, ScriptError> {
    let mut events = Vec::new();
    let mut current_tid: u16 = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        let number = index + 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix("tid ") {
            let rest = rest.trim();
            current_tid = rest.parse().map_err(|_| ScriptError::Parse {
                line: number,
                message: format!("invalid thread id: {rest}"),
            })?;
            continue;
        }

        if line.starts_with('!') {
            events.push(parse_control(line, number)?);
        } else {
            events.push(parse_instruction(line, current_tid, number)?);
        }
    }

    Ok(events)
}

fn parse_control(line: &str, number: usize) -> Result<ScriptEvent, ScriptError> {
    let captures = CONTROL_PATTERN
        .get_or_init(|| Regex::new(r"^!(start|stop)(?:\s+ctx=((?:0x)?[0-9a-fA-F]+))?$").unwrap())
        .captures(line)
        .ok_or_else(|| ScriptError::Parse {
            line: number,
            message: format!("invalid control event: {line}"),
        })?;

    let signal = if &captures[1] == "start" {
        ControlSignal::Start
    } else {
        ControlSignal::Stop
    };
    let ctx = match captures.get(2) {
        Some(m) => Some(ExecutionContext {
            pc: parse_number(m.as_str(), number)?,
        }),
        None => None,
    };

    Ok(ScriptEvent::Control { signal, ctx })
}

fn parse_instruction(line: &str, tid: u16, number: usize) -> Result<ScriptEvent, ScriptError> {
    let mut fields = line.split_whitespace();
    let pc_field = fields.next().ok_or_else(|| ScriptError::Parse {
        line: number,
        message: "missing program counter".to_string(),
    })?;
    let pc = parse_number(pc_field, number)?;

    let mut operands = Vec::new();
    for field in fields {
        let captures = OPERAND_PATTERN
            .get_or_init(|| Regex::new(r"^(r|w|rw):((?:0x)?[0-9a-fA-F]+):([0-9]+)$").unwrap())
            .captures(field)
            .ok_or_else(|| ScriptError::Parse {
                line: number,
                message: format!("invalid operand: {field}"),
            })?;

        let addr = parse_number(&captures[2], number)?;
        let len: u16 = captures[3].parse().map_err(|_| ScriptError::Parse {
            line: number,
            message: format!("invalid operand length: {}", &captures[3]),
        })?;
        operands.push(match &captures[1] {
            "r" => MemOperand::read(addr, len),
            "w" => MemOperand::write(addr, len),
            _ => MemOperand::read_write(addr, len),
        });
    }

    Ok(ScriptEvent::Instruction { pc, tid, operands })
}

fn parse_number(s: &str, number: usize) -> Result<u64, ScriptError> {
    let parsed = if let Some(hex) = s.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| ScriptError::Parse {
        line: number,
        message: format!("invalid number: {s}"),
    })
}

static CONTROL_PATTERN: OnceLock<Regex> = OnceLock::new();
static OPERAND_PATTERN: OnceLock<Regex> = OnceLock::new();
