//! Process instruction scripts.
//!
//! One instruction per line, `#` starts a comment:
//!
//! ```text
//! alloc <size> <reg>
//! free <reg>
//! read <reg> <offset>
//! write <value> <reg> <offset>
//! grow <area> <size>
//! ```
//!
//! Numbers are decimal or `0x`-prefixed hexadecimal.

use core::fmt;
use mm_addresses::PageSize;
use mm_vmem::{AreaId, Process, VmError};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Instruction {
    Alloc { size: u32, handle: usize },
    Free { handle: usize },
    Read { handle: usize, offset: u32 },
    Write { value: u8, handle: usize, offset: u32 },
    Grow { area: AreaId, size: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: unknown instruction `{name}`")]
    UnknownInstruction { line: usize, name: String },
    #[error("line {line}: `{name}` expects {expected} operands, got {got}")]
    OperandCount {
        line: usize,
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("line {line}: `{token}` is not a valid number")]
    InvalidNumber { line: usize, token: String },
}

/// Parse a whole script. Blank and comment-only lines are skipped.
///
/// # Errors
/// The first malformed line.
pub fn parse(text: &str) -> Result<Vec<Instruction>, ScriptError> {
    let mut program = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let code = raw.split_once('#').map_or(raw, |(code, _)| code);
        let mut words = code.split_whitespace();
        let Some(name) = words.next() else {
            continue;
        };
        let operands: Vec<&str> = words.collect();
        program.push(parse_instruction(line, name, &operands)?);
    }
    Ok(program)
}

fn parse_instruction(line: usize, name: &str, ops: &[&str]) -> Result<Instruction, ScriptError> {
    let (name, expected) = match name {
        "alloc" => ("alloc", 2),
        "free" => ("free", 1),
        "read" => ("read", 2),
        "write" => ("write", 3),
        "grow" => ("grow", 2),
        other => {
            return Err(ScriptError::UnknownInstruction {
                line,
                name: other.to_owned(),
            });
        }
    };
    if ops.len() != expected {
        return Err(ScriptError::OperandCount {
            line,
            name,
            expected,
            got: ops.len(),
        });
    }

    let num = |i: usize| number(line, ops[i]);
    let instruction = match name {
        "alloc" => Instruction::Alloc {
            size: narrow(line, ops[0], num(0)?)?,
            handle: index(line, ops[1], num(1)?)?,
        },
        "free" => Instruction::Free {
            handle: index(line, ops[0], num(0)?)?,
        },
        "read" => Instruction::Read {
            handle: index(line, ops[0], num(0)?)?,
            offset: narrow(line, ops[1], num(1)?)?,
        },
        "write" => Instruction::Write {
            value: narrow(line, ops[0], num(0)?)?,
            handle: index(line, ops[1], num(1)?)?,
            offset: narrow(line, ops[2], num(2)?)?,
        },
        _ => Instruction::Grow {
            area: index(line, ops[0], num(0)?)?,
            size: narrow(line, ops[1], num(1)?)?,
        },
    };
    Ok(instruction)
}

fn number(line: usize, token: &str) -> Result<u64, ScriptError> {
    let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => token.parse(),
    };
    parsed.map_err(|_| ScriptError::InvalidNumber {
        line,
        token: token.to_owned(),
    })
}

fn narrow<T: TryFrom<u64>>(line: usize, token: &str, value: u64) -> Result<T, ScriptError> {
    T::try_from(value).map_err(|_| ScriptError::InvalidNumber {
        line,
        token: token.to_owned(),
    })
}

fn index(line: usize, token: &str, value: u64) -> Result<usize, ScriptError> {
    narrow(line, token, value)
}

impl Instruction {
    /// Run the instruction against `process` and describe the outcome.
    ///
    /// # Errors
    /// Whatever the memory subsystem reports.
    pub fn execute<S: PageSize>(self, process: &Process<S>) -> Result<String, VmError> {
        Ok(match self {
            Self::Alloc { size, handle } => {
                let addr = process.allocate_named(size, handle)?;
                format!("region {handle} at {addr}")
            }
            Self::Free { handle } => {
                process.free_named(handle)?;
                format!("region {handle} released")
            }
            Self::Read { handle, offset } => {
                let value = process.read_named(handle, offset)?;
                format!("{value}")
            }
            Self::Write {
                value,
                handle,
                offset,
            } => {
                process.write_named(handle, offset, value)?;
                String::from("ok")
            }
            Self::Grow { area, size } => {
                let added = process.grow_area(area, size)?;
                format!("area {area} grew by {added} bytes")
            }
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc { size, handle } => write!(f, "alloc {size} {handle}"),
            Self::Free { handle } => write!(f, "free {handle}"),
            Self::Read { handle, offset } => write!(f, "read {handle} {offset}"),
            Self::Write {
                value,
                handle,
                offset,
            } => write!(f, "write {value} {handle} {offset}"),
            Self::Grow { area, size } => write!(f, "grow {area} {size}"),
        }
    }
}
