//! `memsim`: run process scripts against the paging simulator.
//!
//! Every script becomes one process (pid 1, 2, ... in argument order) running
//! on its own thread. All processes share one RAM store and the configured
//! swap devices.

mod args;
mod logger;
mod script;

use crate::args::{ArgsError, Options, USAGE};
use crate::logger::ConsoleLogger;
use crate::script::{Instruction, ScriptError};
use log::{error, info, log_enabled};
use mm_addresses::Size256;
use mm_physical::MemPhy;
use mm_vmem::{MemoryBanks, MemoryConfig, Process, VmError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::{env, fs, thread};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error(transparent)]
    Args(#[from] ArgsError),
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: ScriptError,
    },
    #[error(transparent)]
    Vm(#[from] VmError),
    #[error("a logger is already installed")]
    Logger,
    #[error("process thread panicked")]
    Panicked,
}

fn main() -> ExitCode {
    match run(env::args().skip(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ Error::Args(_)) => {
            eprintln!("memsim: {e}\n{USAGE}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("memsim: {e}");
            if let Some(source) = core::error::Error::source(&e) {
                eprintln!("  caused by: {source}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: impl IntoIterator<Item = String>) -> Result<(), Error> {
    let opts = Options::parse(args)?;
    ConsoleLogger::new(ConsoleLogger::level_for(opts.verbosity))
        .init()
        .map_err(|_| Error::Logger)?;

    let mut programs = Vec::with_capacity(opts.scripts.len());
    for path in &opts.scripts {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let program = script::parse(&text).map_err(|source| Error::Script {
            path: path.clone(),
            source,
        })?;
        programs.push(program);
    }

    let ram = Arc::new(MemPhy::<Size256>::with_size(opts.ram));
    let mut banks = MemoryBanks::<Size256>::new(ram.clone());
    for &bytes in &opts.swaps {
        banks = banks.with_swap(Arc::new(MemPhy::<Size256>::with_size(bytes)));
    }
    banks.validate()?;
    info!(
        "RAM {} bytes, {} swap device(s), {} process(es)",
        ram.size(),
        opts.swaps.len(),
        programs.len()
    );

    let mut workers = Vec::with_capacity(programs.len());
    for (pid, program) in (1..).zip(programs) {
        let banks = banks.clone();
        workers.push(thread::spawn(move || run_process(pid, &program, banks)));
    }

    let mut result = Ok(());
    for worker in workers {
        match worker.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("{e}");
                result = Err(e.into());
            }
            Err(_) => result = Err(Error::Panicked),
        }
    }

    if log_enabled!(log::Level::Debug) {
        ram.dump();
    }
    log::logger().flush();
    result
}

/// Execute `program` as process `pid`. Failed instructions are reported and
/// skipped; only setup and teardown failures end the process with an error.
fn run_process(pid: u32, program: &[Instruction], banks: MemoryBanks<Size256>) -> Result<(), VmError> {
    let process = Process::new(pid, &MemoryConfig::default(), banks)?;
    for (step, instruction) in program.iter().enumerate() {
        match instruction.execute(&process) {
            Ok(outcome) => println!("pid {pid} [{step}] {instruction}: {outcome}"),
            Err(e @ VmError::NoVictimAvailable) => {
                println!(
                    "pid {pid} [{step}] {instruction}: failed: {e} (RAM is held by other processes)"
                );
            }
            Err(e) => println!("pid {pid} [{step}] {instruction}: failed: {e}"),
        }
    }
    process.teardown()
}
