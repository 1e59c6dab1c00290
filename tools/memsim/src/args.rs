use std::path::PathBuf;

/// Default RAM size in bytes.
pub const DEFAULT_RAM: u32 = 1 << 20;
/// Default size of the single swap device in bytes.
pub const DEFAULT_SWAP: u32 = 16 << 20;

pub const USAGE: &str = "usage: memsim [--ram <bytes>] [--swap <bytes>]... [-v]... <script>...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub ram: u32,
    /// Swap device sizes; the first one is active.
    pub swaps: Vec<u32>,
    pub verbosity: u8,
    pub scripts: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgsError {
    #[error("{0} needs a value")]
    MissingValue(&'static str),
    #[error("invalid size `{0}`")]
    InvalidSize(String),
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("no script given")]
    NoScripts,
}

impl Options {
    /// Parse command line arguments (without the program name).
    ///
    /// # Errors
    /// Unknown options, missing or malformed values, or no scripts.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut args = args.into_iter();
        let mut ram = DEFAULT_RAM;
        let mut swaps = Vec::new();
        let mut verbosity = 0_u8;
        let mut scripts = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--ram" => {
                    ram = size(args.next().ok_or(ArgsError::MissingValue("--ram"))?)?;
                }
                "--swap" => {
                    swaps.push(size(args.next().ok_or(ArgsError::MissingValue("--swap"))?)?);
                }
                flag if flag.starts_with("-v") && flag[1..].bytes().all(|b| b == b'v') => {
                    let count = u8::try_from(flag.len() - 1).unwrap_or(u8::MAX);
                    verbosity = verbosity.saturating_add(count);
                }
                flag if flag.starts_with('-') => {
                    return Err(ArgsError::UnknownOption(flag.to_owned()));
                }
                path => scripts.push(PathBuf::from(path)),
            }
        }

        if scripts.is_empty() {
            return Err(ArgsError::NoScripts);
        }
        if swaps.is_empty() {
            swaps.push(DEFAULT_SWAP);
        }
        Ok(Self {
            ram,
            swaps,
            verbosity,
            scripts,
        })
    }
}

/// Byte count with an optional `K` or `M` suffix.
fn size(value: String) -> Result<u32, ArgsError> {
    let (digits, shift) = match value.as_bytes().last() {
        Some(b'K' | b'k') => (&value[..value.len() - 1], 10),
        Some(b'M' | b'm') => (&value[..value.len() - 1], 20),
        _ => (value.as_str(), 0),
    };
    digits
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_mul(1 << shift))
        .ok_or(ArgsError::InvalidSize(value))
}
