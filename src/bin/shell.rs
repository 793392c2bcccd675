//! scull-shell
//!
//! Line-oriented front end for a set of in-memory scull devices. Commands
//! are read from a script file or stdin, one per line:
//!
//! ```text
//! open <device> <r|w|rw>     start a session (w truncates)
//! write <text...>            write text at the cursor
//! read <count>               read up to count bytes at the cursor
//! seek <offset>              move the cursor
//! cat                        read the whole device from offset 0
//! stat                       show device shape
//! trim                       discard the device contents
//! close                      end the session
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use clap::Parser;
use scullkv::{AccessMode, Config, DeviceRegistry, FileHandle, ScullError};
use tracing_subscriber::{fmt, EnvFilter};

/// scull shell
#[derive(Parser, Debug)]
#[command(name = "scull-shell")]
#[command(about = "Drive in-memory scull devices from a command script")]
#[command(version)]
struct Args {
    /// Number of devices
    #[arg(short = 'n', long, default_value = "3")]
    devices: usize,

    /// Leaf buffer size in bytes
    #[arg(short, long, default_value = "4000")]
    quantum: usize,

    /// Leaf slots per segment
    #[arg(short = 's', long, default_value = "1000")]
    qset: usize,

    /// Per-device memory limit in bytes
    #[arg(short, long)]
    memory_limit: Option<usize>,

    /// Command script (defaults to stdin)
    script: Option<PathBuf>,
}

struct Session {
    registry: DeviceRegistry,
    handle: Option<FileHandle>,
}

impl Session {
    fn execute(&mut self, line: &str, out: &mut impl Write) -> Result<(), ScullError> {
        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some(command) => command,
            None => return Ok(()),
        };

        match command {
            "open" => {
                let index = parse(words.next(), "device")?;
                let mode = match words.next() {
                    Some("r") => AccessMode::ReadOnly,
                    Some("w") => AccessMode::WriteOnly,
                    Some("rw") | None => AccessMode::ReadWrite,
                    Some(other) => {
                        return Err(ScullError::Config(format!("unknown mode: {}", other)))
                    }
                };
                self.handle = Some(self.registry.open(index, mode)?);
                writeln!(out, "opened scull{} ({:?})", index, mode)?;
            }
            "write" => {
                let text = line.trim_start()["write".len()..].trim_start();
                self.handle()?.write_all(text.as_bytes())?;
                writeln!(out, "wrote {} bytes", text.len())?;
            }
            "read" => {
                let count = parse(words.next(), "count")?;
                let chunk = self.handle()?.read_chunk(count)?;
                writeln!(out, "{}", String::from_utf8_lossy(&chunk))?;
            }
            "seek" => {
                let offset = parse(words.next(), "offset")?;
                let pos = self.handle()?.seek(SeekFrom::Start(offset))?;
                writeln!(out, "cursor at {}", pos)?;
            }
            "cat" => {
                let handle = self.handle()?;
                handle.seek(SeekFrom::Start(0))?;
                let mut content = Vec::new();
                handle.read_to_end(&mut content)?;
                writeln!(out, "{}", String::from_utf8_lossy(&content))?;
            }
            "stat" => {
                let stats = self.handle()?.device().stats();
                writeln!(
                    out,
                    "size={} quantum={} qset={} segments={} leaves={} allocated={}",
                    stats.size,
                    stats.quantum,
                    stats.qset,
                    stats.segments,
                    stats.leaves,
                    stats.allocated_bytes
                )?;
            }
            "trim" => {
                self.handle()?.device().trim();
                writeln!(out, "trimmed")?;
            }
            "close" => {
                self.handle = None;
            }
            other => {
                return Err(ScullError::Config(format!("unknown command: {}", other)));
            }
        }
        Ok(())
    }

    fn handle(&mut self) -> Result<&mut FileHandle, ScullError> {
        self.handle
            .as_mut()
            .ok_or(ScullError::BadAccess("no open device"))
    }
}

fn parse<T: std::str::FromStr>(word: Option<&str>, what: &str) -> Result<T, ScullError> {
    word.and_then(|w| w.parse().ok())
        .ok_or_else(|| ScullError::Config(format!("missing or invalid {}", what)))
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scullkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("scull-shell v{}", scullkv::VERSION);

    let mut builder = Config::builder()
        .device_count(args.devices)
        .quantum(args.quantum)
        .qset(args.qset);
    if let Some(limit) = args.memory_limit {
        builder = builder.memory_limit(limit);
    }

    let registry = match DeviceRegistry::new(builder.build()) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("Failed to create devices: {}", e);
            std::process::exit(1);
        }
    };

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                tracing::error!("Failed to open {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut session = Session {
        registry,
        handle: None,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };
        if line.trim() == "quit" {
            break;
        }
        if let Err(e) = session.execute(&line, &mut out) {
            tracing::warn!("{}: {}", line.trim(), e);
        }
    }

    session.handle = None;
    session.registry.destroy();
}
