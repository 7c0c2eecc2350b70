//! Replays allocate/free operations against a fixed-size arena and prints the
//! resulting block listing.
//!
//! ```text
//! $ tagalloc --size 256 --page-size 256 alloc:24 alloc:100 free:1 dump
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::process;

use argh::FromArgs;
use log::{LevelFilter, info};
use snafu::ResultExt as _;
use tagalloc::{Arena, ArenaConfig};

use self::{
    error::{GenericError, Report},
    op::Op,
    replay::Replay,
};

mod error;
mod logger;
mod op;
mod replay;
mod style;

/// Replay allocate/free operations against a fixed-size arena.
#[derive(Debug, FromArgs)]
struct Args {
    /// arena size in bytes, rounded up to the page size
    #[argh(option, default = "4096")]
    size: usize,
    /// rounding granularity in bytes (defaults to the platform page size)
    #[argh(option)]
    page_size: Option<usize>,
    /// log every allocator decision to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
    /// operations to run in order: alloc:<bytes>, free:<n>, check, dump
    #[argh(positional)]
    ops: Vec<Op>,
}

fn main() {
    let args: Args = argh::from_env();

    if let Err(err) = run(&args) {
        let report = Report::new(err);
        eprintln!("{report}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), GenericError> {
    let max_level = if args.verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Warn
    };
    logger::init(max_level).whatever_context("failed to install logger")?;

    let mut config = ArenaConfig::new();
    if let Some(page_size) = args.page_size {
        config = config.with_page_size(page_size);
    }
    let mut arena = Arena::new(config);
    arena
        .init(args.size)
        .with_whatever_context(|_| format!("failed to initialize arena, size={}", args.size))?;
    info!(
        "arena ready: total_size={} page_size={}",
        arena.total_size(),
        arena.config().page_size()
    );

    // A failed operation is reported and the replay moves on.
    let mut replay = Replay::new(arena);
    for &op in &args.ops {
        match replay.apply(op) {
            Ok(outcome) => println!("{outcome}"),
            Err(err) => eprint!("{op}: {}", Report::new(err)),
        }
    }

    println!("{}", replay.arena().list_blocks());

    replay
        .arena()
        .check()
        .whatever_context("arena is inconsistent after replay")?;
    Ok(())
}
