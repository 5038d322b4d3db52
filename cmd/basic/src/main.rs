//! Basic cothread example
//!
//! Round-robin yields, join, cancel and thread counts on one OS thread.
//!
//! # Environment Variables
//!
//! - `COTHREAD_FLUSH_EPRINT=1` - Flush debug output immediately (useful for crash debugging)
//! - `COTHREAD_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `COTHREAD_STACK_SIZE=131072` - Per-thread stack size
//!
//! Usage: `basic [threads]`

use cothread::{create, cancel, exit, id, join, yield_now, SchedulerConfig};
use cothread::{kinfo, kdebug};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

// COTHREAD_LOG_LEVEL=debug COTHREAD_FLUSH_EPRINT=1 cargo run -p cothread-basic
fn main() {
    println!("=== cothread Basic Example ===\n");

    let num_threads: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(4);

    let config = SchedulerConfig::from_env();
    config.print();
    if let Err(e) = cothread::init_with_config(config) {
        eprintln!("init failed: {}", e);
        std::process::exit(1);
    }

    // Workers take turns; each exits with its own id
    let rounds = Rc::new(Cell::new(0usize));
    let start = Instant::now();
    let mut workers = Vec::with_capacity(num_threads);
    for i in 0..num_threads {
        let rounds = rounds.clone();
        let tid = create(move || {
            kdebug!("worker {} started", i);
            for j in 0..3 {
                kdebug!("worker {} round {}", i, j);
                rounds.set(rounds.get() + 1);
                let _ = yield_now();
            }
            exit(id().as_u32() as i32)
        });
        match tid {
            Ok(tid) => {
                println!("Created worker {} (ID={})", i, tid);
                workers.push(tid);
            }
            Err(e) => eprintln!("create failed: {}", e),
        }
    }

    // A spinner that never finishes on its own
    let spinner = create(|| loop {
        let _ = yield_now();
    });

    println!("\nJoining {} workers...\n", workers.len());
    for tid in workers {
        match join(tid) {
            Ok(status) => println!("worker {} -> {}", tid, status),
            Err(e) => println!("join {} failed: {}", tid, e),
        }
    }

    if let Ok(spinner) = spinner {
        let _ = cancel(spinner);
        if cothread::state(spinner).is_some_and(|s| s.is_terminated()) {
            kdebug!("spinner {} torn down", spinner);
        }
        match join(spinner) {
            Ok(status) => println!("spinner {} -> {}", spinner, status),
            Err(e) => println!("join {} failed: {}", spinner, e),
        }
    }

    kinfo!("{} rounds in {:?}", rounds.get(), start.elapsed());
    println!("\nRounds: {}", rounds.get());

    if let Err(e) = cothread::shutdown() {
        eprintln!("shutdown failed: {}", e);
    }
    println!("\n=== Example Complete ===");
}
