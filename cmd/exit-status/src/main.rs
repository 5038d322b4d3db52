//! Process exit scenarios
//!
//! Each scenario ends the process through the scheduler, so the exit code
//! can only be observed from outside. Driven by `tests/exit_status.rs`.
//!
//! Usage: `exit-status <scenario> [code]`
//!
//! - `main-exit <code>` - thread 0 exits with nothing else runnable
//! - `child-last <code>` - thread 0 exits first, a child exits last
//! - `joined <code>` - thread 0 joins a child, then exits with its status
//! - `panic-last` - the last runnable thread panics
//! - `no-init <code>` - `exit` without a scheduler

use cothread::{create, exit, init, join, kerror, yield_now, SchedError};

fn main() {
    let mut args = std::env::args().skip(1);
    let scenario = args.next().unwrap_or_default();
    let code: i32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);

    if scenario != "no-init" {
        if let Err(e) = init() {
            kerror!("init failed: {}", e);
            std::process::exit(2);
        }
    }

    match scenario.as_str() {
        "main-exit" => exit(code),
        "child-last" => {
            spawn(move || {
                // Thread 0 is gone, nothing else is ready
                if yield_now() != Err(SchedError::NothingToRun) {
                    std::process::exit(3);
                }
                exit(code)
            });
            exit(code + 1)
        }
        "joined" => {
            let child = spawn(move || exit(code));
            match join(child) {
                Ok(status) => exit(status.raw()),
                Err(e) => {
                    kerror!("join failed: {}", e);
                    std::process::exit(3)
                }
            }
        }
        "panic-last" => {
            spawn(|| panic!("last thread panics"));
            exit(0)
        }
        "no-init" => exit(code),
        other => {
            eprintln!("unknown scenario {:?}", other);
            std::process::exit(2)
        }
    }
}

fn spawn(f: impl FnOnce() + 'static) -> cothread::ThreadId {
    match create(f) {
        Ok(id) => id,
        Err(e) => {
            kerror!("create failed: {}", e);
            std::process::exit(2)
        }
    }
}
