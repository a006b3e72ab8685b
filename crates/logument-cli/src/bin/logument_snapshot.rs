//! `logument-snapshot` — read a serialized Logument document on stdin and a
//! version number as the first argument, emit the reconstructed snapshot as
//! Compatible-TSON JSON.
//!
//! Usage:
//!   logument-snapshot <version> < document.json

use std::io::{self, Read, Write};

use logument::parse_wire;
use tson::codec::compatible::emit_compatible;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let version: u64 = match args.get(1).and_then(|v| v.parse().ok()) {
        Some(v) => v,
        None => {
            eprintln!("First argument must be a non-negative version number.");
            std::process::exit(1);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let mut log = match parse_wire(buf.trim()) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match log.snapshot(version) {
        Ok(value) => {
            let out = emit_compatible(&value);
            io::stdout().write_all(out.as_bytes()).unwrap();
            io::stdout().write_all(b"\n").unwrap();
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
