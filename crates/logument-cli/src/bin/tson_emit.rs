//! `tson-emit` — read Compatible-TSON JSON on stdin, emit native TSON text
//! on stdout.
//!
//! Usage:
//!   tson-emit < document.json

use std::io::{self, Read, Write};

use tson::codec::compatible::parse_compatible;
use tson::codec::native::emit_native;

fn main() {
    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match parse_compatible(buf.trim()) {
        Ok(value) => {
            let out = emit_native(&value);
            io::stdout().write_all(out.as_bytes()).unwrap();
            io::stdout().write_all(b"\n").unwrap();
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
