//! `tson-parse` — read TSON text on stdin, emit Compatible-TSON JSON on
//! stdout.
//!
//! Usage:
//!   tson-parse < document.tson

use std::io::{self, Read, Write};

use tson::codec::compatible::emit_compatible;

fn main() {
    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match tson::parse(&buf) {
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
