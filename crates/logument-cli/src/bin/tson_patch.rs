//! `tson-patch` — apply a TSON-Patch (JSON array of operation objects) to a
//! TSON document read from stdin, emit the patched document as native TSON
//! text.
//!
//! Usage:
//!   tson-patch '<patch-array-json>' < document.tson

use std::io::{self, Read, Write};

use tson::codec::native::emit_native;
use tson_patch::codec::parse_patch;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let patch_text = match args.get(1) {
        Some(p) => p.clone(),
        None => {
            eprintln!("First argument must be a TSON-Patch JSON array.");
            std::process::exit(1);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    let document = match tson::parse(buf.trim()) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let patch = match parse_patch(&patch_text) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match tson_patch::apply(&document, &patch) {
        Ok(result) => {
            let out = emit_native(&result);
            io::stdout().write_all(out.as_bytes()).unwrap();
            io::stdout().write_all(b"\n").unwrap();
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
