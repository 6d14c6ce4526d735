//! formcast CLI binary.

use clap::Parser;
use formcast::cli::{args::*, commands::*};
use std::process;

fn main() {
    // Parse command line arguments using clap
    let args = FormcastArgs::parse();

    // Set up logging verbosity before the logger initializes
    if args.verbosity() >= 3 {
        unsafe {
            std::env::set_var("RUST_LOG", "debug");
        }
    } else if args.verbosity() >= 2 {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    } else if args.verbosity() == 0 {
        unsafe {
            std::env::set_var("RUST_LOG", "error");
        }
    }
    env_logger::init();

    // Execute the command
    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
