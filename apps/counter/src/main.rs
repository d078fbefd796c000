//! # Pharmacy Counter Entry Point
//!
//! ```text
//! pharma-counter login amina s3cret
//! pharma-counter counter            # sales screen, scanner on stdin
//! pharma-counter stock list --category sirop
//! pharma-counter credit pay 12 --all
//! ```
//!
//! The setup lives in lib.rs so the commands can be tested.

use std::process::ExitCode;

fn main() -> ExitCode {
    pharma_counter_lib::run()
}
