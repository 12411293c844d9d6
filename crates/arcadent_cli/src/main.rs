//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `arcadent_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use arcadent_core::db::migrations::latest_version;

fn main() {
    println!("arcadent_core version={}", arcadent_core::core_version());
    println!("arcadent_core schema_version={}", latest_version());
}
