use anyhow::Result;
use perf_graphs::cli;

// Main entry point
fn main() -> Result<()> {
    cli::handle_calls()
}
