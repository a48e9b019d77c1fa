use clap::Parser;
use std::process;
use wasde_parser::cli::{self, Args};

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = cli::run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                match signal {
                    Ok(()) => Err(anyhow::anyhow!("Processing interrupted by user")),
                    Err(e) => Err(anyhow::anyhow!("Failed to listen for CTRL+C: {}", e)),
                }
            }
        }
    });

    match result {
        Ok(stats) if stats.files_processed == 0 && stats.files_discovered > 0 => {
            eprintln!("Error: none of the {} report files could be parsed", stats.files_discovered);
            process::exit(1);
        }
        Ok(_stats) => {
            // Success - stats have already been reported by the processor
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
