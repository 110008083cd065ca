use relaunch::cli::Cli;

#[tokio::main]
async fn main() {
    // Parse arguments, run the supervisor and propagate its exit status
    let code = match Cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("✗ Error: {}", e);
            1
        }
    };

    std::process::exit(code);
}
