#[tokio::main]
async fn main() {
    if let Err(e) = mediconnect_lib::run().await {
        // The subscriber may not be up yet if configuration failed.
        tracing::error!("{e}");
        eprintln!("mediconnect: {e}");
        std::process::exit(1);
    }
}
