#[tokio::main]
async fn main() {
    if let Err(err) = scoreload::run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
