#[tokio::main]
async fn main() {
    if let Err(e) = medpredict_lib::run().await {
        eprintln!("medpredict: {e}");
        std::process::exit(1);
    }
}
