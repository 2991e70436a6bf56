#[tokio::main]
async fn main() {
    if let Err(err) = reportlens_lib::run().await {
        eprintln!("reportlens: {}", err);
        std::process::exit(1);
    }
}
