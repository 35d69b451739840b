#[tokio::main]
async fn main() {
    if let Err(e) = userinfo_realm_cli::run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
