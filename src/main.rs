#[tokio::main]
async fn main() -> anyhow::Result<()> {
    slide_cli::run_cli().await
}
