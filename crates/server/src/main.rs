#[tokio::main]
async fn main() -> anyhow::Result<()> {
    leadrag_server::start().await
}
