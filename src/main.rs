#[tokio::main]
async fn main() -> anyhow::Result<()> {
    survey_lib::run().await
}
