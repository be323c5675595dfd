use generator::GeneratorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GeneratorConfig::load()?;
    generator::start_server(config).await?;
    Ok(())
}
