use clap::Parser;
use shadercraft::{DemoConfig, run};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = DemoConfig::parse();
    run(&config)?;
    Ok(())
}
