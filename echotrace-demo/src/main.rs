mod cli;
mod engines;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // Optional frame count: `echotrace-demo 300`
    let frames = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u32>())
        .transpose()?
        .unwrap_or(180);

    cli::run_walkthrough(frames)
}
