use std::io::Write;
use std::sync::Arc;

use kira_bridge::cli::parse_bridge_args;
use kira_bridge::logging::init_logger;
use kira_bridge::{Bridge, BridgeConfig};

fn main() -> anyhow::Result<()> {
    init_logger().init();
    let args = parse_bridge_args();

    let config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::from_env()?,
    };
    let bridge = Arc::new(Bridge::new(config));
    bridge.initialize(&args.model)?;

    if args.info {
        println!("{}", serde_json::to_string_pretty(&bridge.model_info())?);
    }

    let mut stdout = std::io::stdout();
    for prompt in &args.prompts {
        if args.stream {
            let job = bridge.spawn_stream(prompt)?;
            for token in job.stream.iter() {
                write!(stdout, "{token}")?;
                stdout.flush()?;
            }
            job.join()?;
            writeln!(stdout)?;
        } else {
            let result = bridge.run_inference(prompt)?;
            writeln!(stdout, "{}", result.text)?;
        }
    }

    Ok(())
}
