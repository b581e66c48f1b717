use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "kira-bridge",
    version,
    about = "Run prompts through the Kira inference bridge"
)]
pub struct BridgeArgs {
    /// Model artifact path passed to `initialize`.
    #[arg(long)]
    pub model: String,
    /// TOML configuration file. Defaults to `KIRA_BRIDGE_CONFIG` or built-in values.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Print the response token by token.
    #[arg(long, default_value_t = false)]
    pub stream: bool,
    /// Print the model info as JSON before running prompts.
    #[arg(long, default_value_t = false)]
    pub info: bool,
    /// Prompts to run, in order.
    #[arg(required = true)]
    pub prompts: Vec<String>,
}

pub fn parse_bridge_args() -> BridgeArgs {
    BridgeArgs::parse()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_bridge_args() {
        let args = vec![
            "kira-bridge",
            "--model",
            "/data/models/gemma-wellness-f16.gguf",
            "--stream",
            "hello",
            "I feel stressed",
        ];
        let bridge_args = BridgeArgs::try_parse_from(args).unwrap();
        assert_eq!(bridge_args.model, "/data/models/gemma-wellness-f16.gguf");
        assert!(bridge_args.stream);
        assert!(!bridge_args.info);
        assert_eq!(bridge_args.config, None);
        assert_eq!(bridge_args.prompts, vec!["hello", "I feel stressed"]);
    }

    #[test]
    fn test_prompt_is_required() {
        let args = vec!["kira-bridge", "--model", "model.bin"];
        assert!(BridgeArgs::try_parse_from(args).is_err());
    }
}
