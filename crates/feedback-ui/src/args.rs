use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_PROMPT: &str = "I implemented the changes you requested.";

#[derive(Parser, Debug, Clone)]
#[command(name = "interactive-feedback-ui")]
#[command(about = "Ask the user for feedback in a desktop dialog")]
pub struct DialogArgs {
    /// Message shown to the user
    #[arg(long, default_value = DEFAULT_PROMPT, allow_hyphen_values = true)]
    pub prompt: String,

    /// Options shown as checkboxes, separated by |||
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub predefined_options: String,

    /// Write the JSON result here instead of printing it
    #[arg(long)]
    pub output_file: Option<PathBuf>,
}

impl DialogArgs {
    pub fn options(&self) -> Vec<String> {
        feedback_core::split_options(&self.predefined_options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launcher_argument_layout() {
        let args = DialogArgs::try_parse_from([
            "interactive-feedback-ui",
            "--prompt",
            "Ship it?",
            "--predefined-options",
            "Yes|||No||||||Later",
            "--output-file",
            "/tmp/feedback_1.json",
        ])
        .unwrap();
        assert_eq!(args.prompt, "Ship it?");
        assert_eq!(args.options(), vec!["Yes", "No", "Later"]);
        assert_eq!(args.output_file, Some(PathBuf::from("/tmp/feedback_1.json")));
    }

    #[test]
    fn test_defaults() {
        let args = DialogArgs::try_parse_from(["interactive-feedback-ui"]).unwrap();
        assert_eq!(args.prompt, DEFAULT_PROMPT);
        assert!(args.options().is_empty());
        assert!(args.output_file.is_none());
    }

    #[test]
    fn test_prompt_may_start_with_dash() {
        let args = DialogArgs::try_parse_from([
            "interactive-feedback-ui",
            "--prompt",
            "- did it work?",
            "--predefined-options",
            "",
        ])
        .unwrap();
        assert_eq!(args.prompt, "- did it work?");
        assert!(args.options().is_empty());
    }
}
