use anyhow::Result;
use clap::Parser;
use feedback_ui::{app, deliver, init_logging, DialogArgs, FeedbackSession, WindowSettings};
use tracing::warn;

fn main() -> Result<()> {
    let args = DialogArgs::parse();
    init_logging();

    let settings_path = WindowSettings::default_path();
    let settings = WindowSettings::load_or_default(settings_path.as_deref());
    let session = FeedbackSession::new(args.prompt.clone(), args.options());

    let (result, settings) = app::run_dialog(session, settings)?;

    if let Some(path) = &settings_path {
        if let Err(e) = settings.save(path) {
            warn!("[dialog] Failed to save window settings: {}", e);
        }
    }

    deliver(&result, args.output_file.as_deref())
}
