pub mod child_process;
pub mod config;
pub mod error;
pub mod gateway;
pub mod launcher;
pub mod logging;
pub mod progress;
pub mod prompt;
pub mod server;

pub use config::{Args, GatewayConfig, LauncherConfig};
pub use error::{GatewayError, LaunchError};
pub use gateway::{AgentResponse, FeedbackGateway, FeedbackRequest};
pub use launcher::DialogLauncher;
pub use server::FeedbackServer;
