//! Shared contract between the interactive feedback MCP server and its dialog process.
//!
//! The server spawns the dialog with the message and `|||`-joined options on the
//! command line; the dialog answers with one JSON [`FeedbackResult`] written to
//! the handoff file.

pub mod error;
pub mod handoff;
pub mod image_codec;
pub mod options;

pub use error::{Error, Result};
pub use handoff::{read_result, remove_handoff, write_result, FeedbackResult};
pub use options::{compose_feedback, join_options, split_options, OPTION_SEPARATOR};
