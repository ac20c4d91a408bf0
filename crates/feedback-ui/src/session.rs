//! Dialog state independent of the window toolkit.
//!
//! A session starts `Open` and ends exactly once, either `Submitted` with the
//! composed answer or `Closed` with an empty one.

use crate::error::{DialogError, Result};
use feedback_core::image_codec::{downscale_to_fit, encode_png_base64};
use feedback_core::{compose_feedback, FeedbackResult};
use image::RgbaImage;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Submitted,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Submitted => "submitted",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct FeedbackSession {
    prompt: String,
    options: Vec<String>,
    checked: Vec<bool>,
    free_text: String,
    screenshots: Vec<RgbaImage>,
    state: SessionState,
}

impl FeedbackSession {
    pub fn new(prompt: impl Into<String>, options: Vec<String>) -> Self {
        let checked = vec![false; options.len()];
        Self {
            prompt: prompt.into(),
            options,
            checked,
            free_text: String::new(),
            screenshots: Vec::new(),
            state: SessionState::Open,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    /// Mutable checkbox flag for option `index`
    pub fn checked_mut(&mut self, index: usize) -> Option<&mut bool> {
        self.checked.get_mut(index)
    }

    pub fn set_checked(&mut self, index: usize, value: bool) {
        if let Some(flag) = self.checked.get_mut(index) {
            *flag = value;
        }
    }

    pub fn toggle_option(&mut self, index: usize) {
        if let Some(flag) = self.checked.get_mut(index) {
            *flag = !*flag;
        }
    }

    pub fn free_text(&self) -> &str {
        &self.free_text
    }

    pub fn free_text_mut(&mut self) -> &mut String {
        &mut self.free_text
    }

    pub fn set_free_text(&mut self, text: impl Into<String>) {
        self.free_text = text.into();
    }

    pub fn screenshots(&self) -> &[RgbaImage] {
        &self.screenshots
    }

    /// Attach an image, downscaled to the size limit. Returns its index.
    pub fn add_screenshot(&mut self, image: RgbaImage) -> usize {
        let image = downscale_to_fit(image);
        debug!(
            "[dialog] Attached screenshot #{} ({}x{})",
            self.screenshots.len(),
            image.width(),
            image.height()
        );
        self.screenshots.push(image);
        self.screenshots.len() - 1
    }

    /// Detach the image at `index`; later images shift down by one
    pub fn remove_screenshot(&mut self, index: usize) -> Option<RgbaImage> {
        if index < self.screenshots.len() {
            Some(self.screenshots.remove(index))
        } else {
            None
        }
    }

    /// Text the agent will receive for the current inputs
    pub fn compose_text(&self) -> String {
        compose_feedback(&self.options, &self.checked, &self.free_text)
    }

    /// Finish with the composed text and every attached image, in attachment order
    pub fn submit(&mut self) -> Result<FeedbackResult> {
        self.ensure_open()?;
        let images = self
            .screenshots
            .iter()
            .enumerate()
            .map(|(index, image)| {
                encode_png_base64(image).map_err(|source| DialogError::Encode { index, source })
            })
            .collect::<Result<Vec<_>>>()?;
        let result = FeedbackResult::new(self.compose_text(), images);
        self.state = SessionState::Submitted;
        info!(
            "[dialog] Submitted {} chars with {} screenshot(s)",
            result.interactive_feedback.chars().count(),
            result.images.len()
        );
        Ok(result)
    }

    /// Finish without an answer
    pub fn close(&mut self) -> Result<FeedbackResult> {
        self.ensure_open()?;
        self.state = SessionState::Closed;
        info!("[dialog] Closed without feedback");
        Ok(FeedbackResult::empty())
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            finished => Err(DialogError::AlreadyFinished(finished)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedback_core::image_codec::decode_base64;

    fn options() -> Vec<String> {
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    }

    #[test]
    fn test_selected_options_follow_list_order() {
        let mut session = FeedbackSession::new("?", options());
        session.toggle_option(2);
        session.toggle_option(0);
        assert_eq!(session.compose_text(), "A; C");
    }

    #[test]
    fn test_options_and_text_are_separated() {
        let mut session = FeedbackSession::new("?", options());
        session.set_checked(1, true);
        session.set_free_text("  and more  \n");
        let result = session.submit().unwrap();
        assert_eq!(result.interactive_feedback, "B\n\nand more");
        assert!(result.images.is_empty());
    }

    #[test]
    fn test_text_only_has_no_separator() {
        let mut session = FeedbackSession::new("?", options());
        session.free_text_mut().push_str("just text");
        assert_eq!(session.compose_text(), "just text");
    }

    #[test]
    fn test_toggle_twice_unchecks() {
        let mut session = FeedbackSession::new("?", options());
        session.toggle_option(1);
        session.toggle_option(1);
        assert!(!session.is_checked(1));
        assert_eq!(session.compose_text(), "");
    }

    #[test]
    fn test_out_of_range_option_is_ignored() {
        let mut session = FeedbackSession::new("?", options());
        session.toggle_option(10);
        session.set_checked(10, true);
        assert!(!session.is_checked(10));
        assert!(session.checked_mut(10).is_none());
    }

    #[test]
    fn test_close_yields_empty_result() {
        let mut session = FeedbackSession::new("?", options());
        session.set_checked(0, true);
        session.set_free_text("ignored");
        session.add_screenshot(RgbaImage::new(2, 2));
        assert_eq!(session.close().unwrap(), FeedbackResult::empty());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_no_reentry_after_finish() {
        let mut session = FeedbackSession::new("?", vec![]);
        session.submit().unwrap();
        assert!(matches!(
            session.close(),
            Err(DialogError::AlreadyFinished(SessionState::Submitted))
        ));
        assert!(matches!(
            session.submit(),
            Err(DialogError::AlreadyFinished(SessionState::Submitted))
        ));

        let mut session = FeedbackSession::new("?", vec![]);
        session.close().unwrap();
        assert!(session.submit().is_err());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_large_screenshot_is_downscaled() {
        let mut session = FeedbackSession::new("?", vec![]);
        session.add_screenshot(RgbaImage::new(3200, 1000));
        let image = &session.screenshots()[0];
        assert_eq!((image.width(), image.height()), (1600, 500));
    }

    #[test]
    fn test_screenshots_keep_attachment_order_after_removal() {
        let mut session = FeedbackSession::new("?", vec![]);
        for width in [1, 2, 3] {
            session.add_screenshot(RgbaImage::new(width, 1));
        }
        assert_eq!(session.remove_screenshot(1).unwrap().width(), 2);
        assert!(session.remove_screenshot(5).is_none());

        let result = session.submit().unwrap();
        let widths: Vec<u32> = result
            .images
            .iter()
            .map(|b64| {
                image::load_from_memory(&decode_base64(b64).unwrap())
                    .unwrap()
                    .width()
            })
            .collect();
        assert_eq!(widths, vec![1, 3]);
    }
}
