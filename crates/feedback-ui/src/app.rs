//! The feedback window (eframe/egui)

use crate::capture;
use crate::error::{DialogError, Result};
use crate::session::FeedbackSession;
use crate::settings::{WindowSettings, MIN_HEIGHT, MIN_WIDTH};
use egui::{Key, Modifiers, RichText, ViewportCommand};
use feedback_core::FeedbackResult;
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

pub const WINDOW_TITLE: &str = "Interactive Feedback MCP";

const THUMB_WIDTH: u32 = 150;
const THUMB_HEIGHT: u32 = 100;

/// What the window leaves behind when it closes
#[derive(Debug)]
pub struct DialogOutcome {
    pub result: Option<Result<FeedbackResult>>,
    pub settings: WindowSettings,
}

type SharedOutcome = Arc<Mutex<DialogOutcome>>;

fn lock(outcome: &SharedOutcome) -> MutexGuard<'_, DialogOutcome> {
    outcome.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Size of a thumbnail fitting a 150x100 box, never upscaled
pub fn thumbnail_size(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (1, 1);
    }
    let scale = (THUMB_WIDTH as f32 / width as f32)
        .min(THUMB_HEIGHT as f32 / height as f32)
        .min(1.0);
    (
        ((width as f32 * scale).round() as u32).max(1),
        ((height as f32 * scale).round() as u32).max(1),
    )
}

fn editor_id() -> egui::Id {
    egui::Id::new("feedback_editor")
}

fn is_paste_event(event: &egui::Event) -> bool {
    match event {
        egui::Event::Paste(_) => true,
        egui::Event::Key {
            key: Key::V,
            pressed: true,
            modifiers,
            ..
        } => modifiers.command,
        _ => false,
    }
}

/// True when the frame's input carries a paste request
pub fn paste_requested(events: &[egui::Event]) -> bool {
    events.iter().any(is_paste_event)
}

/// Only pastes aimed at the feedback editor may pick up a clipboard image
pub fn clipboard_paste_targets_editor(editor_focused: bool, events: &[egui::Event]) -> bool {
    editor_focused && paste_requested(events)
}

/// Drop paste events so the text widgets do not also receive them
pub fn strip_paste_events(events: &mut Vec<egui::Event>) {
    events.retain(|event| !is_paste_event(event));
}

enum Action {
    Submit,
    CaptureScreen,
    PasteImage,
    Browse,
    AddFile(PathBuf),
    Remove(usize),
}

pub struct FeedbackApp {
    session: FeedbackSession,
    thumbnails: Vec<egui::TextureHandle>,
    next_texture_id: usize,
    image_path_input: String,
    pending_capture: Option<Receiver<Result<RgbaImage>>>,
    focus_editor: bool,
    outcome: SharedOutcome,
}

impl FeedbackApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        session: FeedbackSession,
        outcome: SharedOutcome,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self {
            session,
            thumbnails: Vec::new(),
            next_texture_id: 0,
            image_path_input: String::new(),
            pending_capture: None,
            focus_editor: true,
            outcome,
        }
    }

    fn attach(&mut self, ctx: &egui::Context, image: RgbaImage) {
        let index = self.session.add_screenshot(image);
        let stored = &self.session.screenshots()[index];
        let (w, h) = thumbnail_size(stored.width(), stored.height());
        let thumb = image::imageops::thumbnail(stored, w, h);
        let color =
            egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], thumb.as_raw());
        let texture = ctx.load_texture(
            format!("screenshot-{}", self.next_texture_id),
            color,
            egui::TextureOptions::LINEAR,
        );
        self.next_texture_id += 1;
        self.thumbnails.push(texture);
    }

    fn attach_from(&mut self, ctx: &egui::Context, source: &str, acquired: Result<RgbaImage>) {
        match acquired {
            Ok(image) => self.attach(ctx, image),
            Err(e) => debug!("[dialog] No image from {}: {}", source, e),
        }
    }

    fn finish(&mut self, ctx: &egui::Context, result: Result<FeedbackResult>) {
        if let Err(e) = &result {
            error!("[dialog] {}", e);
        }
        lock(&self.outcome).result = Some(result);
        ctx.send_viewport_cmd(ViewportCommand::Close);
    }

    fn start_capture(&mut self, ctx: &egui::Context) {
        if self.pending_capture.is_some() {
            return;
        }
        info!("[dialog] Capturing screen");
        ctx.send_viewport_cmd(ViewportCommand::Minimized(true));
        let waker = ctx.clone();
        self.pending_capture = Some(capture::capture_after_delay(move || {
            waker.send_viewport_cmd(ViewportCommand::Minimized(false));
            waker.send_viewport_cmd(ViewportCommand::Focus);
            waker.request_repaint();
        }));
    }

    fn poll_capture(&mut self, ctx: &egui::Context) {
        let Some(rx) = &self.pending_capture else {
            return;
        };
        match rx.try_recv() {
            Ok(captured) => {
                self.pending_capture = None;
                self.attach_from(ctx, "screen capture", captured);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.pending_capture = None;
                ctx.send_viewport_cmd(ViewportCommand::Minimized(false));
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            let acquired = match (&file.path, &file.bytes) {
                (Some(path), _) => capture::load_image_file(path),
                (None, Some(bytes)) => capture::load_image_bytes(bytes),
                (None, None) => continue,
            };
            self.attach_from(ctx, "dropped file", acquired);
        }
    }

    fn record_geometry(&self, ctx: &egui::Context) {
        let (inner, outer) = ctx.input(|i| (i.viewport().inner_rect, i.viewport().outer_rect));
        let mut outcome = lock(&self.outcome);
        if let Some(inner) = inner {
            outcome.settings.width = inner.width();
            outcome.settings.height = inner.height();
        }
        if let Some(outer) = outer {
            outcome.settings.x = Some(outer.min.x);
            outcome.settings.y = Some(outer.min.y);
        }
    }

    fn show(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        ui.label(RichText::new(self.session.prompt()).size(15.0));
        if ui.button("Copy message").clicked() {
            let prompt = self.session.prompt().to_string();
            ui.ctx().output_mut(|o| o.copied_text = prompt);
        }
        ui.separator();

        for index in 0..self.session.options().len() {
            let label = self.session.options()[index].clone();
            if let Some(flag) = self.session.checked_mut(index) {
                ui.checkbox(flag, label);
            }
        }
        if !self.session.options().is_empty() {
            ui.separator();
        }

        let editor = ui.add(
            egui::TextEdit::multiline(self.session.free_text_mut())
                .id(editor_id())
                .hint_text("Enter your feedback here (Ctrl+Enter to submit)")
                .desired_rows(6)
                .desired_width(f32::INFINITY),
        );
        if self.focus_editor {
            editor.request_focus();
            self.focus_editor = false;
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let capturing = self.pending_capture.is_some();
            if ui
                .add_enabled(!capturing, egui::Button::new("Capture screen"))
                .clicked()
            {
                actions.push(Action::CaptureScreen);
            }
            if ui.button("Paste image").clicked() {
                actions.push(Action::PasteImage);
            }
        });
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.image_path_input)
                    .hint_text("Image file path (or drop files on the window)")
                    .desired_width(ui.available_width() - 200.0),
            );
            let path = PathBuf::from(self.image_path_input.trim());
            if ui
                .add_enabled(
                    capture::is_supported_image_path(&path),
                    egui::Button::new("Add image file"),
                )
                .clicked()
            {
                actions.push(Action::AddFile(path));
            }
            if ui.button("Browse...").clicked() {
                actions.push(Action::Browse);
            }
        });

        if !self.thumbnails.is_empty() {
            egui::ScrollArea::horizontal().show(ui, |ui| {
                ui.horizontal(|ui| {
                    for (index, texture) in self.thumbnails.iter().enumerate() {
                        ui.vertical(|ui| {
                            ui.image((texture.id(), texture.size_vec2()));
                            if ui.small_button("Remove").clicked() {
                                actions.push(Action::Remove(index));
                            }
                        });
                    }
                });
            });
        }

        ui.add_space(8.0);
        if ui
            .add_sized(
                [ui.available_width(), 32.0],
                egui::Button::new("Send feedback (Ctrl+Enter)"),
            )
            .clicked()
        {
            actions.push(Action::Submit);
        }
    }

    fn apply(&mut self, ctx: &egui::Context, action: Action) {
        match action {
            Action::Submit => {
                let result = self.session.submit();
                self.finish(ctx, result);
            }
            Action::CaptureScreen => self.start_capture(ctx),
            Action::PasteImage => {
                let acquired = capture::clipboard_image();
                self.attach_from(ctx, "clipboard", acquired);
            }
            Action::Browse => {
                for path in capture::pick_image_files() {
                    let acquired = capture::load_image_file(&path);
                    self.attach_from(ctx, "file", acquired);
                }
            }
            Action::AddFile(path) => {
                let acquired = capture::load_image_file(&path);
                if acquired.is_ok() {
                    self.image_path_input.clear();
                }
                self.attach_from(ctx, "file", acquired);
            }
            Action::Remove(index) => {
                if self.session.remove_screenshot(index).is_some()
                    && index < self.thumbnails.len()
                {
                    self.thumbnails.remove(index);
                }
            }
        }
    }
}

impl eframe::App for FeedbackApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.record_geometry(ctx);

        if ctx.input(|i| i.viewport().close_requested()) {
            if self.session.is_open() {
                let result = self.session.close();
                lock(&self.outcome).result = Some(result);
            }
            return;
        }
        if !self.session.is_open() {
            return;
        }

        self.poll_capture(ctx);
        self.handle_dropped_files(ctx);

        let mut actions = Vec::new();
        if ctx.input_mut(|i| i.consume_key(Modifiers::COMMAND, Key::Enter)) {
            actions.push(Action::Submit);
        }
        let editor_focused = ctx.memory(|m| m.has_focus(editor_id()));
        if ctx.input(|i| clipboard_paste_targets_editor(editor_focused, &i.events)) {
            // An image paste replaces the text paste; text-only clipboards paste as usual
            if let Ok(image) = capture::clipboard_image() {
                self.attach(ctx, image);
                ctx.input_mut(|i| strip_paste_events(&mut i.events));
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| self.show(ui, &mut actions));
        });

        for action in actions {
            if !self.session.is_open() {
                break;
            }
            self.apply(ctx, action);
        }
    }
}

/// Show the dialog until it is submitted or closed.
///
/// Returns the result to hand back and the window geometry to persist.
pub fn run_dialog(
    session: FeedbackSession,
    settings: WindowSettings,
) -> Result<(FeedbackResult, WindowSettings)> {
    let mut viewport = egui::ViewportBuilder::default()
        .with_title(WINDOW_TITLE)
        .with_inner_size([settings.width, settings.height])
        .with_min_inner_size([MIN_WIDTH, MIN_HEIGHT])
        .with_always_on_top()
        .with_drag_and_drop(true);
    if let Some(position) = settings.position() {
        viewport = viewport.with_position(position);
    }
    let options = eframe::NativeOptions {
        viewport,
        centered: settings.position().is_none(),
        ..Default::default()
    };

    let outcome = Arc::new(Mutex::new(DialogOutcome {
        result: None,
        settings,
    }));
    let app_outcome = Arc::clone(&outcome);
    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| Box::new(FeedbackApp::new(cc, session, app_outcome))),
    )
    .map_err(|e| DialogError::Window(e.to_string()))?;

    let mut outcome = lock(&outcome);
    let result = outcome
        .result
        .take()
        .unwrap_or_else(|| Ok(FeedbackResult::empty()))?;
    Ok((result, outcome.settings.sanitized()))
}
