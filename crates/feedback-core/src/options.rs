//! Predefined options marshaling and feedback text composition

/// Delimiter used to pass predefined options on the dialog command line
pub const OPTION_SEPARATOR: &str = "|||";

/// Separator between selected options inside the composed feedback
pub const SELECTED_OPTIONS_JOINER: &str = "; ";

/// Separator between the options block and the free-text block
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Join options into a single command-line argument. No options gives an empty string.
pub fn join_options<S: AsRef<str>>(options: &[S]) -> String {
    options
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(OPTION_SEPARATOR)
}

/// Split a command-line argument back into options, discarding empty segments
pub fn split_options(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(OPTION_SEPARATOR)
        .filter(|opt| !opt.is_empty())
        .map(str::to_string)
        .collect()
}

/// Compose the final feedback text.
///
/// Selected options are emitted in the order of `options`, independent of the
/// order in which they were checked. `free_text` is trimmed; either block is
/// left out when empty, and so is the separator.
pub fn compose_feedback(options: &[String], checked: &[bool], free_text: &str) -> String {
    let selected: Vec<&str> = options
        .iter()
        .zip(checked.iter())
        .filter(|(_, is_checked)| **is_checked)
        .map(|(opt, _)| opt.as_str())
        .collect();

    let mut parts: Vec<String> = Vec::with_capacity(2);
    if !selected.is_empty() {
        parts.push(selected.join(SELECTED_OPTIONS_JOINER));
    }
    let free_text = free_text.trim();
    if !free_text.is_empty() {
        parts.push(free_text.to_string());
    }
    parts.join(BLOCK_SEPARATOR)
}
