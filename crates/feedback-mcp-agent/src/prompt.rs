use std::env;

pub fn get_server_instructions() -> String {
    let current_os = env::consts::OS;

    format!(
        "
This server lets you pause and ask the human operator for feedback through a desktop dialog.

**When to call `interactive_feedback`**
*   Before finishing a task, to confirm the result matches what the user wanted.
*   When a decision needs human judgement (ambiguous requirements, destructive changes, trade-offs).
*   When you need to see something only the user can show you; they can attach screenshots.

**How to ask**
*   Put one specific question in `message`. Summarize what you did or found so the user can answer without scrolling back.
*   Use `predefined_options` for closed questions (e.g. [\"Proceed\", \"Stop\", \"Try another approach\"]). The user may tick several options and still add free text.
*   The call blocks until the user answers or closes the dialog. This can take minutes; progress notifications are sent meanwhile, do not cancel the call.

**Reading the answer**
*   Selected options come first, joined by \"; \", then a blank line, then any free text.
*   An empty answer means the user closed the dialog without responding. Do not treat it as approval.
*   Screenshots arrive as PNG images after the text; their saved file paths are listed at the end of the text.

Host OS: {current_os}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_mention_tool_and_os() {
        let text = get_server_instructions();
        assert!(text.contains("interactive_feedback"));
        assert!(text.contains(env::consts::OS));
    }
}
