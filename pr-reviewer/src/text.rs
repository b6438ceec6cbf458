//! Output sanitization shared by the description and review steps.

/// Characters removed from generated text before it is published.
const STRIPPED: [char; 5] = ['\r', '\n', '"', '\'', '`'];

/// Removes line terminators and quote characters, keeping every other
/// character in its original order.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|c| !STRIPPED.contains(c)).collect()
}
