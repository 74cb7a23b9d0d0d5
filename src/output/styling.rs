use std::fmt::Display;

use console::{Style, StyledObject};

fn paint(text: impl Display, style: Style) -> StyledObject<String> {
    style.apply_to(text.to_string())
}

/// Job ids, versions and other values the operator will copy.
pub fn accent(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().cyan())
}

pub fn muted(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().dim())
}

pub fn emphasis(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().bright())
}

/// Links and in-flight activity.
pub fn highlight(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().bright().yellow())
}

pub fn success(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().bright().green())
}

pub fn failure(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().bright().red())
}

pub fn banner(text: impl Display) -> StyledObject<String> {
    paint(text, Style::new().magenta().bold())
}

/// Production submissions stand out; mock ones stay quiet.
pub fn mode_label(nomock: bool) -> StyledObject<String> {
    if nomock {
        failure("nomock")
    } else {
        muted("mock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styling_keeps_the_text() {
        console::set_colors_enabled(false);
        assert_eq!(accent("v1.18.3").to_string(), "v1.18.3");
        assert_eq!(mode_label(true).to_string(), "nomock");
        assert_eq!(mode_label(false).to_string(), "mock");
    }
}
