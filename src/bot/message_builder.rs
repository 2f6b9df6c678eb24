use std::fmt::Write;

use url::Url;

enum Style {
    Bold,
    Code,
}

impl Style {
    fn delimiter(&self) -> &'static str {
        match self {
            Self::Bold => "*",
            Self::Code => "`",
        }
    }
}

/// Builds a message for Telegram's (legacy) `Markdown` parse mode.
///
/// Text written through [`std::fmt::Write`] is escaped according to the current style, so
/// payload content can't open entities of its own.
#[derive(Default)]
pub struct MessageBuilder {
    text: String,
    style_stack: Vec<Style>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn build(mut self) -> String {
        self.close_styles();
        self.text
    }

    pub fn bold(&mut self) {
        self.open(Style::Bold);
    }

    pub fn code(&mut self) {
        self.open(Style::Code);
    }

    fn open(&mut self, style: Style) {
        // entities can't be nested in legacy Markdown
        self.close_styles();
        self.text.push_str(style.delimiter());
        self.style_stack.push(style);
    }

    /// Writes `emoji *label* `, the start of every line of our notifications.
    pub fn label(&mut self, emoji: &str, label: &str) {
        write!(self, "{} ", emoji).unwrap();
        self.bold();
        write!(self, "{}", label).unwrap();
        self.close_last();
        write!(self, " ").unwrap();
    }

    /// Writes text inside a code span. Nothing is written for empty text, Telegram refuses empty
    /// entities.
    pub fn code_text(&mut self, text: &str) {
        if text.chars().all(|c| c == '`') {
            return;
        }
        self.code();
        write!(self, "{}", text).unwrap();
        self.close_last();
    }

    /// Writes a link, or only its text when there is no URL to point to.
    pub fn link(&mut self, text: &str, href: Option<&Url>) {
        match href {
            Some(href) => {
                self.text.push('[');
                self.text.push_str(&strip_markup(text));
                // a closing parenthesis would end the link target early
                write!(self.text, "]({})", href.as_str().replace(')', "%29")).unwrap();
            }
            None => write!(self, "{}", text).unwrap(),
        }
    }

    pub fn newline(&mut self) {
        self.close_styles();
        self.text.push('\n');
    }

    /// Panics if called with no style in the stack
    pub fn close_last(&mut self) {
        let style = self.style_stack.pop().expect("cannot be empty");
        self.text.push_str(style.delimiter());
    }

    pub fn close_styles(&mut self) {
        while !self.style_stack.is_empty() {
            self.close_last();
        }
    }
}

impl std::fmt::Write for MessageBuilder {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        match self.style_stack.last() {
            // nothing can be escaped inside entities, drop what would close them instead
            Some(Style::Code) => self.text.extend(s.chars().filter(|&c| c != '`')),
            Some(Style::Bold) => self.text.push_str(&strip_markup(s)),
            None => {
                for c in s.chars() {
                    // a lone `]` opens nothing, and Telegram would show its backslash
                    if is_markup(c) && c != ']' {
                        self.text.push('\\');
                    }
                    self.text.push(c);
                }
            }
        }

        Ok(())
    }
}

fn is_markup(c: char) -> bool {
    matches!(c, '_' | '*' | '`' | '[' | ']')
}

pub(crate) fn strip_markup(text: &str) -> String {
    text.chars().filter(|&c| !is_markup(c)).collect()
}
