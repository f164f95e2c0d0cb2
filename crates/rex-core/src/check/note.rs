use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteLevel {
    Info,
    Warn,
    Bad,
}

/// Free-text observation attached to a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub level: NoteLevel,
    /// What the note is about (`transport`, `range`, `link`, ...).
    pub subject: String,
    pub text: String,
}

impl Note {
    pub fn new(level: NoteLevel, subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level,
            subject: subject.into(),
            text: text.into(),
        }
    }

    pub fn info(subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NoteLevel::Info, subject, text)
    }

    pub fn warn(subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NoteLevel::Warn, subject, text)
    }

    pub fn bad(subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(NoteLevel::Bad, subject, text)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            NoteLevel::Info => "info",
            NoteLevel::Warn => "warn",
            NoteLevel::Bad => "bad",
        };
        write!(f, "[{}] {}: {}", level, self.subject, self.text)
    }
}
