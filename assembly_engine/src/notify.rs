use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::AssemblyError;

pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);
const MAX_NOTICES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeLevel::Info => f.write_str("info"),
            NoticeLevel::Warning => f.write_str("warning"),
            NoticeLevel::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    #[serde(skip)]
    remaining: Duration,
}

impl Notice {
    pub fn remaining(&self) -> Duration {
        self.remaining
    }
}

/// Short-lived user-facing messages, oldest first. Nothing here is fatal;
/// boundary handlers turn errors into notices and carry on.
#[derive(Debug, Clone, Serialize)]
pub struct NoticeBoard {
    #[serde(skip)]
    ttl: Duration,
    notices: VecDeque<Notice>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        NoticeBoard::new(DEFAULT_NOTICE_TTL)
    }
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            notices: VecDeque::new(),
        }
    }

    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Info => log::info!("{message}"),
            NoticeLevel::Warning => log::warn!("{message}"),
            NoticeLevel::Error => log::error!("{message}"),
        }
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            level,
            message,
            remaining: self.ttl,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Warning, message);
    }

    /// Record an engine failure. Validation problems are warnings, the rest
    /// are errors.
    pub fn report(&mut self, err: &AssemblyError) {
        let level = match err {
            AssemblyError::Validation(_) => NoticeLevel::Warning,
            AssemblyError::Parse(_) | AssemblyError::Resource(_) => NoticeLevel::Error,
        };
        self.push(level, err.to_string());
    }

    /// Age every notice by `elapsed` and drop the expired ones.
    pub fn tick(&mut self, elapsed: Duration) -> usize {
        let before = self.notices.len();
        for notice in &mut self.notices {
            notice.remaining = notice.remaining.saturating_sub(elapsed);
        }
        self.notices.retain(|notice| !notice.remaining.is_zero());
        before - self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }
}
