//! # Mock I/O Implementations for Testing
//!
//! A pager that keeps what it was given, shared through a handle so tests
//! can inspect it after the executor took ownership.

use super::Pager;
use std::io;
use std::sync::{Arc, Mutex};

type Pages = Arc<Mutex<Vec<Vec<u8>>>>;

/// Records every paged chunk instead of printing it
#[derive(Clone, Default)]
pub struct CapturedPager {
    pages: Pages,
    terminal: bool,
}

impl CapturedPager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend to be a terminal so HTTP output is styled
    pub fn terminal() -> Self {
        Self {
            terminal: true,
            ..Self::default()
        }
    }

    /// Every page concatenated
    pub fn output(&self) -> String {
        let pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        pages
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }

    /// Each page as one string
    pub fn pages(&self) -> Vec<String> {
        let pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        pages
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }

    pub fn clear(&self) {
        self.pages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Pager for CapturedPager {
    fn page(&mut self, data: &[u8]) -> io::Result<()> {
        if !data.is_empty() {
            self.pages
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(data.to_vec());
        }
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }
}
