// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Reasoning segment splitter
//!
//! Separates a `<think>...</think>` segment from the visible answer. Runs on
//! every decoded chunk while streaming and once more on the final text, so it
//! must stay pure.

use regex::Regex;
use std::sync::LazyLock;

/// A complete, case-insensitive reasoning segment. `(?s)` lets `.` span lines.
static THINK_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>(.*?)</think>").unwrap());

/// Result of splitting accumulated text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThinkSplit {
    /// Text to show as the answer
    pub visible: String,
    /// Trimmed reasoning text, empty when no complete segment was found
    pub think: String,
}

impl ThinkSplit {
    pub fn has_think(&self) -> bool {
        !self.think.is_empty()
    }
}

/// Split raw text into its visible answer and reasoning segment.
///
/// Every complete segment is removed from the visible text; the reasoning
/// comes from the first one. While a closing marker has not arrived the
/// unclosed tail is returned unchanged, opening marker included. The visible
/// part is left-trimmed only; trailing whitespace may be followed by more
/// tokens.
pub fn split(raw: &str) -> ThinkSplit {
    let Some(inner) = THINK_SEGMENT.captures(raw).and_then(|caps| caps.get(1)) else {
        return ThinkSplit {
            visible: raw.to_string(),
            think: String::new(),
        };
    };

    let visible = THINK_SEGMENT.replace_all(raw, "");
    ThinkSplit {
        visible: visible.trim_start().to_string(),
        think: inner.as_str().trim().to_string(),
    }
}
