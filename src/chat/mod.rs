// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat session: transcript, backend selection and the turn engine

pub mod commands;
pub mod diagnostics;
pub mod engine;
pub mod failure;
pub mod selection;
pub mod transcript;

pub use engine::{ChatEngine, IgnoreReason, SessionSnapshot, SubmitOutcome, TurnPhase};
pub use selection::{BackendKind, BackendSelection, CloudModel};
pub use transcript::Transcript;
