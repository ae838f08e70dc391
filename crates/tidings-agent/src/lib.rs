// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation sessions and single-flight answer generation.
//!
//! [`Assistant`] is the entry point. It owns the conversation store, one
//! [`GenerationController`] and the delivery channel readers subscribe to.
//! A generation either answers from a tool (paced slices of rendered
//! output) or streams a model answer built from the bounded context window.

pub mod assistant;
pub mod controller;
pub mod conversation;
pub mod delivery;
pub mod events;
pub mod generation;
pub mod naming;

pub use assistant::{Assistant, AssistantBuilder, AssistantStatus, Rejection, StartOutcome};
pub use controller::{GenerationController, GenerationOutcome, GenerationState};
pub use conversation::{Conversation, ConversationStore, ConversationSummary, DEFAULT_NAME};
pub use events::EventStream;
pub use generation::{INTERRUPTION_MARKER, tool_preamble};
