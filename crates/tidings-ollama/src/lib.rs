// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama language model adapter.
//!
//! Talks to `POST {base_url}/api/chat`: non-streaming for one-shot
//! completions (classification, summaries), JSON Lines streaming for
//! answers. Images travel in each message's `images` array.

pub mod provider;
mod stream;
mod types;

pub use provider::OllamaProvider;
