//! # newsbrief
//!
//! TL;DR and bullet-point summaries of local files, web pages and keyword
//! news digests, produced by a pretrained summarisation model.
//!
//! ## Features
//!
//! - **Length budgeting**: the TL;DR is cut to a character budget at a sentence or word boundary
//! - **Bullet points**: two to five bullets split from a longer model output
//! - **News digest**: RSS/Atom feeds filtered by keyword, capped at three articles per run
//! - **Injectable model**: the summariser runs against any [`SummaryModel`]

pub mod budget;
pub mod bullets;
pub mod commands;
pub mod config;
pub mod digest;
pub mod feed;
pub mod model;
pub mod options;
pub mod scraper;
pub mod summariser;
pub mod summary;
pub mod ui;

pub use config::Config;
pub use model::SummaryModel;
pub use options::{DigestOptions, SummaryOptions};
pub use summariser::{SummarizeError, Summariser};
pub use summary::SummaryResult;
