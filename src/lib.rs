//! # Paper Analyzer
//!
//! Extracts a structured summary (title, summary, problem statement,
//! methodology, results, conclusion) from an uploaded research paper, and
//! keeps a small list of user-submitted names.
//!
//! ## Architecture
//!
//! ```text
//!  POST /api/analyze                       GET/POST /api/users
//!         │                                        │
//!         ▼                                        ▼
//! ┌──────────────────────┐                ┌────────────────┐
//! │  ExtractionService   │                │  NameRecords   │
//! │ ┌────────┐ ┌───────┐ │                └───────┬────────┘
//! │ │ Remote │→│Heurist│ │                        ▼
//! │ │ (LLM)  │ │  ic   │ │                ┌────────────────┐
//! │ └────────┘ └───────┘ │                │ SQLite (users) │
//! └──────────────────────┘                └────────────────┘
//! ```
//!
//! The remote extractor is tried once when a credential is configured; any
//! failure falls through to the deterministic keyword segmenter. The two
//! flows share no state.
//!
//! ## Quick Start
//!
//! ```bash
//! paper-analyzer init                     # create database
//! paper-analyzer analyze paper.txt        # print extracted fields
//! paper-analyzer users add "Ada"          # add a name
//! paper-analyzer serve                    # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`segment`] | Keyword heuristic segmenter |
//! | [`extractor`] | Extractor trait and fallback chain |
//! | [`records`] | Name record store and submission rules |
//! | [`server`] | HTTP server |
//! | [`analyze`] | `analyze` command |
//! | [`users`] | `users` commands |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod analyze;
pub mod config;
pub mod db;
pub mod extractor;
pub mod migrate;
pub mod models;
pub mod records;
pub mod segment;
pub mod server;
pub mod users;
