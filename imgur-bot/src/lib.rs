//! Imgur bot built on `botkit`.
//!
//! ```text
//! imgur-bot job me -a main -u someone
//!        │
//!        ▼
//!  jobs::all_jobs() ──dispatch──▶ AccountMe ──▶ Imgur::my_account
//!                                                    │
//!                                   Bot::prepare_request (Bearer token)
//!                                                    │
//!                                     GET https://api.imgur.com/3/account/me
//! ```

pub mod adapter;
pub mod authorize;
pub mod cli;
pub mod config;
pub mod jobs;
pub mod models;
pub mod provider;

pub use adapter::Imgur;
pub use models::Account;
pub use provider::ImgurProvider;
