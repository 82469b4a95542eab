//! Botkit: a small framework for OAuth2-authenticated provider bots.
//!
//! A provider adapter supplies the provider-specific pieces (URLs, token field
//! names, auth header, rate-limit header) through the [`Provider`] trait; the
//! generic [`Bot`] owns everything else.
//!
//! ```text
//! ┌──────────────┐   authorization_url / exchange_code / normalize_token
//! │   Provider   │◀──────────────────────────────────────────────┐
//! └──────────────┘                                               │
//!        ▲ decorate_request / extract_rate_limit                 │
//!        │                                                       │
//! ┌──────┴───────┐  HttpRequest   ┌───────────┐          ┌──────┴──────┐
//! │     Bot      │───────────────▶│ Transport │          │  authorize  │
//! │ (TokenCell,  │◀───────────────│ (reqwest) │          │   (oauth)   │
//! │  RateLimits) │  RawResponse   └───────────┘          └─────────────┘
//! └──────▲───────┘
//!        │ capabilities
//! ┌──────┴───────┐
//! │  Job runner  │  JobRegistry::dispatch(name, adapter, args)
//! └──────────────┘
//! ```

pub mod bot;
pub mod config;
pub mod credentials;
pub mod error;
pub mod job;
pub mod model;
pub mod oauth;
pub mod provider;
pub mod rate_limit;
pub mod transport;

pub use bot::Bot;
pub use error::BotError;
pub use job::{Job, JobRegistry};
pub use model::Model;
pub use provider::Provider;
