//! # NFT Drop Gallery
//!
//! Server-rendered marketplace front end for browsing NFT collections and
//! minting tokens from drop contracts. Collections come from a headless
//! content store; drop state and claims go through a wallet/contract gateway
//! spoken to over JSON-RPC.
//!
//! ## Quick Start
//! ```bash
//! cargo run --bin drop-gallery
//! ```
//!
//! ## Routes
//! - `GET /` - Listing page with every curated collection
//! - `GET /nft/{slug}` - Drop detail page with the mint flow
//! - `POST /nft/{slug}/mint` - Submit a claim for one token
//! - `POST /nft/{slug}/dialog/close` - Dismiss the success dialog
//! - `GET /health` - Health check with basic metrics

pub mod chain;
pub mod config;
pub mod content;
mod error;
mod handlers;
pub mod middleware;
pub mod mint;
mod pages;
mod response;
mod router;
pub mod session;
mod state;

pub use config::Config;
pub use error::Error;
pub use router::create as create_router;
pub use state::AppState;
