//! # WhatsApp Cloud API
//!
//! Client for the WhatsApp Business Cloud API plus webhook payload handling.
//!
//! ## External interactions
//!
//! - **Graph API**: `POST /{phone_number_id}/messages` for text, reactions,
//!   and read receipts; `GET /{media_id}` then `GET {url}` for the two-step
//!   media download.
//! - **Webhook**: Meta calls `GET` with a verification handshake and `POST`
//!   with message payloads; parsing and verification live here so the HTTP
//!   layer stays thin.

mod client;
mod webhook;

pub use client::WhatsAppClient;
pub use webhook::{parse_webhook, IncomingMessage};
