//! Support Chat Widget
//!
//! A server-rendered chat widget for a customer-support assistant. The
//! browser surface is HTMX-driven HTML; the chat state and all widget
//! operations live server-side in a single controller.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server returning HTML fragments
//! - **Controller**: transcript ownership, send/reset, scripted demo replay
//! - **Backend**: reqwest client posting `{message, history}` to a remote
//!   chat endpoint and reading back `{reply}`
//!
//! # Modules
//!
//! - [`backend`]: remote chat endpoint client
//! - [`config`]: layered application configuration
//! - [`controller`]: the chat UI controller
//! - [`server`]: router and handlers
//! - [`transcript`]: conversation state
//! - [`ui`]: server-rendered markup

pub mod backend;
pub mod config;
pub mod controller;
pub mod server;
pub mod transcript;
pub mod ui;

pub use server::AppState;
