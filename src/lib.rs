//! LeadMaps API Library
//!
//! Lead qualification pipeline for businesses extracted from map searches:
//! scoring, temperature classification, regional market analysis, outreach
//! script generation and a session-backed assistant that routes free-text
//! requests to those stages.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Pipeline logic, models and errors.
//! - `integrations`: External service clients.
//! - `completion_client`: Client for the chat completion service.
//! - `config`: Configuration management.
//! - `contacts`: Phone, WhatsApp and Instagram normalization.
//! - `copywriting`: Outreach script generation.
//! - `dispatcher`: Request classification and assistant replies.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `market_strategy`: Regional market analysis.
//! - `models`: Core data models.
//! - `scoring`: Lead scoring and qualification.
//! - `session`: Session context.

pub mod api;
pub mod core;
pub mod integrations;

pub mod completion_client;
pub mod config;
pub mod contacts;
pub mod copywriting;
pub mod dispatcher;
pub mod errors;
pub mod handlers;
pub mod market_strategy;
pub mod models;
pub mod scoring;
pub mod session;
