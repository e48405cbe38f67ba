//! User accounts with opaque bearer tokens, plus per-user recipe tags and
//! ingredients, served over HTTP.

pub mod db;
pub mod server;
pub mod services;
pub mod web;
