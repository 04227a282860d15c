// Library root
// -----------
// This crate exposes a small library surface for the `leafscan` binary,
// a terminal front-end for the leaf disease inference service.
//
// Module responsibilities:
// - `model`: model identifiers and the JSON shapes the service returns.
// - `error`: failures of a service call and the message shown for each.
// - `config`: base URL, timeout and output directory from the environment.
// - `api`: HTTP calls to `/predict`, `/health` and `/models`.
// - `session`: what is selected and what the last detection produced.
// - `render`: turns a session into the result panel.
// - `ui`: the interactive menu wiring the pieces together.
pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod session;
pub mod ui;
