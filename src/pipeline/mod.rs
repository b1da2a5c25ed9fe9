//! Pipeline stages for renaming a PDF by its DOI.
//!
//! Each submodule implements one step, so every stage can be tested on its
//! own and the network-facing pieces can be driven by scripted transports.
//!
//! ## Data Flow
//!
//! ```text
//! multipart ──▶ doi ──▶ resolve ──▶ filename
//! (file part)  (lopdf)  (registries)  (slugs)
//!                         │
//!                  fetch + registry + cache
//! ```
//!
//! 1. [`multipart`] — split a `multipart/form-data` body into named parts
//! 2. [`doi`]       — read text from the leading pages and find the first
//!    DOI; runs in `spawn_blocking` because lopdf parsing is CPU-bound
//! 3. [`resolve`]   — DOI → metadata record: cache, then Crossref, then
//!    OpenAlex, then placeholders
//!    * [`fetch`]    — transport seam and retry/backoff loop; the only
//!      network I/O
//!    * [`registry`] — per-registry URL and JSON mapping
//!    * [`cache`]    — bounded LRU of resolved records
//! 4. [`filename`]  — deterministic, length-bounded slug filename

pub mod cache;
pub mod doi;
pub mod fetch;
pub mod filename;
pub mod multipart;
pub mod registry;
pub mod resolve;
