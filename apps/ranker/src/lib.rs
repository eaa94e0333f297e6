//! Resume ranker: scores CVs against a job description.
//!
//! Pipeline: [`extract`] (PDF, DOCX, images) → [`nlp`] (normalization, phrases, entities)
//! → [`semantic`] (embedding similarity) → [`scoring`] (score, flags, insights).
//! The HTTP surface lives in [`routes`].

pub mod config;
pub mod errors;
pub mod extract;
pub mod nlp;
pub mod routes;
pub mod scoring;
pub mod semantic;
pub mod state;
