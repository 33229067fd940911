#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![doc = include_str!("../README.md")]

pub use self::errors::Error;

pub mod config;
pub mod controller;
pub mod errors;
pub mod graph;
pub mod hypermedia;
pub mod logger;
pub mod ontology;
pub mod sitemap;
pub mod skolemizer;
pub mod template_call;
pub mod uri_template;
pub mod vocabulary;

/// Application results options list
pub type Result<T, E = Error> = std::result::Result<T, E>;
