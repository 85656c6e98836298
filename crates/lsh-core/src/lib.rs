#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! lsh-core
//!
//! Engine-independent pieces of the local search tool: which files are
//! eligible, how a file becomes a [`types::Document`] with a stable id, and
//! the directory crawl that feeds documents into a [`crawl::DocumentSink`].

pub mod config;
pub mod crawl;
pub mod error;
pub mod filter;
pub mod identity;
pub mod types;
