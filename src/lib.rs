// src/lib.rs — Library root for siteinsight

pub mod api;
pub mod cli;
pub mod demo;
pub mod infra;
pub mod insight;
pub mod provider;
pub mod store;
pub mod util;
