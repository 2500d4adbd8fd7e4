//! Pull request statistics for a GitHub repository.
//!
//! Open pull requests and the pull requests created or closed during the analysis
//! window are loaded from the GitHub API (or a cache file). The weekly history of the
//! open set is rebuilt backward from the present, and Markdown/reStructuredText pages
//! with SVG charts are written for a documentation site.

pub mod cache;
pub mod chart;
pub mod classify;
pub mod cli;
pub mod config;
pub mod dates;
pub mod github;
pub mod model;
pub mod pages;
pub mod report;
pub mod retrospective;
pub mod stats;
