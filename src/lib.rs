//! Build-time utilities for the website: the GitHub contribution-calendar
//! fetcher and the Open Graph card image generator.

pub mod config;
pub mod contributions;
pub mod og_image;
