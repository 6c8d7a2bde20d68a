pub mod extractor;
pub mod features;
pub mod normalization;
pub mod oracle;
pub mod scoring;
pub mod trajectory;
