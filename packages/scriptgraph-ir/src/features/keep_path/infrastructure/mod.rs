//! Keep-path infrastructure

pub mod analyzer;

pub use analyzer::KeepPathAnalyzer;
