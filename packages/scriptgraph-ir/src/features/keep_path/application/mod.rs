//! Keep-path use cases

mod analyze_keep_path;

pub use analyze_keep_path::AnalyzeKeepPathUseCase;
