mod app;
mod application;
mod domain;
mod infrastructure;
mod interfaces;

pub use app::run;
pub use application::ReportIngestionUseCase;
pub use domain::error::{AppError, Result};
pub use domain::report::{ParsedReport, ProcessedReport, SubjectRecord, WeaknessResult};
