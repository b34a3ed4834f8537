pub mod use_cases;

pub use use_cases::duplicates::DuplicateUseCase;
pub use use_cases::export::ExportUseCase;
pub use use_cases::lists::ListUseCase;
pub use use_cases::scanning::ScanUseCase;
pub use use_cases::validation::ValidationUseCase;
