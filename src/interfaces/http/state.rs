use std::sync::Arc;

use crate::application::{
    DuplicateUseCase, ExportUseCase, ListUseCase, ScanUseCase, ValidationUseCase,
};

use super::SharedLogs;

pub struct AppState {
    pub list_use_case: ListUseCase,
    pub scan_use_case: ScanUseCase,
    pub validation_use_case: ValidationUseCase,
    pub duplicate_use_case: Arc<DuplicateUseCase>,
    pub export_use_case: ExportUseCase,
    pub logs: SharedLogs,
}
