// Application state for HTTP handlers
use crate::application::vitals_service::VitalsService;

#[derive(Clone)]
pub struct AppState {
    pub vitals_service: VitalsService,
}
