use runmap_app::AppState;

#[derive(Clone)]
pub struct AppContext {
    pub app_state: AppState,
}
