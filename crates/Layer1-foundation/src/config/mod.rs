//! Config - behavior 설정 관리
//!
//! - `settings.rs` - HookSettings / BehaviorSettings
//! - `loader.rs` - 계층 설정 로더 + 환경 변수

mod loader;
mod settings;

pub use loader::{
    load_settings_from_file, resolve_project_root, strip_json_comments, ConfigLoader,
    EnvOverrides, CONFIG_DIR_NAME, ENV_HOST_PROJECT_DIR, ENV_PROJECT_ROOT, ENV_STATE_DIR,
};
pub use settings::{BehaviorSettings, HookSettings, SubContext};
