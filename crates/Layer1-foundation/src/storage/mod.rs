//! Storage module for forgehook
//!
//! - `json`: JSON - 범용 파일 저장/로드 (원자적 교체)
//! - `session`: 세션 단위 behavior 억제 상태

mod json;
mod session;

// JSON Storage (범용)
pub use json::JsonStore;

// Session Policy Store
pub use session::{
    extract_session_id, validate_session_id, PolicyChange, SessionRecord, SessionStore,
};
