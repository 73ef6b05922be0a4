//! # Payload
//!
//! 호스트가 넘겨준 이벤트 페이로드 읽기 및 해석

mod event;
mod reader;

pub use event::EventPayload;
pub use reader::{PayloadReader, DEFAULT_IDLE_TIMEOUT};
