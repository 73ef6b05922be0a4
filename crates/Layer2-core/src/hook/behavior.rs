//! Behavior - Hook 동작 단위
//!
//! behavior 는 하나 이상의 이벤트에 묶인 작업 단위다.
//! 서로를 호출하지 않으며, 항상 Dispatcher 가 직접 호출한다.

use super::context::HookInvocationContext;
use super::types::{HookEventType, HookResult, ToolMatcher};
use async_trait::async_trait;
use std::sync::Arc;

/// Hook behavior
#[async_trait]
pub trait Behavior: Send + Sync {
    /// 이름 (설정/세션 정책의 키)
    fn name(&self) -> &str;

    /// 한 줄 설명
    fn description(&self) -> &str {
        ""
    }

    /// 반응하는 이벤트
    fn events(&self) -> Vec<HookEventType>;

    /// Tool 매처 (None 이면 모든 tool)
    fn tool_matcher(&self) -> Option<ToolMatcher> {
        None
    }

    /// 이벤트/tool 에 묶여 있는지
    fn binds(&self, event: &HookEventType, tool_name: Option<&str>) -> bool {
        if !self.events().contains(event) {
            return false;
        }
        match self.tool_matcher() {
            Some(matcher) => matcher.matches(tool_name),
            None => true,
        }
    }

    /// 실행
    async fn execute(&self, ctx: &HookInvocationContext) -> HookResult;
}

// ============================================================================
// BehaviorRegistry
// ============================================================================

/// behavior 레지스트리
///
/// 시작 시 한 번 만들어 Dispatcher 에 넘긴다. 등록 순서가 실행 순서다.
#[derive(Default, Clone)]
pub struct BehaviorRegistry {
    behaviors: Vec<Arc<dyn Behavior>>,
}

impl BehaviorRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 등록 (같은 이름은 교체, 순서는 유지)
    pub fn register(&mut self, behavior: Arc<dyn Behavior>) {
        match self
            .behaviors
            .iter()
            .position(|b| b.name() == behavior.name())
        {
            Some(idx) => self.behaviors[idx] = behavior,
            None => self.behaviors.push(behavior),
        }
    }

    pub fn with(mut self, behavior: Arc<dyn Behavior>) -> Self {
        self.register(behavior);
        self
    }

    /// 이름으로 조회
    pub fn get(&self, name: &str) -> Option<Arc<dyn Behavior>> {
        self.behaviors.iter().find(|b| b.name() == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 등록 순서대로 전체
    pub fn all(&self) -> &[Arc<dyn Behavior>] {
        &self.behaviors
    }

    pub fn names(&self) -> Vec<&str> {
        self.behaviors.iter().map(|b| b.name()).collect()
    }

    /// 목록 (이름, 설명)
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.behaviors
            .iter()
            .map(|b| (b.name(), b.description()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

// ============================================================================
// BehaviorSelector
// ============================================================================

/// 실행할 behavior 선택
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BehaviorSelector {
    /// 이벤트에 묶인 전부
    All,
    /// 이름으로 지정 (쉼표 구분)
    Named(Vec<String>),
}

impl BehaviorSelector {
    pub fn parse(selector: &str) -> Self {
        let names: Vec<String> = selector
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() || names.iter().any(|n| n == "all") {
            Self::All
        } else {
            Self::Named(names)
        }
    }

    pub fn includes(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(names) => names.iter().any(|n| n == name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, Vec<HookEventType>);

    #[async_trait]
    impl Behavior for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn events(&self) -> Vec<HookEventType> {
            self.1.clone()
        }

        fn tool_matcher(&self) -> Option<ToolMatcher> {
            Some(ToolMatcher::new("Edit|Write"))
        }

        async fn execute(&self, _ctx: &HookInvocationContext) -> HookResult {
            HookResult::success()
        }
    }

    #[test]
    fn test_registry_keeps_order_and_replaces() {
        let registry = BehaviorRegistry::new()
            .with(Arc::new(Named("b", vec![HookEventType::Stop])))
            .with(Arc::new(Named("a", vec![HookEventType::Stop])))
            .with(Arc::new(Named("b", vec![HookEventType::PreToolUse])));

        assert_eq!(registry.names(), vec!["b", "a"]);
        let b = registry.get("b").unwrap();
        assert_eq!(b.events(), vec![HookEventType::PreToolUse]);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_binds_checks_event_and_tool() {
        let behavior = Named("lint", vec![HookEventType::PostToolUse]);
        assert!(behavior.binds(&HookEventType::PostToolUse, Some("Write")));
        assert!(!behavior.binds(&HookEventType::PostToolUse, Some("Read")));
        assert!(!behavior.binds(&HookEventType::PreToolUse, Some("Write")));
    }

    #[test]
    fn test_selector_parse() {
        assert_eq!(BehaviorSelector::parse("all"), BehaviorSelector::All);
        assert_eq!(BehaviorSelector::parse(""), BehaviorSelector::All);

        let selector = BehaviorSelector::parse("lint, typecheck");
        assert!(selector.includes("lint"));
        assert!(selector.includes("typecheck"));
        assert!(!selector.includes("checkpoint"));
    }
}
