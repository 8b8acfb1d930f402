//! 구독 요청 ID 생성기.

use std::sync::atomic::{AtomicU64, Ordering};

/// 단조 증가하는 요청 ID 생성기.
///
/// 세션 그룹이 소유하며 그룹 내 모든 세션이 `Arc`로 공유합니다.
/// 첫 ID는 1입니다.
#[derive(Debug, Default)]
pub struct RequestIdGenerator {
    last: AtomicU64,
}

impl RequestIdGenerator {
    /// 새 생성기.
    pub fn new() -> Self {
        Self::default()
    }

    /// 다음 요청 ID.
    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 마지막으로 발급한 ID (발급 전이면 0).
    pub fn last_id(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_start_at_one() {
        let ids = RequestIdGenerator::new();
        assert_eq!(ids.last_id(), 0);
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.last_id(), 2);
    }

    #[tokio::test]
    async fn test_ids_unique_across_tasks() {
        let ids = Arc::new(RequestIdGenerator::new());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                tokio::spawn(async move { (0..100).map(|_| ids.next_id()).collect::<Vec<_>>() })
            })
            .collect();

        let mut seen = HashSet::new();
        for task in tasks {
            for id in task.await.unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 800);
    }
}
