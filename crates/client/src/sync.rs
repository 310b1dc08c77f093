//! 跨上下文同步过滤
//!
//! 存储变更带单调修订号与来源标记：来源为本上下文的变更直接跳过
//! （回声抑制），修订号不高于已见最大值的变更视为过期。
//! 冲突以全量替换解决（后写者胜，不做合并）。

use tracing::debug;

use prodhub_storage::{ContextId, StoreChange};

/// 每个前台上下文持有一份的变更过滤器
pub struct SyncFilter {
    context_id: ContextId,
    last_seen_revision: u64,
}

impl SyncFilter {
    pub fn new(context_id: ContextId) -> Self {
        Self {
            context_id,
            last_seen_revision: 0,
        }
    }

    /// 判定一条变更是否应被应用，并推进已见修订号
    pub fn should_apply(&mut self, change: &StoreChange) -> bool {
        if change.origin == self.context_id {
            // 自己的写入：只推进水位，不重放
            self.last_seen_revision = self.last_seen_revision.max(change.revision);
            debug!("跳过本上下文自身的写入 (修订号 {})", change.revision);
            return false;
        }
        if change.revision <= self.last_seen_revision {
            debug!(
                "跳过过期变更: 修订号 {} <= 已见 {}",
                change.revision, self.last_seen_revision
            );
            return false;
        }
        self.last_seen_revision = change.revision;
        true
    }

    pub fn last_seen_revision(&self) -> u64 {
        self.last_seen_revision
    }

    pub fn context_id(&self) -> &ContextId {
        &self.context_id
    }
}
