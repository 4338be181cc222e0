//! 短期上下文记忆
//!
//! 有界环形缓冲：保存最近若干条（key, 截断文本），仅用于拼入 prompt，避免同一轮运行里重复调用；
//! 不是权威数据源。超出容量时丢弃最旧的条目。

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::memory::truncate_chars;

/// 多组件共享的短期记忆句柄
pub type SharedMemory = Arc<Mutex<ShortTermMemory>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryEntry {
    /// 子任务 id，或 "plan" 等标签
    pub key: String,
    pub note: String,
}

#[derive(Clone, Debug)]
pub struct ShortTermMemory {
    entries: VecDeque<MemoryEntry>,
    capacity: usize,
    note_chars: usize,
}

impl ShortTermMemory {
    pub fn new(capacity: usize, note_chars: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            note_chars,
        }
    }

    pub fn shared(capacity: usize, note_chars: usize) -> SharedMemory {
        Arc::new(Mutex::new(Self::new(capacity, note_chars)))
    }

    pub fn push(&mut self, key: impl Into<String>, note: &str) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(MemoryEntry {
            key: key.into(),
            note: truncate_chars(note, self.note_chars),
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 构建供执行 prompt 使用的「已有结果」片段；为空时返回空串
    pub fn to_prompt_section(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut s = String::from("## Prior results (reuse, do not repeat)\n");
        for e in &self.entries {
            s.push_str(&format!("- [{}] {}\n", e.key, e.note));
        }
        s.push('\n');
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let mut mem = ShortTermMemory::new(2, 100);
        mem.push("t1", "a");
        mem.push("t2", "b");
        mem.push("t3", "c");
        let keys: Vec<&str> = mem.entries().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["t2", "t3"]);
    }

    #[test]
    fn test_notes_are_truncated() {
        let mut mem = ShortTermMemory::new(4, 5);
        mem.push("t1", "abcdefghij");
        assert_eq!(mem.entries().next().unwrap().note, "abcde");
    }

    #[test]
    fn test_prompt_section() {
        let mut mem = ShortTermMemory::new(4, 50);
        assert_eq!(mem.to_prompt_section(), "");
        mem.push("t1", "found three gaps");
        let section = mem.to_prompt_section();
        assert!(section.contains("## Prior results"));
        assert!(section.contains("- [t1] found three gaps"));
    }
}
