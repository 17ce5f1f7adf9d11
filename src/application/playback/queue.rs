//! Utterance Queue - 朗读队列
//!
//! 每服务器一条，严格 FIFO：入队顺序即播放顺序。不去重、不设上限、
//! 不重排。消息入队、命令处理与完成回调三条路径都会触到它，内部用
//! 互斥锁保护，临界区只做内存操作。

use std::collections::VecDeque;
use std::sync::Mutex;

/// 待朗读文本的 FIFO 队列
#[derive(Debug, Default)]
pub struct UtteranceQueue {
    items: Mutex<VecDeque<String>>,
}

impl UtteranceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加到队尾
    pub fn enqueue(&self, text: String) {
        self.items.lock().unwrap().push_back(text);
    }

    /// 取出队首
    pub fn dequeue(&self) -> Option<String> {
        self.items.lock().unwrap().pop_front()
    }

    /// 放回队首（播放启动竞态时保序重试）
    pub fn requeue_front(&self, text: String) {
        self.items.lock().unwrap().push_front(text);
    }

    /// 清空（会话断开时整体丢弃）
    pub fn clear(&self) {
        self.items.lock().unwrap().clear();
    }

    pub fn has_pending(&self) -> bool {
        !self.items.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}
