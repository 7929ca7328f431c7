//! 警告写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，记录没有成功生成的考生，不关心流程

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// 警告写入服务
///
/// 多个考生任务并发写入同一个文件，内部用锁保证每条记录完整。
pub struct WarnWriter {
    warn_file_path: PathBuf,
    lock: Mutex<()>,
}

impl WarnWriter {
    /// 创建新的警告写入服务
    pub fn new() -> Self {
        Self::with_path("warn.txt")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            warn_file_path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.warn_file_path
    }

    /// 写入警告信息
    ///
    /// # 参数
    /// - `roll_number`: 学号
    /// - `stage`: 出错的阶段（生成 / 编译试卷 / 编译答案）
    /// - `reason`: 错误信息，编译错误会带上编译器输出
    pub async fn write(&self, roll_number: &str, stage: &str, reason: &str) -> Result<()> {
        debug!(
            "写入警告: 考生 {} | 阶段 {} | 信息长度: {}",
            roll_number,
            stage,
            reason.len()
        );

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)?;

        let warn_msg = format!("考生 {} | {} | {}\n", roll_number, stage, reason);

        file.write_all(warn_msg.as_bytes())?;

        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}
