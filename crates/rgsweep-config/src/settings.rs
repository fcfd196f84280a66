//! 設定ファイルの内容
//!
//! すべての項目は省略可能で、省略時は既定値が使われる。

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// ステージ内並行数の上限
pub const MAX_STAGE_TASKS: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub retry: RetrySettings,
    pub concurrency: ConcurrencySettings,
    /// 1グループあたりの上限時間 (未指定なら無制限)
    pub group_timeout_secs: Option<u64>,
    pub protection_tag: ProtectionTagSettings,
    /// 最終削除で競合した場合に強制削除するリソースタイプ
    pub force_deletion_types: Vec<String>,
    pub cross_group_decline: DeclineBehavior,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retry: RetrySettings::default(),
            concurrency: ConcurrencySettings::default(),
            group_timeout_secs: None,
            protection_tag: ProtectionTagSettings::default(),
            force_deletion_types: vec![
                "Microsoft.Compute/virtualMachines".to_string(),
                "Microsoft.Compute/virtualMachineScaleSets".to_string(),
            ],
            cross_group_decline: DeclineBehavior::default(),
        }
    }
}

impl Settings {
    /// YAML文字列から読み込む (空文字列は既定値)
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// 値の整合性を確認
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts は1以上を指定してください".into(),
            ));
        }
        let multiplier = self.retry.backoff_multiplier;
        if multiplier.is_nan() || multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "retry.backoff_multiplier は1.0以上を指定してください".into(),
            ));
        }
        if self.retry.operation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "retry.operation_timeout_secs は1以上を指定してください".into(),
            ));
        }
        if self.concurrency.groups == 0 {
            return Err(ConfigError::Invalid(
                "concurrency.groups は1以上を指定してください".into(),
            ));
        }
        if self.group_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "group_timeout_secs は1以上を指定してください".into(),
            ));
        }
        if self.protection_tag.key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "protection_tag.key が空です".into(),
            ));
        }
        Ok(())
    }

    pub fn group_timeout(&self) -> Option<Duration> {
        self.group_timeout_secs.map(Duration::from_secs)
    }
}

/// 再試行の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub operation_timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            operation_timeout_secs: 300,
        }
    }
}

impl RetrySettings {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

/// 並行数の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConcurrencySettings {
    /// ステージ内で同時に処理するリソース数
    pub stage_tasks: usize,
    /// 並行モードで同時に処理するグループ数
    pub groups: usize,
}

impl Default for ConcurrencySettings {
    fn default() -> Self {
        Self {
            stage_tasks: 8,
            groups: 4,
        }
    }
}

impl ConcurrencySettings {
    /// 1..=32 に丸めたステージ内並行数
    pub fn effective_stage_tasks(&self) -> usize {
        self.stage_tasks.clamp(1, MAX_STAGE_TASKS)
    }
}

/// 削除対象から外すためのタグ (大文字小文字は区別しない)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtectionTagSettings {
    pub key: String,
    pub value: String,
}

impl Default for ProtectionTagSettings {
    fn default() -> Self {
        Self {
            key: "keep".to_string(),
            value: "true".to_string(),
        }
    }
}

/// 別グループのVM削除が拒否されたときのサブネットの扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclineBehavior {
    /// サブネット全体を残す
    #[default]
    AbortSubnet,
    /// 該当NICのみ残してサブネット処理を続ける
    SkipNic,
}
