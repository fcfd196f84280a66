pub mod plan;
pub mod purge;

use crate::prompt::StdinPrompt;
use crate::report;
use anyhow::Context;
use clap::Args;
use colored::Colorize;
use rgsweep_cloud::ProtectionTag;
use rgsweep_cloud_azure::AzureCliClient;
use rgsweep_config::{DeclineBehavior, RetrySettings, Settings};
use rgsweep_core::{
    AutoApprove, ConfirmationPolicy, CrossGroupDecline, ExecutionMode, FleetOrchestrator,
    FleetReport, GroupFilter, GroupTeardownCoordinator, ProgressSink, RetryPolicy, StageFamily,
    TeardownOptions,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// purge / plan 共通の対象指定
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// 対象のリソースグループ名（省略時は保護タグのない全グループ）
    pub group: Option<String>,
    /// サブスクリプション（名前またはID）
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    pub subscription: Option<String>,
    /// 設定ファイルのパス（環境変数 RGSWEEP_CONFIG でも指定可）
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// 複数グループを並行して処理
    #[arg(long)]
    pub concurrent: bool,
    /// 1系統のステージだけを実行し、グループ自体は削除しない
    /// (netapp, network, data-collection, vault, locks)
    #[arg(long, value_name = "FAMILY")]
    pub only: Option<StageFamily>,
    /// 結果をJSONで出力
    #[arg(long)]
    pub json: bool,
}

/// purge の動作フラグ
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    pub force: bool,
    pub remove_locks: bool,
    pub dry_run: bool,
}

/// 設定ファイルを読み込む（--config があればそれを優先）
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = match path {
        Some(path) => rgsweep_config::load_from(path)?,
        None => rgsweep_config::load()?,
    };
    Ok(settings)
}

pub fn retry_policy(retry: &RetrySettings) -> RetryPolicy {
    RetryPolicy {
        max_attempts: retry.max_attempts,
        initial_delay: retry.initial_delay(),
        max_delay: retry.max_delay(),
        backoff_multiplier: retry.backoff_multiplier,
        operation_timeout: retry.operation_timeout(),
    }
}

/// 設定ファイルの値にCLIフラグを重ねてTeardownOptionsを組み立てる
pub fn build_options(settings: &Settings, target: &TargetArgs, flags: RunFlags) -> TeardownOptions {
    TeardownOptions {
        force: flags.force,
        remove_locks: flags.remove_locks,
        dry_run: flags.dry_run,
        only: target.only,
        stage_concurrency: settings.concurrency.effective_stage_tasks(),
        cross_group_decline: match settings.cross_group_decline {
            DeclineBehavior::AbortSubnet => CrossGroupDecline::AbortSubnet,
            DeclineBehavior::SkipNic => CrossGroupDecline::SkipNic,
        },
        force_deletion_types: settings.force_deletion_types.clone(),
        group_timeout: settings.group_timeout(),
        protection_tag: ProtectionTag {
            key: settings.protection_tag.key.clone(),
            value: settings.protection_tag.value.clone(),
        },
        retry: retry_policy(&settings.retry),
    }
}

fn execution_mode(target: &TargetArgs) -> ExecutionMode {
    if target.concurrent {
        ExecutionMode::Concurrent
    } else {
        ExecutionMode::Sequential
    }
}

fn group_filter(target: &TargetArgs) -> GroupFilter {
    match &target.group {
        Some(name) => GroupFilter::Named(name.clone()),
        None => GroupFilter::All,
    }
}

/// フリート全体を実行してレポートを返す
pub async fn run(target: &TargetArgs, flags: RunFlags) -> anyhow::Result<FleetReport> {
    let settings = load_settings(target.config.as_deref())?;
    let options = build_options(&settings, target, flags);
    debug!(?options, "teardown options");

    let client = AzureCliClient::new(target.subscription.clone());
    let account = client
        .check_auth()
        .await
        .context("Azure CLIの認証を確認できませんでした")?;
    if !target.json {
        println!("アカウント: {}", account.cyan());
    }

    let confirm: Arc<dyn ConfirmationPolicy> = if options.force {
        Arc::new(AutoApprove)
    } else {
        Arc::new(StdinPrompt::default())
    };

    let (sender, receiver) = mpsc::unbounded_channel();
    let coordinator = GroupTeardownCoordinator::new(Arc::new(client), options, confirm)
        .with_progress(ProgressSink::new(sender));
    let orchestrator =
        FleetOrchestrator::new(coordinator).with_group_concurrency(settings.concurrency.groups);

    let renderer = if target.json {
        drop(receiver);
        None
    } else {
        Some(tokio::spawn(report::render_progress(receiver)))
    };

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!(
                    "{}",
                    "中断しています... 実行中の処理が終わるまで待機します".yellow()
                );
                cancel.cancel();
            }
        })
    };

    let result = orchestrator
        .run_fleet(&group_filter(target), execution_mode(target), &cancel)
        .await;
    interrupt.abort();

    // 送信側を閉じて描画タスクを終わらせる
    drop(orchestrator);
    if let Some(renderer) = renderer {
        let _ = renderer.await;
    }

    Ok(result?)
}

/// レポートを出力
pub fn print_report(report: &FleetReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        report::print_summary(report);
    }
    Ok(())
}
