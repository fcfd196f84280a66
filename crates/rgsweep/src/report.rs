//! 進捗と結果の表示

use colored::Colorize;
use rgsweep_core::{
    FleetReport, GroupOutcome, GroupState, ProgressEvent, RemovalOutcome, RemovalStatus,
};
use tokio::sync::mpsc::UnboundedReceiver;

/// リソースIDの末尾（表示用）
fn short_name(id: &str) -> &str {
    id.trim_end_matches('/').rsplit('/').next().unwrap_or(id)
}

fn outcome_line(outcome: &RemovalOutcome) -> String {
    let name = short_name(&outcome.resource_id);
    match &outcome.status {
        RemovalStatus::Removed => format!("✓ {} を削除", name.cyan()),
        RemovalStatus::NotFound => format!("ℹ {} は既に存在しません", name),
        RemovalStatus::Skipped(reason) => {
            format!("- {} をスキップ ({})", name, reason).yellow().to_string()
        }
        RemovalStatus::Failed(reason) => {
            format!("⚠ {} の削除に失敗: {}", name, reason).red().to_string()
        }
    }
}

fn state_line(state: &GroupState) -> Option<String> {
    let line = match state {
        GroupState::Protected => "ℹ 保護タグが付いているためスキップ".dimmed().to_string(),
        GroupState::FinalDeleting => "グループを削除中...".blue().to_string(),
        GroupState::Deleted => "✓ 削除完了".green().to_string(),
        GroupState::Blocked { reason } => {
            format!("✗ 削除できません: {}", reason).red().to_string()
        }
        GroupState::Planned => "✓ 計画を作成しました".green().to_string(),
        GroupState::Cleaned => "✓ ステージの片付け完了".green().to_string(),
        GroupState::Discovered | GroupState::Planning | GroupState::Executing { .. } => {
            return None;
        }
    };
    Some(line)
}

/// 進捗イベントを受信しきるまで表示する
pub async fn render_progress(mut receiver: UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = receiver.recv().await {
        match event {
            ProgressEvent::GroupStateChanged { group, state } => {
                if let Some(line) = state_line(&state) {
                    println!("[{}] {}", group.bold(), line);
                }
            }
            ProgressEvent::StageStarted { group, stage, tasks } => {
                println!("[{}] ▶ {} ({} 件)", group.bold(), stage, tasks);
            }
            ProgressEvent::ResourceOutcome { group, outcome, .. } => {
                println!("[{}]   {}", group.bold(), outcome_line(&outcome));
            }
            ProgressEvent::StageFinished {
                group,
                stage,
                failed,
                total,
                ..
            } => {
                if failed > 0 {
                    println!(
                        "[{}] {}",
                        group.bold(),
                        format!("⚠ {}: {}/{} 件が失敗", stage, failed, total).yellow()
                    );
                }
            }
        }
    }
}

fn summary_line(report: &FleetReport) -> String {
    let mut parts = vec![
        format!("削除 {}", report.deleted_count()),
        format!("保護 {}", report.protected_count()),
        format!("失敗 {}", report.blocked_count()),
    ];
    if report.planned_count() > 0 {
        parts.push(format!("計画 {}", report.planned_count()));
    }
    if report.cleaned_count() > 0 {
        parts.push(format!("片付け {}", report.cleaned_count()));
    }
    parts.join(" / ")
}

fn print_plan(group: &GroupOutcome) {
    let Some(plan) = &group.plan else {
        return;
    };
    if plan.is_empty() {
        println!("    (削除前に片付けるリソースはありません)");
    }
    for stage in plan {
        println!("    {} ({} 件)", stage.stage.to_string().cyan(), stage.resources.len());
        if let Some(error) = &stage.error {
            println!("      {}", format!("⚠ 一覧を取得できません: {}", error).yellow());
        }
        for resource in &stage.resources {
            println!("      • {}", short_name(resource));
        }
    }
}

/// 実行結果のまとめを表示
pub fn print_summary(report: &FleetReport) {
    println!();
    println!("{}", "結果:".bold());

    for group in &report.groups {
        let state = match &group.state {
            GroupState::Deleted | GroupState::Planned | GroupState::Cleaned => {
                group.state.label().green()
            }
            GroupState::Blocked { .. } => group.state.label().red(),
            _ => group.state.label().dimmed(),
        };
        println!("  • {} {}", group.group.cyan(), state);
        if let Some(reason) = group.reason() {
            println!("    {}", reason.red());
        }
        let failed = group.outcomes().filter(|o| o.status.is_failed()).count();
        if failed > 0 {
            println!("    {}", format!("{} 件のリソースが残っています", failed).yellow());
        }
        print_plan(group);
    }

    let elapsed = report.finished_at - report.started_at;
    println!();
    println!(
        "{} ({} 秒)",
        summary_line(report).bold(),
        elapsed.num_seconds()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rgsweep_core::ExecutionMode;

    fn report(states: Vec<GroupState>) -> FleetReport {
        let now = Utc::now();
        FleetReport {
            started_at: now,
            finished_at: now,
            mode: ExecutionMode::Sequential,
            groups: states
                .into_iter()
                .enumerate()
                .map(|(i, state)| GroupOutcome::new(format!("rg-{}", i), state))
                .collect(),
        }
    }

    /// リソースIDから末尾の名前を取り出せることを確認
    #[test]
    fn test_short_name() {
        assert_eq!(
            short_name("/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet1"),
            "vnet1"
        );
        assert_eq!(short_name("plain"), "plain");
    }

    /// 件数のまとめに計画・片付けが必要なときだけ含まれることを確認
    #[test]
    fn test_summary_line() {
        let fleet = report(vec![
            GroupState::Deleted,
            GroupState::Protected,
            GroupState::Blocked {
                reason: "locked".into(),
            },
        ]);
        assert_eq!(summary_line(&fleet), "削除 1 / 保護 1 / 失敗 1");

        let fleet = report(vec![GroupState::Planned, GroupState::Cleaned]);
        assert_eq!(summary_line(&fleet), "削除 0 / 保護 0 / 失敗 0 / 計画 1 / 片付け 1");
    }

    /// 途中経過の状態は表示しないことを確認
    #[test]
    fn test_state_line_skips_transient_states() {
        assert!(state_line(&GroupState::Planning).is_none());
        assert!(state_line(&GroupState::Executing { stage: 1, of: 3 }).is_none());
        assert!(state_line(&GroupState::Deleted).is_some());
    }

    /// 失敗したリソースの行に理由が含まれることを確認
    #[test]
    fn test_outcome_line_includes_reason() {
        let outcome = RemovalOutcome::failed("/x/y/nsg-web", "Conflict: in use");
        let line = outcome_line(&outcome);
        assert!(line.contains("nsg-web"));
        assert!(line.contains("Conflict: in use"));
    }

    /// JSON出力にグループの状態が含まれることを確認
    #[test]
    fn test_report_serializes_to_json() {
        let fleet = report(vec![GroupState::Blocked {
            reason: "timed out".into(),
        }]);
        let json = serde_json::to_value(&fleet).unwrap();
        assert_eq!(json["mode"], "sequential");
        assert_eq!(json["groups"][0]["state"]["state"], "blocked");
        assert_eq!(json["groups"][0]["state"]["reason"], "timed out");
    }
}
