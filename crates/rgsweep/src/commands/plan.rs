use super::{RunFlags, TargetArgs};
use colored::Colorize;
use rgsweep_core::FleetReport;

/// dry-run で削除計画だけを表示する
pub async fn handle(target: &TargetArgs) -> anyhow::Result<Option<FleetReport>> {
    if !target.json {
        println!("{}", "削除計画を作成中...".blue());
    }

    let flags = RunFlags {
        dry_run: true,
        ..RunFlags::default()
    };
    let report = super::run(target, flags).await?;
    super::print_report(&report, target.json)?;
    Ok(Some(report))
}
