use super::{RunFlags, TargetArgs};
use crate::prompt;
use colored::Colorize;
use rgsweep_core::FleetReport;

pub async fn handle(target: &TargetArgs, flags: RunFlags) -> anyhow::Result<Option<FleetReport>> {
    if !target.json {
        let heading = if flags.dry_run {
            "削除計画を作成中..."
        } else {
            "リソースグループを片付けています..."
        };
        println!("{}", heading.yellow());
        match &target.group {
            Some(group) => println!("対象: {}", group.cyan()),
            None => println!("対象: {}", "保護タグのない全グループ".cyan()),
        }
        if let Some(family) = target.only {
            println!(
                "ステージ: {}（グループ自体は削除しません）",
                family.to_string().cyan()
            );
        }
    }

    // 確認（--force / --dry-run が指定されていない場合）
    if !flags.force && !flags.dry_run {
        let scope = target.group.as_deref().unwrap_or("保護タグのない全グループ");
        let question = format!("{} を削除します。続行しますか？", scope);
        if !prompt::ask_yes_no(&question)? {
            println!("{}", "キャンセルしました。".yellow());
            return Ok(None);
        }
    }

    let report = super::run(target, flags).await?;
    super::print_report(&report, target.json)?;
    Ok(Some(report))
}
