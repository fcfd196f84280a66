//! 標準入力での確認

use async_trait::async_trait;
use colored::Colorize;
use rgsweep_core::{ConfirmationKind, ConfirmationPolicy, ConfirmationRequest};
use std::io::Write;
use tokio::sync::Mutex;

/// y/N で確認する (標準入力が読めなければ「いいえ」)
pub fn ask_yes_no(question: &str) -> std::io::Result<bool> {
    eprint!("{} [y/N]: ", question);
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("y") || input.eq_ignore_ascii_case("yes")
}

fn describe(request: &ConfirmationRequest) -> String {
    let action = match request.kind {
        ConfirmationKind::NsgDisassociation => "NSGの関連付けをすべて解除します",
        ConfirmationKind::CrossGroupVm => "別のリソースグループにあるVMを削除します",
        ConfirmationKind::OrphanedNic => "どこにも接続されていないNICを削除します",
    };

    let mut text = format!("{}\n  対象: {}\n  理由: {}", action, request.subject, request.reason);
    if !request.resources.is_empty() {
        text.push_str(&format!("\n  影響するリソース ({} 件):", request.resources.len()));
        for resource in &request.resources {
            text.push_str(&format!("\n    • {}", resource));
        }
    }
    text
}

/// ストラテジーからの確認要求を端末で尋ねる
///
/// 並行実行中でも質問が混ざらないよう、一度に1件ずつ尋ねる。
#[derive(Default)]
pub struct StdinPrompt {
    lock: Mutex<()>,
}

#[async_trait]
impl ConfirmationPolicy for StdinPrompt {
    async fn confirm(&self, request: &ConfirmationRequest) -> bool {
        let _guard = self.lock.lock().await;
        let text = describe(request);

        let answer = tokio::task::spawn_blocking(move || {
            eprintln!();
            eprintln!("{} {}", "確認:".yellow().bold(), text);
            ask_yes_no("続行しますか？")
        })
        .await;

        matches!(answer, Ok(Ok(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y / yes のみを承認として扱うことを確認
    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }

    /// 確認文に対象と影響するリソースが含まれることを確認
    #[test]
    fn test_describe_lists_resources() {
        let request = ConfirmationRequest::new(
            ConfirmationKind::NsgDisassociation,
            "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/networkSecurityGroups/nsg",
            "2 associations",
        )
        .with_resources(vec!["subnet-a".into(), "nic-b".into()]);

        let text = describe(&request);
        assert!(text.contains("NSG"));
        assert!(text.contains("networkSecurityGroups/nsg"));
        assert!(text.contains("2 件"));
        assert!(text.contains("• nic-b"));
    }
}
