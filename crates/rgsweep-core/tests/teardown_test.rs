mod common;

use async_trait::async_trait;
use common::{coordinator, fast_options, nsg_scenario};
use rgsweep_cloud::{FailureKind, MemoryCloud, Operation, ResourceDescriptor, ResourceKind};
use rgsweep_core::{
    GroupState, RemovalContext, RemovalOutcome, RemovalStatus, RemovalStrategy, StageFamily,
    StageKind, StrategyRegistry,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 削除の副作用として同じグループにNICを残すストラテジー
struct LeavesNicBehind {
    cloud: Arc<MemoryCloud>,
}

#[async_trait]
impl RemovalStrategy for LeavesNicBehind {
    fn name(&self) -> &'static str {
        "leaves-nic"
    }

    async fn remove(
        &self,
        ctx: &RemovalContext<'_>,
        resource: &ResourceDescriptor,
    ) -> RemovalOutcome {
        self.cloud.add_resource(
            &ctx.group.name,
            ResourceKind::NetworkInterface,
            "nic-leftover",
            json!({}),
        );
        ctx.delete(&resource.id).await
    }
}

/// 空のグループは計画なしでそのまま削除されることを確認
#[tokio::test]
async fn test_empty_group_is_deleted() {
    let cloud = Arc::new(MemoryCloud::new());
    let group = cloud.add_group("rg-empty", &[]);

    let outcome = coordinator(&cloud, fast_options())
        .teardown(&group, &CancellationToken::new())
        .await;

    assert_eq!(outcome.state, GroupState::Deleted);
    assert!(outcome.stages.is_empty());
    assert!(!cloud.group_exists("rg-empty"));
    assert_eq!(cloud.mutating_calls().len(), 1);
}

/// ロック解除が無効な場合、ロック付きグループはBlockedで終わることを確認
#[tokio::test]
async fn test_locked_group_is_blocked_without_lock_removal() {
    let cloud = Arc::new(MemoryCloud::new());
    let group = cloud.add_group("rg-locked", &[]);
    let lock = cloud.add_lock(&group.id, "do-not-delete");

    let outcome = coordinator(&cloud, fast_options())
        .teardown(&group, &CancellationToken::new())
        .await;

    // ロックは残り、グループ削除は通常→強制の2回試行される
    let reason = outcome.reason().expect("blocked reason").to_lowercase();
    assert!(matches!(outcome.state, GroupState::Blocked { .. }));
    assert!(reason.contains("lock"), "reason: {}", reason);
    assert!(cloud.lock_exists(&lock));
    assert!(cloud.group_exists("rg-locked"));
    assert_eq!(cloud.count_calls(Operation::DeleteLock), 0);
    assert_eq!(cloud.count_calls(Operation::DeleteResourceGroup), 2);

    let locks = outcome.stage(StageKind::LockRemoval).expect("lock stage");
    assert!(matches!(locks.outcomes[0].status, RemovalStatus::Skipped(_)));
}

/// ロック解除を有効にするとロックを外してグループを削除できることを確認
#[tokio::test]
async fn test_lock_removal_unblocks_group() {
    let cloud = Arc::new(MemoryCloud::new());
    let group = cloud.add_group("rg-locked", &[]);
    let lock = cloud.add_lock(&group.id, "do-not-delete");

    let mut options = fast_options();
    options.remove_locks = true;
    let outcome = coordinator(&cloud, options)
        .teardown(&group, &CancellationToken::new())
        .await;

    assert_eq!(outcome.state, GroupState::Deleted);
    assert!(!cloud.lock_exists(&lock));
    assert_eq!(cloud.count_calls(Operation::DeleteResourceGroup), 1);
}

/// NSGの関連付けを外してからサブネット・NSG・VNetを削除することを確認
#[tokio::test]
async fn test_nsg_disassociated_before_delete() {
    let cloud = Arc::new(MemoryCloud::new());
    let fixture = nsg_scenario(&cloud, "rg-net");

    let outcome = coordinator(&cloud, fast_options())
        .teardown(&fixture.group, &CancellationToken::new())
        .await;

    assert_eq!(outcome.state, GroupState::Deleted);
    assert!(
        outcome.outcomes().all(|o| o.status == RemovalStatus::Removed),
        "outcomes: {:?}",
        outcome.outcomes().collect::<Vec<_>>()
    );

    // 関連付け解除: サブネット2つ + NIC 1つ
    let calls = cloud.calls();
    let clears: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            c.op == Operation::UpdateResource
                && c.detail
                    .as_deref()
                    .is_some_and(|d| d.starts_with("clear nsg") || d == "clear nic nsg")
        })
        .map(|(i, _)| i)
        .collect();
    assert_eq!(clears.len(), 3);

    let nsg_delete = calls
        .iter()
        .position(|c| c.op == Operation::DeleteResource && c.target == fixture.nsg)
        .expect("nsg delete call");
    assert!(clears.iter().all(|&i| i < nsg_delete));

    let prepare = outcome.stage(StageKind::NsgDisassociate).expect("prepare stage");
    assert_eq!(prepare.outcomes.len(), 1);
    assert_eq!(prepare.outcomes[0].attempts_made, 3);

    for id in [&fixture.nsg, &fixture.vnet, &fixture.nic] {
        assert!(!cloud.contains(id));
    }
}

/// 実行済みグループへの再実行は冪等に成功することを確認
#[tokio::test]
async fn test_rerun_is_idempotent() {
    let cloud = Arc::new(MemoryCloud::new());
    let fixture = nsg_scenario(&cloud, "rg-net");
    let coordinator = coordinator(&cloud, fast_options());

    let first = coordinator
        .teardown(&fixture.group, &CancellationToken::new())
        .await;
    assert_eq!(first.state, GroupState::Deleted);
    let before = cloud.mutating_calls().len();

    let second = coordinator
        .teardown(&fixture.group, &CancellationToken::new())
        .await;

    // 2回目はグループ削除(NotFound)以外に変更操作を行わない
    assert_eq!(second.state, GroupState::Deleted);
    assert!(second.stages.is_empty());
    assert_eq!(cloud.mutating_calls().len(), before + 1);
}

/// 保護タグ付きグループには一切API呼び出しが行われないことを確認
#[tokio::test]
async fn test_protected_group_is_untouched() {
    let cloud = Arc::new(MemoryCloud::new());
    let fixture = nsg_scenario(&cloud, "rg-keep");
    // タグ名・値の大文字小文字は区別しない
    let group = cloud.add_group("rg-keep", &[("Keep", "TRUE")]);
    cloud.add_lock(&group.id, "ops");

    let outcome = coordinator(&cloud, fast_options())
        .teardown(&group, &CancellationToken::new())
        .await;

    assert_eq!(outcome.state, GroupState::Protected);
    assert!(outcome.stages.is_empty());
    assert!(cloud.calls().is_empty());
    assert!(cloud.contains(&fixture.nsg));
}

/// ドライランでは計画のみ返し、変更操作を行わないことを確認
#[tokio::test]
async fn test_dry_run_reports_plan_without_mutation() {
    let cloud = Arc::new(MemoryCloud::new());
    let fixture = nsg_scenario(&cloud, "rg-net");

    let mut options = fast_options();
    options.dry_run = true;
    let outcome = coordinator(&cloud, options)
        .teardown(&fixture.group, &CancellationToken::new())
        .await;

    assert_eq!(outcome.state, GroupState::Planned);
    assert!(cloud.mutating_calls().is_empty());

    let plan = outcome.plan.expect("plan");
    let stages: Vec<StageKind> = plan.iter().map(|s| s.stage).collect();
    assert_eq!(
        stages,
        vec![
            StageKind::NsgDisassociate,
            StageKind::NicDetach,
            StageKind::SubnetCleanup,
            StageKind::NsgDelete,
            StageKind::VnetDelete,
        ]
    );
    let subnets = &plan[2].resources;
    assert_eq!(subnets.len(), 2);
    assert!(subnets.contains(&fixture.subnets[0]));
}

/// ファミリー指定時は該当ステージのみ実行しグループを残すことを確認
#[tokio::test]
async fn test_cleanup_mode_keeps_group() {
    let cloud = Arc::new(MemoryCloud::new());
    let fixture = nsg_scenario(&cloud, "rg-mixed");
    let dce = cloud.add_resource(
        "rg-mixed",
        ResourceKind::DataCollectionEndpoint,
        "dce-main",
        json!({}),
    );

    let mut options = fast_options();
    options.only = Some(StageFamily::DataCollection);
    let outcome = coordinator(&cloud, options)
        .teardown(&fixture.group, &CancellationToken::new())
        .await;

    assert_eq!(outcome.state, GroupState::Cleaned);
    assert!(!cloud.contains(&dce));
    assert!(cloud.contains(&fixture.nsg));
    assert!(cloud.group_exists("rg-mixed"));
    assert_eq!(cloud.count_calls(Operation::DeleteResourceGroup), 0);
}

/// ステージの失敗後も残りのステージとグループ削除が続行されることを確認
#[tokio::test(start_paused = true)]
async fn test_degraded_stage_does_not_halt_plan() {
    let cloud = Arc::new(MemoryCloud::new());
    let fixture = nsg_scenario(&cloud, "rg-net");
    cloud.fail_always(
        Operation::DeleteResource,
        Some(&fixture.nsg),
        FailureKind::PermissionDenied,
    );

    let outcome = coordinator(&cloud, fast_options())
        .teardown(&fixture.group, &CancellationToken::new())
        .await;

    let nsg_stage = outcome.stage(StageKind::NsgDelete).expect("nsg stage");
    assert!(nsg_stage.is_degraded());
    // 権限エラーは恒久的なので再試行しない
    assert_eq!(nsg_stage.outcomes[0].attempts_made, 1);

    let vnet_stage = outcome.stage(StageKind::VnetDelete).expect("vnet stage");
    assert_eq!(vnet_stage.outcomes[0].status, RemovalStatus::Removed);
    assert_eq!(outcome.state, GroupState::Deleted);
}

/// グループ削除の競合時は強制削除タイプ付きで1回だけ再試行することを確認
#[tokio::test]
async fn test_final_delete_escalates_with_force_types() {
    let cloud = Arc::new(MemoryCloud::new());
    let group = cloud.add_group("rg-vm", &[]);
    cloud.add_resource(
        "rg-vm",
        ResourceKind::VirtualMachine,
        "vm-app",
        json!({ "deletionBlocked": true }),
    );

    let outcome = coordinator(&cloud, fast_options())
        .teardown(&group, &CancellationToken::new())
        .await;

    assert_eq!(outcome.state, GroupState::Deleted);
    assert_eq!(cloud.count_calls(Operation::DeleteResourceGroup), 2);
}

/// 強制削除でも解消しない競合はBlockedになり理由が短縮されることを確認
#[tokio::test]
async fn test_unresolvable_conflict_blocks_with_short_reason() {
    let cloud = Arc::new(MemoryCloud::new());
    let group = cloud.add_group("rg-app", &[]);
    cloud.add_typed_resource(
        "rg-app",
        "Microsoft.Web/sites",
        &"x".repeat(400),
        json!({ "deletionBlocked": true }),
    );

    let outcome = coordinator(&cloud, fast_options())
        .teardown(&group, &CancellationToken::new())
        .await;

    let reason = outcome.reason().expect("blocked reason");
    assert!(matches!(outcome.state, GroupState::Blocked { .. }));
    assert!(reason.chars().count() <= 300);
    assert!(cloud.group_exists("rg-app"));
}

/// グループタイムアウトで実行中の処理を打ち切りBlockedになることを確認
#[tokio::test(start_paused = true)]
async fn test_group_timeout_blocks_group() {
    let cloud = Arc::new(MemoryCloud::new());
    let group = cloud.add_group("rg-slow", &[]);
    let dce = cloud.add_resource(
        "rg-slow",
        ResourceKind::DataCollectionEndpoint,
        "dce-stuck",
        json!({}),
    );
    cloud.fail_always(Operation::DeleteResource, Some(&dce), FailureKind::Hang);

    let mut options = fast_options();
    options.group_timeout = Some(std::time::Duration::from_secs(1));
    let outcome = coordinator(&cloud, options)
        .teardown(&group, &CancellationToken::new())
        .await;

    assert_eq!(outcome.reason(), Some("timed out"));
    assert!(cloud.contains(&dce));
    assert_eq!(cloud.count_calls(Operation::DeleteResourceGroup), 0);
}

/// 一覧取得の一時的なエラーは再試行され、グループ削除まで進むことを確認
#[tokio::test(start_paused = true)]
async fn test_throttled_listing_is_retried() {
    let cloud = Arc::new(MemoryCloud::new());
    let fixture = nsg_scenario(&cloud, "rg-net");
    cloud.fail_times(
        Operation::ListResources,
        Some("rg-net"),
        FailureKind::Throttled,
        1,
    );
    cloud.fail_listing(
        "rg-net",
        ResourceKind::NetworkSecurityGroup,
        FailureKind::Throttled,
        Some(2),
    );

    let outcome = coordinator(&cloud, fast_options())
        .teardown(&fixture.group, &CancellationToken::new())
        .await;

    assert_eq!(outcome.state, GroupState::Deleted);
    assert!(
        outcome.outcomes().all(|o| o.status == RemovalStatus::Removed),
        "outcomes: {:?}",
        outcome.outcomes().collect::<Vec<_>>()
    );
    assert!(outcome.stage(StageKind::NsgDelete).is_some());
    assert!(!cloud.group_exists("rg-net"));
    assert_eq!(cloud.count_calls(Operation::DeleteResourceGroup), 1);
}

/// 権限エラーで一覧取得できないステージだけが劣化し、グループ削除は試行されることを確認
#[tokio::test(start_paused = true)]
async fn test_denied_listing_degrades_only_that_stage() {
    let cloud = Arc::new(MemoryCloud::new());
    let fixture = nsg_scenario(&cloud, "rg-net");
    let dce = cloud.add_resource(
        "rg-net",
        ResourceKind::DataCollectionEndpoint,
        "dce-main",
        json!({}),
    );
    cloud.fail_listing(
        "rg-net",
        ResourceKind::DataCollectionEndpoint,
        FailureKind::PermissionDenied,
        None,
    );

    let outcome = coordinator(&cloud, fast_options())
        .teardown(&fixture.group, &CancellationToken::new())
        .await;

    let dce_stage = outcome.stage(StageKind::DceDelete).expect("dce stage");
    assert!(dce_stage.is_degraded());
    match &dce_stage.outcomes[0].status {
        RemovalStatus::Failed(reason) => {
            assert!(reason.contains("enumeration failed"), "{}", reason)
        }
        other => panic!("unexpected status: {:?}", other),
    }

    // 権限エラーは再試行しない: 計画時と実行直前の1回ずつ
    let dce_listings = cloud
        .calls()
        .iter()
        .filter(|c| c.op == Operation::ListResources && c.detail.as_deref() == Some("dce"))
        .count();
    assert_eq!(dce_listings, 2);

    // 他のステージは通常どおり実行される
    let nsg_stage = outcome.stage(StageKind::NsgDelete).expect("nsg stage");
    assert_eq!(nsg_stage.outcomes[0].status, RemovalStatus::Removed);
    assert!(
        !cloud
            .calls()
            .iter()
            .any(|c| c.op == Operation::DeleteResource && c.target == dce)
    );

    assert_eq!(cloud.count_calls(Operation::DeleteResourceGroup), 1);
    assert_eq!(outcome.state, GroupState::Deleted);
}

/// ドライランでは一覧取得に失敗したステージが理由付きで計画に残ることを確認
#[tokio::test(start_paused = true)]
async fn test_dry_run_keeps_unlisted_stage() {
    let cloud = Arc::new(MemoryCloud::new());
    let fixture = nsg_scenario(&cloud, "rg-net");
    cloud.fail_listing(
        "rg-net",
        ResourceKind::VirtualNetwork,
        FailureKind::PermissionDenied,
        None,
    );

    let mut options = fast_options();
    options.dry_run = true;
    let outcome = coordinator(&cloud, options)
        .teardown(&fixture.group, &CancellationToken::new())
        .await;

    assert_eq!(outcome.state, GroupState::Planned);
    let plan = outcome.plan.expect("plan");
    let vnet = plan
        .iter()
        .find(|s| s.stage == StageKind::VnetDelete)
        .expect("vnet stage");
    assert!(vnet.resources.is_empty());
    assert!(vnet.error.as_deref().is_some_and(|e| e.contains("ListResources")));

    // 後続・先行のステージも列挙されている
    assert!(plan.iter().any(|s| s.stage == StageKind::NsgDelete));
    assert!(plan.iter().all(|s| s.error.is_none() || s.stage == StageKind::VnetDelete));
    assert!(cloud.mutating_calls().is_empty());
}

/// 計画時に空だったステージも実行直前に再列挙され、後から現れたリソースを削除することを確認
#[tokio::test]
async fn test_stage_empty_at_planning_is_listed_again() {
    let cloud = Arc::new(MemoryCloud::new());
    let group = cloud.add_group("rg-anf", &[]);
    let account = cloud.add_resource("rg-anf", ResourceKind::NetAppAccount, "anf", json!({}));

    let mut registry = StrategyRegistry::with_defaults();
    registry.register(
        ResourceKind::NetAppAccount,
        LeavesNicBehind {
            cloud: cloud.clone(),
        },
    );
    let outcome = coordinator(&cloud, fast_options())
        .with_registry(Arc::new(registry))
        .teardown(&group, &CancellationToken::new())
        .await;

    assert_eq!(outcome.state, GroupState::Deleted);
    assert!(!cloud.contains(&account));

    let nics = outcome.stage(StageKind::NicDetach).expect("nic stage");
    assert_eq!(nics.outcomes.len(), 1);
    assert!(nics.outcomes[0].resource_id.ends_with("/nic-leftover"));
    assert_eq!(nics.outcomes[0].status, RemovalStatus::Removed);

    // NICは個別に削除済みなので、グループ削除は1回で済む
    assert_eq!(cloud.count_calls(Operation::DeleteResourceGroup), 1);
}
