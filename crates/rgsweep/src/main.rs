mod commands;
mod prompt;
mod report;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{RunFlags, TargetArgs};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rgsweep")]
#[command(about = "依存関係を解きほぐして、リソースグループを片付ける。", long_about = None)]
struct Cli {
    /// 詳細ログを出力 (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// リソースグループを依存順に片付けて削除
    Purge {
        #[command(flatten)]
        target: TargetArgs,
        /// 確認なしで実行
        #[arg(short, long)]
        force: bool,
        /// 管理ロックを削除してから進める
        #[arg(long)]
        remove_locks: bool,
        /// 計画のみ表示し、変更は行わない
        #[arg(long)]
        dry_run: bool,
    },
    /// 削除計画を表示（変更は行わない）
    Plan {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// バージョン情報を表示
    Version,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdoutはレポート用、ログはstderrへ
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let report = match cli.command {
        Commands::Version => {
            println!("rgsweep {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Purge {
            target,
            force,
            remove_locks,
            dry_run,
        } => {
            let flags = RunFlags {
                force,
                remove_locks,
                dry_run,
            };
            commands::purge::handle(&target, flags).await?
        }
        Commands::Plan { target } => commands::plan::handle(&target).await?,
    };
    let Some(report) = report else {
        return Ok(());
    };

    if report.has_blocked() {
        eprintln!(
            "{} {} 個のグループを削除できませんでした",
            "Error:".red().bold(),
            report.blocked_count()
        );
        std::process::exit(1);
    }

    Ok(())
}
