use crate::cli::{
    SnapshotArgs, SnapshotCommand, SnapshotCreateArgs, SnapshotDeleteArgs, SnapshotListArgs,
};
use crate::output::OutputWriter;
use crate::progress;
use anyhow::Result;
use lodestone_client::Lodestone;
use tabled::Tabled;

pub async fn execute(args: SnapshotArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    match args.command {
        SnapshotCommand::Create(args) => create(args, client, output).await,
        SnapshotCommand::List(args) => list(args, client, output).await,
        SnapshotCommand::Delete(args) => delete(args, client, output).await,
    }
}

async fn create(args: SnapshotCreateArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    let index = client.index(&args.index);
    let mut task = index.create_snapshot().await?;

    if args.no_wait {
        if output.is_json() {
            output.result(serde_json::json!({ "taskId": task.task_id }))?;
        } else {
            output.kv("Task", &task.task_id);
        }
        return Ok(());
    }

    if output.is_json() {
        task.wait().await?;
        output.result(serde_json::json!({ "taskId": task.task_id, "state": task.state }))?;
        return Ok(());
    }

    let spinner = progress::create_spinner("Creating snapshot...");
    match task.wait().await {
        Ok(()) => {
            progress::finish_success(&spinner, "Snapshot created");
            Ok(())
        }
        Err(e) => {
            progress::finish_error(&spinner, "Snapshot failed");
            Err(e.into())
        }
    }
}

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "Snapshot Id")]
    snapshot_id: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

async fn list(args: SnapshotListArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    let snapshots = client.index(&args.index).list_snapshots().await?;

    if output.is_json() {
        output.result(&snapshots)?;
        return Ok(());
    }

    let rows: Vec<SnapshotRow> = snapshots
        .iter()
        .map(|snapshot| SnapshotRow {
            snapshot_id: snapshot.snapshot_id.clone(),
            created_at: snapshot
                .created_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    output.table(rows);
    Ok(())
}

async fn delete(args: SnapshotDeleteArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    client
        .index(&args.index)
        .delete_snapshot(&args.snapshot_id)
        .await?;

    if output.is_json() {
        output.result(serde_json::json!({ "deleted": args.snapshot_id }))?;
    } else {
        output.success(format!("Deleted snapshot {}", args.snapshot_id));
    }
    Ok(())
}
