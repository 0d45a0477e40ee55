use crate::cli::{TaskArgs, TaskCommand, TaskStatusArgs};
use crate::output::OutputWriter;
use crate::progress;
use anyhow::Result;
use lodestone_client::Lodestone;
use lodestone_core::models::TaskState;

pub async fn execute(args: TaskArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    match args.command {
        TaskCommand::Status(args) => status(args, client, output).await,
    }
}

async fn status(args: TaskStatusArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    let mut task = client.task(args.task_id.as_str()).await?;

    if args.wait && !task.state.is_terminal() {
        if output.is_json() {
            task.wait().await?;
        } else {
            let spinner = progress::create_spinner("Waiting for task...");
            match task.wait().await {
                Ok(()) => progress::finish_success(&spinner, "Task finished"),
                Err(e) => {
                    progress::finish_error(&spinner, "Task did not finish");
                    return Err(e.into());
                }
            }
        }
    }

    if output.is_json() {
        output.result(serde_json::json!({
            "taskId": task.task_id,
            "state": task.state,
            "statusMessage": task.message,
        }))?;
        return Ok(());
    }

    output.kv("Task", &task.task_id);
    output.kv("State", format!("{:?}", task.state));
    if let Some(message) = &task.message {
        output.kv("Message", message);
    }
    if task.state == TaskState::Failed {
        output.error("Task reported failure");
    }
    Ok(())
}
