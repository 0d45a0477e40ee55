use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lodestone - hosted embedding-index client
#[derive(Parser, Debug)]
#[command(name = "lodestone")]
#[command(about = "Client for the Lodestone embedding-index service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Base URL of the API
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// API key (overrides file and environment values)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Workspace handle to scope requests to
    #[arg(long, global = true)]
    pub space: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Path to a TOML config file (defaults to ./lodestone.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage embedding indexes
    Index(IndexArgs),

    /// Manage index snapshots
    Snapshot(SnapshotArgs),

    /// Inspect long-running tasks
    Task(TaskArgs),

    /// Show resolved configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub command: IndexCommand,
}

#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// Create an index (or return the existing one with the same name)
    Create(IndexCreateArgs),

    /// Insert one or more text values into an index
    Insert(IndexInsertArgs),

    /// Search an index
    Search(IndexSearchArgs),

    /// List the items held by an index
    Items(IndexItemsArgs),

    /// Delete an index and all of its data
    Delete(IndexDeleteArgs),
}

#[derive(Parser, Debug)]
pub struct IndexCreateArgs {
    /// Name of the index
    pub name: String,

    /// Embedding model the index uses
    #[arg(long, default_value = "text-embedding")]
    pub model: String,

    /// Fail if an index with this name already exists
    #[arg(long)]
    pub no_upsert: bool,
}

#[derive(Parser, Debug)]
pub struct IndexInsertArgs {
    /// Id of the index
    pub index: String,

    /// Text value(s) to insert
    #[arg(required = true, num_args = 1..)]
    pub values: Vec<String>,

    /// External identifier to attach (single value only)
    #[arg(long)]
    pub external_id: Option<String>,

    /// External type to attach (single value only)
    #[arg(long)]
    pub external_type: Option<String>,

    /// Skip immediate re-embedding of the inserted items
    #[arg(long)]
    pub no_reindex: bool,
}

#[derive(Parser, Debug)]
pub struct IndexSearchArgs {
    /// Id of the index
    pub index: String,

    /// Query text(s); multiple queries run as a batch
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Number of hits to return per query
    #[arg(long, short = 'k', default_value = "5")]
    pub k: usize,

    /// Include item metadata in the hits
    #[arg(long)]
    pub include_metadata: bool,
}

#[derive(Parser, Debug)]
pub struct IndexItemsArgs {
    /// Id of the index
    pub index: String,

    /// Only items referencing this file
    #[arg(long)]
    pub file_id: Option<String>,

    /// Only items referencing this block
    #[arg(long)]
    pub block_id: Option<String>,

    /// Only items referencing this span
    #[arg(long)]
    pub span_id: Option<String>,
}

#[derive(Parser, Debug)]
pub struct IndexDeleteArgs {
    /// Id of the index
    pub index: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Subcommand, Debug)]
pub enum SnapshotCommand {
    /// Capture a snapshot of an index
    Create(SnapshotCreateArgs),

    /// List the snapshots of an index
    List(SnapshotListArgs),

    /// Delete a snapshot
    Delete(SnapshotDeleteArgs),
}

#[derive(Parser, Debug)]
pub struct SnapshotCreateArgs {
    /// Id of the index
    pub index: String,

    /// Return the task id immediately instead of waiting for completion
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Parser, Debug)]
pub struct SnapshotListArgs {
    /// Id of the index
    pub index: String,
}

#[derive(Parser, Debug)]
pub struct SnapshotDeleteArgs {
    /// Id of the index
    pub index: String,

    /// Id of the snapshot
    pub snapshot_id: String,
}

#[derive(Parser, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Show the state of a task
    Status(TaskStatusArgs),
}

#[derive(Parser, Debug)]
pub struct TaskStatusArgs {
    /// Id of the task
    pub task_id: String,

    /// Poll until the task reaches a terminal state
    #[arg(long)]
    pub wait: bool,
}
