use crate::cli::{
    IndexArgs, IndexCommand, IndexCreateArgs, IndexDeleteArgs, IndexInsertArgs, IndexItemsArgs,
    IndexSearchArgs,
};
use crate::output::OutputWriter;
use anyhow::{bail, Result};
use lodestone_client::{CreateIndexParams, InsertOptions, ItemFilter, Lodestone};
use lodestone_core::models::SearchHit;
use tabled::Tabled;

pub async fn execute(args: IndexArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    match args.command {
        IndexCommand::Create(args) => create(args, client, output).await,
        IndexCommand::Insert(args) => insert(args, client, output).await,
        IndexCommand::Search(args) => search(args, client, output).await,
        IndexCommand::Items(args) => items(args, client, output).await,
        IndexCommand::Delete(args) => delete(args, client, output).await,
    }
}

async fn create(args: IndexCreateArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    let params =
        CreateIndexParams::new(&args.name, &args.model).with_upsert(!args.no_upsert);
    let index = client.create_index(params).await?;

    if output.is_json() {
        output.result(serde_json::json!({ "id": index.id, "name": index.name }))?;
    } else {
        output.success(format!("Index {} ready ({})", args.name, index.id));
    }
    Ok(())
}

async fn insert(args: IndexInsertArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    if args.values.len() > 1 && (args.external_id.is_some() || args.external_type.is_some()) {
        bail!("--external-id and --external-type apply to single-value inserts only");
    }

    let index = client.index(&args.index);
    let reindex = !args.no_reindex;

    let result = if args.values.len() == 1 {
        let mut options = InsertOptions::default().with_reindex(reindex);
        if let Some(external_id) = &args.external_id {
            options = options.with_external_id(external_id.as_str());
        }
        if let Some(external_type) = &args.external_type {
            options = options.with_external_type(external_type.as_str());
        }
        index.insert(args.values[0].as_str(), options).await?
    } else {
        index.insert_many(args.values.clone(), reindex).await?
    };

    if output.is_json() {
        output.result(&result)?;
    } else {
        output.success(format!("Inserted {} item(s)", result.item_ids.len()));
    }
    Ok(())
}

#[derive(Tabled)]
struct HitRow {
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "External Id")]
    external_id: String,
}

impl HitRow {
    fn from_hit(hit: &SearchHit) -> Self {
        Self {
            score: format!("{:.4}", hit.score),
            value: hit.value.clone().unwrap_or_default(),
            external_id: hit.external_id.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

async fn search(args: IndexSearchArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    let index = client.index(&args.index);

    let result = if args.query.len() == 1 {
        index
            .search(args.query[0].as_str(), args.k, args.include_metadata)
            .await?
    } else {
        index
            .search(args.query.clone(), args.k, args.include_metadata)
            .await?
    };

    if output.is_json() {
        output.result(&result)?;
        return Ok(());
    }

    for (query, hits) in args.query.iter().zip(result.hits.iter()) {
        if args.query.len() > 1 {
            output.section(format!("Query: {}", query));
        }
        if hits.is_empty() {
            output.warning(format!("No hits for '{}'", query));
            continue;
        }
        output.table(hits.iter().map(HitRow::from_hit).collect());
    }
    Ok(())
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "File Id")]
    file_id: String,
    #[tabled(rename = "External Id")]
    external_id: String,
}

async fn items(args: IndexItemsArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    let mut filter = ItemFilter::default();
    if let Some(file_id) = &args.file_id {
        filter = filter.with_file_id(file_id.as_str());
    }
    if let Some(block_id) = &args.block_id {
        filter = filter.with_block_id(block_id.as_str());
    }
    if let Some(span_id) = &args.span_id {
        filter = filter.with_span_id(span_id.as_str());
    }

    let items = client.index(&args.index).list_items(filter).await?;

    if output.is_json() {
        output.result(&items)?;
        return Ok(());
    }

    let rows: Vec<ItemRow> = items
        .iter()
        .map(|item| ItemRow {
            id: item.id.clone().unwrap_or_else(|| "-".to_string()),
            value: truncate(item.value.as_deref().unwrap_or(""), 60),
            file_id: item.file_id.clone().unwrap_or_else(|| "-".to_string()),
            external_id: item.external_id.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    output.table(rows);
    Ok(())
}

async fn delete(args: IndexDeleteArgs, client: &Lodestone, output: &OutputWriter) -> Result<()> {
    if !args.yes {
        if output.is_json() {
            bail!("--yes is required to delete an index in JSON mode");
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete index {} and all of its data?",
                args.index
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            output.info("Aborted");
            return Ok(());
        }
    }

    client.index(&args.index).delete().await?;

    if output.is_json() {
        output.result(serde_json::json!({ "deleted": args.index }))?;
    } else {
        output.success(format!("Deleted index {}", args.index));
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…", head)
    }
}
