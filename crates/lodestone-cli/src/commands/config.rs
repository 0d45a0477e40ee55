use crate::output::OutputWriter;
use anyhow::Result;
use lodestone_core::config::ClientConfig;
use tabled::Tabled;

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub fn execute(config: &ClientConfig, output: &OutputWriter) -> Result<()> {
    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow {
            key,
            value,
            source: format!("{:?}", source),
        })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        let data: serde_json::Map<String, serde_json::Value> = rows
            .iter()
            .map(|row| {
                (
                    row.key.clone(),
                    serde_json::json!({ "value": row.value, "source": row.source }),
                )
            })
            .collect();
        output.result(serde_json::Value::Object(data))?;
    } else {
        output.table(rows);
    }

    Ok(())
}
