use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => Ok(render_table(&serde_json::to_value(value)?)),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn render_table(value: &Value) -> String {
    match value {
        Value::Array(items) if items.is_empty() => String::from("(no rows)"),
        Value::Array(items) if items.iter().all(Value::is_object) => {
            let mut headers: Vec<&str> = Vec::new();
            for key in items.iter().filter_map(Value::as_object).flat_map(|m| m.keys()) {
                if !headers.contains(&key.as_str()) {
                    headers.push(key);
                }
            }
            let rows = items
                .iter()
                .filter_map(Value::as_object)
                .map(|map| {
                    headers
                        .iter()
                        .map(|h| map.get(*h).map_or_else(|| "-".to_string(), cell))
                        .collect()
                })
                .collect::<Vec<Vec<String>>>();
            table::render(&headers, &rows)
        }
        Value::Array(items) => {
            let rows = items.iter().map(|item| vec![cell(item)]).collect::<Vec<_>>();
            table::render(&["value"], &rows)
        }
        Value::Object(map) => {
            let rows = map
                .iter()
                .map(|(key, value)| vec![key.clone(), cell(value)])
                .collect::<Vec<_>>();
            table::render(&["key", "value"], &rows)
        }
        scalar => table::render(&["value"], &[vec![cell(scalar)]]),
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::String(v) => v.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::render;
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Example {
        email: &'static str,
        roles: Vec<&'static str>,
        context: Option<&'static str>,
    }

    fn example() -> Example {
        Example {
            email: "ana@example.com",
            roles: vec!["requester", "worker"],
            context: None,
        }
    }

    #[test]
    fn json_render_is_valid_json() {
        let out = render(&example(), OutputFormat::Json).expect("json render should work");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["email"], "ana@example.com");
    }

    #[test]
    fn raw_render_is_single_line_json() {
        let out = render(&example(), OutputFormat::Raw).expect("raw render should work");
        assert!(!out.contains('\n'));
    }

    #[test]
    fn table_render_for_object_lists_keys() {
        let out = render(&example(), OutputFormat::Table).expect("table render should work");
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("key"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(out.contains("requester, worker"));
        assert!(lines.iter().any(|l| l.starts_with("context") && l.trim_end().ends_with('-')));
    }

    #[test]
    fn empty_list_renders_placeholder() {
        let rows: Vec<Example> = Vec::new();
        assert_eq!(render(&rows, OutputFormat::Table).unwrap(), "(no rows)");
    }
}
