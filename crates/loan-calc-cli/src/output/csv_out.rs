use serde_json::{Map, Value};
use std::io;

type CsvWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Schedules write one record per payment, sensitivity grids one record per
/// rate; anything else is written as field,value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => {
                if let Some(Value::Array(rows)) = result.get("rows") {
                    write_array_csv(&mut wtr, rows);
                } else if let Some(Value::Array(matrix)) = result.get("matrix") {
                    write_matrix_csv(&mut wtr, result, matrix);
                } else {
                    write_fields_csv(&mut wtr, result);
                }
            }
            _ => write_object_lists_csv(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields_csv(wtr: &mut CsvWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

/// Lookup tables: each list is written with a leading `list` column.
fn write_object_lists_csv(wtr: &mut CsvWriter<'_>, map: &Map<String, Value>) {
    let lists: Vec<(&String, &Vec<Value>)> = map
        .iter()
        .filter_map(|(k, v)| v.as_array().map(|a| (k, a)))
        .filter(|(_, a)| a.first().is_some_and(Value::is_object))
        .collect();

    if lists.is_empty() {
        write_fields_csv(wtr, map);
        return;
    }

    for (name, items) in lists {
        let Some(Value::Object(first)) = items.first() else {
            continue;
        };
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let mut header_row = vec!["list"];
        header_row.extend(&headers);
        let _ = wtr.write_record(&header_row);

        for item in items {
            if let Value::Object(obj) = item {
                let mut row = vec![name.clone()];
                row.extend(
                    headers
                        .iter()
                        .map(|h| obj.get(*h).map(format_csv_value).unwrap_or_default()),
                );
                let _ = wtr.write_record(&row);
            }
        }
    }
}

fn write_array_csv(wtr: &mut CsvWriter<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn write_matrix_csv(wtr: &mut CsvWriter<'_>, result: &Map<String, Value>, matrix: &[Value]) {
    let row_labels = result.get("variable_1_values").and_then(Value::as_array);
    let col_labels = result.get("variable_2_values").and_then(Value::as_array);
    let (Some(row_labels), Some(col_labels)) = (row_labels, col_labels) else {
        return;
    };

    let mut header = vec![result
        .get("variable_1_name")
        .map(format_csv_value)
        .unwrap_or_default()];
    header.extend(col_labels.iter().map(format_csv_value));
    let _ = wtr.write_record(&header);

    for (label, row) in row_labels.iter().zip(matrix) {
        let mut record = vec![format_csv_value(label)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_csv_value));
        }
        let _ = wtr.write_record(&record);
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
