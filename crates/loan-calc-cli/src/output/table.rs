use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go in a Field/Value table; schedule rows, option
/// lists and sensitivity matrices get tables of their own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            print_object(res_map);
            if let Some(Value::Array(matrix)) = res_map.get("matrix") {
                print_matrix(res_map, matrix);
            }
        }
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Scalars as Field/Value rows, then each array of objects as its own table.
fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut scalar_rows = 0;
    for (key, val) in map {
        if is_object_list(val) || key == "matrix" {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(val)]);
        scalar_rows += 1;
    }
    if scalar_rows > 0 {
        println!("{}", Table::from(builder));
    }

    for (key, val) in map {
        if let Value::Array(arr) = val {
            if is_object_list(val) {
                println!("\n{}:", key);
                print_array_table(arr);
            }
        }
    }
}

fn is_object_list(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if arr.first().is_some_and(Value::is_object))
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

/// Rows labelled by variable 1, columns by variable 2.
fn print_matrix(res_map: &Map<String, Value>, matrix: &[Value]) {
    let row_labels = res_map.get("variable_1_values").and_then(Value::as_array);
    let col_labels = res_map.get("variable_2_values").and_then(Value::as_array);
    let (Some(row_labels), Some(col_labels)) = (row_labels, col_labels) else {
        return;
    };

    let corner = format!(
        "{} \\ {}",
        res_map.get("variable_1_name").map(format_value).unwrap_or_default(),
        res_map.get("variable_2_name").map(format_value).unwrap_or_default()
    );

    let mut builder = Builder::default();
    let mut header = vec![corner];
    header.extend(col_labels.iter().map(format_value));
    builder.push_record(header);

    for (label, row) in row_labels.iter().zip(matrix) {
        let mut record = vec![format_value(label)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_value));
        }
        builder.push_record(record);
    }

    println!("\n{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
