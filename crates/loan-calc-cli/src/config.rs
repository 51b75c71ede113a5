use std::path::Path;
use tracing::debug;

use loan_calc_core::options::LoanOptions;

use crate::input;

/// Built-in options, or the lookup tables from a JSON / YAML file.
pub fn load_options(path: Option<&str>) -> Result<LoanOptions, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(LoanOptions::default());
    };

    let is_yaml = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let options: LoanOptions = if is_yaml {
        input::file::read_yaml(path)?
    } else {
        input::file::read_json(path)?
    };
    options.validate()?;

    debug!(
        path,
        purposes = options.purposes.len(),
        frequencies = options.repayment_periods.len(),
        terms = options.term_months.len(),
        "loaded loan options"
    );
    Ok(options)
}
