use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const HEADER: &str = "caller,method,force,params";

/// Writes a request CSV with the given data rows to a temp file.
pub fn requests_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

/// A `createCar` row whose params are positional.
pub fn create_car_row(caller: &str, key: &str, owner: &str) -> String {
    format!(
        r#"{},createCar,false,"[""{}"",""Toyota"",""Corolla"",""Blue"",""{}""]""#,
        caller, key, owner
    )
}

pub fn generate_csv(path: &Path, rows: usize, callers: usize) -> Result<(), Error> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", HEADER)?;

    for i in 1..=rows {
        let caller = format!("caller{}", i % callers);
        writeln!(file, "{}", create_car_row(&caller, &format!("car{}", i), &caller))?;
    }

    file.flush()?;
    Ok(())
}

/// Splits the CLI output into `[caller, method, status, reference]` rows.
pub fn result_rows(stdout: &[u8]) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_reader(stdout);
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}
