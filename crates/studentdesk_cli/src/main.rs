//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `studentdesk_core` linkage without the Flutter runtime.
//! - Dump or export the student table from the configured database.
//!
//! Usage: `studentdesk_cli [list [QUERY] | export [DIR]]`

use std::process::ExitCode;
use studentdesk_core::{
    export_students, filter_records, init_logging_from_config, DeskConfig, DirectoryDownloadSink,
    SnapshotOrder, SqliteStudentCollection,
};

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = DeskConfig::from_env();
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    println!("studentdesk_core ping={}", studentdesk_core::ping());
    println!("studentdesk_core version={}", studentdesk_core::core_version());

    let result = match args.first().map(String::as_str) {
        None => Ok(()),
        Some("list") => list(&config, args.get(1).map(String::as_str).unwrap_or("")),
        Some("export") => export(&config, args.get(1).map(String::as_str)),
        Some(other) => Err(format!("unknown command `{other}`; expected list|export")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn list(config: &DeskConfig, query: &str) -> Result<(), String> {
    let collection = SqliteStudentCollection::open(&config.db_path).map_err(|err| err.to_string())?;
    let records = collection
        .list(SnapshotOrder::newest_first())
        .map_err(|err| err.to_string())?;
    let visible = filter_records(&records, query);

    let json = serde_json::to_string_pretty(&visible).map_err(|err| err.to_string())?;
    println!("{json}");
    println!("students shown={} total={}", visible.len(), records.len());
    Ok(())
}

fn export(config: &DeskConfig, dir: Option<&str>) -> Result<(), String> {
    let collection = SqliteStudentCollection::open(&config.db_path).map_err(|err| err.to_string())?;
    let records = collection
        .list(SnapshotOrder::newest_first())
        .map_err(|err| err.to_string())?;
    let sink = match dir {
        Some(dir) => DirectoryDownloadSink::new(dir),
        None => DirectoryDownloadSink::new(config.export_dir.clone()),
    };

    let path = export_students(&records, &sink).map_err(|err| err.to_string())?;
    println!("exported rows={} path={}", records.len(), path.display());
    Ok(())
}
