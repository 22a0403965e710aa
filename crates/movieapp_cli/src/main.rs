//! Catalog report entry point.
//!
//! # Responsibility
//! - Resolve configuration from the environment and start logging.
//! - Open (and migrate) the catalog database.
//! - Print catalog statistics and per-year counts as JSON.

mod config;

use config::CliConfig;
use log::info;
use movieapp_core::db::open_db;
use movieapp_core::{
    core_version, init_logging, MovieService, MovieStatistics, MovieYearCount,
    SqliteMovieRepository,
};
use serde::Serialize;
use std::error::Error;
use std::process::ExitCode;

#[derive(Debug, Serialize)]
struct CatalogReport {
    version: &'static str,
    statistics: MovieStatistics,
    year_min: i16,
    count_min: i64,
    years: Vec<MovieYearCount>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("movieapp: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CliConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }

    let mut conn = open_db(&config.db_path)?;
    let service = MovieService::new(SqliteMovieRepository::try_new(&mut conn)?);
    let report = CatalogReport {
        version: core_version(),
        statistics: service.get_statistics()?,
        year_min: config.year_min,
        count_min: config.count_min,
        years: service.get_count_movie_by_year(config.year_min, config.count_min)?,
    };
    info!(
        "event=cli_report module=cli status=ok movie_count={} year_rows={}",
        report.statistics.count,
        report.years.len()
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
