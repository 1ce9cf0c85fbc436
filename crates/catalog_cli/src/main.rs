//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `catalog_core` wiring end to end: config, logging, storage.
//! - Print live row counts per table in a stable `key=value` format.
//!
//! Usage: `catalog_cli [config.toml]`

use catalog_core::{
    open_with_config, Category, CoreConfig, Entity, Grouping, Item, RepoResult, SubUnit,
    UnitOfWork,
};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("catalog_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = CoreConfig::load(config_path.as_deref()).map_err(|err| err.to_string())?;
    catalog_core::init_logging(&config.logging).map_err(|err| err.to_string())?;

    println!("catalog_core ping={}", catalog_core::ping());
    println!("catalog_core version={}", catalog_core::core_version());

    let conn = open_with_config(&config.database).map_err(|err| err.to_string())?;
    let uow = UnitOfWork::new(conn);
    print_live_count::<Category>(&uow).map_err(|err| err.to_string())?;
    print_live_count::<Item>(&uow).map_err(|err| err.to_string())?;
    print_live_count::<Grouping>(&uow).map_err(|err| err.to_string())?;
    print_live_count::<SubUnit>(&uow).map_err(|err| err.to_string())?;
    uow.dispose().map_err(|err| err.to_string())?;

    log::info!("event=cli_smoke module=cli status=ok");
    Ok(())
}

fn print_live_count<T: Entity>(uow: &UnitOfWork) -> RepoResult<()> {
    let live = uow.repo::<T>()?.count(false)?;
    println!("{}_live={live}", T::TABLE);
    Ok(())
}
