//! Maps parsed CLI commands to their handlers and resolves the process
//! exit code: `0` success, `1` invalid input, `2` I/O error, `3` partial.

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::commands::{analyze, carve, modules};
use crate::config::Config;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_INVALID_INPUT: i32 = 1;
pub const EXIT_IO_ERROR: i32 = 2;
pub const EXIT_PARTIAL: i32 = 3;

pub fn run(cli: Cli) -> Result<i32> {
    let config = match Config::load_from(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("failed to load config, using defaults: {e}");
            Config::default()
        }
    };

    match cli.command {
        Commands::Carve {
            dump,
            output,
            per_type_cap,
            workers,
            convert,
            converter_path,
        } => carve::run(
            &dump,
            output,
            per_type_cap,
            workers,
            convert,
            converter_path,
            &config,
            cli.quiet,
        ),

        Commands::Analyze { dump } => analyze::run(&dump),

        Commands::Modules { dump } => modules::run(&dump),

        Commands::Configure {
            output_root,
            workers,
            per_type_cap,
            convert,
            show,
        } => {
            let mut config = config;

            if show {
                println!("output_root: {:?}", config.output_root);
                println!("workers: {:?}", config.workers);
                println!("per_type_cap: {:?}", config.per_type_cap);
                println!("convert: {}", config.convert);
                if let Ok(path) = Config::config_path() {
                    println!("config file: {}", path.display());
                }
                return Ok(EXIT_SUCCESS);
            }

            let mut changed = false;
            if let Some(root) = output_root {
                config.output_root = Some(root);
                changed = true;
            }
            if let Some(w) = workers {
                config.workers = Some(w);
                changed = true;
            }
            if let Some(cap) = per_type_cap {
                config.per_type_cap = Some(cap);
                changed = true;
            }
            if let Some(c) = convert {
                config.convert = c;
                changed = true;
            }

            if changed {
                config.save()?;
                println!("configuration saved");
                if let Ok(path) = Config::config_path() {
                    println!("config file: {}", path.display());
                }
            } else {
                println!("nothing to configure; pass --show or one of the option flags");
            }
            Ok(EXIT_SUCCESS)
        }
    }
}
