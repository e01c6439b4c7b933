use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use pc_ascii::color::ColorLevel;
use pc_ascii::compositor::Compositor;
use pc_core::config::{ConvertConfig, load_config};
use pc_source::terminal::CrosstermTerminal;

pub mod batch;
pub mod cli;
pub mod pipeline;
pub mod player;

/// Nom du fichier de configuration cherché dans le répertoire personnel.
const HOME_CONFIG: &str = ".picscii.toml";

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .init();

    if cli.formats {
        println!("{}", batch::formats_text());
        return Ok(());
    }

    // 3. Valider les entrées
    cli.validate_inputs()?;

    // 4. Charger la config, puis les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply(&mut config)?;
    config.validate()?;
    batch::check_save_dirs(&config)?;

    // 5. Police, seulement si une sortie image est demandée
    let font = if config.save_img.is_some() || config.save_gif.is_some() {
        Some(pc_export::load_font(config.font_path.as_deref())?)
    } else {
        None
    };

    // 6. Chaîne de conversion + pool
    let compositor = Compositor::new(&config, ColorLevel::detect(), &CrosstermTerminal)?;
    let pool = pipeline::BoundedPool::with_host_parallelism()?;
    let ctx = batch::RunContext {
        compositor: &compositor,
        pool: &pool,
        font: font.as_ref(),
    };

    // 7. Une entrée à la fois ; seule une erreur de configuration arrête tout
    let mut failed = 0usize;
    let mut stdout = std::io::stdout().lock();
    for input in &cli.inputs {
        if let Err(e) = batch::process_input(input, &ctx, &mut stdout) {
            if batch::aborts_run(&e) {
                return Err(e);
            }
            eprintln!("Error: {e:#}");
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{failed}/{} entrée(s) en échec", cli.inputs.len());
    }
    Ok(())
}

/// Resolve config: `--config` first, then `~/.picscii.toml`, else defaults.
fn resolve_config(cli: &cli::Cli) -> Result<ConvertConfig> {
    if let Some(path) = &cli.config {
        return load_config(path);
    }
    match dirs::home_dir().map(|home| home.join(HOME_CONFIG)) {
        Some(path) if path.is_file() => {
            log::debug!("config: {}", path.display());
            load_config(&path)
        }
        other => {
            let shown = other.unwrap_or_else(|| PathBuf::from(HOME_CONFIG));
            log::debug!("Config introuvable : {}. Utilisation des défauts.", shown.display());
            Ok(ConvertConfig::default())
        }
    }
}
