//! @acp:module "Init Command"
//! @acp:summary "Create a generator config file"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `qgen init`: writes `.qgen.config.json` and the output folder.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

use crate::config::Config;
use crate::workbook::Subject;

/// Options for the init command
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Config file to write
    pub config_path: PathBuf,
    /// Force overwrite existing config
    pub force: bool,
    /// Curated workbook folder
    pub data_root: Option<PathBuf>,
    /// Output folder
    pub output_dir: Option<PathBuf>,
    /// Fixed sampling seed
    pub seed: Option<u64>,
    /// Skip interactive prompts
    pub yes: bool,
}

/// Execute the init command
pub fn execute_init(options: InitOptions) -> Result<()> {
    let config_path = &options.config_path;

    if config_path.exists() && !options.force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    let mut config = Config::default();

    let interactive = !options.yes
        && options.data_root.is_none()
        && options.output_dir.is_none()
        && options.seed.is_none();

    if interactive {
        run_interactive_init(&mut config)?;
    } else {
        apply_cli_options(&mut config, &options);
    }

    report_banks(&config.data_root);

    if !config.output_dir.exists() {
        std::fs::create_dir_all(&config.output_dir)?;
        println!(
            "{} Created {}/ directory",
            style("✓").green(),
            config.output_dir.display()
        );
    }

    config.save(config_path)?;
    println!("{} Created {}", style("✓").green(), config_path.display());

    println!("\n{}", style("Next steps:").bold());
    println!(
        "  1. Export {} (or put it in a .env file)",
        style(&config.llm.api_key_env).cyan()
    );
    println!(
        "  2. Run {} to preview examples",
        style("qgen fewshots --subject Math --curriculum GCSE --chapter 1 --topic ...").cyan()
    );
    println!(
        "  3. Run {} to generate questions",
        style("qgen generate ...").cyan()
    );

    Ok(())
}

fn run_interactive_init(config: &mut Config) -> Result<()> {
    println!("{} Question Generator Setup\n", style("→").cyan());
    let theme = ColorfulTheme::default();

    let data_root: String = Input::with_theme(&theme)
        .with_prompt("Folder with curated workbooks")
        .default(config.data_root.display().to_string())
        .interact_text()?;
    config.data_root = PathBuf::from(data_root);

    let output_dir: String = Input::with_theme(&theme)
        .with_prompt("Folder for generated workbooks")
        .default(config.output_dir.display().to_string())
        .interact_text()?;
    config.output_dir = PathBuf::from(output_dir);

    let reproducible = Confirm::with_theme(&theme)
        .with_prompt("Use a fixed sampling seed (reproducible example picks)?")
        .default(false)
        .interact()?;
    if reproducible {
        let seed: u64 = Input::with_theme(&theme)
            .with_prompt("Seed")
            .default(42)
            .interact_text()?;
        config.selection.seed = Some(seed);
    }

    config.header_detection.min_keyword_matches = if Confirm::with_theme(&theme)
        .with_prompt("Require two header keywords when locating science header rows?")
        .default(false)
        .interact()?
    {
        2
    } else {
        1
    };

    Ok(())
}

fn apply_cli_options(config: &mut Config, options: &InitOptions) {
    if let Some(root) = &options.data_root {
        config.data_root = root.clone();
    }
    if let Some(out) = &options.output_dir {
        config.output_dir = out.clone();
    }
    if options.seed.is_some() {
        config.selection.seed = options.seed;
    }
}

/// Show which subject folders exist under the data root
fn report_banks(root: &Path) {
    if !root.is_dir() {
        println!(
            "{} {} does not exist yet; add subject folders before generating",
            style("⚠").yellow(),
            root.display()
        );
        return;
    }

    let subjects = [Subject::Math, Subject::Physics, Subject::Chemistry];
    let found: Vec<&Subject> = subjects
        .iter()
        .filter(|s| root.join(s.folder()).is_dir())
        .collect();
    if found.is_empty() {
        println!("{} No subject folders found in {}", style("⚠").yellow(), root.display());
    } else {
        println!("{} Found banks:", style("✓").green());
        for subject in found {
            println!("    {}", style(subject).cyan());
        }
    }
}
