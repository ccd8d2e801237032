//! Minimal CLI: contract → (generate | check)
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// turn an annotated API contract into Django REST framework sources
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse a contract and write serializers.py / views.py / urls.py
    Generate(GenerateOut),
    /// run the whole pipeline without writing anything
    Check(CheckOnly),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// contract document; .yaml/.yml parse as YAML, everything else as JSON
    input: PathBuf,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory root
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// dotted package path under the base directory (e.g. myproject.api)
    #[arg(long)]
    package: Option<String>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckOnly {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let contract = crate::load::load_document(&target.input_settings.input)?;
                let units = crate::render::render_units(&contract)?;

                let outdir = prepare_package_dir(&target.base_dir, target.package.as_deref())?;
                write_unit(&outdir, "serializers.py", &units.serializers)?;
                write_unit(&outdir, "views.py", &units.views)?;
                write_unit(&outdir, "urls.py", &units.urls)?;
                info!(outdir = %outdir.display(), "generated sources written");
                Ok(())
            }
            Command::Check(target) => {
                let contract = crate::load::load_document(&target.input_settings.input)?;
                let _units = crate::render::render_units(&contract)?;
                println!(
                    "ok: {} definition(s), {} path(s)",
                    contract.definitions.len(),
                    contract.paths.len(),
                );
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Creates the base directory, then one nested directory per dotted package
/// component, touching an `__init__.py` in each. Returns the innermost
/// directory that the units are written into.
fn prepare_package_dir(base_dir: &Path, package: Option<&str>) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(base_dir)
        .with_context(|| format!("failed to create {}", base_dir.display()))?;
    let mut outdir = base_dir.to_path_buf();
    if let Some(package) = package {
        for part in package.split('.') {
            outdir.push(part);
            std::fs::create_dir_all(&outdir)
                .with_context(|| format!("failed to create {}", outdir.display()))?;
            let init = outdir.join("__init__.py");
            if !init.exists() {
                std::fs::write(&init, "")
                    .with_context(|| format!("failed to write {}", init.display()))?;
            }
        }
    }
    Ok(outdir)
}

fn write_unit(outdir: &Path, name: &str, text: &str) -> anyhow::Result<()> {
    let path = outdir.join(name);
    std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))
}
