use clap::Subcommand;
use std::path::PathBuf;

pub mod arx;
pub mod convert;
pub mod inspect;

#[derive(Subcommand)]
pub enum Commands {
    /// Convert LEX/XTX/JNT/ARX inputs in one run
    Convert {
        /// Input files, classified by their magic
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write OBJ/MTL instead of GLB
        #[arg(long)]
        obj: bool,

        /// Decode only, write nothing
        #[arg(short, long)]
        simulate: bool,

        /// Fail on inconsistencies that are normally tolerated
        #[arg(long)]
        strict: bool,

        /// JSON file with decode options
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decompress an ARX archive
    Arx {
        /// ARX file
        file: PathBuf,

        /// Output file (default: <file>_uncomp)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a summary of a single file
    Inspect {
        /// File to inspect
        file: PathBuf,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Convert {
                files,
                obj,
                simulate,
                strict,
                config,
                output,
            } => {
                let options = convert::ConvertOptions::load(
                    config.as_deref(),
                    *strict,
                    *obj,
                    *simulate,
                    output.clone(),
                )?;
                convert::execute(files, &options)
            }
            Commands::Arx { file, output } => arx::execute(file, output.as_deref()),
            Commands::Inspect { file } => inspect::execute(file),
        }
    }
}
