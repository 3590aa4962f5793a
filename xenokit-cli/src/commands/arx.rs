//! CLI interface for ARX decompression
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Default output path: the input with `_uncomp` appended.
pub fn default_output(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push("_uncomp");
    PathBuf::from(name)
}

pub fn execute(file: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let data = xenokit::formats::arx::read_arx(file)
        .with_context(|| format!("failed to decompress {}", file.display()))?;

    let output = output.map_or_else(|| default_output(file), Path::to_path_buf);
    std::fs::write(&output, &data)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote {} ({} bytes)", output.display(), data.len());
    Ok(())
}
