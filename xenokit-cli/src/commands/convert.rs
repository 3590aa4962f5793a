//! CLI interface for multi-file conversion
//!
//! Inputs are classified by magic. Any number of LEX files merge into one
//! model; at most one XTX, JNT and ARX file may be given per run.
use std::path::{Path, PathBuf};

use anyhow::Context;
use xenokit::formats::jnt::read_jnt;
use xenokit::prelude::*;

/// Options for one `convert` run.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub decode: DecodeOptions,
    /// Write OBJ/MTL instead of GLB.
    pub obj: bool,
    /// Decode without writing anything.
    pub simulate: bool,
    pub output_dir: Option<PathBuf>,
}

impl ConvertOptions {
    /// Build options from an optional JSON config, with `--strict` on top.
    pub fn load(
        config: Option<&Path>,
        strict: bool,
        obj: bool,
        simulate: bool,
        output_dir: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let decode = match config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                DecodeOptions::from_json(&json)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => DecodeOptions::default(),
        };
        Ok(Self {
            decode: if strict { decode.with_strict(true) } else { decode },
            obj,
            simulate,
            output_dir,
        })
    }

    /// Where an output derived from `input` goes: `input` + `suffix`,
    /// relocated into the output directory when one is set.
    pub fn output_path(&self, input: &Path, suffix: &str) -> PathBuf {
        let mut name = input.file_name().unwrap_or(input.as_os_str()).to_owned();
        name.push(suffix);
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => input.with_file_name(name),
        }
    }
}

/// Inputs of one run, grouped by kind.
#[derive(Debug, Default)]
pub struct Inputs {
    pub lex: Vec<PathBuf>,
    pub xtx: Option<PathBuf>,
    pub jnt: Option<PathBuf>,
    pub arx: Option<PathBuf>,
}

fn set_once(slot: &mut Option<PathBuf>, kind: FileKind, path: &Path) -> xenokit::Result<()> {
    if slot.is_some() {
        return Err(Error::DuplicateInput {
            kind: kind.name(),
            path: path.to_path_buf(),
        });
    }
    *slot = Some(path.to_path_buf());
    Ok(())
}

/// Sort input files by detected kind. Unknown files are skipped with a warning.
pub fn classify(files: &[PathBuf]) -> xenokit::Result<Inputs> {
    let mut inputs = Inputs::default();
    for path in files {
        let kind = FileKind::detect(path)?;
        tracing::info!("{kind} file {}", path.display());
        match kind {
            FileKind::Lex => inputs.lex.push(path.clone()),
            FileKind::Xtx => set_once(&mut inputs.xtx, kind, path)?,
            FileKind::Jnt => set_once(&mut inputs.jnt, kind, path)?,
            FileKind::Arx => set_once(&mut inputs.arx, kind, path)?,
            FileKind::Unknown => tracing::warn!("Ignoring unknown file {}", path.display()),
        }
    }
    Ok(inputs)
}

pub fn execute(files: &[PathBuf], options: &ConvertOptions) -> anyhow::Result<()> {
    let inputs = classify(files)?;
    let mut diag = Diagnostics::new(options.decode);
    let write = !options.simulate;

    if let Some(dir) = options.output_dir.as_ref().filter(|_| write) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let texture = inputs
        .xtx
        .as_deref()
        .map(|path| read_xtx(path).with_context(|| format!("failed to parse XTX {}", path.display())))
        .transpose()?;

    let mut model = Model::new();
    for path in &inputs.lex {
        let summary = read_lex(path, &mut model, texture.as_ref(), &mut diag)
            .with_context(|| format!("failed to parse LEX {}", path.display()))?;
        println!("{}: {} tris", path.display(), summary.triangles);
    }

    if let Some(path) = &inputs.arx {
        let data = read_arx(path)
            .with_context(|| format!("failed to decompress ARX {}", path.display()))?;
        if write {
            let out = options.output_path(path, "_uncomp");
            std::fs::write(&out, &data)?;
            println!("Wrote {}", out.display());
        }
    }

    if write {
        write_outputs(&inputs, &model, texture.as_ref(), options, &mut diag)?;
    }

    if let Some(path) = &inputs.jnt {
        match read_jnt(path) {
            Ok(jnt) => {
                let tree = jnt.render_tree();
                print!("{}", tree.text);
                println!("{} leaves", tree.leaves);
            }
            Err(e) => tracing::error!("Failed to parse JNT {}: {e}", path.display()),
        }
    }

    let anomalies = diag.anomalies().len();
    if anomalies > 0 {
        println!("{anomalies} anomalies reported (see warnings above)");
    }
    Ok(())
}

fn write_outputs(
    inputs: &Inputs,
    model: &Model,
    texture: Option<&Texture>,
    options: &ConvertOptions,
    diag: &mut Diagnostics,
) -> anyhow::Result<()> {
    let xtx_name = inputs.xtx.as_deref().map(|p| p.to_string_lossy().into_owned());

    if let Some(lex) = inputs.lex.first() {
        if options.obj {
            write_obj(options.output_path(lex, ".obj"), model, xtx_name.as_deref())?;
        } else {
            write_glb(options.output_path(lex, ".glb"), model, xtx_name.as_deref())?;
        }
    }

    if let (Some(xtx), Some(texture)) = (&inputs.xtx, texture) {
        let composite = if model.materials().is_empty() {
            None
        } else {
            Some(apply_palettes(texture, model, diag)?)
        };
        write_texture_pngs(options.output_path(xtx, ""), texture, composite.as_deref())?;
    }
    Ok(())
}
