//! CLI interface for printing file summaries
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use xenokit::formats::arx::ArxHeader;
use xenokit::formats::jnt::read_jnt;
use xenokit::prelude::*;

pub fn execute(file: &Path) -> anyhow::Result<()> {
    let kind = FileKind::detect(file)?;
    println!("{}: {kind}", file.display());

    match kind {
        FileKind::Lex => inspect_lex(file),
        FileKind::Xtx => {
            let texture = read_xtx(file)?;
            println!("  page:      {}x{}", texture.width, texture.height);
            println!("  used area: {}x{}", texture.max_x, texture.max_y);
            Ok(())
        }
        FileKind::Jnt => {
            let jnt = read_jnt(file)?;
            println!("  name:   {}", jnt.header.name);
            println!("  blocks: {}", jnt.blocks.len());
            let tree = jnt.render_tree();
            print!("{}", tree.text);
            println!("  leaves: {}", tree.leaves);
            Ok(())
        }
        FileKind::Arx => {
            let header = ArxHeader::read(&mut BufReader::new(File::open(file)?))
                .with_context(|| format!("failed to read ARX header of {}", file.display()))?;
            println!("  original size:   {}", header.size_orig);
            println!("  compressed size: {}", header.size_comp);
            Ok(())
        }
        FileKind::Unknown => anyhow::bail!("unrecognized file type: {}", file.display()),
    }
}

fn inspect_lex(file: &Path) -> anyhow::Result<()> {
    let mut model = Model::new();
    let mut diag = Diagnostics::default();
    let summary = read_lex(file, &mut model, None, &mut diag)?;

    println!("  name:      {}", model.name);
    println!("  meshes:    {}", summary.meshes);
    for mesh in &model.meshes {
        println!(
            "    {:<32} {:>5} tris  weights={}",
            mesh.name,
            mesh.triangles.len(),
            mesh.weight_format
        );
    }
    println!("  triangles: {}", summary.triangles);
    println!("  vertices:  {}", model.vertices().len());
    println!("  materials: {}", model.materials().len());
    println!("  bones:     {}", model.bones().len());
    for anomaly in diag.anomalies() {
        println!("  anomaly:   {anomaly}");
    }
    Ok(())
}
