//! Wavefront OBJ/MTL export
//!
//! Every pool vertex is written as a `v`/`vt`/`vn` triple so a single index
//! addresses all three. Faces whose first vertex has a zero normal sum are
//! written without a normal reference.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::page_image_names;
use crate::error::Result;
use crate::model::Model;

/// Write the OBJ geometry, referencing the material library `mtl_name`.
pub fn write_obj_geometry<W: Write>(writer: &mut W, model: &Model, mtl_name: &str) -> Result<()> {
    writeln!(writer, "mtllib {mtl_name}")?;

    let vertices = model.vertices();
    for v in vertices {
        let [x, y, z] = v.position;
        let [u, tv] = v.uv;
        let [nx, ny, nz] = v.normal;
        writeln!(writer, "v {x:.9} {y:.9} {z:.9}")?;
        writeln!(writer, "vt {u:.9} {tv:.9}")?;
        writeln!(writer, "vn {nx:.9} {ny:.9} {nz:.9}")?;
    }

    let mut current_material = None;
    for mesh in &model.meshes {
        writeln!(writer, "o {}", mesh.name)?;
        for tri in &mesh.triangles {
            if current_material != Some(tri.material) {
                current_material = Some(tri.material);
                writeln!(writer, "usemtl material_{}", tri.material)?;
            }

            let [a, b, c] = tri.indices.map(|i| i + 1);
            let without_normal = vertices
                .get_index(tri.indices[0])
                .is_some_and(|v| v.normal.iter().sum::<f32>() == 0.0);
            if without_normal {
                writeln!(writer, "f {a}/{a}/ {b}/{b}/ {c}/{c}/")?;
            } else {
                writeln!(writer, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
            }
        }
    }
    Ok(())
}

/// Write the material library.
///
/// Textured materials get a `map_Kd` line when `xtx_path` names the page
/// the PNG exporter wrote.
pub fn write_mtl<W: Write>(writer: &mut W, model: &Model, xtx_path: Option<&str>) -> Result<()> {
    let images = xtx_path.map(page_image_names);
    for (i, material) in model.materials().iter().enumerate() {
        let [r, g, b, _] = material.color.diffuse();
        writeln!(writer, "newmtl material_{i}")?;
        writeln!(writer, "Kd {r:.9} {g:.9} {b:.9}")?;
        if let Some((rgb, palette)) = images.as_ref().filter(|_| material.has_texture) {
            let map = if material.is_indexed() { palette } else { rgb };
            writeln!(writer, "map_Kd {map}")?;
        }
    }
    Ok(())
}

/// Write `obj_path` and a material library beside it with the `.mtl`
/// extension.
pub fn write_obj<P: AsRef<Path>>(obj_path: P, model: &Model, xtx_path: Option<&str>) -> Result<()> {
    let obj_path = obj_path.as_ref();
    let mtl_path = obj_path.with_extension("mtl");
    let mtl_name = mtl_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut obj = BufWriter::new(File::create(obj_path)?);
    write_obj_geometry(&mut obj, model, &mtl_name)?;
    obj.flush()?;
    tracing::info!("Wrote {}", obj_path.display());

    let mut mtl = BufWriter::new(File::create(&mtl_path)?);
    write_mtl(&mut mtl, model, xtx_path)?;
    mtl.flush()?;
    tracing::info!("Wrote {}", mtl_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Material, Mesh, Triangle, Vertex};
    use pretty_assertions::assert_eq;

    fn model() -> Model {
        let mut model = Model::new();
        let textured = model.add_material(Material {
            has_texture: true,
            palette: Material::DIRECT_RGBA,
            ..Material::default()
        });
        let plain = model.add_material(Material {
            palette: 0x01,
            ..Material::default()
        });

        let indices = [0.0f32, 1.0, 2.0, 3.0].map(|x| {
            let mut v = Vertex::unweighted();
            v.position = [x, 0.0, 0.0];
            v.normal = if x == 0.0 { [0.0; 3] } else { [0.0, 1.0, 0.0] };
            model.add_vertex(v)
        });
        model.meshes.push(Mesh {
            name: "00/body/root".into(),
            weight_format: 0,
            triangles: vec![
                Triangle {
                    indices: [0, 1, 2],
                    material: textured,
                },
                Triangle {
                    indices: [indices[1], indices[3], indices[2]],
                    material: plain,
                },
            ],
        });
        model
    }

    #[test]
    fn test_obj_text() {
        let mut out = Vec::new();
        write_obj_geometry(&mut out, &model(), "kosmos.lex.mtl").unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "mtllib kosmos.lex.mtl");
        assert_eq!(lines[1], "v 0.000000000 0.000000000 0.000000000");
        assert_eq!(lines[13], "o 00/body/root");
        assert_eq!(lines[14], "usemtl material_0");
        assert_eq!(lines[15], "f 1/1/ 2/2/ 3/3/");
        assert_eq!(lines[16], "usemtl material_1");
        assert_eq!(lines[17], "f 2/2/2 4/4/4 3/3/3");
    }

    #[test]
    fn test_mtl_maps() {
        let mut out = Vec::new();
        write_mtl(&mut out, &model(), Some("tex/kosmos.xtx")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "newmtl material_0\n\
             Kd 0.000000000 0.000000000 0.000000000\n\
             map_Kd kosmos.xtx_RGB.png\n\
             newmtl material_1\n\
             Kd 0.000000000 0.000000000 0.000000000\n"
        );

        let mut out = Vec::new();
        write_mtl(&mut out, &model(), None).unwrap();
        assert!(!String::from_utf8(out).unwrap().contains("map_Kd"));
    }

    #[test]
    fn test_write_obj_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kosmos.lex.obj");
        write_obj(&path, &model(), None).unwrap();
        assert!(path.exists());
        assert!(dir.path().join("kosmos.lex.mtl").exists());
    }
}
