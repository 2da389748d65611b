//! STL (Stereolithography) reading and writing.
//!
//! Both ASCII and binary STL are read; the format is detected from the
//! content rather than the extension:
//! - binary files are exactly `84 + 50 * n` bytes long, where `n` is the
//!   little-endian triangle count stored after the 80-byte header
//! - anything else starting with `solid` is parsed as ASCII
//!
//! Facet normals are ignored; orientation comes from vertex winding.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::MeshError;
use crate::math::intersect_3d::{triangle_normal, Triangle};
use crate::math::{Point3, Vector3};

use super::Solid;

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Reads the triangles of an STL file.
///
/// # Errors
///
/// Returns [`MeshError::FileNotFound`] if the file does not exist,
/// [`MeshError::Io`] if it cannot be read and [`MeshError::Parse`] if the
/// content is not valid STL.
pub fn read_stl(path: &Path) -> Result<Vec<Triangle>, MeshError> {
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            MeshError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            MeshError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_stl(&bytes).map_err(|message| MeshError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parses STL content held in memory.
///
/// # Errors
///
/// Returns a description of the first problem found.
pub fn parse_stl(bytes: &[u8]) -> Result<Vec<Triangle>, String> {
    if let Some(count) = binary_triangle_count(bytes) {
        return Ok(parse_binary(bytes, count));
    }
    let looks_ascii = bytes
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take(5)
        .eq(b"solid".iter());
    if looks_ascii {
        let text = std::str::from_utf8(bytes).map_err(|e| format!("not UTF-8: {e}"))?;
        return parse_ascii(text);
    }
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(format!("file too small to be valid STL ({} bytes)", bytes.len()));
    }
    Err("binary STL size does not match its triangle count".into())
}

/// Triangle count when `bytes` has the exact size of a binary STL.
fn binary_triangle_count(bytes: &[u8]) -> Option<usize> {
    let count_bytes: [u8; 4] = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?.try_into().ok()?;
    let count = u32::from_le_bytes(count_bytes) as usize;
    let expected = count.checked_mul(TRIANGLE_SIZE)?.checked_add(HEADER_SIZE + 4)?;
    (expected == bytes.len()).then_some(count)
}

fn parse_binary(bytes: &[u8], count: usize) -> Vec<Triangle> {
    bytes[HEADER_SIZE + 4..]
        .chunks_exact(TRIANGLE_SIZE)
        .take(count)
        // Skip the 12-byte normal, then three 12-byte vertices.
        .map(|chunk| {
            [
                read_vertex(&chunk[12..24]),
                read_vertex(&chunk[24..36]),
                read_vertex(&chunk[36..48]),
            ]
        })
        .collect()
}

fn read_vertex(buf: &[u8]) -> Point3 {
    let c = |i: usize| f64::from(f32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]));
    Point3::new(c(0), c(4), c(8))
}

fn parse_ascii(text: &str) -> Result<Vec<Triangle>, String> {
    let mut triangles = Vec::new();
    let mut corners: Vec<Point3> = Vec::with_capacity(3);
    let mut in_loop = false;

    for (line_no, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };
        match keyword.to_ascii_lowercase().as_str() {
            "outer" => {
                in_loop = true;
                corners.clear();
            }
            "vertex" if in_loop => {
                let coords: Vec<f64> = parts
                    .take(3)
                    .map(str::parse)
                    .collect::<Result<_, _>>()
                    .map_err(|e| format!("line {}: bad vertex coordinate: {e}", line_no + 1))?;
                let &[x, y, z] = &coords[..] else {
                    return Err(format!("line {}: vertex needs three coordinates", line_no + 1));
                };
                corners.push(Point3::new(x, y, z));
            }
            "endloop" => {
                in_loop = false;
                let &[a, b, c] = &corners[..] else {
                    return Err(format!(
                        "line {}: facet has {} vertices, expected 3",
                        line_no + 1,
                        corners.len()
                    ));
                };
                triangles.push([a, b, c]);
            }
            "endsolid" => break,
            _ => {}
        }
    }

    Ok(triangles)
}

/// Writes a solid as binary STL.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_stl(solid: &Solid, path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);

    let mut header = [b' '; HEADER_SIZE];
    let text = format!("cavityfit {}", solid.name());
    let len = text.len().min(HEADER_SIZE);
    header[..len].copy_from_slice(&text.as_bytes()[..len]);
    writer.write_all(&header)?;

    let count = u32::try_from(solid.triangle_count())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many triangles for STL"))?;
    writer.write_all(&count.to_le_bytes())?;

    for tri in solid.iter_triangles() {
        let normal = triangle_normal(&tri).unwrap_or_else(Vector3::zeros);
        write_f32s(&mut writer, normal.x, normal.y, normal.z)?;
        for v in &tri {
            write_f32s(&mut writer, v.x, v.y, v.z)?;
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }

    writer.flush()
}

#[allow(clippy::cast_possible_truncation)]
fn write_f32s<W: Write>(writer: &mut W, x: f64, y: f64, z: f64) -> io::Result<()> {
    writer.write_all(&(x as f32).to_le_bytes())?;
    writer.write_all(&(y as f32).to_le_bytes())?;
    writer.write_all(&(z as f32).to_le_bytes())
}
