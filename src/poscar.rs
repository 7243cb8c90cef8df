//! VASP POSCAR reading and writing (spec §6): seed structures in, objective-
//! oracle input out.
//!
//! Grounded on the teacher's [`crate::engine::external::gulp::GulpEvaluator::generate_input`]
//! (element-ordered, fractional-coordinate text generation for an external
//! process) and `parse_geometry` (line-oriented numeric parsing of an
//! external tool's coordinate block), adapted to the POSCAR format rather
//! than a GULP deck.

use nalgebra::{Matrix3, Vector3};

use crate::core::crystal::{Atom, CrystalBody};
use crate::core::geometry::Cell;
use crate::error::{Result, XtalError};

/// Write `body` as a POSCAR block (direct/fractional coordinates, grouped and
/// counted by species in first-encounter order) with `comment` as its title
/// line.
pub fn write_poscar(body: &CrystalBody, comment: &str) -> String {
    let mut species_order: Vec<u32> = Vec::new();
    for atom in &body.atoms {
        if !species_order.contains(&atom.atomic_number) {
            species_order.push(atom.atomic_number);
        }
    }

    let mut s = String::new();
    s.push_str(comment);
    s.push('\n');
    s.push_str("1.0\n");
    let (v1, v2, v3) = body.cell.vectors();
    for v in [v1, v2, v3] {
        s.push_str(&format!("{:.9} {:.9} {:.9}\n", v.x, v.y, v.z));
    }

    let symbols: Vec<String> = species_order.iter().map(|z| z.to_string()).collect();
    s.push_str(&symbols.join(" "));
    s.push('\n');

    let counts: Vec<String> = species_order
        .iter()
        .map(|z| body.atoms.iter().filter(|a| a.atomic_number == *z).count().to_string())
        .collect();
    s.push_str(&counts.join(" "));
    s.push('\n');

    s.push_str("Direct\n");
    for &z in &species_order {
        for atom in body.atoms.iter().filter(|a| a.atomic_number == z) {
            let f = body.cell.cart_to_frac(&atom.position);
            s.push_str(&format!("{:.9} {:.9} {:.9}\n", f.x, f.y, f.z));
        }
    }
    s
}

/// Read a seed structure from a POSCAR block. `species_by_symbol` resolves
/// the symbol line's tokens (e.g. `"Na"`, `"11"`) to atomic numbers; callers
/// typically pass a small lookup built from their settings. Scale factors on
/// line 2 are applied uniformly; selective dynamics and velocities are
/// ignored (not needed for a seed geometry).
pub fn read_poscar(text: &str, species_by_symbol: impl Fn(&str) -> Option<u32>) -> Result<CrystalBody> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 8 {
        return Err(XtalError::ConfigError("POSCAR too short to contain a structure".into()));
    }

    let scale: f64 = lines[1]
        .trim()
        .parse()
        .map_err(|_| XtalError::ConfigError("POSCAR scale factor is not a number".into()))?;

    let parse_vec = |line: &str| -> Result<Vector3<f64>> {
        let parts: Vec<f64> = line
            .split_whitespace()
            .map(|t| t.parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| XtalError::ConfigError(format!("POSCAR lattice line is not numeric: {line:?}")))?;
        if parts.len() != 3 {
            return Err(XtalError::ConfigError(format!("POSCAR lattice line needs 3 components: {line:?}")));
        }
        Ok(Vector3::new(parts[0], parts[1], parts[2]) * scale)
    };
    let v1 = parse_vec(lines[2])?;
    let v2 = parse_vec(lines[3])?;
    let v3 = parse_vec(lines[4])?;
    let cell = Cell::new(Matrix3::from_rows(&[v1.transpose(), v2.transpose(), v3.transpose()]));

    let symbols: Vec<&str> = lines[5].split_whitespace().collect();
    let counts: Vec<usize> = lines[6]
        .split_whitespace()
        .map(|t| t.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| XtalError::ConfigError("POSCAR species-count line is not numeric".into()))?;
    if symbols.len() != counts.len() {
        return Err(XtalError::ConfigError(
            "POSCAR species line and count line have different lengths".into(),
        ));
    }

    let mode_line = lines[7].trim().to_ascii_lowercase();
    let is_direct = mode_line.starts_with('d') || mode_line.starts_with('s') && lines.len() > 8 && {
        lines[8].trim().to_ascii_lowercase().starts_with('d')
    };
    let coord_start = if mode_line.starts_with('s') { 9 } else { 8 };

    let mut body = CrystalBody::new(cell);
    let mut idx = coord_start;
    for (symbol, &count) in symbols.iter().zip(counts.iter()) {
        let z = species_by_symbol(symbol)
            .ok_or_else(|| XtalError::ConfigError(format!("unknown POSCAR species symbol {symbol:?}")))?;
        for _ in 0..count {
            let line = lines
                .get(idx)
                .ok_or_else(|| XtalError::ConfigError("POSCAR ended before all atoms were read".into()))?;
            let parts: Vec<f64> = line
                .split_whitespace()
                .take(3)
                .map(|t| t.parse::<f64>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| XtalError::ConfigError(format!("POSCAR coordinate line is not numeric: {line:?}")))?;
            if parts.len() != 3 {
                return Err(XtalError::ConfigError(format!("POSCAR coordinate line needs 3 components: {line:?}")));
            }
            let coords = Vector3::new(parts[0], parts[1], parts[2]);
            let cart = if is_direct {
                body.cell.frac_to_cart(&coords)
            } else {
                coords * scale
            };
            body.atoms.push(Atom { atomic_number: z, position: cart });
            idx += 1;
        }
    }
    Ok(body)
}
