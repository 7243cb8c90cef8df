use nalgebra::Matrix3;
use xtalopt_core::core::crystal::CrystalBody;
use xtalopt_core::core::geometry::Cell;

pub fn cubic(a: f64) -> Cell {
    Cell::new(Matrix3::new(a, 0.0, 0.0, 0.0, a, 0.0, 0.0, 0.0, a))
}

/// A small rocksalt-like seed body: 4 Na + 4 Cl at well-separated fractional sites.
pub fn rocksalt_like(a: f64) -> CrystalBody {
    use nalgebra::Vector3;
    let mut body = CrystalBody::new(cubic(a));
    for i in 0..4 {
        body.add_atom(11, Vector3::new(i as f64 * 0.2, 0.0, 0.0));
    }
    for i in 0..4 {
        body.add_atom(17, Vector3::new(i as f64 * 0.2, a / 2.0, a / 2.0));
    }
    body
}
