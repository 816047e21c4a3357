//! Geometry validation for loaded collections.

use chainage_core::models::Geometry;
use chainage_core::{ChainageError, Result};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }
}

/// Validate a geometry
pub fn validate_geometry(geometry: &Geometry) -> ValidationResult {
    let mut result = ValidationResult::valid();
    match geometry {
        Geometry::Point { coordinates } => {
            check_coord("Point", *coordinates, &mut result);
        }
        Geometry::LineString { coordinates } => {
            validate_line_string("LineString", coordinates, &mut result);
        }
        Geometry::Polygon { coordinates } => {
            validate_rings("Polygon", coordinates, &mut result);
        }
        Geometry::MultiPoint { coordinates } => {
            for (i, coord) in coordinates.iter().enumerate() {
                check_coord(&format!("MultiPoint[{}]", i), *coord, &mut result);
            }
        }
        Geometry::MultiLineString { coordinates } => {
            for (i, line) in coordinates.iter().enumerate() {
                validate_line_string(&format!("MultiLineString[{}]", i), line, &mut result);
            }
        }
        Geometry::MultiPolygon { coordinates } => {
            for (i, rings) in coordinates.iter().enumerate() {
                validate_rings(&format!("MultiPolygon[{}]", i), rings, &mut result);
            }
        }
    }
    result
}

fn check_coord(location: &str, coord: [f64; 2], result: &mut ValidationResult) {
    if !coord[0].is_finite() || !coord[1].is_finite() {
        result.add_error(location.to_string(), "Coordinates must be finite".to_string());
    }
}

fn validate_line_string(location: &str, coords: &[[f64; 2]], result: &mut ValidationResult) {
    if coords.len() < 2 {
        result.add_error(
            location.to_string(),
            format!("LineString must have at least 2 points, found {}", coords.len()),
        );
        return;
    }

    for (i, coord) in coords.iter().enumerate() {
        check_coord(&format!("{}[{}]", location, i), *coord, result);
    }
}

fn validate_rings(location: &str, rings: &[Vec<[f64; 2]>], result: &mut ValidationResult) {
    if rings.is_empty() {
        result.add_error(location.to_string(), "Polygon must have an exterior ring".to_string());
        return;
    }

    for (i, ring) in rings.iter().enumerate() {
        let ring_location = if i == 0 {
            format!("{} exterior", location)
        } else {
            format!("{} interior[{}]", location, i - 1)
        };

        if ring.len() < 4 {
            result.add_error(
                ring_location.clone(),
                format!("Ring must have at least 4 points, found {}", ring.len()),
            );
            continue;
        }

        if ring.first() != ring.last() {
            result.add_error(
                ring_location.clone(),
                "Ring must be closed (first point == last point)".to_string(),
            );
        }

        for (j, coord) in ring.iter().enumerate() {
            check_coord(&format!("{}[{}]", ring_location, j), *coord, result);
        }
    }
}

/// Validate a geometry, failing with the first problem found.
///
/// `location` names the feature being checked so errors point back to it.
pub fn ensure_valid(location: &str, geometry: &Geometry) -> Result<()> {
    let result = validate_geometry(geometry);
    if result.is_valid {
        return Ok(());
    }

    let first = &result.errors[0];
    Err(ChainageError::InvalidGeometry {
        location: format!("{}: {}", location, first.location),
        reason: first.reason.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        let result = validate_geometry(&Geometry::point(1.0, 2.0));
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_non_finite_point() {
        let result = validate_geometry(&Geometry::point(f64::NAN, 2.0));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_short_line_string() {
        let result = validate_geometry(&Geometry::line_string(vec![[0.0, 0.0]]));
        assert!(!result.is_valid);
        assert!(result.errors[0].reason.contains("at least 2 points"));
    }

    #[test]
    fn test_unclosed_ring() {
        let result = validate_geometry(&Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
        ]]));
        assert!(!result.is_valid);
        assert!(result.errors[0].reason.contains("closed"));
    }

    #[test]
    fn test_ensure_valid_names_the_location() {
        let bad = Geometry::line_string(vec![[0.0, 0.0]]);
        let err = ensure_valid("routes/17", &bad).unwrap_err();
        assert!(err.to_string().contains("routes/17"));
    }
}
