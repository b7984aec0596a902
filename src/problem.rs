//! The loop nest being mapped: domain, context, dependencies and vertices

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::ProblemConfig;
use crate::error::{ExploreError, ExploreResult};
use crate::matrix::IntMatrix;
use crate::parser::parse_matrices;
use crate::polyhedron::Polyhedron;

/// Validated inputs of one exploration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub dimensions: usize,
    pub parameters: usize,
    pub parameter_names: Vec<String>,
    /// Parameter values used for the instance BPP and PE count
    pub instantiation: Vec<i64>,
    /// Iteration domain over unknowns and parameters
    pub domain: Polyhedron,
    /// Constraints on the parameters alone (zero unknowns)
    pub context: Polyhedron,
    /// One dependency vector per row
    pub dependencies: IntMatrix,
    /// One extreme point of the domain per row
    pub vertices: IntMatrix,
}

impl Problem {
    /// Check every matrix against the declared dimensionality
    pub fn new(
        parameter_names: Vec<String>,
        instantiation: Vec<i64>,
        domain: Polyhedron,
        context: Polyhedron,
        dependencies: IntMatrix,
        vertices: IntMatrix,
    ) -> ExploreResult<Self> {
        let dimensions = domain.dimensions;
        let parameters = domain.parameters;

        if dimensions == 0 {
            return Err(ExploreError::input("Polyhedron must have at least one dimension"));
        }
        if parameter_names.len() != parameters || instantiation.len() != parameters {
            return Err(ExploreError::input(format!(
                "Expected {} parameter names and instantiations, got {} and {}",
                parameters,
                parameter_names.len(),
                instantiation.len()
            )));
        }
        if context.dimensions != 0 || context.parameters != parameters {
            return Err(ExploreError::input(
                "Context must constrain exactly the domain's parameters",
            ));
        }
        for (name, poly) in [("domain", &domain), ("context", &context)] {
            if let Some(c) = poly.constraints.iter().find(|c| c.coeffs.len() != poly.width()) {
                return Err(ExploreError::input(format!(
                    "A {} constraint has {} coefficients, expected {}",
                    name,
                    c.coeffs.len(),
                    poly.width()
                )));
            }
        }
        if dependencies.ncols() != dimensions {
            return Err(ExploreError::input(format!(
                "Number of columns in dependencies ({}) should equal number of dimensions ({})",
                dependencies.ncols(),
                dimensions
            )));
        }
        if vertices.ncols() != dimensions {
            return Err(ExploreError::input(format!(
                "Number of columns in vertices ({}) should equal number of dimensions ({})",
                vertices.ncols(),
                dimensions
            )));
        }

        Ok(Self {
            dimensions,
            parameters,
            parameter_names,
            instantiation,
            domain,
            context,
            dependencies,
            vertices,
        })
    }

    /// Load every file named by a problem configuration
    pub fn load(config: &ProblemConfig) -> ExploreResult<Self> {
        info!("Reading pip polyhedron: {}", config.constraints_path.display());
        let [domain, context]: [IntMatrix; 2] = read_matrices(&config.constraints_path, 2)?
            .try_into()
            .map_err(|_| ExploreError::input("Constraints file must hold domain and context"))?;
        let dependencies = read_single(&config.dependencies_path)?;
        let vertices = read_single(&config.vertices_path)?;

        let domain = Polyhedron::from_pip_matrix(&domain, config.dimensions, config.parameters)?;
        let context = Polyhedron::from_pip_matrix(&context, 0, config.parameters)?;

        Self::new(
            config.parameter_names.clone(),
            config.parameter_instantiations.clone(),
            domain,
            context,
            dependencies,
            vertices,
        )
    }
}

fn read_matrices(path: &Path, count: usize) -> ExploreResult<Vec<IntMatrix>> {
    let source = fs::read_to_string(path).map_err(|e| ExploreError::io(path, e))?;
    parse_matrices(&source, count)
}

fn read_single(path: &Path) -> ExploreResult<IntMatrix> {
    read_matrices(path, 1)?
        .pop()
        .ok_or_else(|| ExploreError::input(format!("No matrix in {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedron::Constraint;

    fn unit_square() -> Polyhedron {
        Polyhedron::new(
            2,
            0,
            vec![
                Constraint::inequality(vec![1, 0, 0]),
                Constraint::inequality(vec![-1, 0, 1]),
                Constraint::inequality(vec![0, 1, 0]),
                Constraint::inequality(vec![0, -1, 1]),
            ],
        )
    }

    #[test]
    fn test_valid_problem() {
        let deps = IntMatrix::from_rows(vec![vec![1, 0], vec![0, 1]]).unwrap();
        let verts = IntMatrix::from_rows(vec![vec![0, 0], vec![1, 1]]).unwrap();
        let problem = Problem::new(
            vec![],
            vec![],
            unit_square(),
            Polyhedron::new(0, 0, vec![]),
            deps,
            verts,
        )
        .unwrap();
        assert_eq!(problem.dimensions, 2);
        assert_eq!(problem.parameters, 0);
    }

    #[test]
    fn test_dependency_width_mismatch() {
        let deps = IntMatrix::from_rows(vec![vec![1, 0, 0]]).unwrap();
        let verts = IntMatrix::from_rows(vec![vec![0, 0]]).unwrap();
        let err = Problem::new(
            vec![],
            vec![],
            unit_square(),
            Polyhedron::new(0, 0, vec![]),
            deps,
            verts,
        )
        .unwrap_err();
        assert!(matches!(err, ExploreError::InputError { .. }));
    }

    #[test]
    fn test_vertex_width_mismatch() {
        let deps = IntMatrix::from_rows(vec![vec![1, 0]]).unwrap();
        let verts = IntMatrix::from_rows(vec![vec![0]]).unwrap();
        assert!(Problem::new(
            vec![],
            vec![],
            unit_square(),
            Polyhedron::new(0, 0, vec![]),
            deps,
            verts,
        )
        .is_err());
    }
}
