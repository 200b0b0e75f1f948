//! Dense named per-vertex scalar columns.
//!
//! The measurement passes write their outputs (distortion, depth) into
//! columns identified by name; the surrounding application owns the
//! storage and maps it to its metric/shape files.

use folia_types::{FoliaError, FoliaResult};

use crate::topology::TopologyHelper;

/// A set of per-vertex float columns, all of the same length.
#[derive(Debug, Clone, Default)]
pub struct ScalarColumns {
    vertex_count: usize,
    names: Vec<String>,
    values: Vec<Vec<f32>>,
}

impl ScalarColumns {
    /// Create an empty column set for `vertex_count` vertices.
    pub fn new(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            names: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Number of vertices each column covers.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.values.len()
    }

    /// Append a zero-initialized column, returning its index.
    pub fn add_column(&mut self, name: &str) -> usize {
        self.names.push(name.to_string());
        self.values.push(vec![0.0; self.vertex_count]);
        self.values.len() - 1
    }

    /// Index of the column with the given name, if present.
    pub fn column_by_name(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Column name.
    pub fn name(&self, column: usize) -> &str {
        &self.names[column]
    }

    /// Read one value.
    #[inline]
    pub fn value(&self, vertex: usize, column: usize) -> f32 {
        self.values[column][vertex]
    }

    /// Write one value.
    #[inline]
    pub fn set_value(&mut self, vertex: usize, column: usize, value: f32) {
        self.values[column][vertex] = value;
    }

    /// Whole column as a slice.
    pub fn column(&self, column: usize) -> &[f32] {
        &self.values[column]
    }

    /// Whole column, mutable.
    pub fn column_mut(&mut self, column: usize) -> &mut [f32] {
        &mut self.values[column]
    }

    /// Neighbor-average smoothing of one column in place.
    ///
    /// Each iteration: `value = (1 - strength) * value + strength *
    /// mean(neighbor values)`. Vertices without neighbors keep their
    /// value.
    pub fn smooth_average_neighbors(
        &mut self,
        column: usize,
        strength: f32,
        iterations: u32,
        topology: &TopologyHelper,
    ) -> FoliaResult<()> {
        if topology.vertex_count() != self.vertex_count {
            return Err(FoliaError::AttributeLengthMismatch {
                expected: self.vertex_count,
                actual: topology.vertex_count(),
            });
        }

        let inverse = 1.0 - strength;
        let mut scratch = vec![0.0f32; self.vertex_count];
        for _ in 0..iterations {
            {
                let current = &self.values[column];
                for v in 0..self.vertex_count {
                    let neighbors = topology.neighbors(v);
                    if neighbors.is_empty() {
                        scratch[v] = current[v];
                        continue;
                    }
                    let sum: f32 = neighbors.iter().map(|&n| current[n as usize]).sum();
                    let mean = sum / neighbors.len() as f32;
                    scratch[v] = inverse * current[v] + strength * mean;
                }
            }
            self.values[column].copy_from_slice(&scratch);
        }
        Ok(())
    }
}
