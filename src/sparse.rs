//! Dense 3-vectors, block-diagonal 3x3 matrices, and a CSR matrix of 3x3
//! blocks — the linear-algebra substrate the cloth solver assembles into
//! and the PCG solver consumes.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::geom::{Mat33, Vec3};

/// Dense array of per-node 3-vectors (positions, velocities, forces, ...).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DenseVec3 {
    data: Vec<Vec3>,
}

impl DenseVec3 {
    pub fn zeros(n: usize) -> Self {
        DenseVec3 { data: vec![Vec3::zero(); n] }
    }

    pub fn from_vec(data: Vec<Vec3>) -> Self {
        DenseVec3 { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[Vec3] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Vec3] {
        &mut self.data
    }

    pub fn dot(&self, other: &DenseVec3) -> f32 {
        self.data.iter().zip(other.data.iter()).map(|(a, b)| a.dot(*b)).sum()
    }

    pub fn add(&self, other: &DenseVec3) -> DenseVec3 {
        DenseVec3 {
            data: self.data.iter().zip(other.data.iter()).map(|(a, b)| *a + *b).collect(),
        }
    }

    pub fn sub(&self, other: &DenseVec3) -> DenseVec3 {
        DenseVec3 {
            data: self.data.iter().zip(other.data.iter()).map(|(a, b)| *a - *b).collect(),
        }
    }

    pub fn scale(&self, f: f32) -> DenseVec3 {
        DenseVec3 { data: self.data.iter().map(|a| a.scale(f)).collect() }
    }

    pub fn axpy(&self, alpha: f32, other: &DenseVec3) -> DenseVec3 {
        DenseVec3 {
            data: self.data.iter().zip(other.data.iter()).map(|(a, b)| *a + b.scale(alpha)).collect(),
        }
    }
}

impl std::ops::Index<usize> for DenseVec3 {
    type Output = Vec3;
    fn index(&self, i: usize) -> &Vec3 {
        &self.data[i]
    }
}

impl std::ops::IndexMut<usize> for DenseVec3 {
    fn index_mut(&mut self, i: usize) -> &mut Vec3 {
        &mut self.data[i]
    }
}

/// Array of n 3x3 blocks, interpreted as a block-diagonal matrix.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiagMat33 {
    blocks: Vec<Mat33>,
}

impl DiagMat33 {
    pub fn zeros(n: usize) -> Self {
        DiagMat33 { blocks: vec![Mat33::zero(); n] }
    }

    pub fn from_blocks(blocks: Vec<Mat33>) -> Self {
        DiagMat33 { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn as_slice(&self) -> &[Mat33] {
        &self.blocks
    }

    pub fn as_mut_slice(&mut self) -> &mut [Mat33] {
        &mut self.blocks
    }

    pub fn mul_dense(&self, v: &DenseVec3) -> DenseVec3 {
        DenseVec3 {
            data: self.blocks.iter().zip(v.as_slice()).map(|(m, x)| m.mul_vec3(*x)).collect(),
        }
    }

    /// Per-block inverse; singular blocks invert to zero (used as the
    /// preconditioner fallback for fully constrained nodes).
    pub fn inverse(&self) -> DiagMat33 {
        DiagMat33 {
            blocks: self.blocks.iter().map(|m| m.inverse().unwrap_or_else(Mat33::zero)).collect(),
        }
    }
}

impl std::ops::Index<usize> for DiagMat33 {
    type Output = Mat33;
    fn index(&self, i: usize) -> &Mat33 {
        &self.blocks[i]
    }
}

impl std::ops::IndexMut<usize> for DiagMat33 {
    fn index_mut(&mut self, i: usize) -> &mut Mat33 {
        &mut self.blocks[i]
    }
}

/// A sparse matrix of 3x3 blocks in compressed-row-storage form.
///
/// `cols` within a single row are strictly ascending; this is an
/// invariant relied on by [`SparseMat33::assemble_diagonal`] and
/// [`SparseMat33::add`], not merely a convention.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMat33 {
    rows: usize,
    cols: usize,
    values: Vec<Mat33>,
    col_idx: Vec<u32>,
    row_ptrs: Vec<u32>,
}

impl SparseMat33 {
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_cols(&self) -> usize {
        self.cols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_ptrs(&self) -> &[u32] {
        &self.row_ptrs
    }

    pub fn col_idx(&self) -> &[u32] {
        &self.col_idx
    }

    pub fn values(&self) -> &[Mat33] {
        &self.values
    }

    /// Writes the dense expansion of `row` into `out[0..num_cols()]`.
    ///
    /// The source bounded this with `row < M + 1`, silently permitting a
    /// one-past-the-end read; this implementation requires `row < M`.
    pub fn assemble_row(&self, row: usize, out: &mut [Mat33]) -> Result<(), Error> {
        if row >= self.rows {
            return Err(Error::InternalInconsistency {
                invariant: "assemble_row requires row < num_rows",
            });
        }
        if out.len() != self.cols {
            return Err(Error::InternalInconsistency {
                invariant: "assemble_row output width must equal num_cols",
            });
        }
        for slot in out.iter_mut() {
            *slot = Mat33::zero();
        }
        let start = self.row_ptrs[row] as usize;
        let end = self.row_ptrs[row + 1] as usize;
        for k in start..end {
            out[self.col_idx[k] as usize] = self.values[k];
        }
        Ok(())
    }

    /// Extracts the diagonal blocks; requires a square matrix. Relies on
    /// the sorted-column invariant to stop scanning a row once the
    /// column index passes the diagonal.
    pub fn assemble_diagonal(&self) -> Result<DiagMat33, Error> {
        if self.rows != self.cols {
            return Err(Error::InternalInconsistency { invariant: "assemble_diagonal requires a square matrix" });
        }
        let mut out = DiagMat33::zeros(self.rows);
        for row in 0..self.rows {
            let start = self.row_ptrs[row] as usize;
            let end = self.row_ptrs[row + 1] as usize;
            for k in start..end {
                let col = self.col_idx[k] as usize;
                if col == row {
                    out[row] = self.values[k];
                    break;
                }
                if col > row {
                    break;
                }
            }
        }
        Ok(out)
    }

    /// `out[row] = sum over k in row of values[k] * v[cols[k]]`.
    pub fn multiply(&self, v: &DenseVec3) -> Result<DenseVec3, Error> {
        if v.len() != self.cols {
            return Err(Error::InternalInconsistency { invariant: "multiply operand width must equal num_cols" });
        }
        let mut out = DenseVec3::zeros(self.rows);
        for row in 0..self.rows {
            let start = self.row_ptrs[row] as usize;
            let end = self.row_ptrs[row + 1] as usize;
            let mut acc = Vec3::zero();
            for k in start..end {
                acc = acc + self.values[k].mul_vec3(v[self.col_idx[k] as usize]);
            }
            out[row] = acc;
        }
        Ok(out)
    }

    /// Sums two same-shape sparse matrices via a proper sorted merge of
    /// each pair of rows, accumulating on column collisions. This
    /// replaces the source's fused add, which advanced its column
    /// cursors using value-array indices where it needed column values
    /// (and vice versa) and only held up for diagonal-only operands.
    pub fn add(&self, other: &SparseMat33) -> Result<SparseMat33, Error> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(Error::InternalInconsistency { invariant: "add requires matching shapes" });
        }
        let mut values = Vec::with_capacity(self.nnz() + other.nnz());
        let mut col_idx = Vec::with_capacity(self.nnz() + other.nnz());
        let mut row_ptrs = Vec::with_capacity(self.rows + 1);
        row_ptrs.push(0u32);

        for row in 0..self.rows {
            let (mut ai, a_end) = (self.row_ptrs[row] as usize, self.row_ptrs[row + 1] as usize);
            let (mut bi, b_end) = (other.row_ptrs[row] as usize, other.row_ptrs[row + 1] as usize);
            while ai < a_end && bi < b_end {
                let ca = self.col_idx[ai];
                let cb = other.col_idx[bi];
                match ca.cmp(&cb) {
                    std::cmp::Ordering::Less => {
                        col_idx.push(ca);
                        values.push(self.values[ai]);
                        ai += 1;
                    }
                    std::cmp::Ordering::Greater => {
                        col_idx.push(cb);
                        values.push(other.values[bi]);
                        bi += 1;
                    }
                    std::cmp::Ordering::Equal => {
                        col_idx.push(ca);
                        values.push(self.values[ai].add(&other.values[bi]));
                        ai += 1;
                        bi += 1;
                    }
                }
            }
            while ai < a_end {
                col_idx.push(self.col_idx[ai]);
                values.push(self.values[ai]);
                ai += 1;
            }
            while bi < b_end {
                col_idx.push(other.col_idx[bi]);
                values.push(other.values[bi]);
                bi += 1;
            }
            row_ptrs.push(values.len() as u32);
        }

        Ok(SparseMat33 { rows: self.rows, cols: self.cols, values, col_idx, row_ptrs })
    }

    pub fn scale(&self, f: f32) -> SparseMat33 {
        SparseMat33 {
            rows: self.rows,
            cols: self.cols,
            values: self.values.iter().map(|m| m.scale(f)).collect(),
            col_idx: self.col_idx.clone(),
            row_ptrs: self.row_ptrs.clone(),
        }
    }

    pub fn negate(&self) -> SparseMat33 {
        self.scale(-1.0)
    }

    /// Builds the diagonal-only matrix `diag` as a `SparseMat33`, for
    /// combining with Jacobian contributions via [`SparseMat33::add`].
    pub fn from_diag(diag: &DiagMat33) -> SparseMat33 {
        let n = diag.len();
        let values = diag.as_slice().to_vec();
        let col_idx: Vec<u32> = (0..n as u32).collect();
        let row_ptrs: Vec<u32> = (0..=n as u32).collect();
        SparseMat33 { rows: n, cols: n, values, col_idx, row_ptrs }
    }
}

/// Accumulates block contributions keyed by `(row, col)` and finalizes
/// into sorted CSR form. Used by force assembly, where several springs
/// incident on the same node contribute to the same diagonal block.
#[derive(Default)]
pub struct SparseMat33Builder {
    rows: usize,
    cols: usize,
    entries: BTreeMap<(u32, u32), Mat33>,
}

impl SparseMat33Builder {
    pub fn new(rows: usize, cols: usize) -> Self {
        SparseMat33Builder { rows, cols, entries: BTreeMap::new() }
    }

    pub fn add_block(&mut self, row: usize, col: usize, block: Mat33) {
        let key = (row as u32, col as u32);
        let entry = self.entries.entry(key).or_insert_with(Mat33::zero);
        *entry = entry.add(&block);
    }

    pub fn build(self) -> SparseMat33 {
        let mut values = Vec::with_capacity(self.entries.len());
        let mut col_idx = Vec::with_capacity(self.entries.len());
        let mut row_ptrs = vec![0u32; self.rows + 1];

        for (&(row, col), block) in self.entries.iter() {
            values.push(*block);
            col_idx.push(col);
            row_ptrs[row as usize + 1] += 1;
        }
        for i in 1..row_ptrs.len() {
            row_ptrs[i] += row_ptrs[i - 1];
        }

        SparseMat33 { rows: self.rows, cols: self.cols, values, col_idx, row_ptrs }
    }
}
