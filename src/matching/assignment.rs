use pathfinding::kuhn_munkres::{kuhn_munkres, Weights};

/// 0/1 compatibility matrix, padded to a square.
struct PairingMatrix {
    data: Vec<Vec<i64>>,
    size: usize,
}

impl Weights<i64> for PairingMatrix {
    fn rows(&self) -> usize {
        self.size
    }

    fn columns(&self) -> usize {
        self.size
    }

    fn at(&self, row: usize, col: usize) -> i64 {
        self.data[row][col]
    }

    fn neg(&self) -> Self {
        let data = self
            .data
            .iter()
            .map(|row| row.iter().map(|&v| -v).collect())
            .collect();
        Self { data, size: self.size }
    }
}

/// Largest one-to-one pairing between `rows` left items and `columns` right
/// items where `compatible(row, column)` holds. Pairs come back sorted by row.
///
/// The number of pairs does not depend on the order of either side.
pub fn max_pairing(rows: usize, columns: usize, compatible: impl Fn(usize, usize) -> bool) -> Vec<(usize, usize)> {
    let size = rows.max(columns);
    let mut data = vec![vec![0i64; size]; size];
    let mut any = false;
    for (r, row) in data.iter_mut().enumerate().take(rows) {
        for (c, cell) in row.iter_mut().enumerate().take(columns) {
            if compatible(r, c) {
                *cell = 1;
                any = true;
            }
        }
    }
    if !any {
        return Vec::new();
    }

    let matrix = PairingMatrix { data, size };
    let (_, assignments) = kuhn_munkres(&matrix);
    assignments
        .into_iter()
        .enumerate()
        .filter(|&(r, c)| r < rows && c < columns && matrix.data[r][c] == 1)
        .collect()
}
