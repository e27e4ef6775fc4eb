use super::{Batch, BatchSize, Commit};

/// Split `commits` into consecutive batches of `size`, the last one holding
/// the remainder. Concatenating the batches gives back `commits` exactly.
pub fn plan(commits: &[Commit], size: BatchSize) -> Vec<Batch> {
    commits
        .chunks(size.get())
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            commits: chunk.to_vec(),
        })
        .collect()
}
