/// A contiguous slice of the record index space handed to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    /// Worker identifier, also used to name the worker's output file
    pub rank: usize,
    /// First record index (inclusive)
    pub start: usize,
    /// Number of records
    pub size: usize,
}

impl Job {
    pub fn new(rank: usize, start: usize, size: usize) -> Self {
        Job { rank, start, size }
    }

    /// Record indices covered by this job; empty for a zero-size job.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.size
    }
}

/// Splits `domain_size` records into `world_size` contiguous jobs.
///
/// Every worker receives `domain_size / world_size` records and the last one
/// also takes the remainder. With more workers than records, the first
/// `domain_size` workers get one record each and the rest get empty jobs.
/// Sizes always sum to `domain_size`.
pub fn decompose(domain_size: usize, world_size: usize) -> Vec<Job> {
    (0..world_size)
        .map(|rank| decompose_domain(domain_size, rank, world_size))
        .collect()
}

/// Computes the job of a single worker, see [`decompose`].
pub fn decompose_domain(domain_size: usize, world_rank: usize, world_size: usize) -> Job {
    if world_size > domain_size {
        return if world_rank < domain_size {
            Job::new(world_rank, world_rank, 1)
        } else {
            Job::new(world_rank, domain_size, 0)
        };
    }

    let base = domain_size / world_size;
    let mut size = base;
    if world_rank == world_size - 1 {
        size += domain_size % world_size;
    }
    Job::new(world_rank, base * world_rank, size)
}
