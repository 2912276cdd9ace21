use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Receiver};
use log::{debug, error};

use crate::classify::{classify_job, ClassificationStats};
use crate::decompose::Job;
use crate::kv_store::RecordStore;
use crate::taxonomy::Taxonomy;

/// Output file of worker `rank`: `base` itself for a single worker, `base.<rank>` otherwise.
pub fn output_path(base: &Path, rank: usize, num_workers: usize) -> PathBuf {
    if num_workers <= 1 {
        return base.to_path_buf();
    }
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{}", rank));
    PathBuf::from(name)
}

/// Runs one worker per job against the shared taxonomy and record store.
///
/// All jobs are queued before any worker starts; each worker takes exactly
/// one job from the queue and writes its own output file. The call returns
/// only after every worker has finished, so `store` may be released as soon
/// as it returns. The first worker error aborts the others and is returned.
pub fn run_jobs<S>(
    jobs: Vec<Job>,
    taxonomy: &Taxonomy,
    store: &S,
    ranks: &[String],
    output_base: &Path,
) -> Result<ClassificationStats>
where
    S: RecordStore + ?Sized,
{
    let num_workers = jobs.len();
    if num_workers == 0 {
        return Ok(ClassificationStats::default());
    }

    let (job_sender, job_receiver) = bounded::<Job>(num_workers);
    for job in jobs {
        job_sender
            .send(job)
            .map_err(|_| anyhow!("job queue closed while dispatching"))?;
    }
    drop(job_sender);

    let (result_sender, result_receiver) = bounded(num_workers);
    let abort = AtomicBool::new(false);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .thread_name(|i| format!("lca-worker-{}", i))
        .build()
        .context("failed to build worker pool")?;

    pool.scope(|s| {
        for _ in 0..num_workers {
            let job_receiver = job_receiver.clone();
            let result_sender = result_sender.clone();
            let abort = &abort;

            s.spawn(move |_| {
                let result =
                    run_worker(&job_receiver, taxonomy, store, ranks, output_base, num_workers, abort);
                if result.is_err() {
                    abort.store(true, Ordering::Relaxed);
                }
                // The receiver outlives the scope, so this cannot fail.
                let _ = result_sender.send(result);
            });
        }
    });
    drop(result_sender);

    let mut totals = ClassificationStats::default();
    let mut first_error = None;
    for result in result_receiver.iter() {
        match result {
            Ok(stats) => totals.merge(&stats),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => error!("{:#}", e),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(totals),
    }
}

fn run_worker<S>(
    jobs: &Receiver<Job>,
    taxonomy: &Taxonomy,
    store: &S,
    ranks: &[String],
    output_base: &Path,
    num_workers: usize,
    abort: &AtomicBool,
) -> Result<ClassificationStats>
where
    S: RecordStore + ?Sized,
{
    let job = jobs
        .recv()
        .context("job queue drained before every worker received a job")?;

    let path = output_path(output_base, job.rank, num_workers);
    let file = File::create(&path)
        .with_context(|| format!("could not create output file {}", path.display()))?;
    let mut output = BufWriter::new(file);

    debug!(
        "Worker {} computing split from {} to {}",
        job.rank,
        job.start,
        job.start + job.size
    );
    let stats = classify_job(&job, taxonomy, store, ranks, &mut output, abort)
        .with_context(|| format!("worker {} failed writing {}", job.rank, path.display()))?;
    debug!("Worker {} done: {:?}", job.rank, stats);
    Ok(stats)
}
