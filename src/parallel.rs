use anyhow::{Context, Result};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, warn};

pub fn par_map<T, R, F>(
    items: &[T],
    cores: Option<usize>,
    context: &'static str,
    f: F,
) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    let run = || items.par_iter().map(&f).collect::<Vec<R>>();
    match worker_count(cores, items.len()) {
        Some(threads) => {
            debug!("{context}: {} tasks on {threads} threads", items.len());
            let pool = ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context(context)?;
            Ok(pool.install(run))
        }
        None => Ok(run()),
    }
}

pub fn worker_count(cores: Option<usize>, tasks: usize) -> Option<usize> {
    let cores = cores?;
    let capped = cores.clamp(1, tasks.max(1));
    if cores > capped {
        warn!("Requested {cores} threads for {tasks} tasks; using {capped}");
    }
    Some(capped)
}
