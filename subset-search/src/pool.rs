use std::sync::Arc;

use crossbeam::channel::unbounded;
use threadpool::ThreadPool;

/// Apply `job` to every item on a thread pool.
/// The output keeps the order of `items`; `None` marks a job whose
/// result never came back because it panicked.
pub(crate) fn par_map<I, T, F>(items: Vec<I>, num_threads: usize, job: Arc<F>) -> Vec<Option<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> T + Send + Sync + 'static,
{
    let n = items.len();
    let pool = ThreadPool::new(num_threads.max(1));

    let (ch_res_s, ch_res_r) = unbounded();
    for (i, item) in items.into_iter().enumerate() {
        let ch_res_s = ch_res_s.clone();
        let job = job.clone();
        pool.execute(move || {
            let out = job(item);
            // the receiver is alive until every sender is gone
            let _ = ch_res_s.send((i, out));
        });
    }
    drop(ch_res_s);

    let mut results: Vec<Option<T>> = (0..n).map(|_| None).collect();
    while let Ok((i, out)) = ch_res_r.recv() {
        results[i] = Some(out);
    }

    results
}
