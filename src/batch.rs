//! Parallel batch reduction.
//!
//! Input lines are spread over a rayon pool. Every worker reduces with its
//! own [`Engine`], so no cell pool is ever touched by two threads.

use crate::engine::Engine;
use crate::pool::PoolConfig;
use crate::reduction::ReductionConfig;
use crate::schema::ReductionRecord;
use rayon::prelude::*;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub workers: usize,
    pub pool: PoolConfig,
    pub reduction: ReductionConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            workers: num_cpus::get(),
            pool: PoolConfig::default(),
            reduction: ReductionConfig::default(),
        }
    }
}

/// Summary counts over a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub terms: usize,
    pub normal_forms: usize,
    pub errors: usize,
    pub fatal: usize,
}

impl BatchStats {
    pub fn of(records: &[ReductionRecord]) -> Self {
        records.iter().fold(BatchStats::default(), |mut stats, r| {
            stats.terms += 1;
            stats.normal_forms += r.normal_form as usize;
            stats.errors += r.is_error() as usize;
            stats.fatal += r.fatal as usize;
            stats
        })
    }
}

/// Reduce every term line of `lines`, returning records in input order.
///
/// Blank lines and lines starting with `#` are skipped but still count
/// towards line numbers.
pub fn run_batch<S>(
    lines: &[S],
    config: &BatchConfig,
) -> Result<Vec<ReductionRecord>, ThreadPoolBuildError>
where
    S: AsRef<str> + Sync,
{
    let workers = config.workers.max(1);
    let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;

    let jobs: Vec<(usize, &str)> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| (i + 1, line.as_ref().trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect();
    info!(terms = jobs.len(), workers, "starting batch");

    let records: Vec<ReductionRecord> = pool.install(|| {
        jobs.par_iter()
            .map_init(
                || Engine::with_config(config.pool.clone(), config.reduction.clone()),
                |engine, &(line, input)| match engine.reduce_text(input) {
                    Ok(outcome) => ReductionRecord::reduced(line, input, outcome),
                    Err(err) => {
                        if err.is_fatal() {
                            warn!(line, error = %err, "resource exhaustion while reducing");
                        } else if err.is_syntax() {
                            debug!(line, error = %err, "term rejected");
                        } else {
                            warn!(line, error = %err, "reduction failed");
                        }
                        ReductionRecord::failed(line, input, &err)
                    }
                },
            )
            .collect()
    });

    let stats = BatchStats::of(&records);
    info!(
        terms = stats.terms,
        normal_forms = stats.normal_forms,
        errors = stats.errors,
        "batch finished"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduction::StopReason;

    fn config(workers: usize) -> BatchConfig {
        BatchConfig {
            workers,
            ..BatchConfig::default()
        }
    }

    #[test]
    fn test_records_in_input_order() {
        let lines = vec![
            "# identity".to_string(),
            "((L 1.1) 7)".to_string(),
            String::new(),
            "((L 1.(1 1)) (L 1.(1 1)))".to_string(),
            "(L 1.".to_string(),
            "(((L 1.(L 2.(1 (1 2)))) 5) 6)".to_string(),
        ];

        let records = run_batch(&lines, &config(4)).unwrap();
        let numbers: Vec<usize> = records.iter().map(|r| r.line).collect();
        assert_eq!(numbers, vec![2, 4, 5, 6]);

        assert_eq!(records[0].result.as_deref(), Some("7"));
        assert!(records[0].normal_form);

        assert_eq!(records[1].stop, Some(StopReason::StepLimit));
        assert_eq!(records[1].steps, 1000);

        assert!(records[2].is_error());
        assert!(!records[2].fatal);

        assert_eq!(records[3].result.as_deref(), Some("(5 (5 6))"));

        let stats = BatchStats::of(&records);
        assert_eq!(
            stats,
            BatchStats {
                terms: 4,
                normal_forms: 2,
                errors: 1,
                fatal: 0
            }
        );
    }

    #[test]
    fn test_single_worker_matches_many() {
        let lines: Vec<String> = (0..20)
            .map(|n| format!("((L 1.(L 2.(1 2))) {})", n))
            .collect();
        let one = run_batch(&lines, &config(1)).unwrap();
        let many = run_batch(&lines, &config(8)).unwrap();
        assert_eq!(one, many);
        assert_eq!(one.len(), 20);
    }

    #[test]
    fn test_zero_workers_clamped() {
        let records = run_batch(&["1"], &config(0)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].steps, 0);
    }
}
