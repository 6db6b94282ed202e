//! Bounded worker pool over assets
//!
//! Every asset is an independent job. Jobs run on a dedicated `rayon` pool
//! sized to the configured thread count; a panic inside one job is caught at
//! the job boundary and recorded, and the remaining jobs carry on.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use lob_types::ids::{AssetCode, PeriodId};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use tracing::{error, info};

use crate::config::StockUniverse;
use crate::error::{BatchError, ConfigError};
use crate::locator::TickFileLocator;
use crate::orchestrator::AssetPipeline;
use crate::output::OutputSink;

/// One asset and the periods of its listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetJob {
    pub asset: AssetCode,
    pub periods: Vec<PeriodId>,
}

/// Jobs for every asset of the universe, or only those in `only` when it is
/// not empty. Assets come out in code order.
pub fn plan_jobs(
    universe: &StockUniverse,
    end_month: PeriodId,
    only: &[AssetCode],
) -> Result<Vec<AssetJob>, ConfigError> {
    universe
        .iter()
        .filter(|(code, _)| only.is_empty() || only.contains(code))
        .map(|(code, info)| {
            Ok(AssetJob {
                asset: code.clone(),
                periods: info.periods(end_month)?,
            })
        })
        .collect()
}

/// Final state of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssetStatus {
    Completed {
        snapshots: usize,
        bars: usize,
        processed_periods: usize,
        skipped_periods: usize,
        digest: String,
    },
    /// Aggregation succeeded but the sink failed.
    SinkFailed { reason: String },
    /// The pipeline returned an error or panicked.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    pub asset: AssetCode,
    #[serde(flatten)]
    pub status: AssetStatus,
}

/// Result of a whole batch, in asset code order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub assets: Vec<AssetSummary>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn completed(&self) -> usize {
        self.assets
            .iter()
            .filter(|a| matches!(a.status, AssetStatus::Completed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.assets.len() - self.completed()
    }

    pub fn get(&self, asset: &AssetCode) -> Option<&AssetStatus> {
        self.assets.iter().find(|a| &a.asset == asset).map(|a| &a.status)
    }
}

/// Runs asset jobs on a bounded pool.
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    threads: usize,
}

impl BatchRunner {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run every job and hand each output to `sink`. Output buffers are
    /// dropped as soon as the sink returns.
    pub fn run<L, S>(
        &self,
        pipeline: &AssetPipeline<L>,
        sink: &S,
        jobs: &[AssetJob],
    ) -> Result<BatchSummary, BatchError>
    where
        L: TickFileLocator,
        S: OutputSink + ?Sized,
    {
        let started = Instant::now();
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("lob-worker-{}", i))
            .build()?;

        info!(assets = jobs.len(), threads = self.threads, "Starting batch");
        let mut assets: Vec<AssetSummary> =
            pool.install(|| jobs.par_iter().map(|job| run_job(pipeline, sink, job)).collect());
        assets.sort_by(|a, b| a.asset.cmp(&b.asset));

        let summary = BatchSummary {
            assets,
            elapsed: started.elapsed(),
        };
        info!(
            completed = summary.completed(),
            failed = summary.failed(),
            ms = summary.elapsed.as_millis() as u64,
            "Batch finished"
        );
        Ok(summary)
    }
}

fn run_job<L, S>(pipeline: &AssetPipeline<L>, sink: &S, job: &AssetJob) -> AssetSummary
where
    L: TickFileLocator,
    S: OutputSink + ?Sized,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| match pipeline.run(&job.asset, &job.periods) {
        Ok(output) => match sink.write(&output) {
            Ok(()) => AssetStatus::Completed {
                snapshots: output.snapshots.len(),
                bars: output.bars.len(),
                processed_periods: output.report.processed(),
                skipped_periods: output.report.skipped(),
                digest: output.digest(),
            },
            Err(e) => {
                error!(asset = %job.asset, error = %e, "Output sink failed");
                AssetStatus::SinkFailed {
                    reason: e.to_string(),
                }
            }
        },
        Err(e) => {
            error!(asset = %job.asset, error = %e, "Asset pipeline failed");
            AssetStatus::Failed {
                reason: e.to_string(),
            }
        }
    }));

    let status = result.unwrap_or_else(|payload| {
        let reason = panic_message(payload.as_ref());
        error!(asset = %job.asset, reason = %reason, "Asset pipeline panicked");
        AssetStatus::Failed { reason }
    });

    AssetSummary {
        asset: job.asset.clone(),
        status,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StockInfo;
    use crate::locator::TickFile;
    use crate::orchestrator::AssetOutput;
    use crate::error::SinkError;
    use aggregation::EngineConfig;
    use tick_codec::Compression;

    struct NoFiles;

    impl TickFileLocator for NoFiles {
        fn locate(&self, _asset: &AssetCode, _period: PeriodId) -> Option<TickFile> {
            None
        }
    }

    /// Panics for one asset, discards everything else.
    struct PanickySink(&'static str);

    impl OutputSink for PanickySink {
        fn write(&self, output: &AssetOutput) -> Result<(), SinkError> {
            if output.asset.as_str() == self.0 {
                panic!("sink exploded for {}", self.0);
            }
            Ok(())
        }
    }

    fn info(ipo: &str) -> StockInfo {
        StockInfo {
            name: "x".to_string(),
            industry: String::new(),
            sub_industry: String::new(),
            ipo_date: ipo.to_string(),
            delist_date: None,
            is_delisted: false,
        }
    }

    #[test]
    fn test_plan_jobs_filters_and_orders() {
        let mut universe = StockUniverse::new();
        universe.insert(AssetCode::new("600005"), info("2024-01"));
        universe.insert(AssetCode::new("600004"), info("2023-11"));
        universe.insert(AssetCode::new("000001"), info("2024-02"));
        let end = PeriodId::new(2024, 2).unwrap();

        let all = plan_jobs(&universe, end, &[]).unwrap();
        let codes: Vec<&str> = all.iter().map(|j| j.asset.as_str()).collect();
        assert_eq!(codes, vec!["000001", "600004", "600005"]);
        assert_eq!(all[1].periods.len(), 4);

        let only = plan_jobs(&universe, end, &[AssetCode::new("600005")]).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].periods.len(), 2);
    }

    #[test]
    fn test_panic_is_isolated_to_one_asset() {
        let pipeline = AssetPipeline::new(NoFiles, Compression::Zlib, EngineConfig::default()).unwrap();
        let period = PeriodId::new(2024, 1).unwrap();
        let jobs: Vec<AssetJob> = ["600004", "600005", "600006"]
            .iter()
            .map(|code| AssetJob {
                asset: AssetCode::new(*code),
                periods: vec![period],
            })
            .collect();

        let summary = BatchRunner::new(2)
            .run(&pipeline, &PanickySink("600005"), &jobs)
            .unwrap();
        assert_eq!(summary.assets.len(), 3);
        assert_eq!(summary.completed(), 2);
        assert_eq!(summary.failed(), 1);
        match summary.get(&AssetCode::new("600005")).unwrap() {
            AssetStatus::Failed { reason } => assert!(reason.contains("sink exploded")),
            other => panic!("unexpected status: {:?}", other),
        }
    }

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }

    #[test]
    fn test_summary_serializes_status_tag() {
        let summary = BatchSummary {
            assets: vec![AssetSummary {
                asset: AssetCode::new("600004"),
                status: AssetStatus::Failed {
                    reason: "boom".to_string(),
                },
            }],
            elapsed: Duration::ZERO,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, r#"{"assets":[{"asset":"600004","status":"failed","reason":"boom"}]}"#);
    }
}
