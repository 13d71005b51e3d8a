use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use log::info;
use novelgate_lib::fetch::cached_fetch_before;
use novelgate_lib::fetch::RequestExecutor;
use tokio::time::Instant;

use super::CommandParams;
use crate::ExitCode;
use crate::executor::FetchFailure;
use crate::retry::RetryExt;
use crate::stats::FetchStats;
use crate::target::{ArtifactKey, Target};

/// Fetch all targets, `passes` times over.
///
/// Within a pass, up to `max_concurrency` targets are in flight. The gate
/// keeps requests to the same host apart, the caches serve repeated targets.
pub(crate) async fn fetch(params: &CommandParams) -> (FetchStats, ExitCode) {
    let started = std::time::Instant::now();
    let max_concurrency = params.cfg.max_concurrency.max(1);
    let mut stats = FetchStats::default();

    for pass in 1..=params.cfg.passes {
        if params.cfg.passes > 1 {
            info!("Starting pass {pass} of {}", params.cfg.passes);
        }

        let results: Vec<_> = stream::iter(&params.targets)
            .map(|target| async move {
                let (retries, result) = fetch_target(params, target).await;
                (target, retries, result)
            })
            .buffer_unordered(max_concurrency)
            .collect()
            .await;

        for (target, retries, result) in results {
            match &result {
                Ok(len) => info!("✔ {target}: {len} bytes"),
                Err(e) => info!("✗ {target}: {e}"),
            }
            stats.add(pass, target, retries, &result);
        }

        params.caches.recycle();
    }

    stats.duration_secs = started.elapsed().as_secs();
    let code = if stats.is_success() {
        ExitCode::Success
    } else {
        ExitCode::FetchFailure
    };
    (stats, code)
}

/// Fetch a single target, retrying transient failures
async fn fetch_target(params: &CommandParams, target: &Target) -> (u64, Result<usize, FetchFailure>) {
    let max_retries = params.cfg.max_retries;
    let mut retries = 0;

    loop {
        match fetch_once(params, target).await {
            Err(e) if retries < max_retries && e.should_retry() => {
                retries += 1;
                log::debug!("Retrying {target} ({retries}/{max_retries}): {e}");
            }
            result => return (retries, result),
        }
    }
}

/// Serve a target from its cache or fetch it through the gate.
/// Returns the size of the artifact.
async fn fetch_once(params: &CommandParams, target: &Target) -> Result<usize, FetchFailure> {
    let CommandParams {
        fetcher, caches, ..
    } = params;
    let url = &target.url;
    let deadline = params.cfg.max_wait.map(|wait| Instant::now() + wait);

    let len = match (&target.key, deadline) {
        (ArtifactKey::Extension(id), None) => {
            fetcher.fetch_cached(&caches.extensions, *id, url).await?.len()
        }
        (ArtifactKey::Extension(id), Some(deadline)) => fetcher
            .fetch_cached_before(&caches.extensions, *id, url, deadline)
            .await?
            .len(),
        (ArtifactKey::Chapter(id), None) => {
            fetcher.fetch_cached(&caches.chapters, *id, url).await?.len()
        }
        (ArtifactKey::Chapter(id), Some(deadline)) => fetcher
            .fetch_cached_before(&caches.chapters, *id, url, deadline)
            .await?
            .len(),
        (ArtifactKey::Library(name), None) => fetcher
            .fetch_cached_with(&caches.libraries, name.clone(), url, to_text)
            .await?
            .len(),
        (ArtifactKey::Library(name), Some(deadline)) => {
            let executor = fetcher.executor();
            let host = executor.host(url)?;
            cached_fetch_before(
                &caches.libraries,
                fetcher.gate(),
                name.clone(),
                &host,
                deadline,
                || async { to_text(executor.execute(&host, url).await?) },
            )
            .await?
            .len()
        }
    };
    Ok(len)
}

/// Library sources are cached as text
fn to_text(bytes: Bytes) -> Result<String, FetchFailure> {
    Ok(String::from_utf8(bytes.to_vec())?)
}
