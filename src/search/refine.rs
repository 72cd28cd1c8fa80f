//! Multi-hop query refinement
//!
//! Each hop asks the generator for a query from the topic and the passages
//! collected so far, runs it, and feeds the results back as context.

use super::{Passage, QueryGenerator, SearchError, SearchProvider};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Appends `passages` to `context`, keeping the first occurrence of each
pub fn extend_deduplicated(context: &mut Vec<String>, passages: impl IntoIterator<Item = String>) {
    let mut seen: HashSet<String> = context.iter().cloned().collect();
    for passage in passages {
        if seen.insert(passage.clone()) {
            context.push(passage);
        }
    }
}

/// Query for one hop; the raw topic when the generator fails or is too slow
async fn hop_query(
    generator: Option<&dyn QueryGenerator>,
    provider: SearchProvider,
    topic: &str,
    context: &[String],
    timeout: Duration,
) -> String {
    let Some(generator) = generator else {
        return topic.to_string();
    };

    match tokio::time::timeout(timeout, generator.generate(provider, topic, context)).await {
        Ok(Ok(query)) => query,
        Ok(Err(e)) => {
            warn!(%provider, "Query generation failed, using the topic: {}", e);
            topic.to_string()
        }
        Err(_) => {
            warn!(%provider, "Query generation timed out after {:?}, using the topic", timeout);
            topic.to_string()
        }
    }
}

/// Runs `hops` rounds (at least one) and returns the results of the last.
///
/// A failed retrieval on an intermediate hop only contributes no context;
/// the outcome of the final hop is returned as is.
pub async fn refine<T, F, Fut>(
    topic: &str,
    hops: usize,
    generator: Option<&dyn QueryGenerator>,
    provider: SearchProvider,
    retrieve: F,
    timeout: Duration,
) -> Result<Vec<T>, SearchError>
where
    T: Passage,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<T>, SearchError>>,
{
    let hops = hops.max(1);
    let mut context: Vec<String> = Vec::new();

    for hop in 0..hops - 1 {
        let query = hop_query(generator, provider, topic, &context, timeout).await;
        debug!(%provider, hop, %query, "Retrieving");

        match retrieve(query).await {
            Ok(results) => extend_deduplicated(&mut context, results.iter().map(Passage::passage)),
            Err(e) => warn!(%provider, hop, "Retrieval failed, continuing without context: {}", e),
        }
    }

    let query = hop_query(generator, provider, topic, &context, timeout).await;
    debug!(%provider, hop = hops - 1, %query, "Retrieving");
    retrieve(query).await
}
