//! Auto-connect post-pass.
use crate::model::{EntityStore, Relationship, ViewStore};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};

/// What one post-pass drew, and the views it could not finish.
#[derive(Debug, Default)]
pub struct ConnectReport {
    /// Connections added, including those on views that later failed.
    pub added: usize,
    pub failures: Vec<anyhow::Error>,
}

impl ConnectReport {
    /// All failures joined into one line, if any.
    pub fn error_message(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let messages: Vec<String> = self.failures.iter().map(|err| format!("{err:#}")).collect();
        Some(messages.join("; "))
    }
}

/// Draw every relationship whose endpoints are both placed on one of `views`
/// and which is not yet drawn there.
///
/// A failing view stops at its first error; the remaining views are still
/// wired. Running it again over the same views adds nothing.
pub fn auto_connect<S>(store: &mut S, views: &BTreeSet<String>) -> ConnectReport
where
    S: EntityStore + ViewStore + ?Sized,
{
    let relationships = store.relationships();
    let mut report = ConnectReport::default();
    for view in views {
        let mut added = 0;
        let outcome = connect_view(store, view, &relationships, &mut added);
        report.added += added;
        tracing::debug!(view = %view, added, "auto-connect pass");
        if let Err(err) = outcome {
            report.failures.push(err);
        }
    }
    report
}

fn connect_view<S>(
    store: &mut S,
    view: &str,
    relationships: &[Relationship],
    added: &mut usize,
) -> Result<()>
where
    S: EntityStore + ViewStore + ?Sized,
{
    let children = store
        .view_children(view)
        .with_context(|| format!("list visuals on view {view}"))?;
    let mut placed: BTreeMap<&str, &str> = BTreeMap::new();
    for child in &children {
        placed
            .entry(child.entity_id.as_str())
            .or_insert(child.id.as_str());
    }
    let drawn: BTreeSet<String> = store
        .view_connections(view)
        .with_context(|| format!("list connections on view {view}"))?
        .into_iter()
        .map(|connection| connection.relationship_id)
        .collect();

    for rel in relationships {
        if drawn.contains(&rel.id) {
            continue;
        }
        let (Some(source), Some(target)) = (
            placed.get(rel.source.as_str()),
            placed.get(rel.target.as_str()),
        ) else {
            continue;
        };
        store
            .connect_in_view(view, &rel.id, source, target)
            .with_context(|| format!("connect {} on view {view}", rel.id))?;
        *added += 1;
    }
    Ok(())
}
