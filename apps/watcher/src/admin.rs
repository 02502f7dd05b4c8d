//! Registry maintenance commands.

use crate::handler::HandlerError;
use pricewatch_core::{ElementMatch, Target};
use pricewatch_store::{SqliteStore, TargetRegistry};
use tracing::{info, warn};

/// Parse a `key=value` pair from the command line.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {:?}", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Validate and upsert a target.
pub async fn add_target(
    store: &SqliteStore,
    title: String,
    url: String,
    element: Vec<(String, String)>,
) -> Result<Target, HandlerError> {
    url::Url::parse(&url).map_err(|source| HandlerError::InvalidUrl {
        url: url.clone(),
        source,
    })?;

    let element: ElementMatch = element.into_iter().collect();
    // reject rules that could never become a selector
    element.to_css()?;

    let target = Target::new(title, url, element);
    store.upsert_target(&target).await?;
    info!(title = target.title.as_str(), "Target saved");
    Ok(target)
}

pub async fn remove_target(store: &SqliteStore, title: &str) -> Result<bool, HandlerError> {
    let removed = store.remove_target(title).await?;
    if removed {
        info!(title = title, "Target removed");
    } else {
        warn!(title = title, "No such target");
    }
    Ok(removed)
}

/// One line per target: title, url and the selector it renders to.
pub async fn describe_targets(store: &SqliteStore) -> Result<Vec<String>, HandlerError> {
    let targets = store.list_targets().await?;
    Ok(targets
        .iter()
        .map(|t| {
            let css = t
                .element
                .to_css()
                .unwrap_or_else(|e| format!("<invalid: {}>", e));
            format!("{}\t{}\t{}", t.title, t.url, css)
        })
        .collect())
}

/// One line per stored price.
pub async fn describe_prices(store: &SqliteStore) -> Result<Vec<String>, HandlerError> {
    let records = store.list_prices().await?;
    Ok(records
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}",
                r.title,
                r.price,
                r.created.to_rfc3339(),
                r.updated.to_rfc3339()
            )
        })
        .collect())
}
