//! Subscription maintenance against the configured preference store.

use pricewatch_core::{AppConfig, CategoryCatalog, Subscription, Target, UserId};
use rust_decimal::Decimal;

fn describe(subscription: &Subscription, catalog: &CategoryCatalog) -> String {
    let target = match &subscription.target {
        Target::Category(id) => match catalog.get(*id) {
            Some(category) => format!("category {id} ({})", category.name),
            None => format!("category {id} (not in catalog)"),
        },
        Target::Query(query) => format!("query \"{query}\""),
    };
    format!(
        "{:>14}  {:>10}  {target}",
        subscription.user_id,
        subscription.threshold.normalize().to_string()
    )
}

/// Prints every stored subscription.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or listed.
pub(crate) async fn run_list(config: &AppConfig, catalog: &CategoryCatalog) -> anyhow::Result<()> {
    let store = pricewatch_db::open_store(config).await?;
    let subscriptions = store.list_subscriptions().await?;
    if subscriptions.is_empty() {
        println!("no subscriptions");
        return Ok(());
    }
    for subscription in &subscriptions {
        println!("{}", describe(subscription, catalog));
    }
    println!("{} subscriptions", subscriptions.len());
    Ok(())
}

/// Creates or replaces the subscription of `user_id`.
///
/// # Errors
///
/// Returns an error if the category is unknown, or the store rejects the write.
pub(crate) async fn run_set(
    config: &AppConfig,
    catalog: &CategoryCatalog,
    user_id: UserId,
    target: Target,
    threshold: Decimal,
) -> anyhow::Result<()> {
    if let Target::Category(id) = target {
        if catalog.get(id).is_none() {
            anyhow::bail!("category {id} is not in the catalog");
        }
    }
    let store = pricewatch_db::open_store(config).await?;
    let subscription = store.upsert(user_id, target, threshold).await?;
    tracing::info!(user_id, target = %subscription.target, "subscription saved");
    println!("{}", describe(&subscription, catalog));
    Ok(())
}

/// Removes the subscription of `user_id`, if any.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or written.
pub(crate) async fn run_remove(config: &AppConfig, user_id: UserId) -> anyhow::Result<()> {
    let store = pricewatch_db::open_store(config).await?;
    if store.remove(user_id).await? {
        println!("removed subscription of {user_id}");
    } else {
        println!("{user_id} has no subscription");
    }
    Ok(())
}
