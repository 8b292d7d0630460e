use super::fetch_error;
use crate::error::RemoteFetchError;
use nadi_model::{InventoryItem, Record, SiteId};
use nadi_source::{select_records, DataSource, Direction, Select};

/// Inventory of `site`, by name
///
/// # Errors
/// [`RemoteFetchError`] if the remote read fails
pub async fn fetch_inventory(
    source: &dyn DataSource,
    site: Option<SiteId>,
) -> Result<Vec<InventoryItem>, RemoteFetchError> {
    let Some(site) = site else {
        return Ok(Vec::new());
    };
    select_records(
        source,
        Select::from(InventoryItem::TABLE)
            .eq("site_id", site)
            .order_by("name", Direction::Ascending),
    )
    .await
    .map_err(fetch_error::<InventoryItem>)
}
