//! DNS zone resources and data source

pub mod record;
pub mod redirection;
pub mod zone;

use ovh_client::{OvhClient, path_escape};
use ovh_core::handler::HandlerResult;

/// Ask the DNS servers to pick up pending zone changes
///
/// Records and redirections only become visible after a zone refresh, so
/// every write is followed by one.
pub(crate) async fn refresh_zone(client: &OvhClient, zone: &str) -> HandlerResult<()> {
    client
        .post_empty::<()>(&format!("/domain/zone/{}/refresh", path_escape(zone)))
        .await?;
    Ok(())
}
