//! Typed payloads carried in `Msg::body` between trucks and the broker.
//! The bus itself only knows `serde_json::Value`; these
//! structs give the decision ladders a typed view without introducing a
//! second message envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dt_core::{NodeId, PackageId, SiteId, Tick};

pub const MSG_PROPOSAL: &str = "proposal";
pub const MSG_ACCEPT: &str = "accept";
pub const MSG_REJECT: &str = "reject";
pub const MSG_ASSIGNMENT_CONFIRMED: &str = "assignment_confirmed";
pub const MSG_PICKUP_CONFIRMED: &str = "pickup_confirmed";
pub const MSG_DELIVERY_CONFIRMED: &str = "delivery_confirmed";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalBody {
    pub package_id: PackageId,
    pub origin_site: SiteId,
    pub destination_site: SiteId,
    pub origin_node: NodeId,
    pub destination_node: NodeId,
    pub size: u32,
    pub pickup_deadline_tick: Tick,
    pub delivery_deadline_tick: Tick,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackageRefBody {
    pub package_id: PackageId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryConfirmedBody {
    pub package_id: PackageId,
    pub on_time: bool,
    pub delivery_tick: Tick,
    /// Already lateness-discounted by the truck (`Package::late_discounted_payment`) —
    /// the package record itself is gone from `ctx.packages` by the time the
    /// broker processes this, so the payment can't be recomputed on arrival.
    pub payment: f64,
}

/// Parse `body` as `T`, treating a malformed payload as "ignore the
/// message" rather than a hard error — a peer running ahead/behind a
/// protocol revision should not be able to wedge the tick loop.
pub fn parse_body<T: for<'de> Deserialize<'de>>(body: &Value) -> Option<T> {
    serde_json::from_value(body.clone()).ok()
}
