use ofe_common::Money;
use serde::{Deserialize, Serialize};

//--------------------------------------     Restaurant      ----------------------------------------------------------
/// The restaurant facts the engine needs: enough to stamp an order snapshot and resolve ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
}

//--------------------------------------      MenuItem       ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub restaurant_id: i64,
}
