use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct Message {
    #[schema(example = "Training session closed")]
    /// Message to display
    pub message: String,
    #[schema(example = "Success")]
    /// Status of the message
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// current page of the pagination
    #[param(default = 1, example = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// number of items per page
    #[param(default = 20, example = 20)]
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    20
}
