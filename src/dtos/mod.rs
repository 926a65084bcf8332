pub mod nominationdtos;
pub mod pointsdtos;
pub mod referraldtos;
pub mod rewarddtos;

use serde::{Deserialize, Serialize};

pub use nominationdtos::*;
pub use pointsdtos::*;
pub use referraldtos::*;
pub use rewarddtos::*;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub status: String,
    pub data: Vec<T>,
    pub results: usize,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            status: "success".to_string(),
            results: data.len(),
            data,
        }
    }
}
