// src/auth/models.rs

use serde::{Deserialize, Serialize};

/// JWT claims issued by the external account service
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}
